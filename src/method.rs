//! HTTP method as a typed enum.
//!
//! Covers the RFC 9110 methods. Only a subset can carry routes: see
//! [`Method::is_routable`]. `OPTIONS` belongs to the CORS middleware, and the
//! rest never reach application handlers.
//!
//! A request with a method string outside this set is answered with
//! `404 Not Found`, the same as any other unroutable request.

use std::fmt;
use std::str::FromStr;

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }

    /// Whether a handler may be registered for this method.
    pub fn is_routable(self) -> bool {
        matches!(self, Self::Get | Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

/// Returned when a method string is not one of the RFC 9110 methods.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown http method `{0}`")]
pub struct UnknownMethod(pub String);

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            other     => Err(UnknownMethod(other.to_owned())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!("GET".parse::<Method>(), Ok(Method::Get));
        assert_eq!("get".parse::<Method>(), Err(UnknownMethod("get".into())));
    }

    #[test]
    fn only_crud_methods_are_routable() {
        let routable: Vec<_> = ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD", "TRACE"]
            .iter()
            .filter_map(|s| s.parse::<Method>().ok())
            .filter(|m| m.is_routable())
            .map(Method::as_str)
            .collect();
        assert_eq!(routable, ["GET", "POST", "PUT", "PATCH", "DELETE"]);
    }
}
