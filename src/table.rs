//! Ranked (method, pattern) table.
//!
//! The router resolves paths with [`RouteTable::find`]. The authentication
//! ignore-list and the role map never look at the path: they take the route
//! the router resolved and look it up by shape with [`RouteTable::get`].
//!
//! Entries are kept sorted at insertion: more literal segments first, then
//! declaration order. Lookup returns the first entry that matches, so
//! `/users/self` beats `/users/{id}` however they were registered.

use std::collections::HashMap;

use crate::method::Method;
use crate::path::{self, Pattern};
use crate::router::RouteError;

struct Entry<T> {
    pattern: Pattern,
    specificity: usize,
    value: T,
}

pub(crate) struct RouteTable<T> {
    routes: HashMap<Method, Vec<Entry<T>>>,
}

impl<T> RouteTable<T> {
    pub(crate) fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Adds an entry. Fails when an entry with the same method and pattern
    /// shape already exists, since the two could never be told apart.
    pub(crate) fn insert(&mut self, method: Method, pattern: Pattern, value: T) -> Result<(), RouteError> {
        let entries = self.routes.entry(method).or_default();
        if entries.iter().any(|e| e.pattern.same_shape(&pattern)) {
            return Err(RouteError::Duplicate { method, pattern: pattern.to_string() });
        }
        let specificity = pattern.specificity();
        // After every entry at least as specific: ties keep declaration order.
        let at = entries.partition_point(|e| e.specificity >= specificity);
        entries.insert(at, Entry { pattern, specificity, value });
        Ok(())
    }

    pub(crate) fn find(&self, method: Method, path: &str) -> Option<(&Pattern, &T)> {
        let entries = self.routes.get(&method)?;
        let segments = path::segments(path);
        entries
            .iter()
            .find(|e| e.pattern.matches_segments(&segments))
            .map(|e| (&e.pattern, &e.value))
    }

    /// The entry declared with the same shape as `pattern`, if any.
    pub(crate) fn get(&self, method: Method, pattern: &Pattern) -> Option<&T> {
        self.routes
            .get(&method)?
            .iter()
            .find(|e| e.pattern.same_shape(pattern))
            .map(|e| &e.value)
    }

    pub(crate) fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self { Self::new() }
}

/// Parses a `"METHOD /pattern"` key as used in the ignore-list and role map.
pub(crate) fn parse_route_key(key: &str) -> Result<(Method, Pattern), RouteError> {
    let (method, pattern) = key
        .trim()
        .split_once(' ')
        .ok_or_else(|| RouteError::MalformedKey(key.to_owned()))?;
    let method = method.parse::<Method>()?;
    let pattern = Pattern::parse(pattern.trim())?;
    Ok((method, pattern))
}

/// Builds a table from `"METHOD /pattern"` keys.
pub(crate) fn from_keys<K, T>(entries: impl IntoIterator<Item = (K, T)>) -> Result<RouteTable<T>, RouteError>
where
    K: AsRef<str>,
{
    let mut table = RouteTable::new();
    for (key, value) in entries {
        let (method, pattern) = parse_route_key(key.as_ref())?;
        table.insert(method, pattern, value)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(keys: &[&'static str]) -> RouteTable<&'static str> {
        from_keys(keys.iter().map(|k| (*k, *k))).unwrap()
    }

    #[test]
    fn literal_beats_wildcard_in_either_order() {
        for keys in [["GET /users/{id}", "GET /users/self"], ["GET /users/self", "GET /users/{id}"]] {
            let t = table(&keys);
            assert_eq!(t.find(Method::Get, "/users/self").map(|(_, v)| *v), Some("GET /users/self"));
            assert_eq!(t.find(Method::Get, "/users/5").map(|(_, v)| *v), Some("GET /users/{id}"));
        }
    }

    #[test]
    fn equal_specificity_keeps_declaration_order() {
        let t = table(&["GET /a/{x}/c", "GET /a/b/{y}"]);
        assert_eq!(t.find(Method::Get, "/a/b/c").map(|(_, v)| *v), Some("GET /a/{x}/c"));

        let t = table(&["GET /a/b/{y}", "GET /a/{x}/c"]);
        assert_eq!(t.find(Method::Get, "/a/b/c").map(|(_, v)| *v), Some("GET /a/b/{y}"));
    }

    #[test]
    fn method_is_part_of_the_key() {
        let t = table(&["POST /users"]);
        assert!(t.find(Method::Get, "/users").is_none());
        assert!(t.find(Method::Post, "/users").is_some());
    }

    #[test]
    fn same_shape_is_a_duplicate() {
        let err = from_keys([("GET /users/{id}", ()), ("GET /users/{user_id}", ())]).err();
        assert!(matches!(err, Some(RouteError::Duplicate { method: Method::Get, .. })));

        // Different methods do not collide.
        assert!(from_keys([("GET /users/{id}", ()), ("PUT /users/{id}", ())]).is_ok());
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(matches!(parse_route_key("/users"), Err(RouteError::MalformedKey(_))));
        assert!(matches!(parse_route_key("FETCH /users"), Err(RouteError::Method(_))));
        assert!(matches!(parse_route_key("GET /users/{}"), Err(RouteError::Pattern(_))));
    }

    #[test]
    fn get_matches_by_shape_not_by_path() {
        let t = table(&["GET /users/{id}"]);
        let renamed = Pattern::parse("/users/{user_id}").unwrap();
        let literal = Pattern::parse("/users/self").unwrap();
        assert_eq!(t.get(Method::Get, &renamed), Some(&"GET /users/{id}"));
        assert_eq!(t.get(Method::Get, &literal), None);
        assert_eq!(t.get(Method::Put, &renamed), None);
    }

    #[test]
    fn counts_entries_across_methods() {
        assert_eq!(table(&["GET /a", "POST /a", "GET /b"]).len(), 3);
    }
}
