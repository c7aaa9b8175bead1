//! Request parameter collection.
//!
//! Every typed handler sees a single flat [`Params`] set built from three
//! sources, applied in this order (later sources overwrite earlier ones):
//!
//! ```text
//! 1. JSON body        {"id": "1", "name": "dat"}
//! 2. path wildcards   /users/{id}      on /users/2   → id = "2"
//! 3. query string     ?id=3&tag=a&tag=b              → id = "3", tag = ["a", "b"]
//! ```
//!
//! Wildcards beat the body. The query beats both.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::path::Wildcards;

/// The merged parameter set of one request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds the parameter set for one request.
///
/// Fails with `BadRequest` when a non-empty body is not a JSON object.
pub fn collect(body: &[u8], wildcards: &Wildcards, query: Option<&str>) -> Result<Params, ApiError> {
    let mut params = from_body(body)?;

    for (name, value) in wildcards.iter() {
        params.insert(name, value);
    }

    for (name, mut values) in group_query(query.unwrap_or_default()) {
        match values.len() {
            0 => {}
            1 => params.insert(name, values.remove(0)),
            _ => params.insert(name, values),
        }
    }

    Ok(params)
}

fn from_body(body: &[u8]) -> Result<Params, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Params::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(Params(map)),
        Ok(_) => Err(ApiError::bad_request("request body must be a JSON object")),
        Err(e) => Err(ApiError::bad_request(format!("invalid JSON body: {e}"))),
    }
}

/// Decodes the query string and groups repeated keys, keeping the order in
/// which each key first appeared.
fn group_query(query: &str) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn wildcards(pairs: &[(&str, &str)]) -> Wildcards {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn merges_all_three_sources() {
        let body = br#"{"name":"Dat","age":26}"#;
        let params = collect(body, &wildcards(&[("id", "123")]), Some("job=senior-software-engineer")).unwrap();

        assert_eq!(params.get("id"), Some(&json!("123")));
        assert_eq!(params.get("name"), Some(&json!("Dat")));
        assert_eq!(params.get("age"), Some(&json!(26)));
        assert_eq!(params.get("job"), Some(&json!("senior-software-engineer")));
        assert_eq!(params.len(), 4);
    }

    // Regression: the query string overrides wildcards, which override the body.
    #[test]
    fn query_beats_wildcard_beats_body() {
        let params = collect(br#"{"id":"1"}"#, &wildcards(&[("id", "2")]), Some("id=3")).unwrap();
        assert_eq!(params.get("id"), Some(&json!("3")));

        let params = collect(br#"{"id":"1"}"#, &wildcards(&[("id", "2")]), None).unwrap();
        assert_eq!(params.get("id"), Some(&json!("2")));
    }

    #[test]
    fn iterates_every_source_once() {
        let params = collect(br#"{"name":"Dat"}"#, &wildcards(&[("id", "1")]), Some("id=2")).unwrap();
        assert!(params.contains("id"));
        assert!(!params.contains("age"));

        let mut keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["id", "name"]);
    }

    #[test]
    fn empty_body_is_not_an_error() {
        assert!(collect(b"", &Wildcards::default(), None).unwrap().is_empty());
        assert!(collect(b"  \n", &Wildcards::default(), None).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let err = collect(b"{not json", &Wildcards::default(), None).unwrap_err();
        assert_eq!(err.status().as_u16(), 400);

        let err = collect(b"[1,2,3]", &Wildcards::default(), None).unwrap_err();
        assert_eq!(err.message(), "request body must be a JSON object");
    }

    #[test]
    fn repeated_query_keys_become_lists() {
        let params = collect(b"", &Wildcards::default(), Some("tag=a&name=x&tag=b")).unwrap();
        assert_eq!(params.get("tag"), Some(&json!(["a", "b"])));
        assert_eq!(params.get("name"), Some(&json!("x")));
    }

    #[test]
    fn query_values_are_decoded() {
        let params = collect(b"", &Wildcards::default(), Some("q=hello%20world&plus=a+b&empty=")).unwrap();
        assert_eq!(params.get("q"), Some(&json!("hello world")));
        assert_eq!(params.get("plus"), Some(&json!("a b")));
        assert_eq!(params.get("empty"), Some(&json!("")));
    }
}
