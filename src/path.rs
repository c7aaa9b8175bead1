//! Path patterns and matching.
//!
//! A pattern is a `/`-separated list of segments. A segment wholly wrapped
//! in braces, `{name}`, is a wildcard that binds exactly one path segment.
//! Everything else is a literal compared byte for byte.
//!
//! ```text
//! pattern  /users/{id}/accounts
//! path     /users/42/accounts      → match, id = "42"
//! path     /users/42               → no match (segment count differs)
//! ```
//!
//! Leading and trailing slashes are ignored on both sides, so `/users/42/`
//! matches `/users/{id}`. There are no optional segments, no partial-segment
//! wildcards and no catch-all tails.

use std::collections::HashMap;
use std::fmt;

/// Splits a path or pattern into segments after trimming outer slashes.
pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.trim_matches('/').split('/').collect()
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Wildcard(String),
}

/// A parsed path pattern such as `/users/{user_id}/accounts`.
#[derive(Clone, Debug)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

/// Why a pattern string was rejected.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern `{pattern}` has a wildcard with an empty name")]
    EmptyName { pattern: String },

    #[error("pattern `{pattern}` has segment `{segment}` with braces that do not wrap the whole segment")]
    PartialWildcard { pattern: String, segment: String },

    #[error("pattern `{pattern}` binds `{name}` more than once")]
    DuplicateName { pattern: String, name: String },
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let mut parsed = Vec::new();
        for seg in segments(raw) {
            let wrapped = seg.len() >= 2 && seg.starts_with('{') && seg.ends_with('}');
            if wrapped {
                let name = &seg[1..seg.len() - 1];
                if name.is_empty() {
                    return Err(PatternError::EmptyName { pattern: raw.to_owned() });
                }
                if name.contains(['{', '}']) {
                    return Err(PatternError::PartialWildcard {
                        pattern: raw.to_owned(),
                        segment: seg.to_owned(),
                    });
                }
                if parsed.iter().any(|s| matches!(s, Segment::Wildcard(n) if n == name)) {
                    return Err(PatternError::DuplicateName {
                        pattern: raw.to_owned(),
                        name: name.to_owned(),
                    });
                }
                parsed.push(Segment::Wildcard(name.to_owned()));
            } else if seg.contains(['{', '}']) {
                return Err(PatternError::PartialWildcard {
                    pattern: raw.to_owned(),
                    segment: seg.to_owned(),
                });
            } else {
                parsed.push(Segment::Literal(seg.to_owned()));
            }
        }
        Ok(Self { raw: raw.to_owned(), segments: parsed })
    }

    /// The pattern as it was declared.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Does `path` match this pattern?
    pub fn is_match(&self, path: &str) -> bool {
        self.matches_segments(&segments(path))
    }

    /// Binds every wildcard to the path segment at its position.
    ///
    /// Meant to be called after [`is_match`](Self::is_match) succeeded. On a
    /// path with fewer segments, wildcards past the end are left unbound.
    pub fn extract(&self, path: &str) -> Wildcards {
        self.extract_segments(&segments(path))
    }

    /// Number of literal segments. Routes with more literals win overlaps.
    pub fn specificity(&self) -> usize {
        self.segments.iter().filter(|s| matches!(s, Segment::Literal(_))).count()
    }

    /// Two patterns have the same shape when they match exactly the same
    /// paths: same literals in the same places, wildcards anywhere else.
    /// Wildcard names are irrelevant.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                (Segment::Wildcard(_), Segment::Wildcard(_)) => true,
                _ => false,
            })
    }

    pub(crate) fn matches_segments(&self, path: &[&str]) -> bool {
        self.segments.len() == path.len()
            && self.segments.iter().zip(path).all(|(seg, part)| match seg {
                Segment::Literal(lit) => lit == part,
                Segment::Wildcard(_) => true,
            })
    }

    pub(crate) fn extract_segments(&self, path: &[&str]) -> Wildcards {
        let bindings = self
            .segments
            .iter()
            .zip(path)
            .filter_map(|(seg, part)| match seg {
                Segment::Wildcard(name) => Some((name.clone(), (*part).to_owned())),
                Segment::Literal(_) => None,
            })
            .collect();
        Wildcards(bindings)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Matches `path` against a raw pattern string. Malformed patterns never match.
pub fn is_match(pattern: &str, path: &str) -> bool {
    Pattern::parse(pattern).is_ok_and(|p| p.is_match(path))
}

/// Bindings of `path` under a raw pattern string, empty when the pattern is
/// malformed or does not match.
pub fn extract(pattern: &str, path: &str) -> Wildcards {
    match Pattern::parse(pattern) {
        Ok(p) if p.is_match(path) => p.extract(path),
        _ => Wildcards::default(),
    }
}

/// Wildcard bindings of the route that matched the current request.
///
/// The dispatcher stores this in the request extensions. Typed handlers
/// read it back when collecting parameters.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Wildcards(HashMap<String, String>);

impl Wildcards {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl FromIterator<(String, String)> for Wildcards {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_functions_take_raw_patterns() {
        assert!(is_match("/users/{id}", "/users/42"));
        assert!(!is_match("/users/{}", "/users/42"));
        assert_eq!(extract("/users/{id}", "/users/42").get("id"), Some("42"));
        assert!(extract("/users/{id}", "/accounts/42/x").is_empty());
    }

    #[test]
    fn wildcards_iterate_their_bindings() {
        let wildcards = extract("/users/{user_id}/accounts/{id}", "/users/3/accounts/9");
        let mut pairs: Vec<_> = wildcards.iter().collect();
        pairs.sort_unstable();
        assert_eq!(pairs, [("id", "9"), ("user_id", "3")]);
        assert_eq!(wildcards.len(), 2);
    }

    fn pattern(raw: &str) -> Pattern {
        Pattern::parse(raw).unwrap()
    }

    #[test]
    fn matches_by_segment() {
        let p = pattern("/users/{id}");
        let cases = [
            ("/users/123", true),
            ("/users/123/", true),
            ("users/123", true),
            ("/users", false),
            ("/users/123/accounts", false),
            ("/accounts/123", false),
        ];
        for (path, want) in cases {
            assert_eq!(p.is_match(path), want, "{path}");
        }
    }

    #[test]
    fn wildcards_are_not_optional() {
        assert!(!pattern("/users/{id}").is_match("/users"));
        assert!(!pattern("/users/{id}").is_match("/users/"));
    }

    #[test]
    fn root_pattern_matches_root_only() {
        let p = pattern("/");
        assert!(p.is_match("/"));
        assert!(p.is_match(""));
        assert!(!p.is_match("/users"));
    }

    #[test]
    fn equal_length_match_iff_literals_equal() {
        // Every literal/wildcard mix over three positions against paths that
        // differ from the literal at a chosen position.
        let literals = ["a", "b", "c"];
        for mask in 0u8..8 {
            let raw: String = literals
                .iter()
                .enumerate()
                .map(|(i, lit)| {
                    if mask & (1 << i) != 0 { format!("/{{w{i}}}") } else { format!("/{lit}") }
                })
                .collect();
            let p = pattern(&raw);
            for differ in 0..3 {
                let path: String = literals
                    .iter()
                    .enumerate()
                    .map(|(i, lit)| if i == differ { "/zz".to_owned() } else { format!("/{lit}") })
                    .collect();
                let literal_at_differ = mask & (1 << differ) == 0;
                assert_eq!(p.is_match(&path), !literal_at_differ, "{raw} vs {path}");
            }
            assert!(p.is_match("/a/b/c"), "{raw}");
        }
    }

    #[test]
    fn extract_recovers_wildcards() {
        let p = pattern("/users/{id}");
        let w = p.extract("/users/42");
        assert_eq!(w.get("id"), Some("42"));
        assert_eq!(w.len(), 1);

        let p = pattern("/users/{user_id}/accounts/{id}");
        let w = p.extract("/users/7/accounts/99");
        assert_eq!(w.get("user_id"), Some("7"));
        assert_eq!(w.get("id"), Some("99"));
    }

    #[test]
    fn extract_keeps_segment_text_verbatim() {
        let w = pattern("/files/{name}").extract("/files/a%20b");
        assert_eq!(w.get("name"), Some("a%20b"));
    }

    #[test]
    fn rejects_malformed_wildcards() {
        assert!(matches!(Pattern::parse("/users/{}"), Err(PatternError::EmptyName { .. })));
        assert!(matches!(
            Pattern::parse("/users/user{id}"),
            Err(PatternError::PartialWildcard { .. })
        ));
        assert!(matches!(Pattern::parse("/users/{id"), Err(PatternError::PartialWildcard { .. })));
        assert!(matches!(
            Pattern::parse("/a/{id}/b/{id}"),
            Err(PatternError::DuplicateName { .. })
        ));
    }

    #[test]
    fn specificity_counts_literals() {
        assert_eq!(pattern("/users/self").specificity(), 2);
        assert_eq!(pattern("/users/{id}").specificity(), 1);
        assert_eq!(pattern("/{a}/{b}").specificity(), 0);
    }

    #[test]
    fn shape_ignores_wildcard_names() {
        assert!(pattern("/users/{id}").same_shape(&pattern("/users/{user_id}")));
        assert!(!pattern("/users/{id}").same_shape(&pattern("/users/self")));
        assert!(!pattern("/users/{id}").same_shape(&pattern("/users/{id}/accounts")));
    }
}
