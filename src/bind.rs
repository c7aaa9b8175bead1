//! Typed request binding.
//!
//! A request type says how it is read from [`Params`] by implementing
//! [`FromParams`]. Each field is looked up under its external name with
//! [`Params::field`]:
//!
//! ```rust
//! use tollgate::{ApiError, FromParams, Params};
//!
//! #[derive(Debug, Default)]
//! struct UpdateUser {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl FromParams for UpdateUser {
//!     fn from_params(params: &Params) -> Result<Self, ApiError> {
//!         Ok(Self {
//!             id: params.field("id")?,
//!             name: params.field("name")?,
//!         })
//!     }
//! }
//! ```
//!
//! Coercion is deliberately small. Integer fields accept a base-10 string,
//! because path and query values are always strings. Everything else must
//! already have the right JSON type. A missing field is its type's default.
//! There is no presence tracking, so absent and empty look the same.

use serde_json::Value;

use crate::error::ApiError;
use crate::params::Params;

/// Builds a typed request from the merged parameter set.
pub trait FromParams: Sized {
    fn from_params(params: &Params) -> Result<Self, ApiError>;
}

/// The empty request, for handlers that take no input.
impl FromParams for () {
    fn from_params(_: &Params) -> Result<Self, ApiError> {
        Ok(())
    }
}

/// A type that can be read out of one parameter value.
pub trait FieldValue: Sized + Default {
    /// Human name of the expected type, used in error messages.
    const EXPECTED: &'static str;

    /// Converts `value`, or returns `None` on a type mismatch.
    fn coerce(value: &Value) -> Option<Self>;
}

impl Params {
    /// Reads the field stored under `name`.
    ///
    /// Returns the type's default when the name is absent and `BadRequest`
    /// when the value cannot be coerced.
    pub fn field<T: FieldValue>(&self, name: &str) -> Result<T, ApiError> {
        match self.get(name) {
            None => Ok(T::default()),
            Some(value) => T::coerce(value).ok_or_else(|| {
                ApiError::bad_request(format!("invalid value for `{name}`"))
                    .with_detail(format!("{name}: expected {}", T::EXPECTED))
            }),
        }
    }
}

/// Integers accept JSON numbers in range, and strings parsed as base-10.
macro_rules! integer_field {
    ($($ty:ty => $expected:literal),* $(,)?) => {$(
        impl FieldValue for $ty {
            const EXPECTED: &'static str = $expected;

            fn coerce(value: &Value) -> Option<Self> {
                match value {
                    Value::Number(n) => n
                        .as_i64()
                        .and_then(|v| <$ty>::try_from(v).ok())
                        .or_else(|| n.as_u64().and_then(|v| <$ty>::try_from(v).ok())),
                    Value::String(s) => s.parse::<$ty>().ok(),
                    _ => None,
                }
            }
        }
    )*};
}

integer_field! {
    i32 => "integer",
    i64 => "integer",
    u32 => "non-negative integer",
    u64 => "non-negative integer",
}

impl FieldValue for f64 {
    const EXPECTED: &'static str = "number";

    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse::<i64>().ok().map(|v| v as f64),
            _ => None,
        }
    }
}

impl FieldValue for String {
    const EXPECTED: &'static str = "string";

    fn coerce(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FieldValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn coerce(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FieldValue for Value {
    const EXPECTED: &'static str = "any value";

    fn coerce(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Lists coerce element-wise. A single scalar binds as a one-element list,
/// so `?tag=a` and `?tag=a&tag=b` both bind to `Vec<String>`.
macro_rules! list_field {
    ($($ty:ty => $expected:literal),* $(,)?) => {$(
        impl FieldValue for Vec<$ty> {
            const EXPECTED: &'static str = $expected;

            fn coerce(value: &Value) -> Option<Self> {
                match value {
                    Value::Array(items) => items.iter().map(<$ty>::coerce).collect(),
                    scalar => <$ty>::coerce(scalar).map(|v| vec![v]),
                }
            }
        }
    )*};
}

list_field! {
    String => "list of strings",
    i64 => "list of integers",
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        id: i64,
        name: String,
        age: i32,
        tags: Vec<String>,
    }

    impl FromParams for Person {
        fn from_params(params: &Params) -> Result<Self, ApiError> {
            Ok(Self {
                id: params.field("id")?,
                name: params.field("name")?,
                age: params.field("age")?,
                tags: params.field("tags")?,
            })
        }
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn integer_string_is_parsed() {
        let p = params(json!({"id": "26", "age": 30}));
        let person = Person::from_params(&p).unwrap();
        assert_eq!(person.id, 26);
        assert_eq!(person.age, 30);
    }

    #[test]
    fn non_numeric_string_is_bad_request() {
        let err = Person::from_params(&params(json!({"id": "twenty"}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.details(), ["id: expected integer"]);
    }

    #[test]
    fn absent_fields_stay_default() {
        let person = Person::from_params(&params(json!({"name": "Dat"}))).unwrap();
        assert_eq!(person, Person { name: "Dat".into(), ..Person::default() });
    }

    #[test]
    fn type_mismatch_is_bad_request() {
        let err = Person::from_params(&params(json!({"name": 42}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = Person::from_params(&params(json!({"age": 1.5}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn out_of_range_integer_is_rejected() {
        let err = Person::from_params(&params(json!({"age": 10_000_000_000_i64}))).unwrap_err();
        assert_eq!(err.details(), ["age: expected integer"]);
    }

    #[test]
    fn lists_accept_one_or_many() {
        let one = Person::from_params(&params(json!({"tags": "a"}))).unwrap();
        assert_eq!(one.tags, ["a"]);

        let many = Person::from_params(&params(json!({"tags": ["a", "b"]}))).unwrap();
        assert_eq!(many.tags, ["a", "b"]);

        assert!(Person::from_params(&params(json!({"tags": ["a", 1]}))).is_err());
    }

    #[test]
    fn integer_lists_coerce_each_element() {
        let p = params(json!({"ids": ["1", 2, "3"]}));
        assert_eq!(p.field::<Vec<i64>>("ids").unwrap(), [1, 2, 3]);
    }

    #[test]
    fn unsigned_rejects_negative() {
        let p = params(json!({"n": "-4"}));
        assert!(p.field::<u64>("n").is_err());
        assert_eq!(p.field::<i64>("n").unwrap(), -4);
    }
}
