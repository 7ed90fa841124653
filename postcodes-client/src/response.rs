//! Typed access to decoded API payloads.
//!
//! postcodes.io returns JSON whose shape depends on the endpoint: a single
//! record, a list of records, a list of `{query, result}` pairs, or a bare
//! scalar. [`Response`] owns one composite JSON value (a map or a list) and
//! checks the runtime kind of every value it hands out, so callers get a
//! typed error instead of a wrong value when the payload has an unexpected
//! shape.

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::slice;

use serde_json::{Map, Value, map};

/// A key into a [`Response`]: a map member name or a list position.
///
/// Keys are interpreted loosely, the way the API's own clients index
/// decoded arrays: a numeric name addresses a list position, and an index
/// addresses the map member with that decimal name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(String),
    Index(usize),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// Runtime kind of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    List,
    Map,
}

impl ValueKind {
    /// Returns the kind of `value`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::List,
            Value::Object(_) => ValueKind::Map,
        }
    }

    /// Maps and lists are composite; everything else is a scalar.
    pub fn is_composite(self) -> bool {
        matches!(self, ValueKind::List | ValueKind::Map)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        };
        f.write_str(name)
    }
}

/// Errors from [`Response`] accessors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// The key does not exist in the wrapped value.
    #[error("key not found in response: {key}")]
    KeyNotFound { key: Key },

    /// The key exists but holds a value of another kind.
    #[error("value at {key} is a {found}, expected a {expected}")]
    TypeMismatch {
        key: Key,
        expected: ValueKind,
        found: ValueKind,
    },

    /// The key exists but holds a scalar where a map or a list is needed.
    #[error("value at {key} is a {found}, expected a map or a list")]
    NotCompositeAt { key: Key, found: ValueKind },

    /// A response can only wrap a map or a list.
    #[error("response data must be a map or a list, got a {found}")]
    NotComposite { found: ValueKind },

    /// The key cannot address the wrapped value (e.g. a name on a list).
    #[error("invalid key {key}: {reason}")]
    InvalidKey { key: Key, reason: &'static str },
}

/// A decoded JSON map or list with kind-checked accessors.
///
/// # Examples
///
/// ```
/// use postcodes_client::response::{Response, ResponseError};
/// use serde_json::json;
///
/// let response = Response::new(json!({"a": 1, "b": [1, 2], "c": "x"})).unwrap();
/// assert_eq!(response.get_number("a").unwrap(), 1.0);
/// assert_eq!(response.get_string("c").unwrap(), "x");
/// assert_eq!(response.get_sub_response("b").unwrap().to_list(), vec![json!(1), json!(2)]);
///
/// assert!(matches!(response.get_string("a"), Err(ResponseError::TypeMismatch { .. })));
/// assert!(matches!(response.get_string("z"), Err(ResponseError::KeyNotFound { .. })));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    data: Value,
}

impl Response {
    /// Wrap a composite value. Scalars are rejected.
    pub fn new(data: Value) -> Result<Self, ResponseError> {
        let found = ValueKind::of(&data);
        if !found.is_composite() {
            return Err(ResponseError::NotComposite { found });
        }
        Ok(Self { data })
    }

    /// Wrap an API payload, boxing scalars (including `null`) as
    /// `{"result": value}` so every payload can be read as a response.
    pub fn from_payload(payload: Value) -> Self {
        if ValueKind::of(&payload).is_composite() {
            return Self { data: payload };
        }
        let mut boxed = Map::new();
        boxed.insert("result".to_string(), payload);
        Self {
            data: Value::Object(boxed),
        }
    }

    /// Raw value at `key`, if present.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        lookup(&self.data, &key.into())
    }

    pub fn get_string(&self, key: impl Into<Key>) -> Result<&str, ResponseError> {
        let (key, value) = self.value(key)?;
        value
            .as_str()
            .ok_or_else(|| mismatch(key, ValueKind::String, value))
    }

    /// Numeric value at `key`.
    ///
    /// JSON numbers and booleans are accepted (`true` reads as `1.0`).
    /// Strings are never coerced, even when they look numeric.
    pub fn get_number(&self, key: impl Into<Key>) -> Result<f64, ResponseError> {
        let (key, value) = self.value(key)?;
        match value {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| mismatch(key, ValueKind::Number, value)),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(mismatch(key, ValueKind::Number, value)),
        }
    }

    pub fn get_boolean(&self, key: impl Into<Key>) -> Result<bool, ResponseError> {
        let (key, value) = self.value(key)?;
        value
            .as_bool()
            .ok_or_else(|| mismatch(key, ValueKind::Bool, value))
    }

    /// The map or list at `key`, as an independent response.
    pub fn get_sub_response(&self, key: impl Into<Key>) -> Result<Response, ResponseError> {
        let (key, value) = self.value(key)?;
        if !ValueKind::of(value).is_composite() {
            return Err(ResponseError::NotCompositeAt {
                key,
                found: ValueKind::of(value),
            });
        }
        Ok(Response {
            data: value.clone(),
        })
    }

    /// Like [`Response::get_sub_response`], but `null` reads as `None`.
    pub fn get_optional_sub_response(
        &self,
        key: impl Into<Key>,
    ) -> Result<Option<Response>, ResponseError> {
        let (key, value) = self.value(key)?;
        match value {
            Value::Null => Ok(None),
            Value::Array(_) | Value::Object(_) => Ok(Some(Response {
                data: value.clone(),
            })),
            _ => Err(ResponseError::NotCompositeAt {
                key,
                found: ValueKind::of(value),
            }),
        }
    }

    /// Insert or override the value at `key`.
    ///
    /// The value itself is not checked; a later typed read reports any
    /// mismatch. On a list, an index equal to the length appends.
    pub fn set_value(&mut self, key: impl Into<Key>, value: Value) -> Result<(), ResponseError> {
        let key = key.into();
        match &mut self.data {
            Value::Object(members) => {
                members.insert(key.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                let index = match &key {
                    Key::Index(index) => Some(*index),
                    Key::Name(name) => name.parse::<usize>().ok(),
                };
                let Some(index) = index else {
                    return Err(ResponseError::InvalidKey {
                        key,
                        reason: "lists are addressed by position",
                    });
                };
                match index.cmp(&items.len()) {
                    Ordering::Less => items[index] = value,
                    Ordering::Equal => items.push(value),
                    Ordering::Greater => {
                        return Err(ResponseError::InvalidKey {
                            key,
                            reason: "position is past the end of the list",
                        });
                    }
                }
                Ok(())
            }
            other => Err(ResponseError::NotComposite {
                found: ValueKind::of(other),
            }),
        }
    }

    /// Iterate over the composite children in order, skipping scalars.
    ///
    /// The iterator borrows the response, so it always sees the value as it
    /// was when the iterator was created. Call again to start over.
    pub fn composites(&self) -> Composites<'_> {
        let children = match &self.data {
            Value::Array(items) => Children::List(items.iter()),
            Value::Object(members) => Children::Map(members.values()),
            _ => Children::Done,
        };
        Composites { children }
    }

    /// Shallow copy of the entries, keyed by name for maps and by position
    /// for lists.
    pub fn to_map(&self) -> Vec<(Key, Value)> {
        match &self.data {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Key::Index(i), v.clone()))
                .collect(),
            Value::Object(members) => members
                .iter()
                .map(|(k, v)| (Key::Name(k.clone()), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Shallow copy of the values, keys dropped.
    pub fn to_list(&self) -> Vec<Value> {
        match &self.data {
            Value::Array(items) => items.clone(),
            Value::Object(members) => members.values().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            Value::Array(items) => items.len(),
            Value::Object(members) => members.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_list(&self) -> bool {
        self.data.is_array()
    }

    pub fn is_map(&self) -> bool {
        self.data.is_object()
    }

    pub fn as_value(&self) -> &Value {
        &self.data
    }

    pub fn into_value(self) -> Value {
        self.data
    }

    fn value(&self, key: impl Into<Key>) -> Result<(Key, &Value), ResponseError> {
        let key = key.into();
        match lookup(&self.data, &key) {
            Some(value) => Ok((key, value)),
            None => Err(ResponseError::KeyNotFound { key }),
        }
    }
}

impl TryFrom<Value> for Response {
    type Error = ResponseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Response::new(value)
    }
}

impl From<Map<String, Value>> for Response {
    fn from(members: Map<String, Value>) -> Self {
        Response {
            data: Value::Object(members),
        }
    }
}

impl From<Vec<Value>> for Response {
    fn from(items: Vec<Value>) -> Self {
        Response {
            data: Value::Array(items),
        }
    }
}

fn lookup<'a>(data: &'a Value, key: &Key) -> Option<&'a Value> {
    match (data, key) {
        (Value::Object(members), Key::Name(name)) => members.get(name),
        (Value::Object(members), Key::Index(index)) => members.get(&index.to_string()),
        (Value::Array(items), Key::Index(index)) => items.get(*index),
        (Value::Array(items), Key::Name(name)) => {
            name.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        _ => None,
    }
}

fn mismatch(key: Key, expected: ValueKind, found: &Value) -> ResponseError {
    ResponseError::TypeMismatch {
        key,
        expected,
        found: ValueKind::of(found),
    }
}

/// Iterator returned by [`Response::composites`].
pub struct Composites<'a> {
    children: Children<'a>,
}

enum Children<'a> {
    List(slice::Iter<'a, Value>),
    Map(map::Values<'a>),
    Done,
}

impl Iterator for Composites<'_> {
    type Item = Response;

    fn next(&mut self) -> Option<Response> {
        loop {
            let next = match &mut self.children {
                Children::List(items) => items.next(),
                Children::Map(values) => values.next(),
                Children::Done => None,
            };
            let Some(value) = next else {
                self.children = Children::Done;
                return None;
            };
            if ValueKind::of(value).is_composite() {
                return Some(Response {
                    data: value.clone(),
                });
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let upper = match &self.children {
            Children::List(items) => items.len(),
            Children::Map(values) => values.len(),
            Children::Done => 0,
        };
        (0, Some(upper))
    }
}

impl FusedIterator for Composites<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Response {
        Response::new(json!({"a": 1, "b": [1, 2], "c": "x"})).unwrap()
    }

    #[test]
    fn typed_accessors() {
        let response = sample();
        assert_eq!(response.get_number("a").unwrap(), 1.0);
        assert_eq!(response.get_string("c").unwrap(), "x");
        assert_eq!(
            response.get_sub_response("b").unwrap().to_list(),
            vec![json!(1), json!(2)]
        );
    }

    #[test]
    fn wrong_kind_is_type_mismatch() {
        let err = sample().get_string("a").unwrap_err();
        assert_eq!(
            err,
            ResponseError::TypeMismatch {
                key: Key::from("a"),
                expected: ValueKind::String,
                found: ValueKind::Number,
            }
        );
        assert!(matches!(
            sample().get_boolean("a"),
            Err(ResponseError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn missing_key_is_checked_before_kind() {
        assert_eq!(
            sample().get_string("z").unwrap_err(),
            ResponseError::KeyNotFound { key: Key::from("z") }
        );
        assert!(matches!(
            sample().get_number("z"),
            Err(ResponseError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn numeric_strings_are_not_numbers() {
        let response = Response::new(json!({"lat": "51.79", "flag": true})).unwrap();
        assert!(matches!(
            response.get_number("lat"),
            Err(ResponseError::TypeMismatch { .. })
        ));
        assert_eq!(response.get_number("flag").unwrap(), 1.0);
    }

    #[test]
    fn scalars_cannot_be_wrapped() {
        assert_eq!(
            Response::new(json!(true)).unwrap_err(),
            ResponseError::NotComposite {
                found: ValueKind::Bool
            }
        );
    }

    #[test]
    fn payload_scalars_are_boxed() {
        let response = Response::from_payload(json!(false));
        assert!(!response.get_boolean("result").unwrap());

        let response = Response::from_payload(Value::Null);
        assert_eq!(response.get("result"), Some(&Value::Null));

        let response = Response::from_payload(json!(["a"]));
        assert!(response.is_list());
        assert_eq!(response.get_string(0usize).unwrap(), "a");
    }

    #[test]
    fn composites_skip_scalars() {
        let response = Response::new(json!([["a", "b"], "scalar", ["c"]])).unwrap();
        let children: Vec<_> = response.composites().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].to_list(), vec![json!("a"), json!("b")]);
        assert_eq!(children[1].to_list(), vec![json!("c")]);
    }

    #[test]
    fn composites_is_restartable_per_call() {
        let response = Response::new(json!({"x": {"n": 1}, "y": 2, "z": [3]})).unwrap();
        let mut first = response.composites();
        assert!(first.next().is_some());
        assert!(first.next().is_some());
        assert!(first.next().is_none());
        assert!(first.next().is_none());
        assert_eq!(response.composites().count(), 2);
    }

    #[test]
    fn set_value_on_map() {
        let mut response = sample();
        response.set_value("a", json!("now a string")).unwrap();
        response.set_value("d", json!(true)).unwrap();
        assert_eq!(response.get_string("a").unwrap(), "now a string");
        assert!(response.get_boolean("d").unwrap());
        assert_eq!(response.len(), 4);
    }

    #[test]
    fn set_value_on_list() {
        let mut response = Response::new(json!([1, 2])).unwrap();
        response.set_value(0usize, json!(10)).unwrap();
        response.set_value(2usize, json!(30)).unwrap();
        assert_eq!(response.to_list(), vec![json!(10), json!(2), json!(30)]);

        assert!(matches!(
            response.set_value(9usize, json!(0)),
            Err(ResponseError::InvalidKey { .. })
        ));
        assert!(matches!(
            response.set_value("name", json!(0)),
            Err(ResponseError::InvalidKey { .. })
        ));
        assert!(response.is_list());
    }

    #[test]
    fn to_map_keeps_key_types_and_order() {
        let map = sample().to_map();
        let keys: Vec<_> = map.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["a", "b", "c"]);

        let list = Response::new(json!(["p", "q"])).unwrap().to_map();
        assert_eq!(list[1], (Key::Index(1), json!("q")));
    }

    #[test]
    fn loose_keys() {
        let list = Response::new(json!(["p", "q"])).unwrap();
        assert_eq!(list.get_string("1").unwrap(), "q");

        let map = Response::new(json!({"0": "zero"})).unwrap();
        assert_eq!(map.get_string(0usize).unwrap(), "zero");
    }

    #[test]
    fn optional_sub_response() {
        let response = Response::new(json!({"n": null, "m": {}, "s": "x"})).unwrap();
        assert!(response.get_optional_sub_response("n").unwrap().is_none());
        assert!(response.get_optional_sub_response("m").unwrap().is_some());
        assert_eq!(
            response.get_optional_sub_response("s").unwrap_err(),
            ResponseError::NotCompositeAt {
                key: Key::from("s"),
                found: ValueKind::String,
            }
        );
    }

    #[test]
    fn sub_response_of_scalar_names_both_composites() {
        let err = sample().get_sub_response("c").unwrap_err();
        assert_eq!(
            err,
            ResponseError::NotCompositeAt {
                key: Key::from("c"),
                found: ValueKind::String,
            }
        );
        assert_eq!(err.to_string(), "value at c is a string, expected a map or a list");
    }

    #[test]
    fn error_display() {
        let err = ResponseError::TypeMismatch {
            key: Key::from("c"),
            expected: ValueKind::Number,
            found: ValueKind::String,
        };
        assert_eq!(err.to_string(), "value at c is a string, expected a number");

        let err = ResponseError::KeyNotFound { key: Key::Index(3) };
        assert_eq!(err.to_string(), "key not found in response: 3");
    }
}
