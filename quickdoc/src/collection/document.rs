use im::OrdMap;
use itertools::Itertools;

use crate::common::Value;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

/// An ordered, string-keyed map of [Value]s.
///
/// A `Document` is the container a dotted key walks into: for the stored key
/// `"profile"` holding `{"name": "Alice", "address": {"zip": "123"}}`, the key
/// `"profile.address.zip"` names `"123"`. The walk itself lives in
/// [codec](crate::codec); a `Document` only knows its own top-level fields, so
/// a field name here is taken literally even if it contains a dot.
///
/// Backed by `im::OrdMap`, so cloning is O(1) and a mutated clone shares the
/// untouched structure with its source. Read-modify-write operations rely on
/// this to snapshot the stored payload cheaply before changing it.
#[derive(Clone, Eq, PartialEq, Default, Ord, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with the top-level field `key`, replacing any previous value.
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Alice");
    /// doc.put("age", 30);
    /// assert_eq!(doc.size(), 2);
    /// ```
    pub fn put<K: Into<String>, T: Into<Value>>(&mut self, key: K, value: T) {
        self.data.insert(key.into(), value.into());
    }

    /// Returns the value of the top-level field `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Removes the top-level field `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the field names in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Iterates the fields in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let fields = self
            .data
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}\"{}\": {}",
                    indent_str,
                    key,
                    value.to_pretty_json(indent + 2)
                )
            })
            .join(",\n");
        format!("{{\n{}\n{}}}", fields, " ".repeat(indent))
    }

    pub(crate) fn to_debug_string(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let fields = self
            .data
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}\"{}\": {}",
                    indent_str,
                    key,
                    value.to_debug_string(indent + 2)
                )
            })
            .join(",\n");
        format!("{{\n{}\n{}}}", fields, " ".repeat(indent))
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string(0))
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Document {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(map: BTreeMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// ```rust
/// use quickdoc::doc;
///
/// let empty = doc!{};
///
/// let base = 100;
/// let profile = doc!{
///     name: "Charlie",
///     score: (base * 2),
///     address: { city: "Oslo", zip: "0150" },
///     tags: ["admin", "user"]
/// };
/// assert_eq!(profile.size(), 4);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Converts one `doc!` value: nested documents, arrays or plain expressions.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
