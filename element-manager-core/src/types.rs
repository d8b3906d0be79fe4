//! Element records and their open attribute bag.

use crate::error::ParseRefError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fields of the blank new-element form, in display order.
pub const FORM_FIELDS: [&str; 5] = ["capacity", "color", "screenSize", "generation", "price"];

static MISSING: Value = Value::Null;

/// A catalog record.
///
/// `id` is non-empty only once the remote store has assigned one. `local_id` is
/// minted by [`crate::ElementState`] for records created in this session; the
/// server never sees it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    #[serde(
        default,
        deserialize_with = "id_from_string_or_number",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<u64>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default)]
    pub data: AttributeBag,
}

impl Element {
    pub fn new(name: impl Into<String>, data: AttributeBag) -> Self {
        Self {
            name: name.into(),
            data,
            ..Default::default()
        }
    }

    /// The new-element form as first shown: empty name, every form field empty.
    pub fn blank_form() -> Self {
        let mut data = AttributeBag::new();
        for field in FORM_FIELDS {
            data.insert(field, Value::String(String::new()));
        }
        Self::new("", data)
    }

    /// Preferred handle for this record: the remote id when present, else the local id.
    pub fn reference(&self) -> Option<ElementRef> {
        if !self.id.is_empty() {
            Some(ElementRef::Remote(self.id.clone()))
        } else {
            self.local_id.map(ElementRef::Local)
        }
    }

    pub fn matches(&self, target: &ElementRef) -> bool {
        match target {
            ElementRef::Remote(id) => !id.is_empty() && self.id == *id,
            ElementRef::Local(local_id) => self.local_id == Some(*local_id),
        }
    }

    /// Same record as `other`: matched on `other.id` when it has one, otherwise on
    /// `local_id`. A differing id never falls back to the local id.
    pub fn same_record(&self, other: &Element) -> bool {
        if !other.id.is_empty() {
            return self.id == other.id;
        }
        other.local_id.is_some() && self.local_id == other.local_id
    }
}

/// Body sent on create and update. The id travels in the URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WritePayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub data: AttributeBag,
}

impl From<&Element> for WritePayload {
    fn from(element: &Element) -> Self {
        Self {
            name: element.name.clone(),
            data: element.data.clone(),
        }
    }
}

impl WritePayload {
    pub fn into_element(self, id: impl Into<String>) -> Element {
        Element {
            id: id.into(),
            local_id: None,
            name: self.name,
            data: self.data,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Attribute {
    key: String,
    value: Value,
}

/// Free-form `data` attributes.
///
/// Keys are matched case-insensitively; the first spelling seen for a key is the one
/// written back to the server. Reading a missing key yields `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<Map<String, Value>>", into = "Map<String, Value>")]
pub struct AttributeBag {
    entries: BTreeMap<String, Attribute>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Value stored under `key`, or `Value::Null` when absent.
    pub fn get(&self, key: &str) -> &Value {
        self.entries
            .get(&key.to_lowercase())
            .map(|attr| &attr.value)
            .unwrap_or(&MISSING)
    }

    /// Insert or replace, returning the previous value. An existing key keeps its
    /// original spelling.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.get_mut(&key.to_lowercase()) {
            Some(attr) => Some(std::mem::replace(&mut attr.value, value)),
            None => {
                self.entries
                    .insert(key.to_lowercase(), Attribute { key, value });
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries
            .remove(&key.to_lowercase())
            .map(|attr| attr.value)
    }

    /// `(original key, value)` pairs in case-insensitive key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .values()
            .map(|attr| (attr.key.as_str(), &attr.value))
    }

    /// Missing, null, or a string with only whitespace.
    pub fn is_blank(&self, key: &str) -> bool {
        match self.get(key) {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of `key`: JSON numbers as-is, strings parsed after trimming.
    /// `None` when absent, blank, unparsable or not finite.
    pub fn number(&self, key: &str) -> Option<f64> {
        let n = match self.get(key) {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Display form of a value: strings unquoted, everything else as JSON.
    pub fn text(&self, key: &str) -> String {
        match self.get(key) {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<Option<Map<String, Value>>> for AttributeBag {
    fn from(map: Option<Map<String, Value>>) -> Self {
        let mut bag = AttributeBag::new();
        for (key, value) in map.unwrap_or_default() {
            bag.insert(key, value);
        }
        bag
    }
}

impl From<AttributeBag> for Map<String, Value> {
    fn from(bag: AttributeBag) -> Self {
        bag.entries
            .into_values()
            .map(|attr| (attr.key, attr.value))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for AttributeBag {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut bag = AttributeBag::new();
        for (key, value) in iter {
            bag.insert(key, value);
        }
        bag
    }
}

/// How a user action names a record in the list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementRef {
    /// Match on the remote `id`.
    Remote(String),
    /// Match on the locally minted sequence number.
    Local(u64),
}

impl FromStr for ElementRef {
    type Err = ParseRefError;

    /// `#3` is local id 3; any other token is a remote id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseRefError::Empty);
        }
        match s.strip_prefix('#') {
            Some(digits) => digits
                .parse::<u64>()
                .map(ElementRef::Local)
                .map_err(|_| ParseRefError::InvalidLocalId(s.to_string())),
            None => Ok(ElementRef::Remote(s.to_string())),
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRef::Remote(id) => write!(f, "{}", id),
            ElementRef::Local(local_id) => write!(f, "#{}", local_id),
        }
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
