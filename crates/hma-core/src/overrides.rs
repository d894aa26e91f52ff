//! Override source: per-creature attribute edits loaded from JSON
//!
//! Accepted shapes are an array of records or an object whose values are
//! records (the object's own keys are ignored; each record's `Name` is used).

use crate::error::{Error, Result};
use crate::names::NameNormalizer;
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Tri-state attribute edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit<T> {
    /// Attribute absent: keep the original value
    Keep,
    /// Attribute present but null or blank: clear to the placeholder
    Clear,
    /// Attribute present with a value
    Set(T),
}

impl<T> Default for FieldEdit<T> {
    fn default() -> Self {
        FieldEdit::Keep
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldEdit<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => FieldEdit::Set(value),
            None => FieldEdit::Clear,
        })
    }
}

impl<T: Blank> FieldEdit<T> {
    /// View of the edit with blank values folded into `Clear`
    pub fn effective(&self) -> FieldEdit<&T> {
        match self {
            FieldEdit::Keep => FieldEdit::Keep,
            FieldEdit::Set(value) if value.is_blank() => FieldEdit::Clear,
            FieldEdit::Set(value) => FieldEdit::Set(value),
            FieldEdit::Clear => FieldEdit::Clear,
        }
    }
}

/// Values that may be present but carry no content
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

/// A numeric stat as written by editors: a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(serde_json::Number),
    Text(String),
}

impl Blank for StatValue {
    fn is_blank(&self) -> bool {
        matches!(self, StatValue::Text(s) if s.is_blank())
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Number(n) => match n.as_f64() {
                // 80.0 is written as 80
                Some(v) if !n.is_i64() && !n.is_u64() && v.fract() == 0.0 => {
                    write!(f, "{}", v as i64)
                }
                _ => write!(f, "{}", n),
            },
            StatValue::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

/// Sparse edits for one creature
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverrideRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "HP", default)]
    pub hp: FieldEdit<StatValue>,
    #[serde(rename = "Attack", default)]
    pub attack: FieldEdit<StatValue>,
    #[serde(rename = "Defense", default)]
    pub defense: FieldEdit<StatValue>,
    #[serde(rename = "Sp Atk", alias = "Sp. Atk", default)]
    pub sp_atk: FieldEdit<StatValue>,
    #[serde(rename = "Sp Def", alias = "Sp. Def", default)]
    pub sp_def: FieldEdit<StatValue>,
    #[serde(rename = "Speed", default)]
    pub speed: FieldEdit<StatValue>,
    #[serde(rename = "Type 1", default)]
    pub type1: FieldEdit<String>,
    #[serde(rename = "Type 2", default)]
    pub type2: FieldEdit<String>,
    #[serde(rename = "Ability 1", default)]
    pub ability1: FieldEdit<String>,
    #[serde(rename = "Ability 2", default)]
    pub ability2: FieldEdit<String>,
    #[serde(rename = "Hidden Ability", default)]
    pub hidden_ability: FieldEdit<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OverrideDocument {
    List(Vec<OverrideRecord>),
    Keyed(KeyedRecords),
}

/// Values of a keyed object, in document order
struct KeyedRecords(Vec<OverrideRecord>);

impl<'de> Deserialize<'de> for KeyedRecords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct KeyedVisitor;

        impl<'de> Visitor<'de> for KeyedVisitor {
            type Value = KeyedRecords;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of override records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut records = Vec::new();
                while let Some((_, record)) = map.next_entry::<IgnoredAny, OverrideRecord>()? {
                    records.push(record);
                }
                Ok(KeyedRecords(records))
            }
        }

        deserializer.deserialize_map(KeyedVisitor)
    }
}

/// All overrides for a run, keyed by normalized name
#[derive(Debug, Clone, Default)]
pub struct OverrideSet {
    records: HashMap<String, OverrideRecord>,
}

impl OverrideSet {
    /// Build a set from records; a later record for the same name wins
    pub fn from_records(
        records: impl IntoIterator<Item = OverrideRecord>,
        names: &NameNormalizer,
    ) -> Self {
        let mut map = HashMap::new();
        for record in records {
            let key = names.normalize(&record.name);
            if map.insert(key.clone(), record).is_some() {
                tracing::debug!(name = %key, "duplicate override; keeping the last one");
            }
        }
        Self { records: map }
    }

    /// Parse an override document from a JSON string
    pub fn from_json_str(content: &str, names: &NameNormalizer) -> serde_json::Result<Self> {
        let records = match serde_json::from_str::<OverrideDocument>(content)? {
            OverrideDocument::List(records) => records,
            OverrideDocument::Keyed(KeyedRecords(records)) => records,
        };
        Ok(Self::from_records(records, names))
    }

    /// Load an override document from a JSON file
    pub fn load<P: AsRef<Path>>(path: P, names: &NameNormalizer) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let set = Self::from_json_str(&content, names).map_err(|e| Error::OverrideParse {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), records = set.len(), "loaded overrides");
        Ok(set)
    }

    /// Find the override for a normalized name
    pub fn get(&self, name: &str) -> Option<&OverrideRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
