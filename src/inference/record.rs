//! Sparse Record - typed view of the merged request attributes
//!
//! Keys keep their first-insertion position; a later insert of the same key
//! replaces the value in place.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

/// One attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    /// Arrays and objects: carried through, never numeric
    Composite(String),
}

impl FieldValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Missing,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(FieldValue::Missing, FieldValue::Number),
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Composite(other.to_string()),
        }
    }

    /// Lenient numeric parse: numbers, booleans and numeric strings
    pub fn to_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Value as it reaches the model: anything non-numeric or non-finite is 0
    pub fn to_feature(&self) -> f64 {
        self.to_number().filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    /// String form used for categorical encoding
    pub fn to_category(&self) -> String {
        match self {
            FieldValue::Missing => "None".to_string(),
            FieldValue::Bool(true) => "True".to_string(),
            FieldValue::Bool(false) => "False".to_string(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{:.1}", n),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Date(d) => d.to_string(),
            FieldValue::Composite(raw) => raw.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SparseRecord {
    entries: Vec<(String, FieldValue)>,
    index: HashMap<String, usize>,
}

impl SparseRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of several JSON objects; on key collision the later source wins
    pub fn merged<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = &'a Map<String, Value>>,
    {
        let mut record = Self::new();
        for source in sources {
            for (key, value) in source {
                record.insert(key.clone(), FieldValue::from_json(value));
            }
        }
        record
    }

    pub fn insert(&mut self, key: String, value: FieldValue) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Keys starting with `prefix`, in insertion order
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(move |k| k.starts_with(prefix))
    }
}
