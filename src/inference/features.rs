//! Feature Extractor - request attributes to model row
//!
//! Steps, in order:
//! 1. merge `contractData` and `sinistreData` (claim side wins on collision)
//! 2. parse the contract start/expiry dates, unparseable → missing
//! 3. contract duration in days when both dates parsed
//! 4. settlement columns (`REGLEMENT_*`): numeric coercion, total and
//!    count of strictly positive amounts
//! 5. ordinal-encode the categorical columns within this record only
//! 6. reindex to the schema, absent columns → 0, unknown columns dropped
//! 7. every residual non-numeric value → 0
//!
//! No step fails on a bad individual value.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ndarray::Array1;
use serde_json::{Map, Value};

use super::record::{FieldValue, SparseRecord};
use super::schema::FeatureSchema;

pub const CONTRACT_START: &str = "EFFET_CONTRAT";
pub const CONTRACT_EXPIRY: &str = "DATE_EXPIRATION";
pub const CONTRACT_DURATION: &str = "duree_contrat";

pub const SETTLEMENT_PREFIX: &str = "REGLEMENT_";
pub const SETTLED_TOTAL: &str = "montant_total_regle";
pub const SETTLEMENT_TYPES: &str = "nb_types_reglement";

pub const CATEGORICAL_COLUMNS: [&str; 4] =
    ["usage", "CODE_INTERMEDIAIRE", "NATURE_SINISTRE", "LIEU_ACCIDENT"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Lenient date parse, `None` when the value is not a recognizable date
pub fn parse_date(value: &FieldValue) -> Option<NaiveDateTime> {
    let raw = match value {
        FieldValue::Text(s) => s.trim(),
        FieldValue::Date(d) => return Some(*d),
        _ => return None,
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Whole days between two instants, floored like a timedelta's day count
pub fn days_between(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_milliseconds().div_euclid(86_400_000)
}

/// First-occurrence integer codes for a column's values
#[derive(Debug, Default)]
pub struct OrdinalEncoder {
    codes: HashMap<String, i64>,
}

impl OrdinalEncoder {
    pub fn encode(&mut self, category: String) -> i64 {
        let next = self.codes.len() as i64;
        *self.codes.entry(category).or_insert(next)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Full extraction from the two request mappings
    pub fn extract(
        &self,
        contract: &Map<String, Value>,
        sinistre: &Map<String, Value>,
        schema: &FeatureSchema,
    ) -> Array1<f64> {
        let mut record = SparseRecord::merged([contract, sinistre]);
        self.engineer(&mut record);
        self.reindex(&record, schema)
    }

    /// Steps 2-5, in place
    pub fn engineer(&self, record: &mut SparseRecord) {
        self.derive_duration(record);
        self.derive_settlements(record);
        self.encode_categories(record);
    }

    fn derive_duration(&self, record: &mut SparseRecord) {
        let mut parsed = [None, None];
        for (slot, column) in parsed.iter_mut().zip([CONTRACT_START, CONTRACT_EXPIRY]) {
            if let Some(value) = record.get(column) {
                *slot = parse_date(value);
                let replacement = slot.map_or(FieldValue::Missing, FieldValue::Date);
                record.insert(column.to_string(), replacement);
            }
        }

        // Column exists whenever both inputs exist, even if one failed to parse
        if record.contains(CONTRACT_START) && record.contains(CONTRACT_EXPIRY) {
            let duration = match parsed {
                [Some(start), Some(end)] => FieldValue::Number(days_between(start, end) as f64),
                _ => FieldValue::Missing,
            };
            record.insert(CONTRACT_DURATION.to_string(), duration);
        }
    }

    fn derive_settlements(&self, record: &mut SparseRecord) {
        let columns: Vec<String> = record
            .keys_with_prefix(SETTLEMENT_PREFIX)
            .map(str::to_string)
            .collect();

        let mut total = 0.0;
        let mut positive = 0u32;
        for column in columns {
            let amount = record.get(&column).and_then(FieldValue::to_number);
            if let Some(amount) = amount.filter(|a| !a.is_nan()) {
                total += amount;
                if amount > 0.0 {
                    positive += 1;
                }
            }
            record.insert(column, amount.map_or(FieldValue::Missing, FieldValue::Number));
        }

        record.insert(SETTLED_TOTAL.to_string(), FieldValue::Number(total));
        record.insert(SETTLEMENT_TYPES.to_string(), FieldValue::Number(positive as f64));
    }

    fn encode_categories(&self, record: &mut SparseRecord) {
        // One row per request, so each column's vocabulary is that row alone
        for column in CATEGORICAL_COLUMNS {
            if let Some(value) = record.get(column) {
                let code = OrdinalEncoder::default().encode(value.to_category());
                record.insert(column.to_string(), FieldValue::Number(code as f64));
            }
        }
    }

    /// Steps 6-7: exact schema order and width
    pub fn reindex(&self, record: &SparseRecord, schema: &FeatureSchema) -> Array1<f64> {
        schema
            .names()
            .iter()
            .map(|name| record.get(name).map_or(0.0, FieldValue::to_feature))
            .collect()
    }
}
