// src/record.rs
//! Typed records and validation of raw delimited rows.

use crate::metrics::Metrics;

/// Number of fields a well-formed row carries: id, name, condition, state, price.
pub const FIELDS_PER_ROW: usize = 5;

/// One priced product record. Identity for duplicate capping is `id` alone;
/// the remaining fields ride along untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub condition: String,
    pub state: String,
    pub price: f64,
}

impl Record {
    /// Validate one raw row. Rejects rows that do not carry exactly
    /// [`FIELDS_PER_ROW`] fields, or whose id/price fail to parse. `name`,
    /// `condition` and `state` are taken verbatim; empty strings are allowed.
    pub fn from_raw(fields: Vec<String>) -> Option<Self> {
        let [id, name, condition, state, price]: [String; FIELDS_PER_ROW] =
            fields.try_into().ok()?;
        let id = id.parse::<i64>().ok()?;
        let price = price.parse::<f64>().ok()?;
        Some(Self { id, name, condition, state, price })
    }
}

/// Convert a batch of raw rows into records.
///
/// A malformed row is skipped individually and counted; the remaining rows of
/// the batch are still parsed.
pub fn parse_batch(rows: Vec<Vec<String>>, metrics: &Metrics) -> Vec<Record> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        metrics.inc_row();
        match Record::from_raw(row) {
            Some(record) => records.push(record),
            None => metrics.inc_malformed(),
        }
    }
    records
}
