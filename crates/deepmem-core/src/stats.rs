//! Aggregate statistics over a collection.

use crate::schema::{MAX_IMPORTANCE, MIN_IMPORTANCE, Record};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    /// Distinct category count
    pub categories: usize,
    /// Distinct tag count
    pub tags: usize,
    /// Mean importance rounded to one decimal, 0.0 when empty
    pub avg_importance: f64,
    /// Record count per importance value; every key in 1..=10 is present
    pub importance_distribution: BTreeMap<u8, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    /// Size of the compact JSON serialization of the collection
    pub size_bytes: usize,
}

impl Stats {
    pub fn compute(records: &[Record]) -> Self {
        let mut distribution: BTreeMap<u8, usize> =
            (MIN_IMPORTANCE..=MAX_IMPORTANCE).map(|i| (i, 0)).collect();
        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut tags: BTreeSet<&str> = BTreeSet::new();
        let mut sum: u64 = 0;

        for r in records {
            *distribution.entry(r.importance).or_default() += 1;
            *by_category.entry(r.category.clone()).or_default() += 1;
            tags.extend(r.tags.iter().map(String::as_str));
            sum += u64::from(r.importance);
        }

        let avg_importance = if records.is_empty() {
            0.0
        } else {
            let mean = sum as f64 / records.len() as f64;
            (mean * 10.0).round() / 10.0
        };

        Self {
            total: records.len(),
            categories: by_category.len(),
            tags: tags.len(),
            avg_importance,
            importance_distribution: distribution,
            by_category,
            oldest: records.iter().map(|r| r.created_at).min(),
            newest: records.iter().map(|r| r.created_at).max(),
            size_bytes: serde_json::to_vec(records).map(|v| v.len()).unwrap_or(0),
        }
    }
}
