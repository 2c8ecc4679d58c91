//! Aggregate views over classification records

use crate::records::{ClassificationRecord, ReviewAction};
use poclass_core::NOT_SURE;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of records per (L1, L2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    #[serde(rename = "L1")]
    pub l1: String,
    #[serde(rename = "L2")]
    pub l2: String,
    pub count: usize,
}

/// Tally of review actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub approved: usize,
    pub overridden: usize,
}

/// Summary over all records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    pub total: usize,
    pub actions: ActionCounts,
    pub not_sure_percentage: f64,
    pub categories: Vec<CategoryCount>,
}

/// Record counts grouped by (L1, L2), sorted by category
pub fn category_counts(records: &[ClassificationRecord]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for record in records {
        *counts.entry((&record.l1, &record.l2)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((l1, l2), count)| CategoryCount {
            l1: l1.to_string(),
            l2: l2.to_string(),
            count,
        })
        .collect()
}

/// Share of records whose L1 is "Not sure", as a percentage
pub fn not_sure_percentage(records: &[ClassificationRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let not_sure = records.iter().filter(|r| r.l1 == NOT_SURE).count();
    not_sure as f64 / records.len() as f64 * 100.0
}

/// Approved and overridden tallies
pub fn action_counts(records: &[ClassificationRecord]) -> ActionCounts {
    records
        .iter()
        .fold(ActionCounts::default(), |mut counts, record| {
            match record.action {
                ReviewAction::Approved => counts.approved += 1,
                ReviewAction::Overridden => counts.overridden += 1,
            }
            counts
        })
}

/// Build the full summary
pub fn summarize(records: &[ClassificationRecord]) -> RecordSummary {
    RecordSummary {
        total: records.len(),
        actions: action_counts(records),
        not_sure_percentage: not_sure_percentage(records),
        categories: category_counts(records),
    }
}
