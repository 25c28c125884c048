//! Comparison of named run groups

use std::collections::BTreeMap;

use beamscan_stats::SampleSummary;
use serde::{Deserialize, Serialize};

/// One group's values and their spread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    /// Members with a value, in catalog order
    pub runs: Vec<u32>,
    pub values: Vec<f64>,
    /// `None` when no member has a value
    pub summary: Option<SampleSummary>,
}

/// Summarise `value_of` over every group
///
/// Runs for which `value_of` returns `None` are skipped with a warning.
pub fn summarize_groups<F>(groups: &BTreeMap<String, Vec<u32>>, value_of: F) -> Vec<GroupSummary>
where
    F: Fn(u32) -> Option<f64>,
{
    groups
        .iter()
        .map(|(name, members)| {
            let mut runs = Vec::with_capacity(members.len());
            let mut values = Vec::with_capacity(members.len());
            for &run in members {
                match value_of(run) {
                    Some(v) => {
                        runs.push(run);
                        values.push(v);
                    }
                    None => tracing::warn!("Group '{}': run {} has no value", name, run),
                }
            }
            let summary = SampleSummary::from_values(&values);
            GroupSummary {
                name: name.clone(),
                runs,
                values,
                summary,
            }
        })
        .collect()
}
