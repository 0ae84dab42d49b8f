//! Per-item correlation between export tonnage and deforested area.

use crate::model::{CanonicalItem, CorrelationRecord, ItemSummary, JoinedRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_MIN_TOTAL_TONNES: f64 = 10_000.0;
pub const DEFAULT_MIN_SAMPLES: usize = 8;

/// Decides whether an item with a defined correlation is reported.
pub trait InclusionPolicy {
    fn admits(&self, summary: &ItemSummary) -> bool;
}

impl<F> InclusionPolicy for F
where
    F: Fn(&ItemSummary) -> bool,
{
    fn admits(&self, summary: &ItemSummary) -> bool {
        self(summary)
    }
}

/// Built-in thresholds. `MinTotalTonnes` is the current rule; `MinSamples`
/// is the rule earlier runs of the analysis used.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    MinTotalTonnes(f64),
    MinSamples(usize),
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::MinTotalTonnes(DEFAULT_MIN_TOTAL_TONNES)
    }
}

impl InclusionPolicy for ThresholdPolicy {
    fn admits(&self, summary: &ItemSummary) -> bool {
        match *self {
            ThresholdPolicy::MinTotalTonnes(min) => summary.total_tonnes_exported >= min,
            ThresholdPolicy::MinSamples(min) => summary.n >= min,
        }
    }
}

/// Pearson product-moment correlation of paired samples.
///
/// Returns `None` if the slices differ in length, hold fewer than two pairs,
/// either side has zero variance, or the result is not finite.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    if is_constant(xs) || is_constant(ys) {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    // separate roots keep the denominator finite for large tonnages
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Per-item summaries over years where both series have a value, ordered by
/// item. Items with no usable years are still listed (n = 0, corr = None).
pub fn summarize_items(joined: &[JoinedRecord]) -> Vec<ItemSummary> {
    let mut groups: BTreeMap<&CanonicalItem, Vec<(i32, f64, f64)>> = BTreeMap::new();
    for row in joined {
        let pairs = groups.entry(&row.item).or_default();
        if let (Some(tonnes), Some(km2)) = (row.tonnes_exported, row.deforested_area_km2) {
            pairs.push((row.year, tonnes, km2));
        }
    }

    groups
        .into_iter()
        .map(|(item, mut pairs)| {
            pairs.sort_by_key(|(year, _, _)| *year);
            let exported: Vec<f64> = pairs.iter().map(|(_, t, _)| *t).collect();
            let deforested: Vec<f64> = pairs.iter().map(|(_, _, d)| *d).collect();
            ItemSummary {
                item: item.clone(),
                n: pairs.len(),
                corr: pearson(&exported, &deforested),
                total_tonnes_exported: exported.iter().sum(),
            }
        })
        .collect()
}

/// Correlation table: items whose correlation is defined and which `policy`
/// admits.
pub fn compute_correlations<P>(joined: &[JoinedRecord], policy: &P) -> Vec<CorrelationRecord>
where
    P: InclusionPolicy + ?Sized,
{
    let summaries = summarize_items(joined);
    let total = summaries.len();

    let records: Vec<CorrelationRecord> = summaries
        .into_iter()
        .filter_map(|summary| {
            let corr = summary.corr?;
            if !policy.admits(&summary) {
                return None;
            }
            Some(CorrelationRecord {
                item: summary.item,
                n: summary.n,
                corr,
                total_tonnes_exported: summary.total_tonnes_exported,
            })
        })
        .collect();

    debug!(items = total, included = records.len(), "Computed correlations");
    records
}
