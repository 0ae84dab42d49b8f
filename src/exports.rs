//! Export aggregation: raw trade rows -> one tonnage figure per canonical
//! item per year.

use crate::canonical::ItemCanonicalizer;
use crate::model::{CanonicalItem, RawTradeRecord, YearlyExport};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Which trade rows count as exports of interest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFilter {
    pub country: String,
    pub element: String,
}

impl Default for ExportFilter {
    fn default() -> Self {
        Self {
            country: "Brazil".to_string(),
            element: "Export Quantity".to_string(),
        }
    }
}

impl ExportFilter {
    pub fn matches(&self, record: &RawTradeRecord) -> bool {
        record.area == self.country && record.element == self.element
    }
}

/// Aggregate Brazilian export quantities with the built-in rules and filter.
pub fn aggregate_exports(
    records: &[RawTradeRecord],
    year_columns: &BTreeSet<i32>,
) -> Vec<YearlyExport> {
    ExportAggregator::default().aggregate(records, year_columns)
}

#[derive(Clone, Debug, Default)]
pub struct ExportAggregator {
    pub filter: ExportFilter,
    pub canonicalizer: ItemCanonicalizer,
}

impl ExportAggregator {
    pub fn new(filter: ExportFilter, canonicalizer: ItemCanonicalizer) -> Self {
        Self {
            filter,
            canonicalizer,
        }
    }

    /// Sum quantities per (canonical item, year).
    ///
    /// A pair only produces a row if at least one contributing cell had a
    /// value; all-missing pairs are "no data", not zero. Output is sorted by
    /// item, then year.
    pub fn aggregate(
        &self,
        records: &[RawTradeRecord],
        year_columns: &BTreeSet<i32>,
    ) -> Vec<YearlyExport> {
        let mut sums: BTreeMap<(CanonicalItem, i32), f64> = BTreeMap::new();
        let mut matched = 0usize;

        for record in records.iter().filter(|r| self.filter.matches(r)) {
            matched += 1;
            let item = self.canonicalizer.canonicalize(&record.item);
            for &year in year_columns {
                if let Some(quantity) = record.quantity(year) {
                    *sums.entry((item.clone(), year)).or_insert(0.0) += quantity;
                }
            }
        }

        debug!(
            country = %self.filter.country,
            element = %self.filter.element,
            matched_records = matched,
            rows = sums.len(),
            "Aggregated exports"
        );

        sums.into_iter()
            .map(|((item, year), tonnes_exported)| YearlyExport {
                item,
                year,
                tonnes_exported,
            })
            .collect()
    }
}
