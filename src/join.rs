//! Joining the export and deforestation series by year.

use crate::model::{CanonicalItem, JoinedRecord, YearlyDeforestation, YearlyExport};
use itertools::{Itertools, MinMaxResult};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Inclusive year span covered by the deforestation series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

pub fn year_range(deforestation: &[YearlyDeforestation]) -> Option<YearRange> {
    match deforestation.iter().map(|d| d.year).minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(y) => Some(YearRange { min: y, max: y }),
        MinMaxResult::MinMax(min, max) => Some(YearRange { min, max }),
    }
}

/// Left join: every export row is kept, deforestation is `None` for years the
/// deforestation series does not cover.
pub fn join_exports(
    exports: &[YearlyExport],
    deforestation: &[YearlyDeforestation],
) -> Vec<JoinedRecord> {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for row in deforestation {
        if by_year.contains_key(&row.year) {
            warn!(year = row.year, "Duplicate deforestation year, keeping first row");
            continue;
        }
        by_year.insert(row.year, row.deforested_area_km2);
    }

    exports
        .iter()
        .map(|e| JoinedRecord {
            item: e.item.clone(),
            year: e.year,
            tonnes_exported: Some(e.tonnes_exported),
            deforested_area_km2: by_year.get(&e.year).copied(),
        })
        .collect()
}

/// Exports restricted to `range` and to the given items.
pub fn filter_exports(
    exports: &[YearlyExport],
    range: YearRange,
    items: &HashSet<CanonicalItem>,
) -> Vec<YearlyExport> {
    exports
        .iter()
        .filter(|e| range.contains(e.year) && items.contains(&e.item))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn export(item: &str, year: i32, tonnes: f64) -> YearlyExport {
        YearlyExport {
            item: item.into(),
            year,
            tonnes_exported: tonnes,
        }
    }

    fn deforestation(year: i32, km2: f64) -> YearlyDeforestation {
        YearlyDeforestation {
            year,
            deforested_area_km2: km2,
        }
    }

    #[test]
    fn test_left_join_keeps_unmatched_export_years() {
        let exports = vec![export("coffee", 2003, 1.0), export("coffee", 2004, 2.0)];
        let def = vec![deforestation(2004, 100.0), deforestation(2005, 90.0)];
        let joined = join_exports(&exports, &def);
        assert_eq!(
            joined,
            vec![
                JoinedRecord {
                    item: "coffee".into(),
                    year: 2003,
                    tonnes_exported: Some(1.0),
                    deforested_area_km2: None,
                },
                JoinedRecord {
                    item: "coffee".into(),
                    year: 2004,
                    tonnes_exported: Some(2.0),
                    deforested_area_km2: Some(100.0),
                },
            ]
        );
    }

    #[test]
    fn test_year_range() {
        assert_eq!(year_range(&[]), None);
        assert_eq!(
            year_range(&[deforestation(2006, 1.0), deforestation(2004, 1.0), deforestation(2019, 1.0)]),
            Some(YearRange { min: 2004, max: 2019 })
        );
        assert_eq!(year_range(&[deforestation(2010, 1.0)]), Some(YearRange { min: 2010, max: 2010 }));
    }

    #[test]
    fn test_filter_exports_by_range_and_item() {
        let exports = vec![
            export("coffee", 2003, 1.0),
            export("coffee", 2004, 2.0),
            export("coffee", 2020, 3.0),
            export("beef", 2004, 4.0),
        ];
        let items: HashSet<CanonicalItem> = [CanonicalItem::from("coffee")].into_iter().collect();
        let filtered = filter_exports(&exports, YearRange { min: 2004, max: 2019 }, &items);
        assert_eq!(filtered, vec![export("coffee", 2004, 2.0)]);
    }
}
