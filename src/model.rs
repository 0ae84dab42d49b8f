//! Record types flowing through the pipeline.
//!
//! Every stage consumes the full output of the previous one, so these are
//! plain owned values with no interior mutability.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One row of the trade dataset, as read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTradeRecord {
    pub area: String,
    pub element: String,
    pub item: String,
    /// Year -> quantity in tonnes. `None` marks a blank cell in the source.
    pub quantities: BTreeMap<i32, Option<f64>>,
}

impl RawTradeRecord {
    pub fn quantity(&self, year: i32) -> Option<f64> {
        self.quantities.get(&year).copied().flatten()
    }
}

/// Normalized commodity category a raw item label maps to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalItem(String);

impl CanonicalItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalItem {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalItem {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YearlyExport {
    pub item: CanonicalItem,
    pub year: i32,
    pub tonnes_exported: f64,
}

/// A raw deforestation row kept positional: year first, label/total last,
/// regional figures in between.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeforestationRow {
    pub cells: Vec<String>,
}

impl DeforestationRow {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YearlyDeforestation {
    pub year: i32,
    pub deforested_area_km2: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JoinedRecord {
    pub item: CanonicalItem,
    pub year: i32,
    pub tonnes_exported: Option<f64>,
    pub deforested_area_km2: Option<f64>,
}

/// Per-item view of the joined series before any inclusion rule is applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item: CanonicalItem,
    /// Number of years with both an export and a deforestation figure.
    pub n: usize,
    /// `None` when the correlation is undefined (zero variance, too few pairs).
    pub corr: Option<f64>,
    pub total_tonnes_exported: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub item: CanonicalItem,
    pub n: usize,
    pub corr: f64,
    pub total_tonnes_exported: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Correlation,
    Deforestation,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Correlation => "correlation",
            SeriesKind::Deforestation => "deforestation",
        }
    }
}

/// Row of the long-format table used for plotting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinedRecord {
    pub label: String,
    pub year: Option<i32>,
    pub value: f64,
    pub kind: SeriesKind,
}
