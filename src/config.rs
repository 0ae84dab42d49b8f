use crate::correlation::ThresholdPolicy;
use crate::error::{PipelineError, Result};
use crate::exports::ExportFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFORESTATION_FILE: &str = "raw/def_area_2004_2019.csv";
pub const TRADE_FILE: &str =
    "raw/Trade_Crops_Livestock_E_All_Data/Trade_Crops_Livestock_E_All_Data.csv";
pub const OUTPUT_DIR: &str = "processed";

/// Settings for one pipeline run. Relative paths are resolved against the
/// data directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub deforestation_path: PathBuf,
    pub trade_path: PathBuf,
    pub output_dir: PathBuf,
    pub country: String,
    pub element: String,
    pub policy: ThresholdPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let filter = ExportFilter::default();
        Self {
            deforestation_path: PathBuf::from(DEFORESTATION_FILE),
            trade_path: PathBuf::from(TRADE_FILE),
            output_dir: PathBuf::from(OUTPUT_DIR),
            country: filter.country,
            element: filter.element,
            policy: ThresholdPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Fields left out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Resolve relative paths against `data_dir`.
    pub fn resolve(mut self, data_dir: &Path) -> Self {
        self.deforestation_path = resolve_path(data_dir, self.deforestation_path);
        self.trade_path = resolve_path(data_dir, self.trade_path);
        self.output_dir = resolve_path(data_dir, self.output_dir);
        self
    }

    pub fn export_filter(&self) -> ExportFilter {
        ExportFilter {
            country: self.country.clone(),
            element: self.element.clone(),
        }
    }
}

fn resolve_path(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
