//! One end-to-end run: read both sources, derive every table, write them.

use crate::canonical::ItemCanonicalizer;
use crate::config::PipelineConfig;
use crate::correlation::{compute_correlations, InclusionPolicy};
use crate::deforestation::summarize_deforestation;
use crate::error::{PipelineError, Result};
use crate::exports::ExportAggregator;
use crate::ingestion::{read_deforestation_rows, read_trade_records, TradeTable};
use crate::join::{filter_exports, join_exports, year_range};
use crate::model::{CanonicalItem, DeforestationRow};
use crate::output::{combine, write_outputs, PipelineOutputs};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

pub struct Pipeline {
    config: PipelineConfig,
    canonicalizer: ItemCanonicalizer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_canonicalizer(config, ItemCanonicalizer::default())
    }

    pub fn with_canonicalizer(config: PipelineConfig, canonicalizer: ItemCanonicalizer) -> Self {
        Self {
            config,
            canonicalizer,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read, derive and write. Sources are fully validated before the
    /// output directory is touched.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        self.canonicalizer.rules().validate()?;

        let deforestation_rows = read_deforestation_rows(&self.config.deforestation_path)?;
        let trade = read_trade_records(&self.config.trade_path)?;

        let outputs = self.derive(&deforestation_rows, &trade)?;
        write_outputs(&outputs, &self.config.output_dir)
    }

    /// Build every output table from already-loaded sources.
    pub fn derive(
        &self,
        deforestation_rows: &[DeforestationRow],
        trade: &TradeTable,
    ) -> Result<PipelineOutputs> {
        self.derive_with_policy(deforestation_rows, trade, &self.config.policy)
    }

    pub fn derive_with_policy<P>(
        &self,
        deforestation_rows: &[DeforestationRow],
        trade: &TradeTable,
        policy: &P,
    ) -> Result<PipelineOutputs>
    where
        P: InclusionPolicy + ?Sized,
    {
        let deforestation = summarize_deforestation(deforestation_rows)?;
        let range = year_range(&deforestation).ok_or_else(|| {
            PipelineError::Schema("Deforestation source has no data rows".to_string())
        })?;

        let aggregator =
            ExportAggregator::new(self.config.export_filter(), self.canonicalizer.clone());
        let exports = aggregator.aggregate(&trade.records, &trade.year_columns);

        let joined = join_exports(&exports, &deforestation);
        let correlations = compute_correlations(&joined, policy);

        let included: HashSet<CanonicalItem> =
            correlations.iter().map(|c| c.item.clone()).collect();
        let filtered_exports = filter_exports(&exports, range, &included);
        let combined = combine(&correlations, &deforestation);

        info!(
            years = deforestation.len(),
            first_year = range.min,
            last_year = range.max,
            export_rows = exports.len(),
            joined_rows = joined.len(),
            items = correlations.len(),
            filtered_rows = filtered_exports.len(),
            "Derived tables"
        );

        Ok(PipelineOutputs {
            joined,
            correlations,
            deforestation,
            filtered_exports,
            combined,
        })
    }
}
