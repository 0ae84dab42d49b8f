pub mod canonical;
pub mod config;
pub mod correlation;
pub mod deforestation;
pub mod error;
pub mod exports;
pub mod ingestion;
pub mod join;
pub mod model;
pub mod output;
pub mod pipeline;

pub use canonical::{canonicalize, CanonicalRules, ItemCanonicalizer};
pub use config::PipelineConfig;
pub use correlation::{compute_correlations, pearson, summarize_items, InclusionPolicy, ThresholdPolicy};
pub use deforestation::summarize_deforestation;
pub use error::{PipelineError, Result};
pub use exports::{aggregate_exports, ExportAggregator, ExportFilter};
pub use model::*;
pub use pipeline::Pipeline;
