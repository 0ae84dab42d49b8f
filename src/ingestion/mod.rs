//! Source readers for the two upstream datasets.
//!
//! - Trade statistics (FAOSTAT bulk download): wide table, one `Y####` column
//!   per year, read through polars.
//! - Amazon deforestation (per-state km² per year): small positional table,
//!   read through the csv crate.

pub mod deforestation_reader;
pub mod trade_reader;

pub use deforestation_reader::{read_deforestation_rows, read_deforestation_rows_from};
pub use trade_reader::{read_trade_records, trade_records_from_frame, TradeTable};

/// Parse a numeric cell. Blank or unparseable cells are missing data.
pub(crate) fn parse_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
