use crate::error::{PipelineError, Result};
use crate::ingestion::parse_cell;
use crate::model::RawTradeRecord;
use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

pub const AREA_COLUMN: &str = "Area";
pub const ELEMENT_COLUMN: &str = "Element";
pub const ITEM_COLUMN: &str = "Item";

lazy_static! {
    static ref YEAR_COLUMN: Regex = Regex::new(r"^Y(\d{4})$").expect("valid year column pattern");
}

/// Trade records plus the year columns discovered in the header.
#[derive(Clone, Debug, Default)]
pub struct TradeTable {
    pub records: Vec<RawTradeRecord>,
    pub year_columns: BTreeSet<i32>,
}

/// Read the FAOSTAT trade CSV.
///
/// Every column is loaded as a string (FAOSTAT mixes flags and numbers, and
/// the bulk files are not always valid UTF-8), then year cells are parsed
/// here so that blanks become missing values instead of read errors.
pub fn read_trade_records(path: &Path) -> Result<TradeTable> {
    if !path.exists() {
        return Err(PipelineError::Source(format!(
            "Trade source not found: {}",
            path.display()
        )));
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_encoding(CsvEncoding::LossyUtf8)
        .with_infer_schema_length(Some(0))
        .finish()
        .map_err(|e| PipelineError::Source(format!("Failed to scan {}: {}", path.display(), e)))?
        .collect()
        .map_err(|e| PipelineError::Source(format!("Failed to read {}: {}", path.display(), e)))?;

    let table = trade_records_from_frame(&df)?;
    info!(
        path = %path.display(),
        rows = table.records.len(),
        years = table.year_columns.len(),
        "Loaded trade source"
    );
    Ok(table)
}

/// Convert an already-loaded trade frame into records.
pub fn trade_records_from_frame(df: &DataFrame) -> Result<TradeTable> {
    let year_columns: BTreeMap<i32, String> = df
        .get_column_names()
        .into_iter()
        .filter_map(|name| {
            YEAR_COLUMN
                .captures(name)
                .and_then(|caps| caps[1].parse::<i32>().ok())
                .map(|year| (year, name.to_string()))
        })
        .collect();

    if year_columns.is_empty() {
        return Err(PipelineError::Schema(
            "Trade source has no year columns matching Y####".to_string(),
        ));
    }
    debug!(first = ?year_columns.keys().next(), last = ?year_columns.keys().last(), "Detected year columns");

    let areas = string_column(df, AREA_COLUMN)?;
    let elements = string_column(df, ELEMENT_COLUMN)?;
    let items = string_column(df, ITEM_COLUMN)?;

    let mut quantity_columns = Vec::with_capacity(year_columns.len());
    for (year, name) in &year_columns {
        let values = string_column(df, name)?
            .into_iter()
            .map(|cell| cell.as_deref().and_then(parse_cell))
            .collect::<Vec<_>>();
        quantity_columns.push((*year, values));
    }

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let quantities = quantity_columns
            .iter()
            .map(|(year, values)| (*year, values[row]))
            .collect();
        records.push(RawTradeRecord {
            area: areas[row].clone().unwrap_or_default(),
            element: elements[row].clone().unwrap_or_default(),
            item: items[row].clone().unwrap_or_default(),
            quantities,
        });
    }

    Ok(TradeTable {
        records,
        year_columns: year_columns.into_keys().collect(),
    })
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name).map_err(|_| {
        PipelineError::Schema(format!("Trade source is missing expected column '{}'", name))
    })?;
    let series = series.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df![
            "Area" => ["Brazil", "Brazil", "Argentina"],
            "Item" => ["Coffee, green", "Meat, chicken", "Coffee, green"],
            "Element" => ["Export Quantity", "Import Quantity", "Export Quantity"],
            "Y2004" => [Some("100"), None, Some("5")],
            "Y2004F" => [Some("A"), Some("A"), Some("*")],
            "Y2005" => [Some("250.5"), Some("3"), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_detects_year_columns_and_ignores_flags() {
        let table = trade_records_from_frame(&frame()).unwrap();
        assert_eq!(table.year_columns.into_iter().collect::<Vec<_>>(), vec![2004, 2005]);
    }

    #[test]
    fn test_parses_records() {
        let table = trade_records_from_frame(&frame()).unwrap();
        assert_eq!(table.records.len(), 3);

        let coffee = &table.records[0];
        assert_eq!(coffee.area, "Brazil");
        assert_eq!(coffee.element, "Export Quantity");
        assert_eq!(coffee.item, "Coffee, green");
        assert_eq!(coffee.quantity(2004), Some(100.0));
        assert_eq!(coffee.quantity(2005), Some(250.5));

        let chicken = &table.records[1];
        assert_eq!(chicken.quantity(2004), None);
        assert_eq!(chicken.quantity(2005), Some(3.0));
    }

    #[test]
    fn test_missing_year_columns_is_schema_error() {
        let df = df![
            "Area" => ["Brazil"],
            "Item" => ["Coffee, green"],
            "Element" => ["Export Quantity"],
            "Year2004" => ["1"],
        ]
        .unwrap();
        let err = trade_records_from_frame(&df).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn test_missing_item_column_is_schema_error() {
        let df = df![
            "Area" => ["Brazil"],
            "Element" => ["Export Quantity"],
            "Y2004" => ["1"],
        ]
        .unwrap();
        let err = trade_records_from_frame(&df).unwrap_err();
        assert!(err.to_string().contains("Item"));
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let err = read_trade_records(Path::new("/nonexistent/trade.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }
}
