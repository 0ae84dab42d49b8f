use crate::error::{PipelineError, Result};
use crate::model::{DeforestationRow, YearlyDeforestation};
use tracing::debug;

/// Collapse per-state rows into one national figure per year.
///
/// The first cell is the year and the last cell is the source's own label or
/// total column; only the cells in between are summed. Blank regional cells
/// count as zero, any other non-numeric cell is a schema error.
pub fn summarize_deforestation(rows: &[DeforestationRow]) -> Result<Vec<YearlyDeforestation>> {
    let mut out = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        if row.cells.len() < 2 {
            return Err(PipelineError::Schema(format!(
                "Deforestation row {} has {} cell(s), expected a year and a trailing label",
                idx + 1,
                row.cells.len()
            )));
        }

        let year = parse_year(&row.cells[0]).ok_or_else(|| {
            PipelineError::Schema(format!(
                "Deforestation row {} has a malformed year '{}'",
                idx + 1,
                row.cells[0]
            ))
        })?;

        let mut deforested_area_km2 = 0.0;
        for (col, cell) in row.cells.iter().enumerate().take(row.cells.len() - 1).skip(1) {
            deforested_area_km2 += parse_region(cell).ok_or_else(|| {
                PipelineError::Schema(format!(
                    "Deforestation row {} column {} is not a number: '{}'",
                    idx + 1,
                    col + 1,
                    cell
                ))
            })?;
        }

        out.push(YearlyDeforestation {
            year,
            deforested_area_km2,
        });
    }

    debug!(years = out.len(), "Summarized deforestation");
    Ok(out)
}

/// Blank (or NaN) -> 0, numbers -> themselves, anything else -> `None`.
fn parse_region(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_nan() => Some(0.0),
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    trimmed.parse::<i32>().ok().or_else(|| {
        // spreadsheets sometimes export years as "2004.0"
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|y| y.fract() == 0.0 && y.abs() < i32::MAX as f64)
            .map(|y| y as i32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sums_middle_columns_only() {
        let rows = vec![
            DeforestationRow::new(["2004", "728", "1211", "8870", "99999999"]),
            DeforestationRow::new(["2005", "592", "", "5899", "AMZ LEGAL"]),
        ];
        let out = summarize_deforestation(&rows).unwrap();
        assert_eq!(
            out,
            vec![
                YearlyDeforestation { year: 2004, deforested_area_km2: 10809.0 },
                YearlyDeforestation { year: 2005, deforested_area_km2: 6491.0 },
            ]
        );
    }

    #[test]
    fn test_output_length_matches_input() {
        let rows: Vec<_> = (2004..2020)
            .map(|y| DeforestationRow::new([y.to_string(), "1".to_string(), "x".to_string()]))
            .collect();
        let out = summarize_deforestation(&rows).unwrap();
        assert_eq!(out.len(), rows.len());
        assert!(out.iter().all(|d| d.deforested_area_km2 == 1.0));
    }

    #[test]
    fn test_row_without_regions_sums_to_zero() {
        let rows = vec![DeforestationRow::new(["2010", "7000"])];
        let out = summarize_deforestation(&rows).unwrap();
        assert_eq!(out[0].deforested_area_km2, 0.0);
    }

    #[test]
    fn test_float_formatted_year() {
        let rows = vec![DeforestationRow::new(["2006.0", "1", "total"])];
        assert_eq!(summarize_deforestation(&rows).unwrap()[0].year, 2006);
    }

    #[test]
    fn test_malformed_year_is_schema_error() {
        let rows = vec![DeforestationRow::new(["two thousand", "1", "total"])];
        let err = summarize_deforestation(&rows).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn test_non_numeric_region_is_schema_error() {
        let rows = vec![DeforestationRow::new(["2004", "1,211", "abc", "100", "AMZ"])];
        let err = summarize_deforestation(&rows).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
        assert!(err.to_string().contains("column 2"), "{}", err);

        let rows = vec![DeforestationRow::new(["2004", "12", "abc", "AMZ"])];
        let err = summarize_deforestation(&rows).unwrap_err();
        assert!(err.to_string().contains("'abc'"), "{}", err);
    }

    #[test]
    fn test_short_row_is_schema_error() {
        let rows = vec![DeforestationRow::new(["2004"])];
        assert!(summarize_deforestation(&rows).is_err());
    }
}
