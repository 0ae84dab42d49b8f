//! Result tables and their CSV serialization.
//!
//! Tables are built as polars frames and written to `<name>.partial` first;
//! the real file names only appear once every table has been written.

use crate::error::{PipelineError, Result};
use crate::model::{
    CombinedRecord, CorrelationRecord, JoinedRecord, SeriesKind, YearlyDeforestation, YearlyExport,
};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const JOINED_FILE: &str = "brazil_joined_data.csv";
pub const CORRELATION_FILE: &str = "brazil_corr_data.csv";
pub const DEFORESTATION_FILE: &str = "total_deforestation_data.csv";
pub const FILTERED_EXPORTS_FILE: &str = "brazil_exports_filtered.csv";
pub const COMBINED_FILE: &str = "combined_data.csv";

const DEFORESTATION_LABEL: &str = "deforestation";
const PARTIAL_SUFFIX: &str = "partial";

/// Everything a run produces, held in memory until written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineOutputs {
    pub joined: Vec<JoinedRecord>,
    pub correlations: Vec<CorrelationRecord>,
    pub deforestation: Vec<YearlyDeforestation>,
    pub filtered_exports: Vec<YearlyExport>,
    pub combined: Vec<CombinedRecord>,
}

/// Long-format union for plotting: correlation rows first, then the yearly
/// deforestation series.
pub fn combine(
    correlations: &[CorrelationRecord],
    deforestation: &[YearlyDeforestation],
) -> Vec<CombinedRecord> {
    let correlation_rows = correlations.iter().map(|c| CombinedRecord {
        label: c.item.to_string(),
        year: None,
        value: c.corr,
        kind: SeriesKind::Correlation,
    });
    let deforestation_rows = deforestation.iter().map(|d| CombinedRecord {
        label: DEFORESTATION_LABEL.to_string(),
        year: Some(d.year),
        value: d.deforested_area_km2,
        kind: SeriesKind::Deforestation,
    });
    correlation_rows.chain(deforestation_rows).collect()
}

pub fn joined_frame(rows: &[JoinedRecord]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new("item", rows.iter().map(|r| r.item.as_str()).collect::<Vec<_>>()),
        Series::new("year", rows.iter().map(|r| r.year).collect::<Vec<_>>()),
        Series::new(
            "tonnes_exported",
            rows.iter().map(|r| r.tonnes_exported).collect::<Vec<_>>(),
        ),
        Series::new(
            "deforested_area_km2",
            rows.iter().map(|r| r.deforested_area_km2).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

pub fn correlation_frame(rows: &[CorrelationRecord]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new("item", rows.iter().map(|r| r.item.as_str()).collect::<Vec<_>>()),
        Series::new("n", rows.iter().map(|r| r.n as u64).collect::<Vec<_>>()),
        Series::new("corr", rows.iter().map(|r| r.corr).collect::<Vec<_>>()),
        Series::new(
            "total_tonnes_exported",
            rows.iter().map(|r| r.total_tonnes_exported).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

pub fn deforestation_frame(rows: &[YearlyDeforestation]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new("year", rows.iter().map(|r| r.year).collect::<Vec<_>>()),
        Series::new(
            "deforested_area_km2",
            rows.iter().map(|r| r.deforested_area_km2).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

pub fn exports_frame(rows: &[YearlyExport]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new("item", rows.iter().map(|r| r.item.as_str()).collect::<Vec<_>>()),
        Series::new("year", rows.iter().map(|r| r.year).collect::<Vec<_>>()),
        Series::new(
            "tonnes_exported",
            rows.iter().map(|r| r.tonnes_exported).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

pub fn combined_frame(rows: &[CombinedRecord]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new("label", rows.iter().map(|r| r.label.as_str()).collect::<Vec<_>>()),
        Series::new("year", rows.iter().map(|r| r.year).collect::<Vec<_>>()),
        Series::new("value", rows.iter().map(|r| r.value).collect::<Vec<_>>()),
        Series::new("type", rows.iter().map(|r| r.kind.as_str()).collect::<Vec<_>>()),
    ])?;
    Ok(df)
}

/// Write all five tables into `dir`, replacing earlier outputs.
///
/// Frames are built before anything touches the disk; staged files are
/// removed again if any write fails.
pub fn write_outputs(outputs: &PipelineOutputs, dir: &Path) -> Result<Vec<PathBuf>> {
    let tables = vec![
        (JOINED_FILE, joined_frame(&outputs.joined)?),
        (CORRELATION_FILE, correlation_frame(&outputs.correlations)?),
        (DEFORESTATION_FILE, deforestation_frame(&outputs.deforestation)?),
        (FILTERED_EXPORTS_FILE, exports_frame(&outputs.filtered_exports)?),
        (COMBINED_FILE, combined_frame(&outputs.combined)?),
    ];

    fs::create_dir_all(dir).map_err(|e| {
        PipelineError::Output(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(tables.len());
    for (name, mut df) in tables {
        let target = dir.join(name);
        let partial = target.with_extension(format!("csv.{}", PARTIAL_SUFFIX));
        if let Err(e) = write_csv(&mut df, &partial) {
            remove_staged(&staged);
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        debug!(path = %partial.display(), rows = df.height(), "Staged output");
        staged.push((partial, target));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (idx, (partial, target)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(partial, target) {
            remove_staged(&staged[idx..]);
            return Err(PipelineError::Output(format!(
                "Failed to move {} into place: {}",
                target.display(),
                e
            )));
        }
        written.push(target.clone());
    }

    info!(dir = %dir.display(), files = written.len(), "Wrote outputs");
    Ok(written)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        PipelineError::Output(format!("Failed to create {}: {}", path.display(), e))
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)
        .map_err(|e| PipelineError::Output(format!("Failed to write {}: {}", path.display(), e)))
}

fn remove_staged(staged: &[(PathBuf, PathBuf)]) {
    for (partial, _) in staged {
        if let Err(e) = fs::remove_file(partial) {
            warn!(path = %partial.display(), error = %e, "Failed to remove staged output");
        }
    }
}
