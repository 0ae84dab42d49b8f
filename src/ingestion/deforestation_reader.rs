use crate::error::{PipelineError, Result};
use crate::model::DeforestationRow;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Read the deforestation CSV as positional rows (header skipped).
pub fn read_deforestation_rows(path: &Path) -> Result<Vec<DeforestationRow>> {
    let file = File::open(path).map_err(|e| {
        PipelineError::Source(format!(
            "Failed to open deforestation source {}: {}",
            path.display(),
            e
        ))
    })?;

    let rows = read_deforestation_rows_from(file)?;
    info!(path = %path.display(), rows = rows.len(), "Loaded deforestation source");
    Ok(rows)
}

pub fn read_deforestation_rows_from<R: Read>(reader: R) -> Result<Vec<DeforestationRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let header_len = rdr.headers()?.len();
    if header_len < 2 {
        return Err(PipelineError::Schema(format!(
            "Deforestation source needs a year column and a trailing label column, found {} column(s)",
            header_len
        )));
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        if record.len() > header_len {
            return Err(PipelineError::Schema(format!(
                "Deforestation row {} has {} cells but the header has {}",
                idx + 1,
                record.len(),
                header_len
            )));
        }

        // short rows are padded so the label column stays at header_len - 1
        let mut row = DeforestationRow::new(record.iter());
        row.cells.resize(header_len, String::new());
        rows.push(row);
    }
    Ok(rows)
}
