//! Local workbook ingestion (XLSX/XLS/ODS via calamine).
//!
//! The first row of the chosen worksheet is the header row; everything
//! below becomes data rows keyed by the derived header keys.

use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;

use super::{SheetData, derive_headers, rows_from_cells};
use crate::error::SheetSyncError;

/// Worksheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, SheetSyncError> {
    let workbook = open_workbook_auto(path)
        .map_err(|e| SheetSyncError::Ingest(format!("cannot open {}: {e}", path.display())))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Load one worksheet as headers + rows. With no explicit `sheet`, the
/// first worksheet is used.
pub fn load_xlsx(path: &Path, sheet: Option<&str>) -> Result<SheetData, SheetSyncError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| SheetSyncError::Ingest(format!("cannot open {}: {e}", path.display())))?;
    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SheetSyncError::Ingest("workbook has no worksheets".into()))?,
    };
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| SheetSyncError::Ingest(format!("cannot read worksheet '{name}': {e}")))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(SheetData::default());
    };
    let labels: Vec<String> = header_row.iter().map(cell_to_string).collect();
    let headers = derive_headers(&labels);
    let cells: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    let rows = rows_from_cells(&headers, &cells);
    Ok(SheetData { headers, rows })
}

/// Render a cell the way the sheet displays it: integral floats without
/// the trailing `.0`, everything else via its natural formatting.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{e:?}"),
    }
}
