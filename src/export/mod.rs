//! Writes normalized inventory rows to a CSV or XLSX file
//!
//! Every export rewrites the destination in full. Content is rendered in
//! memory, written to a temporary file next to the destination and then
//! renamed into place.

pub mod csv;
pub mod xlsx;

use crate::error::ExportError;
use crate::models::{InventoryRow, OutputFormat};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A cell value in export column order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(u64),
    Empty,
}

/// The row's values in `COLUMNS` order; absent optionals become `Empty`
pub fn cells(row: &InventoryRow) -> [Cell<'_>; 9] {
    [
        Cell::Text(&row.style),
        row.part_id.as_deref().map_or(Cell::Empty, Cell::Text),
        Cell::Text(&row.color),
        Cell::Text(&row.size),
        row.description.as_deref().map_or(Cell::Empty, Cell::Text),
        Cell::Text(&row.warehouse_id),
        Cell::Text(&row.warehouse_name),
        Cell::Number(row.quantity),
        row.total_available.map_or(Cell::Empty, Cell::Number),
    ]
}

/// Pick the output format: explicit choice, then the destination's
/// extension, then the configured default, then XLSX.
pub fn resolve_format(
    explicit: Option<OutputFormat>,
    destination: &Path,
    configured: Option<&str>,
) -> Result<OutputFormat, ExportError> {
    if let Some(format) = explicit {
        return Ok(format);
    }

    if let Some(format) = destination
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse::<OutputFormat>().ok())
    {
        return Ok(format);
    }

    match configured {
        Some(value) => value.parse().map_err(ExportError::UnsupportedFormat),
        None => Ok(OutputFormat::Xlsx),
    }
}

/// Destination with the format's extension appended when it is missing
pub fn with_extension(destination: &Path, format: OutputFormat) -> PathBuf {
    let has_extension = destination
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(format.extension()));
    if has_extension {
        return destination.to_path_buf();
    }

    let mut name = destination.as_os_str().to_owned();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

/// Write `rows` to `destination` and return the path actually written
pub fn export(
    rows: &[InventoryRow],
    destination: &Path,
    format: OutputFormat,
) -> Result<PathBuf, ExportError> {
    let path = with_extension(destination, format);

    let bytes = match format {
        OutputFormat::Csv => csv::render(rows)?,
        OutputFormat::Xlsx => xlsx::render(rows)?,
    };
    write_atomically(&path, &bytes)?;

    log::info!("Wrote {} row(s) to {} as {}", rows.len(), path.display(), format.extension());
    Ok(path)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    tmp.write_all(bytes).map_err(io_error)?;
    tmp.flush().map_err(io_error)?;
    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> InventoryRow {
        InventoryRow {
            style: "K420".to_string(),
            part_id: None,
            color: "Black".to_string(),
            size: "S".to_string(),
            description: Some("Polo".to_string()),
            warehouse_id: "1".to_string(),
            warehouse_name: "Seattle, WA".to_string(),
            quantity: 4,
            total_available: None,
        }
    }

    #[test]
    fn absent_values_become_empty_cells() {
        let row = row();
        let cells = cells(&row);
        assert_eq!(cells[0], Cell::Text("K420"));
        assert_eq!(cells[1], Cell::Empty);
        assert_eq!(cells[4], Cell::Text("Polo"));
        assert_eq!(cells[7], Cell::Number(4));
        assert_eq!(cells[8], Cell::Empty);

        let filled = InventoryRow {
            part_id: Some("K420-BLK-S".to_string()),
            description: None,
            total_available: Some(9),
            ..row
        };
        let cells = super::cells(&filled);
        assert_eq!(cells[1], Cell::Text("K420-BLK-S"));
        assert_eq!(cells[4], Cell::Empty);
        assert_eq!(cells[8], Cell::Number(9));
    }

    #[test]
    fn format_precedence() {
        let xlsx_path = Path::new("out.xlsx");
        let bare = Path::new("report");

        assert_eq!(
            resolve_format(Some(OutputFormat::Csv), xlsx_path, Some("xlsx")).unwrap(),
            OutputFormat::Csv
        );
        assert_eq!(
            resolve_format(None, Path::new("out.CSV"), Some("xlsx")).unwrap(),
            OutputFormat::Csv
        );
        assert_eq!(resolve_format(None, bare, Some("csv")).unwrap(), OutputFormat::Csv);
        assert_eq!(resolve_format(None, bare, None).unwrap(), OutputFormat::Xlsx);
    }

    #[test]
    fn unknown_configured_format_is_rejected() {
        match resolve_format(None, Path::new("report.txt"), Some("pdf")) {
            Err(ExportError::UnsupportedFormat(value)) => assert_eq!(value, "pdf"),
            other => panic!("Expected ExportError::UnsupportedFormat, got: {other:?}"),
        }
    }

    #[test]
    fn extension_is_appended_only_when_missing() {
        assert_eq!(
            with_extension(Path::new("out/report"), OutputFormat::Csv),
            PathBuf::from("out/report.csv")
        );
        assert_eq!(
            with_extension(Path::new("report.XLSX"), OutputFormat::Xlsx),
            PathBuf::from("report.XLSX")
        );
        assert_eq!(
            with_extension(Path::new("report.csv"), OutputFormat::Xlsx),
            PathBuf::from("report.csv.xlsx")
        );
    }
}
