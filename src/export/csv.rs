//! CSV rendering

use crate::models::{InventoryRow, COLUMNS};
use ::csv::WriterBuilder;

/// Header row plus one record per inventory row
pub fn render(rows: &[InventoryRow]) -> Result<Vec<u8>, ::csv::Error> {
    // Header written by hand so an empty export still has its columns
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(vec![]);
    wtr.write_record(COLUMNS)?;

    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.into_inner()
        .map_err(|e| ::csv::Error::from(e.into_error()))
}
