//! Minimal Office Open XML workbook
//!
//! One worksheet named `Inventory` with inline strings and numeric quantity
//! cells. Zip entries carry a fixed timestamp so equal rows give equal bytes.

use super::{cells, Cell};
use crate::models::{InventoryRow, COLUMNS};
use std::borrow::Cow;
use std::io::{Cursor, Write};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

pub const SHEET_NAME: &str = "Inventory";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const CONTENT_TYPES: &str = concat!(
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    "</Types>"
);

const ROOT_RELS: &str = concat!(
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    "</Relationships>"
);

const WORKBOOK_RELS: &str = concat!(
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    "</Relationships>"
);

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Render the workbook into memory
pub fn render(rows: &[InventoryRow]) -> Result<Vec<u8>, ZipError> {
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", worksheet(rows)),
    ];

    for (name, body) in parts {
        writer.start_file(name, options)?;
        writer.write_all(XML_DECL.as_bytes())?;
        writer.write_all(body.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

fn workbook() -> String {
    format!(
        r#"<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn worksheet(rows: &[InventoryRow]) -> String {
    let mut xml = format!(r#"<worksheet xmlns="{MAIN_NS}"><sheetData>"#);

    let header = COLUMNS.map(Cell::Text);
    push_row(&mut xml, 1, &header);
    for (i, row) in rows.iter().enumerate() {
        push_row(&mut xml, i + 2, &cells(row));
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row(xml: &mut String, number: usize, values: &[Cell<'_>]) {
    xml.push_str(&format!(r#"<row r="{number}">"#));
    for (col, value) in values.iter().enumerate() {
        let reference = format!("{}{}", column_letter(col), number);
        match value {
            Cell::Text(text) => xml.push_str(&format!(
                r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
                quick_xml::escape::escape(encode_controls(text).as_ref())
            )),
            Cell::Number(n) => xml.push_str(&format!(r#"<c r="{reference}"><v>{n}</v></c>"#)),
            Cell::Empty => {}
        }
    }
    xml.push_str("</row>");
}

/// XML 1.0 forbids C0 controls other than tab, newline and carriage
/// return; spreadsheets spell them as `_xHHHH_`.
fn encode_controls(text: &str) -> Cow<'_, str> {
    let forbidden = |c: char| c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r');
    if !text.contains(forbidden) {
        return Cow::Borrowed(text);
    }

    let mut encoded = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if forbidden(c) {
            encoded.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            encoded.push(c);
        }
    }
    Cow::Owned(encoded)
}

/// A..Z; the export never has more than nine columns
fn column_letter(index: usize) -> char {
    (b'A' + index as u8) as char
}
