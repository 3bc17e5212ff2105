use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use tracing::debug;

use super::{ExtractError, Extraction, Extractor};
use crate::walker::FileKind;

/// Workbooks: every worksheet in file order, every row, every non-empty
/// cell, joined with spaces.
pub struct SpreadsheetExtractor;

impl Extractor for SpreadsheetExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Spreadsheet
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, ExtractError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ExtractError::decode("spreadsheet", e))?;

        let mut out = String::new();
        for sheet in workbook.sheet_names() {
            match workbook.worksheet_range(&sheet) {
                Ok(range) => push_cells(&mut out, &range),
                Err(e) => debug!(sheet = %sheet, "skipping unreadable worksheet: {e}"),
            }
        }

        Ok(Extraction::text(out))
    }
}

fn push_cells(out: &mut String, range: &Range<Data>) {
    for row in range.rows() {
        for cell in row {
            if matches!(cell, Data::Empty) {
                continue;
            }
            let value = cell.to_string();
            if value.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&value);
        }
    }
}
