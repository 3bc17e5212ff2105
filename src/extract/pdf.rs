use lopdf::Document;
use tracing::debug;

use super::{ExtractError, Extraction, Extractor};
use crate::walker::FileKind;

/// PDF text layers, page by page.
///
/// A page whose text cannot be extracted contributes an empty string;
/// only a document that cannot be opened at all is an error. Scanned
/// PDFs without a text layer therefore come out empty.
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Pdf
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, ExtractError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| ExtractError::decode("pdf", e))?;

        let pages: Vec<String> = doc
            .get_pages()
            .into_keys()
            .map(|page| {
                doc.extract_text(&[page]).unwrap_or_else(|e| {
                    debug!(page, "no text on PDF page: {e}");
                    String::new()
                })
            })
            .collect();

        Ok(Extraction::text(pages.join("\n")))
    }
}
