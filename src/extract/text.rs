use super::{ExtractError, Extraction, Extractor};
use crate::walker::FileKind;

/// Plain text. Invalid UTF-8 sequences are replaced, never rejected.
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn kind(&self) -> FileKind {
        FileKind::PlainText
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, ExtractError> {
        Ok(Extraction::text(String::from_utf8_lossy(bytes).into_owned()))
    }
}
