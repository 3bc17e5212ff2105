use std::sync::Arc;

use super::{ExtractError, Extraction, Extractor};
use crate::{ocr::OcrEngine, walker::FileKind};

/// Raster images: decode, then run OCR over the decoded image.
///
/// The decoded image is returned alongside the text so face detection can
/// reuse it without decoding twice.
pub struct ImageExtractor {
    ocr: Arc<dyn OcrEngine>,
}

impl ImageExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }
}

impl Extractor for ImageExtractor {
    fn kind(&self) -> FileKind {
        FileKind::Image
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, ExtractError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| ExtractError::decode("image", e))?;
        let text = self.ocr.recognize(&image)?;
        Ok(Extraction {
            text,
            image: Some(image),
        })
    }
}
