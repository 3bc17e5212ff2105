//! Text recognition over decoded images.

use std::{io::Cursor, path::PathBuf};

use image::{DynamicImage, ImageFormat};
use leptess::LepTess;

use crate::extract::ExtractError;

/// An OCR capability. Implementations are called concurrently from the
/// worker pool and must not assume exclusive use.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ExtractError>;
}

/// Tesseract through `leptess`.
///
/// A `LepTess` handle is not shareable across threads, so each call
/// initializes its own with the configured language and tessdata
/// directory. With no directory, tesseract falls back to
/// `TESSDATA_PREFIX` and its compiled-in default.
#[derive(Debug, Clone)]
pub struct Tesseract {
    tessdata: Option<PathBuf>,
    language: String,
}

impl Tesseract {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            tessdata: None,
            language: language.into(),
        }
    }

    pub fn with_tessdata(mut self, dir: Option<PathBuf>) -> Self {
        self.tessdata = dir;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn init(&self) -> Result<LepTess, ExtractError> {
        let tessdata = match &self.tessdata {
            Some(dir) => Some(dir.to_str().ok_or_else(|| {
                ExtractError::Ocr(format!(
                    "tessdata path is not UTF-8: {}",
                    dir.display()
                ))
            })?),
            None => None,
        };
        LepTess::new(tessdata, &self.language)
            .map_err(|e| ExtractError::Ocr(format!("init failed: {e}")))
    }
}

impl Default for Tesseract {
    fn default() -> Self {
        Self::new("eng")
    }
}

impl OcrEngine for Tesseract {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ExtractError> {
        let mut lt = self.init()?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ExtractError::Ocr(format!("PNG encoding: {e}")))?;

        lt.set_image_from_mem(&png)
            .map_err(|e| ExtractError::Ocr(format!("set_image failed: {e}")))?;
        lt.get_utf8_text()
            .map_err(|e| ExtractError::Ocr(format!("get_utf8_text failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_language_is_english() {
        assert_eq!(Tesseract::default().language(), "eng");
    }

    #[test]
    fn unknown_language_is_an_ocr_error() {
        let engine = Tesseract::new("docsift-no-such-language");
        let err = engine
            .recognize(&DynamicImage::new_luma8(4, 4))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Ocr(_)));
    }

    #[test]
    fn missing_tessdata_dir_is_an_ocr_error() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = Tesseract::new("eng")
            .with_tessdata(Some(tmp.path().join("no-tessdata")));
        let err = engine
            .recognize(&DynamicImage::new_luma8(4, 4))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Ocr(_)));
    }
}
