//! Format adapters turning raw file bytes into normalized plain text.
//!
//! Each [`FileKind`] other than `Unsupported` has one [`Extractor`]. The
//! [`ExtractorRegistry`] picks the adapter and applies whitespace
//! normalization uniformly, so the keyword gate and snippet logic see the
//! same shape of text whatever the source format.
//!
//! | Extractor | Kind | Output |
//! |-----------|------|--------|
//! | [`ImageExtractor`] | `.jpg` `.jpeg` `.png` `.tif` `.tiff` | OCR text + decoded raster |
//! | [`PdfExtractor`] | `.pdf` | Page texts in page order |
//! | [`DocxExtractor`] | `.docx` | Paragraph texts in document order |
//! | [`SpreadsheetExtractor`] | `.xlsx` `.xls` `.xlsm` `.ods` | Non-empty cell values |
//! | [`TextExtractor`] | `.txt` | Lossy UTF-8 decode |

use std::{collections::HashMap, sync::Arc};

use image::DynamicImage;

use crate::{ocr::OcrEngine, text_util::normalize_whitespace, walker::FileKind};

pub mod docx;
pub mod image_file;
pub mod pdf;
pub mod spreadsheet;
pub mod text;

pub use docx::DocxExtractor;
pub use image_file::ImageExtractor;
pub use pdf::PdfExtractor;
pub use spreadsheet::SpreadsheetExtractor;
pub use text::TextExtractor;

/// Why a file produced no text.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No extractor handles this kind. A deliberate skip, not a failure.
    #[error("unsupported file kind: {0}")]
    Unsupported(FileKind),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot decode {format}: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("text recognition failed: {0}")]
    Ocr(String),
}

impl ExtractError {
    pub(crate) fn decode(
        format: &'static str,
        err: impl std::fmt::Display,
    ) -> Self {
        Self::Decode {
            format,
            message: err.to_string(),
        }
    }
}

/// Transient output of one extraction. Owned by the worker that produced
/// it and dropped once the file's outcome is decided.
#[derive(Debug)]
pub struct Extraction {
    pub text: String,
    /// Decoded raster, present only for image files.
    pub image: Option<DynamicImage>,
}

impl Extraction {
    pub fn text(text: String) -> Self {
        Self { text, image: None }
    }
}

/// A format adapter.
pub trait Extractor: Send + Sync {
    /// The kind this adapter handles.
    fn kind(&self) -> FileKind;

    /// Produce raw (not yet normalized) text from the file's bytes.
    fn extract(&self, bytes: &[u8]) -> Result<Extraction, ExtractError>;
}

/// Routes file kinds to their extractors.
pub struct ExtractorRegistry {
    extractors: HashMap<FileKind, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// A registry with every built-in adapter; images are read with `ocr`.
    pub fn with_defaults(ocr: Arc<dyn OcrEngine>) -> Self {
        let mut registry = Self::new();
        registry.register(ImageExtractor::new(ocr));
        registry.register(PdfExtractor);
        registry.register(DocxExtractor);
        registry.register(SpreadsheetExtractor);
        registry.register(TextExtractor);
        registry
    }

    /// Register an extractor, replacing any earlier one for its kind.
    pub fn register<E: Extractor + 'static>(&mut self, extractor: E) {
        self.extractors.insert(extractor.kind(), Arc::new(extractor));
    }

    pub fn get(&self, kind: FileKind) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&kind).cloned()
    }

    /// Extract and normalize text for a file of the given kind.
    pub fn extract(
        &self,
        kind: FileKind,
        bytes: &[u8],
    ) -> Result<Extraction, ExtractError> {
        let extractor =
            self.get(kind).ok_or(ExtractError::Unsupported(kind))?;
        let mut extraction = extractor.extract(bytes)?;
        extraction.text = normalize_whitespace(&extraction.text);
        Ok(extraction)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
