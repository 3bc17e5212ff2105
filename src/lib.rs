//! docsift - scan a tree of documents and keep the ones that matter.
//!
//! Every file under a root directory is read by a format-specific
//! extractor (OCR for images, text layers for PDFs, paragraphs for
//! `.docx`, cells for spreadsheets, plain text). Files whose text
//! contains at least one configured keyword are persisted as a
//! [`MatchRecord`], together with candidate names and dates, a bounded
//! snippet, the full text and, for images, crops of detected faces.
//! Everything else is dropped without a trace.
//!
//! # Quick start
//!
//! ```no_run
//! use std::{path::Path, sync::Arc};
//!
//! use docsift::{
//!     ContentStore, ExtractorRegistry, KeywordGate, OutputDir, Pipeline,
//!     Repository, Tesseract,
//! };
//!
//! let output = OutputDir::resolve(Some(Path::new("scan-output"))).unwrap();
//! let repository = Repository::open(&output.results_db()).unwrap();
//! let pipeline = Pipeline::new(
//!     ExtractorRegistry::with_defaults(Arc::new(Tesseract::default())),
//!     KeywordGate::default(),
//!     ContentStore::new(&output),
//! )
//! .workers(3);
//!
//! let summary = pipeline.run(Path::new("archive"), &repository).unwrap();
//! println!("{} of {} files matched", summary.matched, summary.scanned);
//! ```

pub mod content_store;
pub mod error;
pub mod extract;
pub mod faces;
pub mod keywords;
pub mod metadata;
pub mod ocr;
pub mod output_dir;
pub mod pipeline;
pub mod repository;
pub mod text_util;
pub mod walker;

pub use content_store::{ContentStore, PathDigest};
pub use error::{Error, Result};
pub use extract::{ExtractError, Extraction, Extractor, ExtractorRegistry};
pub use faces::{FaceCropper, FaceDetector, SeetaDetector};
pub use keywords::KeywordGate;
pub use ocr::{OcrEngine, Tesseract};
pub use output_dir::OutputDir;
pub use pipeline::{FileOutcome, Pipeline, RunSummary};
pub use repository::{MatchRecord, NewMatch, Repository};
pub use walker::{FileKind, FileTask};
