//! The scan coordinator.
//!
//! Files are processed on a fixed-size rayon pool. Workers never touch
//! the repository: each sends its [`FileOutcome`] over a channel to the
//! calling thread, which is the repository's only writer. Every per-file
//! failure is contained in that file's outcome.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::Path,
    sync::mpsc,
};

use globset::GlobSet;
use kdam::{BarExt, tqdm};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    content_store::{ContentStore, PathDigest},
    error::Result,
    extract::{ExtractError, ExtractorRegistry},
    faces::FaceCropper,
    keywords::KeywordGate,
    metadata,
    repository::{NewMatch, Repository},
    text_util,
    walker::{self, FileKind, FileTask},
};

/// Default worker pool size. Extraction is CPU- and I/O-heavy and each
/// OCR call initializes its own tesseract instance.
pub const DEFAULT_WORKERS: usize = 3;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Regular files enumerated under the root.
    pub scanned: usize,
    /// Files persisted as a record.
    pub matched: usize,
    /// Files read and extracted that matched no keyword.
    pub unmatched: usize,
    /// Files skipped for their extension.
    pub unsupported: usize,
    /// Files whose read, extraction or persistence failed.
    pub errored: usize,
}

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    Matched(NewMatch),
    NoMatch,
    Unsupported,
    Failed(String),
}

/// Configured scan engine. Build one with [`Pipeline::new`], then call
/// [`Pipeline::run`] once per tree.
pub struct Pipeline {
    registry: ExtractorRegistry,
    gate: KeywordGate,
    store: ContentStore,
    faces: Option<FaceCropper>,
    workers: usize,
    exclude: Option<GlobSet>,
    progress: bool,
}

impl Pipeline {
    pub fn new(
        registry: ExtractorRegistry,
        gate: KeywordGate,
        store: ContentStore,
    ) -> Self {
        Self {
            registry,
            gate,
            store,
            faces: None,
            workers: DEFAULT_WORKERS,
            exclude: None,
            progress: false,
        }
    }

    /// Worker pool size; values below 1 are raised to 1.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Enable face detection on image files.
    pub fn faces(mut self, faces: Option<FaceCropper>) -> Self {
        self.faces = faces;
        self
    }

    /// Skip paths (relative to the scan root) matching these globs.
    pub fn exclude(mut self, exclude: Option<GlobSet>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Show a progress bar on stderr while running.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Scan every file under `root`, appending a record to `repository`
    /// for each keyword match. Returns once every file has been handled.
    ///
    /// Only enumeration and pool setup can fail the run; per-file
    /// problems are counted in the summary.
    pub fn run(&self, root: &Path, repository: &Repository) -> Result<RunSummary> {
        let tasks = walker::discover_tasks(root, self.exclude.as_ref())?;
        info!(files = tasks.len(), root = %root.display(), "starting scan");

        let mut summary = RunSummary {
            scanned: tasks.len(),
            ..RunSummary::default()
        };
        let mut bar = self
            .progress
            .then(|| tqdm!(total = tasks.len(), desc = "Scanning"));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("docsift-worker-{i}"))
            .build()?;
        let (tx, rx) = mpsc::channel::<(FileTask, FileOutcome)>();

        std::thread::scope(|scope| {
            let pool = &pool;
            scope.spawn(move || {
                pool.install(|| {
                    tasks.into_par_iter().for_each_with(tx, |tx, task| {
                        let outcome = self.process_contained(&task);
                        // The receiver lives until every sender is gone.
                        let _ = tx.send((task, outcome));
                    });
                });
            });

            self.collect(rx, repository, &mut summary, || match bar.as_mut() {
                Some(bar) => bar.update(1).map(|_| ()),
                None => Ok(()),
            });
        });

        if let Some(bar) = bar.as_mut() {
            if let Err(e) = bar.refresh() {
                debug!("progress bar: {e}");
            }
            eprintln!();
        }

        info!(
            scanned = summary.scanned,
            matched = summary.matched,
            unsupported = summary.unsupported,
            errored = summary.errored,
            "scan complete"
        );
        Ok(summary)
    }

    /// Drain worker outcomes into the repository until every sender is
    /// gone. `tick` runs after each outcome; its failures are logged and
    /// never stop the drain.
    fn collect<F>(
        &self,
        rx: mpsc::Receiver<(FileTask, FileOutcome)>,
        repository: &Repository,
        summary: &mut RunSummary,
        mut tick: F,
    ) where
        F: FnMut() -> std::io::Result<()>,
    {
        for (task, outcome) in rx {
            self.record(&task, outcome, repository, summary);
            if let Err(e) = tick() {
                debug!("progress bar: {e}");
            }
        }
    }

    /// Route one outcome. Runs on the writer thread only.
    fn record(
        &self,
        task: &FileTask,
        outcome: FileOutcome,
        repository: &Repository,
        summary: &mut RunSummary,
    ) {
        match outcome {
            FileOutcome::Matched(data) => match repository.insert(data) {
                Ok(record) => {
                    debug!(id = record.id, path = %task.path.display(), "recorded match");
                    summary.matched += 1;
                }
                Err(e) => {
                    warn!(path = %task.path.display(), "cannot record match: {e}");
                    summary.errored += 1;
                }
            },
            FileOutcome::NoMatch => summary.unmatched += 1,
            FileOutcome::Unsupported => summary.unsupported += 1,
            FileOutcome::Failed(reason) => {
                debug!(path = %task.path.display(), kind = %task.kind, "dropped: {reason}");
                summary.errored += 1;
            }
        }
    }

    /// [`Pipeline::process`], with a panic inside any format library
    /// turned into a failed outcome for this file only.
    fn process_contained(&self, task: &FileTask) -> FileOutcome {
        catch_unwind(AssertUnwindSafe(|| self.process(task))).unwrap_or_else(
            |_| FileOutcome::Failed("extractor panicked".to_string()),
        )
    }

    /// Read, extract, gate and (on a match) enrich and persist artifacts
    /// for one file.
    pub fn process(&self, task: &FileTask) -> FileOutcome {
        if task.kind == FileKind::Unsupported {
            return FileOutcome::Unsupported;
        }

        let bytes = match std::fs::read(&task.path) {
            Ok(bytes) => bytes,
            Err(e) => return FileOutcome::Failed(format!("read: {e}")),
        };

        let extraction = match self.registry.extract(task.kind, &bytes) {
            Ok(extraction) => extraction,
            Err(ExtractError::Unsupported(_)) => return FileOutcome::Unsupported,
            Err(e) => return FileOutcome::Failed(e.to_string()),
        };
        drop(bytes);

        let keywords = self.gate.matched(&extraction.text);
        if keywords.is_empty() {
            return FileOutcome::NoMatch;
        }

        let text = &extraction.text;
        let source_path = task.path.to_string_lossy().into_owned();
        let digest = PathDigest::of(&task.path);

        let fulltext_file = match self.store.write_fulltext(&digest, text) {
            Ok(name) => name,
            Err(e) => return FileOutcome::Failed(format!("full text: {e}")),
        };

        let faces = match (&self.faces, &extraction.image) {
            (Some(cropper), Some(image)) if task.kind == FileKind::Image => {
                cropper.detect_faces(image, &digest, &self.store)
            }
            _ => Default::default(),
        };

        let dates: Vec<String> = metadata::candidate_dates(text)
            .iter()
            .map(|d| d.to_string())
            .collect();

        FileOutcome::Matched(NewMatch {
            source_path,
            keywords: keywords.join(", "),
            names: metadata::candidate_names(text).join(", "),
            dates: dates.join(", "),
            snippet: text_util::snippet(text),
            fulltext_file,
            face_count: faces.count,
            face_files: faces.files.join(", "),
        })
    }
}
