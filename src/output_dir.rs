use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Root of everything a scan writes: the results database plus the
/// full-text and face-crop artifact directories.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Resolve the output directory from, in order of priority:
    /// 1. An explicit path (from --output-dir)
    /// 2. The DOCSIFT_OUTPUT_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/docsift/)
    ///
    /// The root and both artifact directories are created if missing.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var("DOCSIFT_OUTPUT_DIR") {
            PathBuf::from(val)
        } else {
            xdg::BaseDirectories::with_prefix("docsift")
                .get_data_home()
                .ok_or_else(|| {
                    Error::Config(
                        "could not determine XDG data home directory".into(),
                    )
                })?
        };

        let dir = Self { root };
        for path in [dir.root.clone(), dir.fulltext_dir(), dir.faces_dir()] {
            std::fs::create_dir_all(&path)
                .map_err(|_| Error::OutputDir(path.clone()))?;
        }

        Ok(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn results_db(&self) -> PathBuf {
        self.root.join("results.redb")
    }

    pub fn fulltext_dir(&self) -> PathBuf {
        self.root.join("fulltext")
    }

    pub fn faces_dir(&self) -> PathBuf {
        self.root.join("faces")
    }
}
