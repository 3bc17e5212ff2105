use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};

use crate::{error::Result, output_dir::OutputDir};

/// Lowercase hex SHA-256 of a source file's absolute path.
///
/// Every artifact derived from one source file is named after this
/// digest, so re-scanning the same path overwrites its artifacts instead
/// of adding new ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathDigest(String);

impl PathDigest {
    pub fn of(path: &Path) -> Self {
        let digest = Sha256::digest(path.to_string_lossy().as_bytes());
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name holding the full extracted text.
    pub fn fulltext_name(&self) -> String {
        format!("{}.txt", self.0)
    }

    /// File name of the `index`-th face crop.
    pub fn face_name(&self, index: usize) -> String {
        format!("{}_face{index}.jpg", self.0)
    }
}

impl std::fmt::Display for PathDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directories of content-addressed artifacts.
///
/// Writers never share a file name unless they share a source path, and
/// a run visits each path once, so concurrent workers need no locking.
#[derive(Debug, Clone)]
pub struct ContentStore {
    fulltext_dir: PathBuf,
    faces_dir: PathBuf,
}

impl ContentStore {
    pub fn new(output: &OutputDir) -> Self {
        Self {
            fulltext_dir: output.fulltext_dir(),
            faces_dir: output.faces_dir(),
        }
    }

    pub fn fulltext_dir(&self) -> &Path {
        &self.fulltext_dir
    }

    pub fn faces_dir(&self) -> &Path {
        &self.faces_dir
    }

    /// Write the full text, replacing any earlier copy. Returns the file
    /// name relative to the full-text directory.
    pub fn write_fulltext(
        &self,
        digest: &PathDigest,
        text: &str,
    ) -> Result<String> {
        let name = digest.fulltext_name();
        std::fs::write(self.fulltext_dir.join(&name), text)?;
        Ok(name)
    }

    /// Write one face crop as JPEG. Returns the file name relative to the
    /// faces directory.
    pub fn write_face(
        &self,
        digest: &PathDigest,
        index: usize,
        crop: &DynamicImage,
    ) -> Result<String> {
        let name = digest.face_name(index);
        crop.to_rgb8()
            .save_with_format(self.faces_dir.join(&name), ImageFormat::Jpeg)?;
        Ok(name)
    }
}
