use std::path::{Path, PathBuf};

use globset::GlobSet;

use crate::error::Result;

/// Document family, decided purely by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Image,
    Pdf,
    WordDoc,
    Spreadsheet,
    PlainText,
    Unsupported,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return Self::Unsupported;
        };

        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "tif" | "tiff" => Self::Image,
            "pdf" => Self::Pdf,
            "docx" => Self::WordDoc,
            "xlsx" | "xls" | "xlsm" | "ods" => Self::Spreadsheet,
            "txt" => Self::PlainText,
            _ => Self::Unsupported,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::WordDoc => "worddoc",
            Self::Spreadsheet => "spreadsheet",
            Self::PlainText => "plaintext",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file submitted for processing.
#[derive(Debug, Clone)]
pub struct FileTask {
    /// Absolute path of the file. Symlinks are not resolved, so this is
    /// the path the file was found under.
    pub path: PathBuf,
    pub kind: FileKind,
}

impl FileTask {
    pub fn new(path: PathBuf) -> Self {
        let kind = FileKind::from_path(&path);
        Self { path, kind }
    }
}

/// Recursively enumerate every regular file under `root`.
///
/// Unsupported files are still returned (classified as
/// [`FileKind::Unsupported`]) so the run can count them. Symlinked
/// directories are not followed; symlinks to files are. Entries whose
/// path relative to `root` matches `exclude` are skipped, and so is
/// everything below an excluded directory.
pub fn discover_tasks(
    root: &Path,
    exclude: Option<&GlobSet>,
) -> Result<Vec<FileTask>> {
    let root = std::path::absolute(root)?;
    if !root.is_dir() {
        return Err(crate::Error::NotFound {
            kind: "directory",
            name: root.display().to_string(),
        });
    }

    let mut results = Vec::new();
    walk_dir(&root, &root, exclude, &mut results);
    results.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(results)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    exclude: Option<&GlobSet>,
    results: &mut Vec<FileTask>,
) {
    let entries = match std::fs::read_dir(current) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                dir = %current.display(),
                "skipping unreadable directory: {e}"
            );
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if let Some(globs) = exclude {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            if globs.is_match(relative) {
                continue;
            }
        }

        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            walk_dir(root, &path, exclude, results);
        } else if file_type.is_symlink() {
            // Only symlinks that resolve to regular files are tasks.
            if std::fs::metadata(&path).is_ok_and(|meta| meta.is_file()) {
                results.push(FileTask::new(path));
            }
        } else if file_type.is_file() {
            results.push(FileTask::new(path));
        }
    }
}

#[cfg(test)]
mod tests {
    use globset::{Glob, GlobSetBuilder};

    use super::*;

    fn names(tasks: &[FileTask], root: &Path) -> Vec<String> {
        tasks
            .iter()
            .map(|t| {
                t.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn classifies_extensions_case_insensitively() {
        assert_eq!(FileKind::from_path(Path::new("a/scan.JPG")), FileKind::Image);
        assert_eq!(FileKind::from_path(Path::new("b.tiff")), FileKind::Image);
        assert_eq!(FileKind::from_path(Path::new("c.Pdf")), FileKind::Pdf);
        assert_eq!(FileKind::from_path(Path::new("d.docx")), FileKind::WordDoc);
        assert_eq!(
            FileKind::from_path(Path::new("e.xls")),
            FileKind::Spreadsheet
        );
        assert_eq!(FileKind::from_path(Path::new("f.txt")), FileKind::PlainText);
        assert_eq!(
            FileKind::from_path(Path::new("g.mp4")),
            FileKind::Unsupported
        );
        assert_eq!(
            FileKind::from_path(Path::new("Makefile")),
            FileKind::Unsupported
        );
    }

    #[test]
    fn discovers_all_regular_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("memo.txt"), "memo").unwrap();
        std::fs::write(tmp.path().join("clip.mp4"), "binary").unwrap();
        std::fs::write(tmp.path().join(".hidden.txt"), "hidden").unwrap();

        let root = std::path::absolute(tmp.path()).unwrap();
        let tasks = discover_tasks(tmp.path(), None).unwrap();
        assert_eq!(
            names(&tasks, &root),
            vec![".hidden.txt", "clip.mp4", "memo.txt"]
        );
        assert_eq!(tasks[1].kind, FileKind::Unsupported);
        assert!(tasks.iter().all(|t| t.path.is_absolute()));
    }

    #[test]
    fn recurses_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("box").join("folder");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(sub.join("deep.pdf"), "deep").unwrap();
        std::fs::write(tmp.path().join("top.txt"), "top").unwrap();

        let root = std::path::absolute(tmp.path()).unwrap();
        let tasks = discover_tasks(tmp.path(), None).unwrap();
        assert_eq!(
            names(&tasks, &root),
            vec!["box/folder/deep.pdf", "top.txt"]
        );
        assert_eq!(tasks[0].kind, FileKind::Pdf);
    }

    #[test]
    fn exclude_globs_prune_files_and_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let skipped = tmp.path().join("scratch");
        std::fs::create_dir(&skipped).unwrap();
        std::fs::write(skipped.join("a.txt"), "a").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "b").unwrap();
        std::fs::write(tmp.path().join("c.log"), "c").unwrap();

        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new("scratch").unwrap());
        builder.add(Glob::new("*.log").unwrap());
        let globs = builder.build().unwrap();

        let root = std::path::absolute(tmp.path()).unwrap();
        let tasks = discover_tasks(tmp.path(), Some(&globs)).unwrap();
        assert_eq!(names(&tasks, &root), vec!["b.txt"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = discover_tasks(&tmp.path().join("nope"), None);
        assert!(matches!(result, Err(crate::Error::NotFound { .. })));
    }

    #[test]
    fn empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let tasks = discover_tasks(tmp.path(), None).unwrap();
        assert!(tasks.is_empty());
    }
}
