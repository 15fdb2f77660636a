//! Writing exported files to disk.

use std::path::{Path, PathBuf};

use crate::domain::error::Result;
use crate::domain::ExportFile;

/// Writes `file` into `dir` and returns the path written.
///
/// The directory is created if needed. An existing file with the same name is
/// never overwritten; a numeric suffix is added instead (`households_2024-03-01 (1).xlsx`).
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created or the file cannot
/// be written.
pub fn write_download(dir: &Path, file: &ExportFile) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = unique_path(dir, &file.filename);
    std::fs::write(&path, &file.bytes)?;
    tracing::info!(path = %path.display(), bytes = file.bytes.len(), "export written");
    Ok(path)
}

fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (filename, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_files_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let file = ExportFile {
            filename: "vehicles_2024-03-01.csv".to_string(),
            bytes: b"id\n1\n".to_vec(),
        };
        let first = write_download(dir.path(), &file).unwrap();
        let second = write_download(dir.path(), &file).unwrap();
        assert_eq!(first, dir.path().join("vehicles_2024-03-01.csv"));
        assert_eq!(second, dir.path().join("vehicles_2024-03-01 (1).csv"));
        assert_eq!(std::fs::read(second).unwrap(), b"id\n1\n");
    }
}
