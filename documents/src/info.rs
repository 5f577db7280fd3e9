use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, Result};
use crate::extract::is_supported;

/// File-level facts about a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// File name without directories.
    pub name: String,

    /// Size in bytes.
    pub size: u64,

    /// Extension with a leading dot, as written on disk.
    pub extension: String,

    /// Last modification time.
    pub modified: DateTime<Utc>,

    /// Whether text can be extracted from it.
    pub supported: bool,
}

/// Describe the document at `path`.
pub fn document_info(path: &Path) -> Result<DocumentInfo> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DocumentError::FileNotFound(path.to_path_buf()),
        _ => DocumentError::Io(e),
    })?;

    Ok(DocumentInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size: metadata.len(),
        extension: path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default(),
        modified: DateTime::<Utc>::from(metadata.modified()?),
        supported: is_supported(path),
    })
}

/// Supported files directly inside `dir`, sorted by path. Subdirectories
/// are not descended into.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DocumentError::FileNotFound(dir.to_path_buf()),
        _ => DocumentError::Io(e),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_supported(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_info_for_text_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Notes.TXT");
        fs::write(&path, "hello world").unwrap();

        let info = document_info(&path).unwrap();

        assert_eq!(info.name, "Notes.TXT");
        assert_eq!(info.size, 11);
        assert_eq!(info.extension, ".TXT");
        assert!(info.supported);
        assert!(info.modified <= Utc::now());
    }

    #[test]
    fn test_spreadsheet_is_reported_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheet.csv");
        fs::write(&path, "a,b").unwrap();

        assert!(!document_info(&path).unwrap().supported);
    }

    #[test]
    fn test_list_documents_keeps_supported_files() {
        let dir = TempDir::new().unwrap();
        for name in ["b.txt", "a.docx", "c.pdf", "notes.csv"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let names: Vec<String> = list_documents(dir.path())
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();

        assert_eq!(names, vec!["a.docx", "b.txt", "c.pdf"]);
        assert!(matches!(
            list_documents(&dir.path().join("absent")),
            Err(DocumentError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = document_info(Path::new("/nonexistent/ragbot/a.txt")).unwrap_err();
        assert!(matches!(err, DocumentError::FileNotFound(_)));
    }
}
