use std::fs;

use pretty_assertions::assert_eq;
use ragbot_documents::{DocumentConfig, DocumentError, DocumentProcessor};
use tempfile::TempDir;

#[test]
fn test_process_text_file_into_windows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corpus.txt");
    let words: Vec<String> = (0..25).map(|i| format!("token{i}")).collect();
    fs::write(&path, words.join("\n")).unwrap();

    let processor = DocumentProcessor::new(DocumentConfig {
        chunk_size: 10,
        chunk_overlap: 2,
    });
    let chunks = processor.process(&path).unwrap();

    assert_eq!(chunks.len(), 3);
    assert!(chunks[0].starts_with("token0 token1"));
    assert!(chunks[1].starts_with("token8 token9"));
    assert!(chunks[2].ends_with("token24"));
}

#[test]
fn test_small_file_is_one_chunk_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doc1.txt");
    fs::write(&path, "Machine learning is a subset of AI.\n").unwrap();

    let chunks = DocumentProcessor::default().process(&path).unwrap();

    assert_eq!(chunks, vec!["Machine learning is a subset of AI.\n".to_string()]);
}

#[test]
fn test_empty_file_has_no_chunks() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.txt");
    fs::write(&path, "   \n").unwrap();

    assert!(DocumentProcessor::default().process(&path).unwrap().is_empty());
}

#[test]
fn test_process_rejects_unsupported_and_missing() {
    let dir = TempDir::new().unwrap();
    let sheet = dir.path().join("table.xlsx");
    fs::write(&sheet, "PK").unwrap();
    let processor = DocumentProcessor::default();

    assert!(matches!(
        processor.process(&sheet),
        Err(DocumentError::UnsupportedFormat(ext)) if ext == ".xlsx"
    ));
    assert!(matches!(
        processor.process(&dir.path().join("gone.txt")),
        Err(DocumentError::FileNotFound(_))
    ));
}
