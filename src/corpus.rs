//! Corpus assembly and directory loading.
//!
//! A corpus is a list of raw documents in submission order, plus records
//! for documents that could not be used and optional common documents
//! whose text is excluded from seeding.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use crate::models::{RawDocument, SkippedDocument};

/// Errors that stop corpus loading altogether.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Input documents for one detection run.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<RawDocument>,
    pub common: Vec<RawDocument>,
    pub unavailable: Vec<SkippedDocument>,
    names: HashSet<String>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. Empty or duplicate names are recorded as unavailable
    /// instead. Returns true if the document was added.
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() {
            self.mark_unavailable("<unnamed>", "empty document name");
            return false;
        }
        if !self.names.insert(name.clone()) {
            self.mark_unavailable(name, "duplicate document name");
            return false;
        }
        self.documents.push(RawDocument {
            name,
            text: text.into(),
        });
        true
    }

    /// Add a common (template) document. Its windows never seed matches.
    pub fn add_common(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.common.push(RawDocument {
            name: name.into(),
            text: text.into(),
        });
    }

    pub fn mark_unavailable(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        let skipped = SkippedDocument {
            name: name.into(),
            reason: reason.into(),
        };
        warn!(name = %skipped.name, reason = %skipped.reason, "document unavailable");
        self.unavailable.push(skipped);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Load every non-hidden file under `dir` as a document.
    pub fn load_dir(dir: &Path, recursive: bool) -> Result<Self, CorpusError> {
        let mut corpus = Corpus::new();
        for (name, result) in read_text_files(dir, recursive)? {
            match result {
                Ok(text) => {
                    corpus.add(name, text);
                }
                Err(reason) => corpus.mark_unavailable(name, reason),
            }
        }
        info!(
            dir = %dir.display(),
            documents = corpus.len(),
            unavailable = corpus.unavailable.len(),
            "loaded corpus"
        );
        Ok(corpus)
    }

    /// Load every non-hidden file under `dir` as a common document.
    pub fn load_common_dir(&mut self, dir: &Path, recursive: bool) -> Result<(), CorpusError> {
        for (name, result) in read_text_files(dir, recursive)? {
            match result {
                Ok(text) => self.add_common(name, text),
                Err(reason) => self.mark_unavailable(name, format!("common document: {}", reason)),
            }
        }
        info!(dir = %dir.display(), common = self.common.len(), "loaded common documents");
        Ok(())
    }
}

/// Read files in path order. Per-file failures are returned as reasons so
/// one bad file does not abort the run.
fn read_text_files(
    dir: &Path,
    recursive: bool,
) -> Result<Vec<(String, Result<String, String>)>, CorpusError> {
    if !dir.is_dir() {
        return Err(CorpusError::NotADirectory(dir.to_path_buf()));
    }

    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_hidden(e.file_name())) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = document_name(dir, entry.path());
        debug!(name = %name, "reading document");
        files.push((name, read_text(entry.path())));
    }
    Ok(files)
}

fn read_text(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    let text = String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {}", e))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    Ok(text.nfc().collect())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

/// Path relative to the corpus root, with `/` separators.
fn document_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, bytes: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_add_rejects_duplicates_and_empty_names() {
        let mut corpus = Corpus::new();
        assert!(corpus.add("a.txt", "one"));
        assert!(!corpus.add("a.txt", "two"));
        assert!(!corpus.add("", "three"));
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.unavailable.len(), 2);
        assert_eq!(corpus.unavailable[0].reason, "duplicate document name");
    }

    #[test]
    fn test_load_dir_sorted_and_flat() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.txt", b"second");
        write(tmp.path(), "a.txt", b"first");
        write(tmp.path(), ".hidden", b"skip me");
        write(tmp.path(), "sub/c.txt", b"nested");

        let corpus = Corpus::load_dir(tmp.path(), false).unwrap();
        let names: Vec<&str> = corpus.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(corpus.unavailable.is_empty());
    }

    #[test]
    fn test_load_dir_recursive() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.txt", b"first");
        write(tmp.path(), "sub/c.txt", b"nested");

        let corpus = Corpus::load_dir(tmp.path(), true).unwrap();
        let names: Vec<&str> = corpus.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "sub/c.txt"]);
    }

    #[test]
    fn test_invalid_utf8_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "bad.txt", &[0x66, 0x6f, 0xff, 0xfe]);
        write(tmp.path(), "good.txt", b"fine");

        let corpus = Corpus::load_dir(tmp.path(), false).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.unavailable.len(), 1);
        assert_eq!(corpus.unavailable[0].name, "bad.txt");
        assert!(corpus.unavailable[0].reason.starts_with("invalid UTF-8"));
    }

    #[test]
    fn test_bom_stripped_and_nfc() {
        let tmp = TempDir::new().unwrap();
        // BOM + "cafe" with a combining acute accent
        write(tmp.path(), "doc.txt", "\u{feff}cafe\u{301}".as_bytes());

        let corpus = Corpus::load_dir(tmp.path(), false).unwrap();
        assert_eq!(corpus.documents[0].text, "caf\u{e9}");
    }

    #[test]
    fn test_load_common_dir() {
        let docs = TempDir::new().unwrap();
        let common = TempDir::new().unwrap();
        write(docs.path(), "a.txt", b"answer");
        write(common.path(), "template.txt", b"question text");

        let mut corpus = Corpus::load_dir(docs.path(), false).unwrap();
        corpus.load_common_dir(common.path(), false).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.common.len(), 1);
        assert_eq!(corpus.common[0].text, "question text");
    }

    #[test]
    fn test_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "file.txt", b"x");
        let err = Corpus::load_dir(&tmp.path().join("file.txt"), false).unwrap_err();
        assert!(matches!(err, CorpusError::NotADirectory(_)));
    }
}
