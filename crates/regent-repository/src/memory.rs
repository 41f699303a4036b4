//! In-memory bundle
//!
//! Useful for tests and for hosts that embed their policies in the binary.

use async_trait::async_trait;
use regent_core::LoadError;
use std::collections::BTreeMap;

use crate::bundle::Bundle;
use crate::error::check_relative;

/// Bundle backed by an ordered map of path → contents
#[derive(Debug, Clone, Default)]
pub struct MemoryBundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl Bundle for MemoryBundle {
    async fn list_files(&self) -> Result<Vec<String>, LoadError> {
        Ok(self.files.keys().cloned().collect())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        check_relative(path)?;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::not_found(path))
    }

    fn describe(&self) -> String {
        format!("memory bundle ({} files)", self.files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regent_core::LoadErrorKind;

    #[tokio::test]
    async fn test_list_files_sorted() {
        let bundle = MemoryBundle::new()
            .with_file("z.rego", "package z")
            .with_file("a/b.rego", "package b");

        let files = bundle.list_files().await.unwrap();
        assert_eq!(files, vec!["a/b.rego", "z.rego"]);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let bundle = MemoryBundle::new();
        let err = bundle.read_file("data.json").await.unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::NotFound);
    }
}
