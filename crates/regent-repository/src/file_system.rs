//! File system based bundle implementation

use async_trait::async_trait;
use path_absolutize::Absolutize;
use regent_core::{LoadError, LoadErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::bundle::Bundle;
use crate::error::{check_relative, from_io};

/// Bundle backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FileSystemBundle {
    /// Absolute root path of the bundle
    root_path: PathBuf,
}

impl FileSystemBundle {
    /// Open a bundle rooted at `root_path`
    ///
    /// # Example
    /// ```no_run
    /// use regent_repository::FileSystemBundle;
    ///
    /// let bundle = FileSystemBundle::new("policies").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(root_path: P) -> Result<Self, LoadError> {
        let path = root_path.as_ref();
        let display = path.display().to_string();

        if !path.is_dir() {
            return Err(LoadError::not_found(display));
        }

        let abs_path = path
            .absolutize()
            .map_err(|e| LoadError::new(LoadErrorKind::ReadFailure, display, e.to_string()))?
            .to_path_buf();

        Ok(Self {
            root_path: abs_path,
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Walk the tree below the root, collecting files as relative paths
    async fn collect_files(&self) -> Result<Vec<String>, LoadError> {
        let mut files = Vec::new();
        let mut pending = vec![self.root_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| from_io(&self.relative(&dir), e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| from_io(&self.relative(&dir), e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| from_io(&self.relative(&path), e))?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    files.push(self.relative(&path));
                }
            }
        }

        Ok(files)
    }

    /// Relative, `/`-separated form of an absolute path under the root
    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root_path).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[async_trait]
impl Bundle for FileSystemBundle {
    async fn list_files(&self) -> Result<Vec<String>, LoadError> {
        let mut files = self.collect_files().await?;
        files.sort();
        Ok(files)
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        check_relative(path)?;
        fs::read(self.root_path.join(path))
            .await
            .map_err(|e| from_io(path, e))
    }

    fn describe(&self) -> String {
        self.root_path.display().to_string()
    }
}
