//! Core trait for read-only rule bundles

use async_trait::async_trait;
use regent_core::LoadError;

/// A read-only file tree holding rule modules and a configuration document
///
/// Paths are relative to the bundle root and `/`-separated on every
/// platform.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a bundle can be shared with the
/// reload path of a running service.
#[async_trait]
pub trait Bundle: Send + Sync {
    /// List every file in the bundle, recursively, sorted by path
    async fn list_files(&self) -> Result<Vec<String>, LoadError>;

    /// Read one file by relative path
    ///
    /// Missing files fail with `LoadErrorKind::NotFound`, I/O problems with
    /// `LoadErrorKind::ReadFailure`.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, LoadError>;

    /// Human-readable origin, used in logs
    fn describe(&self) -> String;
}
