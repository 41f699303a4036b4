//! Helpers mapping I/O and decoding failures onto [`LoadError`]

use regent_core::{LoadError, LoadErrorKind};
use std::io;

/// Classify an I/O error for `path`
pub(crate) fn from_io(path: &str, err: io::Error) -> LoadError {
    let kind = match err.kind() {
        io::ErrorKind::NotFound => LoadErrorKind::NotFound,
        _ => LoadErrorKind::ReadFailure,
    };
    LoadError::new(kind, path, err.to_string())
}

/// Reject paths that would escape the bundle root
pub(crate) fn check_relative(path: &str) -> Result<(), LoadError> {
    let escapes = path.starts_with('/')
        || path.split(['/', '\\']).any(|segment| segment == "..");
    if escapes {
        return Err(LoadError::new(
            LoadErrorKind::ReadFailure,
            path,
            "path escapes the bundle root",
        ));
    }
    Ok(())
}
