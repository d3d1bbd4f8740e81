//! File system errors

use std::path::Path;

use super::GadgetError;

/// Creates a file read error for `path`
pub fn read_failed(path: &Path, err: &std::io::Error) -> GadgetError {
    GadgetError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a file write error for `path`
pub fn write_failed(path: &Path, err: &std::io::Error) -> GadgetError {
    GadgetError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a file not found error
pub fn not_found(path: &Path) -> GadgetError {
    GadgetError::FileNotFound {
        path: path.display().to_string(),
    }
}

/// Read a text file, mapping failures to [`GadgetError::FileReadFailed`]
pub fn read_to_string(path: &Path) -> Result<String, GadgetError> {
    std::fs::read_to_string(path).map_err(|e| read_failed(path, &e))
}

/// Write a text file, mapping failures to [`GadgetError::FileWriteFailed`]
pub fn write(path: &Path, contents: &str) -> Result<(), GadgetError> {
    std::fs::write(path, contents).map_err(|e| write_failed(path, &e))
}
