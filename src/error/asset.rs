//! Release index, download and integrity errors

use super::GadgetError;

/// Creates an asset not found error
pub fn not_found(name: impl Into<String>, version: impl Into<String>) -> GadgetError {
    GadgetError::AssetNotFound {
        name: name.into(),
        version: version.into(),
    }
}

/// Creates a checksum mismatch error
pub fn checksum_mismatch(
    file: impl Into<String>,
    expected: impl Into<String>,
    actual: impl Into<String>,
) -> GadgetError {
    GadgetError::ChecksumMismatch {
        file: file.into(),
        expected: expected.into(),
        actual: actual.into(),
    }
}

/// Creates a cache operation failed error
pub fn cache_failed(message: impl Into<String>) -> GadgetError {
    GadgetError::CacheOperationFailed {
        message: message.into(),
    }
}
