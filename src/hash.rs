//! SHA-256 hashing utilities for download integrity

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{GadgetError, Result};

/// Length of a hex-encoded SHA-256 digest
pub const SHA256_HEX_LEN: usize = 64;

/// Calculate the hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| GadgetError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| GadgetError::FileReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Extract the digest for `file_name` from a checksum file
///
/// Accepts `sha256sum` style lines (`<digest>  <name>` or `<digest> *<name>`)
/// and files holding nothing but one bare digest. A listing that does not
/// name `file_name` yields `None`.
pub fn parse_checksum(contents: &str, file_name: &str) -> Option<String> {
    let lines: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    for line in &lines {
        let mut parts = line.split_whitespace();
        let (Some(digest), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        if is_sha256_hex(digest) && name.trim_start_matches('*') == file_name {
            return Some(digest.to_ascii_lowercase());
        }
    }

    match lines.as_slice() {
        [only] if is_sha256_hex(only) => Some(only.to_ascii_lowercase()),
        _ => None,
    }
}

fn is_sha256_hex(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Verify a digest matches the expected value, ignoring case
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}
