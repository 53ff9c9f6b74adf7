//! SHA-256 content digests used for drift detection.
//!
//! Digest comparison detects unintended drift between local files and their
//! remote canonical content; it is not a security boundary.

use anyhow::{Context as _, Result};
use std::path::Path;

/// Compute the lowercase hex SHA-256 digest of a byte slice.
#[must_use]
pub fn sha256_bytes(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for b in &result {
        // write! to a String is infallible; unwrap_or(()) makes that explicit.
        write!(hex, "{b:02x}").unwrap_or(());
    }
    hex
}

/// Compute the lowercase hex SHA-256 digest of the file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading {} for digest", path.display()))?;
    Ok(sha256_bytes(&bytes))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sha256_empty_input() {
        // SHA-256 of the empty string.
        assert_eq!(
            sha256_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_known_content() {
        // echo -n "hello world" | sha256sum
        assert_eq!(
            sha256_bytes(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn sha256_file_matches_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("data");
        std::fs::write(&file, b"some content").expect("write");
        assert_eq!(
            sha256_file(&file).expect("sha256_file"),
            sha256_bytes(b"some content")
        );
    }

    #[test]
    fn sha256_produces_64_hex_chars() {
        let hash = sha256_bytes(b"anything");
        assert_eq!(hash.len(), 64, "SHA-256 hex digest should be 64 characters");
        assert!(
            hash.chars().all(|c| c.is_ascii_hexdigit()),
            "digest should contain only hex characters"
        );
    }

    #[test]
    fn sha256_file_missing_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(sha256_file(&dir.path().join("nope")).is_err());
    }
}
