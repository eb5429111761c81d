//! SHA-256 checksum handling for release archives.

use sha2::{Digest, Sha256};

use crate::error::{InstallError, Result};

/// Computes the lowercase hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Finds the checksum of `file_name` in a `sha256sum`-style list.
///
/// Lines look like `<hex>  <name>`; a `*` before the name (binary mode) is
/// accepted.
#[must_use]
pub fn find_checksum<'a>(list: &'a str, file_name: &str) -> Option<&'a str> {
    list.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let digest = parts.next()?;
        let name = parts.next()?.trim_start_matches('*');
        (name == file_name).then_some(digest)
    })
}

/// Verifies `data` against the entry for `file_name` in `list`.
///
/// # Errors
///
/// Returns [`InstallError::ChecksumNotFound`] if the list has no entry for
/// the file and [`InstallError::ChecksumMismatch`] if the digests differ.
pub fn verify(data: &[u8], list: &str, file_name: &str, list_url: &str) -> Result<()> {
    let expected = find_checksum(list, file_name).ok_or_else(|| InstallError::ChecksumNotFound {
        file: file_name.to_string(),
        url: list_url.to_string(),
    })?;

    let actual = sha256_hex(data);
    if !expected.eq_ignore_ascii_case(&actual) {
        return Err(InstallError::ChecksumMismatch {
            file: file_name.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn test_find_checksum() {
        let list = format!(
            "0000  vaultbot_1.13.0_linux_arm64.tar.gz\n{HELLO_SHA256}  vaultbot_1.13.0_linux_amd64.tar.gz\n"
        );
        assert_eq!(
            find_checksum(&list, "vaultbot_1.13.0_linux_amd64.tar.gz"),
            Some(HELLO_SHA256)
        );
        assert_eq!(find_checksum(&list, "vaultbot_1.13.0_darwin_amd64.tar.gz"), None);
    }

    #[test]
    fn test_find_checksum_binary_mode_marker() {
        let list = format!("{HELLO_SHA256} *archive.tar.gz");
        assert_eq!(find_checksum(&list, "archive.tar.gz"), Some(HELLO_SHA256));
    }

    #[test]
    fn test_verify_ok() {
        let list = format!("{}  archive.tar.gz", HELLO_SHA256.to_uppercase());
        assert!(verify(b"hello", &list, "archive.tar.gz", "https://example.com/sums").is_ok());
    }

    #[test]
    fn test_verify_mismatch() {
        let list = format!("{HELLO_SHA256}  archive.tar.gz");
        let err = verify(b"tampered", &list, "archive.tar.gz", "https://example.com/sums")
            .unwrap_err();
        assert!(matches!(err, InstallError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_verify_missing_entry() {
        let err = verify(b"hello", "", "archive.tar.gz", "https://example.com/sums").unwrap_err();
        assert!(matches!(err, InstallError::ChecksumNotFound { .. }));
    }
}
