// ---------------------------------------------------------------------------
// StoreError: typed errors for data-store and snapshot operations
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while persisting or loading assessment records.
///
/// Persistence is fire-and-forget: callers log these instead of propagating
/// them into the scoring pipeline.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error (file not found, permission denied, disk full, etc.)
    Io(std::io::Error),
    /// Bitcode encoding failed.
    Encode(String),
    /// Bitcode decoding failed (corrupt or invalid snapshot data).
    Decode(String),
    /// Snapshot file does not start with the expected magic bytes.
    BadMagic,
    /// Snapshot file header claims a format newer than this build supports.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Snapshot payload does not match the checksum in its header.
    ChecksumMismatch { expected: u32, computed: u32 },
    /// Snapshot file is shorter than its fixed header.
    TruncatedHeader { len: usize },
    /// A record was addressed to a table the store does not know.
    UnknownTable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Encode(msg) => write!(f, "Encoding error: {msg}"),
            StoreError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            StoreError::BadMagic => write!(f, "Not a data snapshot: bad magic bytes"),
            StoreError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Snapshot format v{found} is newer than the supported v{expected_max}"
            ),
            StoreError::ChecksumMismatch { expected, computed } => write!(
                f,
                "Snapshot corrupted: checksum mismatch (expected {expected:#010X}, got {computed:#010X})"
            ),
            StoreError::TruncatedHeader { len } => {
                write!(f, "Snapshot truncated: {len} bytes is shorter than the header")
            }
            StoreError::UnknownTable(name) => write!(f, "Unknown table: {name}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<bitcode::Error> for StoreError {
    fn from(e: bitcode::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_io() {
        let err = StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        let msg = format!("{err}");
        assert!(msg.contains("I/O error"), "got: {msg}");
        assert!(msg.contains("file not found"), "got: {msg}");
    }

    #[test]
    fn test_store_error_display_version_mismatch() {
        let err = StoreError::VersionMismatch {
            expected_max: 1,
            found: 9,
        };
        let msg = format!("{err}");
        assert!(msg.contains("v9"), "got: {msg}");
        assert!(msg.contains("v1"), "got: {msg}");
    }

    #[test]
    fn test_store_error_display_checksum() {
        let err = StoreError::ChecksumMismatch {
            expected: 0xDEAD,
            computed: 0xBEEF,
        };
        let msg = format!("{err}");
        assert!(msg.contains("checksum mismatch"), "got: {msg}");
    }

    #[test]
    fn test_store_error_display_unknown_table() {
        let msg = format!("{}", StoreError::UnknownTable("ghosts".into()));
        assert!(msg.contains("ghosts"), "got: {msg}");
    }

    #[test]
    fn test_store_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn test_store_error_source_for_io() {
        let err = StoreError::Io(std::io::Error::other("test"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&StoreError::BadMagic).is_none());
    }
}
