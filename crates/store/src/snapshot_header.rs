// ---------------------------------------------------------------------------
// snapshot_header – snapshot file framing with magic, version, and checksum
// ---------------------------------------------------------------------------
//
// Header layout (28 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "ERSK"
//   [4..8]   Header format version (u32)
//   [8..12]  Flags (u32: bit 0 = lz4-compressed payload)
//   [12..20] Timestamp (Unix epoch seconds, u64)
//   [20..24] Uncompressed payload size (u32)
//   [24..28] xxHash32 checksum of the payload that follows the header

use xxhash_rust::xxh32::xxh32;

use crate::error::StoreError;

/// Magic bytes identifying a data snapshot file.
pub const MAGIC: [u8; 4] = *b"ERSK";

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 28;

/// Current header format version. Bumped only when this layout changes.
pub const HEADER_FORMAT_VERSION: u32 = 1;

/// Flag bit: payload is lz4-compressed (size-prepended).
pub const FLAG_COMPRESSED: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub format_version: u32,
    pub flags: u32,
    pub timestamp: u64,
    pub uncompressed_size: u32,
    pub checksum: u32,
}

impl SnapshotHeader {
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Frame a payload: header (with checksum of `payload`) followed by the
/// payload bytes. `uncompressed_size` records the size before compression so
/// readers can preallocate.
pub fn frame(payload: &[u8], flags: u32, uncompressed_size: u32) -> Vec<u8> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&HEADER_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(&uncompressed_size.to_le_bytes());
    out.extend_from_slice(&xxh32(payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Parse and validate a framed snapshot, returning the header and the
/// payload slice.
///
/// # Errors
///
/// Fails when the magic bytes are wrong, the buffer is shorter than the
/// header, the format version is from a newer build, or the payload does not
/// match its checksum.
pub fn unframe(bytes: &[u8]) -> Result<(SnapshotHeader, &[u8]), StoreError> {
    if bytes.len() < 4 || bytes[..4] != MAGIC {
        return Err(StoreError::BadMagic);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::TruncatedHeader { len: bytes.len() });
    }

    let format_version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let flags = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
    let timestamp = u64::from_le_bytes(bytes[12..20].try_into().unwrap());
    let uncompressed_size = u32::from_le_bytes(bytes[20..24].try_into().unwrap());
    let checksum = u32::from_le_bytes(bytes[24..28].try_into().unwrap());

    if format_version > HEADER_FORMAT_VERSION {
        return Err(StoreError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: format_version,
        });
    }

    let payload = &bytes[HEADER_SIZE..];
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != checksum {
        return Err(StoreError::ChecksumMismatch {
            expected: checksum,
            computed,
        });
    }

    Ok((
        SnapshotHeader {
            format_version,
            flags,
            timestamp,
            uncompressed_size,
            checksum,
        },
        payload,
    ))
}
