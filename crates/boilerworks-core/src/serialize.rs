//! Binary snapshot support.
//!
//! Snapshots go through `bitcode` with a versioned header so a stale or
//! foreign blob is rejected with an explicit error before any payload
//! decoding. The helpers are generic over the payload: the core persists
//! a [`WorkSnapshot`](crate::engine::WorkSnapshot), downstream crates
//! wrap their own state the same way.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a boilerworks snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xB01_7E401;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot. Enables format
/// detection and version checking before trusting the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Generic encode / decode
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    header: SnapshotHeader,
    payload: T,
}

/// Serialize a payload with a versioned header.
pub fn encode<T: Serialize>(tick: u64, payload: &T) -> Result<Vec<u8>, SerializeError> {
    let envelope = Envelope {
        header: SnapshotHeader::new(tick),
        payload,
    };
    bitcode::serialize(&envelope).map_err(|e| SerializeError::Encode(e.to_string()))
}

/// Deserialize a payload, validating the header first. Returns the tick
/// the snapshot was taken at alongside the payload.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<(u64, T), DeserializeError> {
    let envelope: Envelope<T> =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    envelope.header.validate()?;
    Ok((envelope.header.tick, envelope.payload))
}

// ===========================================================================
// Tests
// ===========================================================================
