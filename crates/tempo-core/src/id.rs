use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of bytes in a record id — fixed by the wire protocol, where a
/// 14-byte frame carries the id in bytes 2..14.
pub const ID_LEN: usize = 12;

/// Process-local id counter, randomly seeded at startup so two processes
/// generating ids in the same second still diverge.
static COUNTER: AtomicU32 = AtomicU32::new(0);
static COUNTER_SEEDED: std::sync::Once = std::sync::Once::new();

/// A 12-byte record identifier: 4-byte big-endian Unix seconds, 5 random
/// bytes, 3-byte counter. Displayed as 24 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId([u8; ID_LEN]);

impl RecordId {
    /// Generate a fresh id from the current time.
    pub fn new() -> Self {
        COUNTER_SEEDED.call_once(|| {
            COUNTER.store(rand::thread_rng().next_u32(), Ordering::Relaxed);
        });

        let mut bytes = [0u8; ID_LEN];
        let secs = chrono::Utc::now().timestamp() as u32;
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        rand::thread_rng().fill_bytes(&mut bytes[4..9]);
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse an id from a wire slice. Fails unless exactly 12 bytes long.
    pub fn from_slice(slice: &[u8]) -> crate::Result<Self> {
        let bytes: [u8; ID_LEN] = slice
            .try_into()
            .map_err(|_| CoreError::InvalidId(format!("expected {ID_LEN} bytes, got {}", slice.len())))?;
        Ok(Self(bytes))
    }

    pub const fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for RecordId {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let raw = hex::decode(s).map_err(|e| CoreError::InvalidId(e.to_string()))?;
        Self::from_slice(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = RecordId::new();
        let b = RecordId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn hex_round_trip() {
        let id = RecordId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 24);
        assert_eq!(text.parse::<RecordId>().unwrap(), id);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert!(RecordId::from_slice(&[0u8; 11]).is_err());
        assert!(RecordId::from_slice(&[0u8; 13]).is_err());
        assert!(RecordId::from_slice(&[0u8; 12]).is_ok());
    }

    #[test]
    fn timestamp_prefix_is_big_endian_seconds() {
        let before = chrono::Utc::now().timestamp() as u32;
        let id = RecordId::new();
        let secs = u32::from_be_bytes(id.as_bytes()[0..4].try_into().unwrap());
        assert!(secs >= before && secs <= before + 2);
    }
}
