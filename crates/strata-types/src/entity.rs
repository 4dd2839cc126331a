use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// 128-bit identifier for a stored entity (object or index).
///
/// Entity IDs are opaque to the adapter: it never derives placement or
/// layout from them, it only passes them through to the storage client.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub hi: u64,
    pub lo: u64,
}

impl EntityId {
    /// Create an ID from its two halves.
    pub const fn new(hi: u64, lo: u64) -> Self {
        Self { hi, lo }
    }

    /// The null entity ID (all zeros). Represents "no entity".
    pub const fn null() -> Self {
        Self { hi: 0, lo: 0 }
    }

    /// Returns `true` if this is the null entity ID.
    pub fn is_null(&self) -> bool {
        self.hi == 0 && self.lo == 0
    }

    /// The raw 16-byte big-endian representation.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.hi.to_be_bytes());
        out[8..].copy_from_slice(&self.lo.to_be_bytes());
        out
    }

    /// Reconstruct from the 16-byte big-endian representation.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut hi = [0u8; 8];
        let mut lo = [0u8; 8];
        hi.copy_from_slice(&bytes[..8]);
        lo.copy_from_slice(&bytes[8..]);
        Self {
            hi: u64::from_be_bytes(hi),
            lo: u64::from_be_bytes(lo),
        }
    }

    /// Hex-encoded string representation (32 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse from a 32-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 16 {
            return Err(TypeError::InvalidLength {
                expected: 16,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self::from_bytes(arr))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({:#x}:{:#x})", self.hi, self.lo)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}:{:#x}", self.hi, self.lo)
    }
}

impl From<(u64, u64)> for EntityId {
    fn from((hi, lo): (u64, u64)) -> Self {
        Self { hi, lo }
    }
}

/// Generator of unique entity IDs.
///
/// Backed by UUID v7: IDs are time-ordered and collision-resistant across
/// processes, so freshly allocated objects sort roughly by creation time.
#[derive(Debug, Default, Clone, Copy)]
pub struct UfidGenerator;

impl UfidGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Allocate the next unique entity ID. Never returns the null ID.
    pub fn next(&self) -> EntityId {
        let (hi, lo) = uuid::Uuid::now_v7().as_u64_pair();
        EntityId { hi, lo }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_all_zeros() {
        let id = EntityId::null();
        assert!(id.is_null());
        assert_eq!(id.to_bytes(), [0u8; 16]);
    }

    #[test]
    fn bytes_roundtrip() {
        let id = EntityId::new(0xdead_beef, 0xcafe_f00d);
        assert_eq!(EntityId::from_bytes(id.to_bytes()), id);
    }

    #[test]
    fn hex_roundtrip() {
        let id = EntityId::new(1, 2);
        let parsed = EntityId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn from_hex_rejects_bad_length() {
        let err = EntityId::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 16,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            EntityId::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn generator_produces_unique_ids() {
        let generator = UfidGenerator::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let id = generator.next();
            assert!(!id.is_null());
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }

    #[test]
    fn generated_ids_are_time_ordered() {
        let generator = UfidGenerator::new();
        let a = generator.next();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = generator.next();
        assert!(a < b);
    }

    #[test]
    fn serde_roundtrip() {
        let id = EntityId::new(7, 42);
        let json = serde_json::to_string(&id).unwrap();
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
