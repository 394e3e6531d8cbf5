//! Location hashing.
//!
//! Every coordinate maps to a 32-byte [`LocationId`]. A planet exists at a
//! coordinate when the leading 64 bits of its id fall under
//! [`GameConfig::planet_hash_ceiling`].

use core::fmt;
use core::str::FromStr;

use sha2::{Digest, Sha256};

use crate::config::GameConfig;
use crate::coords::WorldCoords;
use crate::error::LocationIdError;

/// Hash of a world coordinate under the planet hash key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationId(pub [u8; 32]);

impl LocationId {
    /// Computes the id of `coords` under `key`.
    pub fn of(coords: WorldCoords, key: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key.to_le_bytes());
        hasher.update(coords.x.to_le_bytes());
        hasher.update(coords.y.to_le_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Leading 64 bits, big-endian.
    pub fn leading_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(bytes)
    }

    /// Whether this id belongs to a planet under the configured rarity.
    pub fn is_planet(&self, config: &GameConfig) -> bool {
        self.leading_u64() < config.planet_hash_ceiling()
    }

    /// 24-bit value read from bytes 4..7, used for level derivation.
    pub fn level_bits(&self) -> u32 {
        u32::from_be_bytes([0, self.0[4], self.0[5], self.0[6]])
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationId({})", &hex::encode(&self.0[..6]))
    }
}

impl FromStr for LocationId {
    type Err = LocationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| LocationIdError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}
