//! Planet derivation from location hashes and perlin values.

use strum::{Display, EnumIter};

use crate::config::GameConfig;
use crate::coords::WorldCoords;
use crate::location::LocationId;
use crate::perlin::perlin;

/// Region type selected by the perlin value at a location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpaceType {
    Nebula,
    Space,
    DeepSpace,
}

impl SpaceType {
    pub fn from_perlin(perlin: u32, (nebula, space): (u32, u32)) -> Self {
        if perlin < nebula {
            SpaceType::Nebula
        } else if perlin < space {
            SpaceType::Space
        } else {
            SpaceType::DeepSpace
        }
    }

    /// Highest level a planet can reach in this space type.
    pub const fn max_level(&self) -> PlanetLevel {
        match self {
            SpaceType::Nebula => PlanetLevel(3),
            SpaceType::Space | SpaceType::DeepSpace => PlanetLevel(GameConfig::MAX_PLANET_LEVEL),
        }
    }

    const fn level_bonus(&self) -> u8 {
        match self {
            SpaceType::DeepSpace => 1,
            SpaceType::Nebula | SpaceType::Space => 0,
        }
    }
}

/// Planet size class, `0..=7`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanetLevel(pub u8);

impl PlanetLevel {
    /// A hash whose level bits fall under `THRESHOLDS[n]` reaches level `n`.
    pub const THRESHOLDS: [u32; 8] = [
        16_777_216, 4_194_292, 524_288, 65_536, 16_384, 1_024, 256, 16,
    ];

    /// Derives the level of a planet from its hash and space type.
    pub fn derive(id: &LocationId, space_type: SpaceType) -> Self {
        let bits = id.level_bits();
        let base = Self::THRESHOLDS
            .iter()
            .rposition(|threshold| bits < *threshold)
            .unwrap_or(0) as u8;
        let level = (base + space_type.level_bonus()).min(space_type.max_level().0);
        PlanetLevel(level)
    }

    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for PlanetLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A discovered planet location with its derived attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanetLocation {
    pub coords: WorldCoords,
    pub hash: LocationId,
    pub perlin: u32,
    pub space_type: SpaceType,
    pub level: PlanetLevel,
}

impl PlanetLocation {
    /// Builds the location for a coordinate already known to hold a planet.
    pub fn derive(coords: WorldCoords, hash: LocationId, config: &GameConfig) -> Self {
        let perlin = perlin(coords, config);
        let space_type = SpaceType::from_perlin(perlin, config.perlin_thresholds);
        Self {
            coords,
            hash,
            perlin,
            space_type,
            level: PlanetLevel::derive(&hash, space_type),
        }
    }
}

/// Returns the planet at `coords`, if there is one inside the world radius.
pub fn planet_at(coords: WorldCoords, config: &GameConfig) -> Option<PlanetLocation> {
    if coords.radius() > config.world_radius as f64 {
        return None;
    }
    let hash = LocationId::of(coords, config.planet_hash_key);
    hash.is_planet(config)
        .then(|| PlanetLocation::derive(coords, hash, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn id_with_level_bits(bits: u32) -> LocationId {
        let mut bytes = [0u8; 32];
        let be = bits.to_be_bytes();
        bytes[4..7].copy_from_slice(&be[1..4]);
        LocationId(bytes)
    }

    #[test]
    fn space_type_follows_thresholds() {
        let thresholds = GameConfig::DEFAULT_PERLIN_THRESHOLDS;
        assert_eq!(SpaceType::from_perlin(14, thresholds), SpaceType::Nebula);
        assert_eq!(SpaceType::from_perlin(15, thresholds), SpaceType::Space);
        assert_eq!(SpaceType::from_perlin(16, thresholds), SpaceType::Space);
        assert_eq!(SpaceType::from_perlin(17, thresholds), SpaceType::DeepSpace);
    }

    #[test]
    fn level_from_bits() {
        let common = id_with_level_bits(5_000_000);
        assert_eq!(PlanetLevel::derive(&common, SpaceType::Space), PlanetLevel(0));

        let rare = id_with_level_bits(10);
        assert_eq!(PlanetLevel::derive(&rare, SpaceType::Space), PlanetLevel(7));

        let mid = id_with_level_bits(60_000);
        assert_eq!(PlanetLevel::derive(&mid, SpaceType::Space), PlanetLevel(3));
        assert_eq!(PlanetLevel::derive(&mid, SpaceType::DeepSpace), PlanetLevel(4));
    }

    #[test]
    fn level_is_capped_by_space_type() {
        let rare = id_with_level_bits(10);
        for space_type in SpaceType::iter() {
            let level = PlanetLevel::derive(&rare, space_type);
            assert!(level <= space_type.max_level(), "{space_type}: {level}");
        }
        assert_eq!(PlanetLevel::derive(&rare, SpaceType::Nebula), PlanetLevel(3));
    }

    #[test]
    fn nothing_outside_world_radius() {
        let config = GameConfig::new().with_planet_rarity(1).with_world_radius(10);
        assert!(planet_at(WorldCoords::new(3, 4), &config).is_some());
        assert!(planet_at(WorldCoords::new(30, 40), &config).is_none());
    }
}
