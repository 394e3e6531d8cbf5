/// World constants and tunable parameters.
///
/// On a live network these values are read from the game contract; the
/// defaults mirror a typical round.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// One in `planet_rarity` locations holds a planet.
    pub planet_rarity: u64,
    /// Planets farther than this from the origin are not part of the world.
    pub world_radius: u64,
    /// Perlin cutoffs `(nebula/space, space/deep space)`.
    pub perlin_thresholds: (u32, u32),
    /// Key mixed into every location hash.
    pub planet_hash_key: u64,
    /// Key mixed into perlin gradient hashes.
    pub perlin_key: u64,
    /// Length scale of the coarsest perlin octave, in world units.
    pub perlin_length_scale: u64,
    /// Side length of chunks produced by the built-in mining patterns.
    pub chunk_side_length: u32,
}

impl GameConfig {
    // ===== compile-time constants =====
    /// Number of perlin octaves summed per sample.
    pub const PERLIN_OCTAVES: u32 = 3;
    /// Perlin values fall in `[0, PERLIN_MAX)`.
    pub const PERLIN_MAX: u32 = 32;
    pub const MAX_PLANET_LEVEL: u8 = 7;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_PLANET_RARITY: u64 = 16_384;
    pub const DEFAULT_WORLD_RADIUS: u64 = 100_000;
    pub const DEFAULT_PERLIN_THRESHOLDS: (u32, u32) = (15, 17);
    pub const DEFAULT_PLANET_HASH_KEY: u64 = 420;
    pub const DEFAULT_PERLIN_KEY: u64 = 1_729;
    pub const DEFAULT_PERLIN_LENGTH_SCALE: u64 = 8_192;
    pub const DEFAULT_CHUNK_SIDE_LENGTH: u32 = 16;

    pub fn new() -> Self {
        Self {
            planet_rarity: Self::DEFAULT_PLANET_RARITY,
            world_radius: Self::DEFAULT_WORLD_RADIUS,
            perlin_thresholds: Self::DEFAULT_PERLIN_THRESHOLDS,
            planet_hash_key: Self::DEFAULT_PLANET_HASH_KEY,
            perlin_key: Self::DEFAULT_PERLIN_KEY,
            perlin_length_scale: Self::DEFAULT_PERLIN_LENGTH_SCALE,
            chunk_side_length: Self::DEFAULT_CHUNK_SIDE_LENGTH,
        }
    }

    pub fn with_planet_rarity(mut self, planet_rarity: u64) -> Self {
        self.planet_rarity = planet_rarity.max(1);
        self
    }

    pub fn with_world_radius(mut self, world_radius: u64) -> Self {
        self.world_radius = world_radius;
        self
    }

    pub fn with_chunk_side_length(mut self, side_length: u32) -> Self {
        self.chunk_side_length = side_length.max(1);
        self
    }

    /// Upper bound (exclusive) on the leading 64 bits of a planet's hash.
    pub fn planet_hash_ceiling(&self) -> u64 {
        u64::MAX / self.planet_rarity.max(1)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
