//! Deterministic multi-octave gradient noise.
//!
//! Lattice gradients are picked from a fixed table by hashing the lattice
//! point, so the same key always produces the same field.

use core::f64::consts::FRAC_1_SQRT_2;

use sha2::{Digest, Sha256};

use crate::config::GameConfig;
use crate::coords::WorldCoords;

const GRADIENTS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

/// Perlin value at `coords`, in `[0, GameConfig::PERLIN_MAX)`.
pub fn perlin(coords: WorldCoords, config: &GameConfig) -> u32 {
    let mut total = 0.0;
    let mut amplitude_sum = 0.0;

    for octave in 0..GameConfig::PERLIN_OCTAVES {
        let scale = (config.perlin_length_scale >> octave).max(1) as f64;
        let amplitude = 1.0 / f64::from(1u32 << octave);
        total += amplitude
            * noise(
                coords.x as f64 / scale,
                coords.y as f64 / scale,
                config.perlin_key,
                octave,
            );
        amplitude_sum += amplitude;
    }

    let normalized = (total / amplitude_sum + 1.0) / 2.0;
    let max = i64::from(GameConfig::PERLIN_MAX);
    ((normalized * max as f64).floor() as i64).clamp(0, max - 1) as u32
}

/// Single octave of gradient noise, roughly in `[-1, 1]`.
fn noise(x: f64, y: f64, key: u64, octave: u32) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let (ix, iy) = (x0 as i64, y0 as i64);
    let (fx, fy) = (x - x0, y - y0);

    let n00 = dot(gradient(ix, iy, key, octave), fx, fy);
    let n10 = dot(gradient(ix + 1, iy, key, octave), fx - 1.0, fy);
    let n01 = dot(gradient(ix, iy + 1, key, octave), fx, fy - 1.0);
    let n11 = dot(gradient(ix + 1, iy + 1, key, octave), fx - 1.0, fy - 1.0);

    let u = fade(fx);
    let v = fade(fy);
    let value = lerp(lerp(n00, n10, u), lerp(n01, n11, u), v);
    (value * core::f64::consts::SQRT_2).clamp(-1.0, 1.0)
}

fn gradient(ix: i64, iy: i64, key: u64, octave: u32) -> (f64, f64) {
    let mut hasher = Sha256::new();
    hasher.update(key.to_le_bytes());
    hasher.update(octave.to_le_bytes());
    hasher.update(ix.to_le_bytes());
    hasher.update(iy.to_le_bytes());
    let digest = hasher.finalize();
    GRADIENTS[usize::from(digest[0]) % GRADIENTS.len()]
}

fn dot((gx, gy): (f64, f64), dx: f64, dy: f64) -> f64 {
    gx * dx + gy * dy
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}
