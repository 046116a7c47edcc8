//! Built-in starting terrains for the pipe-model simulation, so a caller
//! doesn't have to hand-roll an initializer for the common cases. Built on
//! `noise::gradient_noise`/`fbm`.

use crate::grid::Grid;
use crate::noise::fbm;
use crate::topology::Topology;

/// A named starting terrain. `Raw` is not a variant here on purpose — a
/// caller who wants full control just calls `Grid::init_with`/
/// `Simulation::init_with` directly instead of going through this enum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Generator {
    /// A centered ridge along the x axis, cosine-shaped, height `amplitude`
    /// at the center tapering to 0 at the x edges. Sensible default for a
    /// 1D "drains to both sides" smoke test.
    Parabola { amplitude: f32 },
    /// A bowl: height grows quadratically with distance from center, so
    /// water pools in the middle. Useful for the flat-pond/conservation
    /// tests.
    Bowl { amplitude: f32 },
    /// A circular island: radial falloff from the center modulated by
    /// fractal noise, clamped to 0 outside the island radius.
    Island { amplitude: f32, octaves: u32 },
    /// Raw fractal noise, no radial shaping.
    Fbm {
        amplitude: f32,
        octaves: u32,
        frequency: f32,
        lacunarity: f32,
        gain: f32,
    },
}

impl Generator {
    /// Apply this generator to every cell of `grid`, including the outer
    /// ring (`Grid::init_with` does not distinguish interior from ring —
    /// the ring's terrain still matters, since interior cells read it as a
    /// combined height).
    pub fn apply<D: Topology>(&self, grid: &mut Grid<D>, seed: u32) {
        let width = grid.width();
        let height = grid.height();
        let nx = |x: usize| -> f32 {
            if width > 1 {
                (x as f32 / (width - 1) as f32) * 2.0 - 1.0
            } else {
                0.0
            }
        };
        let ny = |y: usize| -> f32 {
            if height > 1 {
                (y as f32 / (height - 1) as f32) * 2.0 - 1.0
            } else {
                0.0
            }
        };

        match *self {
            Generator::Parabola { amplitude } => {
                grid.init_with(|x, _y| {
                    let t = nx(x);
                    (amplitude * (1.0 - t * t), 0.0, 0.0)
                });
            }
            Generator::Bowl { amplitude } => {
                grid.init_with(|x, y| {
                    let (tx, ty) = (nx(x), ny(y));
                    (amplitude * (tx * tx + ty * ty), 0.0, 0.0)
                });
            }
            Generator::Island { amplitude, octaves } => {
                grid.init_with(|x, y| {
                    let (tx, ty) = (nx(x), ny(y));
                    let dist = (tx * tx + ty * ty).sqrt();
                    let falloff = (1.0 - dist).max(0.0);
                    let n = fbm(x as f32, y as f32, seed, octaves, 0.05, 2.0, 0.5);
                    (amplitude * falloff * (0.6 + 0.4 * n), 0.0, 0.0)
                });
            }
            Generator::Fbm {
                amplitude,
                octaves,
                frequency,
                lacunarity,
                gain,
            } => {
                grid.init_with(|x, y| {
                    let n = fbm(x as f32, y as f32, seed, octaves, frequency, lacunarity, gain);
                    (amplitude * n, 0.0, 0.0)
                });
            }
        }
    }
}
