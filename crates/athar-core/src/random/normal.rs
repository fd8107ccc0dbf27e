use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// A source of uniform deviates in `[0, 1)`.
///
/// The Monte Carlo engine never reads an ambient generator; callers inject
/// one of these so that a run can be replayed exactly.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

/// Any `rand` generator wrapped as a uniform source.
#[derive(Debug, Clone)]
pub struct RngUniform<R: RngCore> {
    rng: R,
}

impl<R: RngCore> RngUniform<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngUniform<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: RngCore> UniformSource for RngUniform<R> {
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence of uniforms, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedUniform {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedUniform {
    /// Values outside `[0, 1)` are clamped into it; an empty script yields 0.5.
    pub fn new(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, 1.0 - f64::EPSILON) } else { 0.5 })
            .collect();
        Self { values, cursor: 0 }
    }
}

impl UniformSource for ScriptedUniform {
    fn next_uniform(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.5;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

/// Upper bound on redraws when the source keeps returning exactly zero.
const MAX_ZERO_REDRAWS: u32 = 64;

/// Standard-normal deviates via the Box-Muller transform (cosine branch).
#[derive(Debug, Clone)]
pub struct NormalGenerator<U: UniformSource> {
    source: U,
}

impl<U: UniformSource> NormalGenerator<U> {
    pub fn new(source: U) -> Self {
        Self { source }
    }

    /// `z = sqrt(-2 ln u) * cos(2 pi v)` with `u` redrawn while it is zero.
    pub fn next_standard_normal(&mut self) -> f64 {
        let mut u = self.source.next_uniform();
        let mut redraws = 0;
        while u <= 0.0 {
            if redraws == MAX_ZERO_REDRAWS {
                u = f64::MIN_POSITIVE;
                break;
            }
            u = self.source.next_uniform();
            redraws += 1;
        }
        let v = self.source.next_uniform();
        box_muller(u, v)
    }

    pub fn into_inner(self) -> U {
        self.source
    }
}

/// The transform itself, for a pair of uniforms with `u` in `(0, 1]`.
pub fn box_muller(u: f64, v: f64) -> f64 {
    (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
}
