//! Deterministic random number generation.
//!
//! RULE: Nothing in the crate may call a platform RNG.
//! The estimators draw no randomness at all; only the synthetic-data
//! generator does, and it goes through SeededRng so the same seed always
//! yields the same dataset.
//!
//! Independent concerns use independent streams derived from
//! (seed XOR stream_index), so adding a new stream never shifts the
//! draws of an existing one.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::f64::consts::PI;

pub struct SeededRng {
    inner: Pcg64Mcg,
}

impl SeededRng {
    pub fn new(seed: u64, stream: RngStream) -> Self {
        let derived_seed = seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Standard normal via Box–Muller.
    pub fn standard_normal(&mut self) -> f64 {
        let u1 = self.next_f64().max(1e-300);
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Gamma(shape, rate) via Marsaglia–Tsang. Shapes below 1 use the
    /// `U^(1/shape)` boost.
    pub fn gamma(&mut self, shape: f64, rate: f64) -> f64 {
        assert!(shape > 0.0 && rate > 0.0, "gamma needs positive shape and rate");
        if shape < 1.0 {
            let u = self.next_f64().max(1e-300);
            return self.gamma(shape + 1.0, rate) * u.powf(1.0 / shape);
        }

        let d = shape - 1.0 / 3.0;
        let c = 1.0 / (9.0 * d).sqrt();
        loop {
            let x = self.standard_normal();
            let v = (1.0 + c * x).powi(3);
            if v <= 0.0 {
                continue;
            }
            let u = self.next_f64().max(1e-300);
            if u.ln() < 0.5 * x * x + d - d * v + d * v.ln() {
                return d * v / rate;
            }
        }
    }

    /// Poisson(lambda). Knuth's product method, split into chunks so large
    /// rates do not underflow.
    pub fn poisson(&mut self, lambda: f64) -> u32 {
        const CHUNK: f64 = 30.0;
        let mut remaining = lambda.max(0.0);
        let mut count = 0u32;
        while remaining > 0.0 {
            let step = remaining.min(CHUNK);
            remaining -= step;
            let limit = (-step).exp();
            let mut product = self.next_f64();
            while product > limit {
                count += 1;
                product *= self.next_f64();
            }
        }
        count
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries. Only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngStream {
    Population = 0,
    Visits = 1,
    Services = 2,
    Status = 3,
}
