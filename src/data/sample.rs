//! Synthetic scattering profiles for demos and tests.
//!
//! Every profile samples the same underlying curve, a Guinier term on top of a
//! flat background:
//!
//! ```text
//! I(q) = scale · (i0 · exp(-(q·rg)² / 3) + background)
//! ```
//!
//! Each profile gets its own scale factor (what rescaling has to undo) and a
//! relative noise level that grows with the profile index.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct SimulateConfig {
    pub n_profiles: usize,
    pub n_points: usize,
    pub q_min: f64,
    pub q_max: f64,
    pub i0: f64,
    pub rg: f64,
    pub background: f64,
    /// Relative error of the first profile.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            n_profiles: 3,
            n_points: 120,
            q_min: 0.01,
            q_max: 0.3,
            i0: 100.0,
            rg: 20.0,
            background: 10.0,
            noise: 0.02,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedProfile {
    pub name: String,
    pub scale: f64,
    /// `(q, I, err)` rows in increasing `q`.
    pub rows: Vec<(f64, f64, f64)>,
}

/// Noise-free curve at `q` (scale 1).
pub fn true_intensity(config: &SimulateConfig, q: f64) -> f64 {
    config.i0 * (-(q * config.rg).powi(2) / 3.0).exp() + config.background
}

pub fn generate_profiles(config: &SimulateConfig) -> Result<Vec<SimulatedProfile>, AppError> {
    if config.n_profiles == 0 {
        return Err(AppError::new(2, "Profile count must be > 0."));
    }
    if config.n_points < 2 {
        return Err(AppError::new(2, "Each profile needs at least 2 points."));
    }
    if !(config.q_min.is_finite() && config.q_max.is_finite() && config.q_max > config.q_min && config.q_min >= 0.0) {
        return Err(AppError::new(2, "Invalid q range for simulation."));
    }
    if !(config.noise.is_finite() && config.noise > 0.0) {
        return Err(AppError::new(2, "Noise level must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut out = Vec::with_capacity(config.n_profiles);
    for k in 0..config.n_profiles {
        let scale = if k == 0 { 1.0 } else { rng.gen_range(0.5..2.0) };
        let rel_err = config.noise * (1.0 + 0.5 * k as f64);
        let rows = (0..config.n_points)
            .map(|j| {
                let q = config.q_min + (config.q_max - config.q_min) * j as f64 / (config.n_points - 1) as f64;
                let truth = scale * true_intensity(config, q);
                let err = rel_err * truth;
                let z: f64 = normal.sample(&mut rng);
                (q, truth + err * z, err)
            })
            .collect();
        out.push(SimulatedProfile {
            name: format!("profile_{}.dat", k + 1),
            scale,
            rows,
        });
    }
    Ok(out)
}
