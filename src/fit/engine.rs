//! Regression engine contract and the Gaussian Process engine.
//!
//! The stages only see two operations:
//!
//! - `fit(points, n_reps, init, iterations) -> Hyperparams`
//! - `build(points, n_reps, hyperparams) -> Interpolant`
//!
//! and the interpolant's `evaluate(q) -> (mean, err)`.

use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::Hyperparams;
use crate::error::MergeError;
use crate::math::nelder_mead;
use crate::models::gp::{GaussianProcess, LAMBDA_MIN, SIGMA_MIN, TAU_MIN, neg_log_posterior};
use crate::profile::Point;

/// Posterior mean and standard deviation at one coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub mean: f64,
    pub err: f64,
}

/// A fitted model attached to a profile.
pub trait Interpolant: Debug + Send + Sync {
    fn evaluate(&self, q: f64) -> Estimate;
    fn hyperparams(&self) -> Hyperparams;
}

pub trait RegressionEngine: Send + Sync {
    /// Run at most `iterations` optimizer steps from `init`.
    fn fit(
        &self,
        points: &[Point],
        n_reps: u32,
        init: &Hyperparams,
        iterations: usize,
    ) -> Result<Hyperparams, MergeError>;

    fn build(&self, points: &[Point], n_reps: u32, hp: &Hyperparams) -> Result<Arc<dyn Interpolant>, MergeError>;
}

/// Gaussian Process engine: simplex search over `ln tau`, `ln lambda`,
/// `ln sigma` with `(a, b)` profiled by least squares.
///
/// `init.a` and `init.b` are not read; only the covariance parameters are
/// warm-started.
#[derive(Debug, Clone)]
pub struct GpEngine {
    /// Initial simplex edge, in log units.
    pub step: f64,
    /// Relative spread of objective values at which the search stops early.
    pub tolerance: f64,
}

impl Default for GpEngine {
    fn default() -> Self {
        Self {
            step: 0.5,
            tolerance: 1e-8,
        }
    }
}

fn unpack(x: &[f64]) -> (f64, f64, f64) {
    (
        x[0].exp().max(TAU_MIN),
        x[1].exp().max(LAMBDA_MIN),
        x[2].exp().max(SIGMA_MIN),
    )
}

impl RegressionEngine for GpEngine {
    fn fit(
        &self,
        points: &[Point],
        n_reps: u32,
        init: &Hyperparams,
        iterations: usize,
    ) -> Result<Hyperparams, MergeError> {
        if points.is_empty() {
            return Err(MergeError::DegenerateInput("cannot fit zero points".to_string()));
        }

        let x0 = [
            init.tau.max(TAU_MIN).ln(),
            init.lambda.max(LAMBDA_MIN).ln(),
            init.sigma.max(SIGMA_MIN).ln(),
        ];
        let objective = |x: &[f64]| {
            let (tau, lambda, sigma) = unpack(x);
            neg_log_posterior(points, n_reps, tau, lambda, sigma).map_or(f64::INFINITY, |p| p.value)
        };
        let result = nelder_mead(objective, &x0, self.step, iterations, self.tolerance);
        log::trace!(
            "simplex stopped after {} iterations at objective {:.6}",
            result.iterations,
            result.fx
        );

        let (tau, lambda, sigma) = unpack(&result.x);
        let posterior = neg_log_posterior(points, n_reps, tau, lambda, sigma).ok_or_else(|| {
            MergeError::DegenerateInput(format!(
                "no finite posterior on {} points (tau={tau}, lambda={lambda}, sigma={sigma})",
                points.len()
            ))
        })?;

        Ok(Hyperparams {
            a: posterior.a,
            b: posterior.b,
            tau,
            lambda,
            sigma,
        })
    }

    fn build(&self, points: &[Point], n_reps: u32, hp: &Hyperparams) -> Result<Arc<dyn Interpolant>, MergeError> {
        Ok(Arc::new(GaussianProcess::new(points, n_reps, *hp)?))
    }
}
