//! Gaussian Process regression for one profile.
//!
//! With observations `I` at coordinates `q` (errors `err`, `n_reps` repeats):
//!
//! ```text
//! Ω     = W + sigma · diag(err²) / n_reps      W_ij = w(q_i, q_j)
//! mean  = m(q) + w(q)ᵀ Ω⁻¹ (I - m)
//! var   = tau² - w(q)ᵀ Ω⁻¹ w(q)
//! ```
//!
//! The objective minimized by the engine is the negative log posterior with
//! Jeffreys priors on `tau`, `lambda` and `sigma`. The mean parameters `(a, b)`
//! are not searched: for fixed covariance parameters they are the generalized
//! least squares solution, which is plugged back into the objective.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};

use crate::domain::Hyperparams;
use crate::error::MergeError;
use crate::fit::engine::{Estimate, Interpolant};
use crate::math::{linear_mean, solve_least_squares, sq_exp_covariance};
use crate::profile::Point;

/// Lower bounds on the covariance parameters.
pub const TAU_MIN: f64 = 1.0;
pub const LAMBDA_MIN: f64 = 0.001;
pub const SIGMA_MIN: f64 = 1.0;

/// A fitted GP, ready to be evaluated anywhere.
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    q: Vec<f64>,
    hp: Hyperparams,
    /// `Ω⁻¹ (I - m)`.
    alpha: DVector<f64>,
    /// Inverse of the Cholesky factor of `Ω`.
    l_inv: DMatrix<f64>,
}

impl GaussianProcess {
    pub fn new(points: &[Point], n_reps: u32, hp: Hyperparams) -> Result<Self, MergeError> {
        if points.is_empty() {
            return Err(MergeError::DegenerateInput(
                "cannot build a model from zero points".to_string(),
            ));
        }
        let chol = factorize(points, n_reps, hp.tau, hp.lambda, hp.sigma).ok_or_else(|| {
            MergeError::DegenerateInput(format!(
                "covariance matrix is not positive definite (tau={}, lambda={}, sigma={})",
                hp.tau, hp.lambda, hp.sigma
            ))
        })?;

        let n = points.len();
        let resid = DVector::from_iterator(
            n,
            points.iter().map(|p| p.i - linear_mean(p.q, hp.a, hp.b)),
        );
        let alpha = chol.solve(&resid);
        let l_inv = chol
            .l()
            .solve_lower_triangular(&DMatrix::identity(n, n))
            .ok_or_else(|| MergeError::DegenerateInput("singular Cholesky factor".to_string()))?;

        if alpha.iter().chain(l_inv.iter()).any(|v| !v.is_finite()) {
            return Err(MergeError::DegenerateInput(
                "non-finite values in the fitted model".to_string(),
            ));
        }

        Ok(Self {
            q: points.iter().map(|p| p.q).collect(),
            hp,
            alpha,
            l_inv,
        })
    }

    fn covariances(&self, q: f64) -> DVector<f64> {
        DVector::from_iterator(
            self.q.len(),
            self.q.iter().map(|&qi| sq_exp_covariance(q, qi, self.hp.tau, self.hp.lambda)),
        )
    }
}

impl Interpolant for GaussianProcess {
    fn evaluate(&self, q: f64) -> Estimate {
        let w = self.covariances(q);
        let mean = linear_mean(q, self.hp.a, self.hp.b) + w.dot(&self.alpha);
        let v = &self.l_inv * &w;
        let var = self.hp.tau * self.hp.tau - v.dot(&v);
        Estimate {
            mean,
            err: var.max(0.0).sqrt(),
        }
    }

    fn hyperparams(&self) -> Hyperparams {
        self.hp
    }
}

/// Value of the objective at `(tau, lambda, sigma)` along with the profiled `(a, b)`.
#[derive(Debug, Clone, Copy)]
pub struct Posterior {
    pub value: f64,
    pub a: f64,
    pub b: f64,
}

/// Negative log posterior with `(a, b)` profiled out.
///
/// Returns `None` when the covariance cannot be factorized or the least
/// squares step fails.
pub fn neg_log_posterior(points: &[Point], n_reps: u32, tau: f64, lambda: f64, sigma: f64) -> Option<Posterior> {
    let chol = factorize(points, n_reps, tau, lambda, sigma)?;
    let l = chol.l();
    let n = points.len();

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { points[i].q } else { 1.0 });
    let y = DVector::from_iterator(n, points.iter().map(|p| p.i));
    let design_w = l.solve_lower_triangular(&design)?;
    let y_w = l.solve_lower_triangular(&y)?;

    let beta = solve_least_squares(&design_w, &y_w)?;
    let r = &y_w - &design_w * &beta;

    let log_det_half: f64 = l.diagonal().iter().map(|d| d.ln()).sum();
    let value = 0.5 * r.dot(&r) + log_det_half + tau.ln() + lambda.ln() + sigma.ln();
    value.is_finite().then_some(Posterior {
        value,
        a: beta[0],
        b: beta[1],
    })
}

fn factorize(points: &[Point], n_reps: u32, tau: f64, lambda: f64, sigma: f64) -> Option<Cholesky<f64, Dyn>> {
    let n = points.len();
    let scale = sigma / n_reps as f64;
    let omega = DMatrix::from_fn(n, n, |i, j| {
        let w = sq_exp_covariance(points[i].q, points[j].q, tau, lambda);
        if i == j { w + scale * points[i].err * points[i].err } else { w }
    });
    Cholesky::new(omega)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(rows: &[(f64, f64, f64)]) -> Vec<Point> {
        rows.iter()
            .enumerate()
            .map(|(id, &(q, i, err))| Point { id, q, i, err })
            .collect()
    }

    fn guinier(n: usize) -> Vec<Point> {
        let rows: Vec<(f64, f64, f64)> = (0..n)
            .map(|k| {
                let q = 0.01 + 0.3 * k as f64 / (n - 1) as f64;
                let i = 100.0 * (-(q * 20.0).powi(2) / 3.0).exp() + 10.0;
                (q, i, 0.02 * i)
            })
            .collect();
        points(&rows)
    }

    #[test]
    fn posterior_mean_tracks_smooth_data() {
        let pts = guinier(30);
        let hp = Hyperparams { a: 0.0, b: 50.0, tau: 50.0, lambda: 0.05, sigma: 1.0 };
        let gp = GaussianProcess::new(&pts, 10, hp).unwrap();
        for p in &pts {
            let est = gp.evaluate(p.q);
            assert!((est.mean - p.i).abs() < 3.0 * p.err + 0.5, "q={} {} vs {}", p.q, est.mean, p.i);
            assert!(est.err >= 0.0 && est.err < hp.tau);
        }
        // Far from the data the prior takes over.
        let far = gp.evaluate(10.0);
        assert!((far.err - hp.tau).abs() < 1e-6);
        assert!((far.mean - linear_mean(10.0, hp.a, hp.b)).abs() < 1e-6);
    }

    #[test]
    fn repeated_coordinates_are_allowed() {
        let pts = points(&[(0.1, 5.0, 0.5), (0.1, 5.2, 0.5), (0.2, 4.0, 0.4)]);
        let gp = GaussianProcess::new(&pts, 10, Hyperparams::default()).unwrap();
        assert!(gp.evaluate(0.1).mean.is_finite());
    }

    #[test]
    fn zero_noise_duplicates_are_degenerate() {
        let pts = points(&[(0.1, 5.0, 0.0), (0.1, 5.2, 0.0)]);
        let err = GaussianProcess::new(&pts, 10, Hyperparams::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DegenerateInput);
    }

    #[test]
    fn profiled_mean_recovers_a_line() {
        let rows: Vec<(f64, f64, f64)> = (0..20)
            .map(|k| {
                let q = 0.01 * k as f64;
                (q, -30.0 * q + 8.0, 0.01)
            })
            .collect();
        let pts = points(&rows);
        let post = neg_log_posterior(&pts, 10, 1.0, 0.001, 1.0).unwrap();
        assert!((post.a + 30.0).abs() < 1e-3, "a={}", post.a);
        assert!((post.b - 8.0).abs() < 1e-4, "b={}", post.b);
    }

    #[test]
    fn empty_points_cannot_build() {
        assert!(GaussianProcess::new(&[], 10, Hyperparams::default()).is_err());
    }
}
