//! Mean and covariance functions of the Gaussian Process.
//!
//! - mean: `m(q) = a·q + b`
//! - covariance: `w(q1, q2) = tau² · exp(-½ (|q1 - q2| / lambda)²)`
//!
//! The covariance is the squared-exponential kernel; `tau` is the amplitude
//! and `lambda` the length scale (both strictly positive).

/// Linear mean function.
pub fn linear_mean(q: f64, a: f64, b: f64) -> f64 {
    a * q + b
}

/// Squared-exponential covariance.
pub fn sq_exp_covariance(q1: f64, q2: f64, tau: f64, lambda: f64) -> f64 {
    let x = (q1 - q2) / lambda;
    tau * tau * (-0.5 * x * x).exp()
}
