//! Least squares solver.
//!
//! The GP engine profiles the mean parameters `(a, b)` out of the objective:
//! for fixed covariance parameters the best `(a, b)` is a generalized least
//! squares problem. After whitening with the Cholesky factor of the
//! covariance it becomes an ordinary least squares problem:
//!
//! ```text
//! minimize ‖L⁻¹y - L⁻¹X β‖²
//! ```
//!
//! Implementation choices:
//! - We solve with SVD so tall or rank-deficient designs (a single point,
//!   repeated coordinates) still give a finite answer.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_handles_single_row() {
        let x = DMatrix::from_row_slice(1, 2, &[0.5, 1.0]);
        let y = DVector::from_row_slice(&[4.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((0.5 * beta[0] + beta[1] - 4.0).abs() < 1e-9);
    }
}
