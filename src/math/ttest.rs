//! Student's t tests used by Cleanup and Classification.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::MergeError;

/// Outcome of a t test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub pvalue: f64,
    pub t: f64,
    pub dof: f64,
}

/// Right-tailed one-sample test of "mean > 0".
///
/// `stderr` is the error of a single measurement; the statistic is
/// `mean / sqrt(stderr² / n)` with `n - 1` degrees of freedom.
pub fn one_sample_right_tailed(mean: f64, stderr: f64, n: u32) -> Result<TTest, MergeError> {
    if n < 2 {
        return Err(MergeError::DegenerateInput(format!(
            "one-sample t test needs n >= 2 (got {n})"
        )));
    }
    let variance = stderr * stderr / n as f64;
    if !(variance > 0.0) || !mean.is_finite() {
        return Err(MergeError::DegenerateInput(format!(
            "one-sample t test on mean={mean}, stderr={stderr}"
        )));
    }
    let t = mean / variance.sqrt();
    let dof = (n - 1) as f64;
    let pvalue = survival(t, dof)?;
    Ok(TTest { pvalue, t, dof })
}

/// Two-sided Welch test of "mean1 == mean2" with unequal variances.
pub fn welch_two_sample(
    mean1: f64,
    err1: f64,
    n1: u32,
    mean2: f64,
    err2: f64,
    n2: u32,
) -> Result<TTest, MergeError> {
    if n1 < 2 || n2 < 2 {
        return Err(MergeError::DegenerateInput(format!(
            "Welch t test needs n >= 2 on both sides (got {n1} and {n2})"
        )));
    }
    let v1 = err1 * err1 / n1 as f64;
    let v2 = err2 * err2 / n2 as f64;
    let pooled = v1 + v2;
    if !(pooled > 0.0) || !pooled.is_finite() || !(mean1 - mean2).is_finite() {
        return Err(MergeError::DegenerateInput(format!(
            "Welch t test on ({mean1} ± {err1}) vs ({mean2} ± {err2})"
        )));
    }
    let t = (mean1 - mean2) / pooled.sqrt();
    let dof = pooled * pooled / (v1 * v1 / (n1 - 1) as f64 + v2 * v2 / (n2 - 1) as f64);
    let pvalue = (2.0 * survival(t.abs(), dof)?).min(1.0);
    Ok(TTest { pvalue, t, dof })
}

fn survival(t: f64, dof: f64) -> Result<f64, MergeError> {
    if !dof.is_finite() || dof <= 0.0 {
        return Err(MergeError::DegenerateInput(format!("t distribution with dof={dof}")));
    }
    let dist = StudentsT::new(0.0, 1.0, dof)
        .map_err(|e| MergeError::DegenerateInput(format!("t distribution with dof={dof}: {e}")))?;
    Ok(dist.sf(t))
}
