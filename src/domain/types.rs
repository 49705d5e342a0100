//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - parsed from CLI flags
//! - passed between pipeline stages
//! - exported alongside the merged curve (JSON)

use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::MergeError;

/// Which input profile (by input order) fills a role in rescaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Reference {
    First,
    Last,
}

impl Reference {
    /// Resolve to an index into a list of `len` profiles.
    pub fn index(self, len: usize) -> Option<usize> {
        match (self, len) {
            (_, 0) => None,
            (Reference::First, _) => Some(0),
            (Reference::Last, n) => Some(n - 1),
        }
    }
}

/// Noise model used to estimate the calibration factor `gamma`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GammaModel {
    /// Weighted mean of `log(I_ref / I)` with weights `(err_ref/I_ref + err/I)^-2`.
    Lognormal,
    /// Weighted mean of `I_ref / I` with weights `(err_ref² + err²)^-1`.
    Normal,
}

/// Column set written to the merged output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputLevel {
    /// `q I err` only.
    Sparse,
    /// Adds the origin columns (and `eextrapol` for the mean curve).
    Normal,
    /// Every flag.
    Full,
}

/// Hyperparameters of the regression model.
///
/// - mean function: `a·q + b`
/// - covariance: amplitude `tau`, length scale `lambda`
/// - noise scale `sigma`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparams {
    pub a: f64,
    pub b: f64,
    pub tau: f64,
    pub lambda: f64,
    pub sigma: f64,
}

impl Default for Hyperparams {
    fn default() -> Self {
        Self {
            a: -100.0,
            b: 10.0,
            tau: 10.0,
            lambda: 0.05,
            sigma: 10.0,
        }
    }
}

impl Hyperparams {
    /// `(name, value)` pairs in alphabetical order (for reports).
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("a", self.a),
            ("b", self.b),
            ("lambda", self.lambda),
            ("sigma", self.sigma),
            ("tau", self.tau),
        ]
    }
}

/// One step of an annealed fitting schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStep {
    /// Use every `stride`-th valid point.
    pub stride: usize,
    /// Optimizer iterations for this step.
    pub iterations: usize,
}

/// Coarse-to-fine fitting schedule, e.g. `10:10000/5:1000/1:100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule(pub Vec<ScheduleStep>);

impl Schedule {
    pub fn steps(&self) -> &[ScheduleStep] {
        &self.0
    }
}

impl FromStr for Schedule {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut steps = Vec::new();
        for token in s.split('/').map(str::trim).filter(|t| !t.is_empty()) {
            let (stride, iterations) = token.split_once(':').ok_or_else(|| {
                MergeError::InvalidInput(format!(
                    "schedule step '{token}' must look like STRIDE:ITERATIONS"
                ))
            })?;
            let stride: usize = stride.trim().parse().map_err(|_| {
                MergeError::InvalidInput(format!("invalid stride in schedule step '{token}'"))
            })?;
            let iterations: usize = iterations.trim().parse().map_err(|_| {
                MergeError::InvalidInput(format!("invalid iteration count in schedule step '{token}'"))
            })?;
            if stride == 0 || iterations == 0 {
                return Err(MergeError::InvalidInput(format!(
                    "schedule step '{token}': stride and iterations must be >= 1"
                )));
            }
            steps.push(ScheduleStep { stride, iterations });
        }
        if steps.is_empty() {
            return Err(MergeError::InvalidInput("empty fitting schedule".to_string()));
        }
        Ok(Schedule(steps))
    }
}

/// One input file and its repetition count (`path=N` on the command line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSpec {
    pub path: PathBuf,
    pub n_reps: u32,
}

#[derive(Debug, Clone)]
pub struct CleanupOptions {
    /// Type I error of the one-sample test.
    pub alpha: f64,
    /// Once a point at `q >= q_cutoff` is discarded, the rest of the curve is too.
    pub q_cutoff: f64,
}

#[derive(Debug, Clone)]
pub struct RescalingOptions {
    /// Profile whose gamma is normalized to 1.
    pub reference: Reference,
    /// Profile used for the geometric overlap of every gamma estimate.
    pub pivot: Reference,
    pub model: GammaModel,
    /// Number of synthetic coordinates used for each gamma.
    pub num_points: usize,
}

#[derive(Debug, Clone)]
pub struct ClassificationOptions {
    pub alpha: f64,
}

#[derive(Debug, Clone)]
pub struct MergingOptions {
    pub schedule: Schedule,
    /// Extend the upper end of the domain by this many percent.
    pub extrapolate_pct: f64,
    /// Disable extrapolation entirely (also below the first point).
    pub no_extrapolate: bool,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub dest_dir: PathBuf,
    pub merge_name: String,
    pub summary_name: String,
    pub header: bool,
    pub level: OutputLevel,
    pub all_files: bool,
    /// Number of samples in the written mean curves.
    pub mean_points: usize,
    pub export_json: Option<PathBuf>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub inputs: Vec<ProfileSpec>,
    pub cleanup: CleanupOptions,
    pub initial: Hyperparams,
    pub fit_schedule: Schedule,
    pub rescaling: RescalingOptions,
    pub classification: ClassificationOptions,
    pub merging: MergingOptions,
    pub output: OutputOptions,
    /// The command line as given, echoed into the summary.
    pub command_line: String,
}

/// Portable JSON form of a merge result (`--export-json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub merge_name: String,
    pub n_reps: u32,
    pub n_points: usize,
    pub hyperparams: Hyperparams,
    pub profiles: Vec<CurveProfile>,
    pub grid: CurveGrid,
}

/// Per-input summary carried in a [`CurveFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveProfile {
    pub name: String,
    pub n_reps: u32,
    pub gamma: f64,
    pub hyperparams: Option<Hyperparams>,
    /// Points contributed to the merged profile.
    pub merged_points: usize,
}

/// Merged mean curve sampled on a grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub q: Vec<f64>,
    pub i: Vec<f64>,
    pub err: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_parses_default_string() {
        let s: Schedule = "10:10000/5:1000/1:100".parse().unwrap();
        assert_eq!(
            s.steps(),
            &[
                ScheduleStep { stride: 10, iterations: 10000 },
                ScheduleStep { stride: 5, iterations: 1000 },
                ScheduleStep { stride: 1, iterations: 100 },
            ]
        );
    }

    #[test]
    fn schedule_rejects_bad_steps() {
        assert!("10".parse::<Schedule>().is_err());
        assert!("0:10".parse::<Schedule>().is_err());
        assert!("5:x".parse::<Schedule>().is_err());
        assert!("".parse::<Schedule>().is_err());
    }

    #[test]
    fn reference_resolves_indices() {
        assert_eq!(Reference::First.index(3), Some(0));
        assert_eq!(Reference::Last.index(3), Some(2));
        assert_eq!(Reference::Last.index(0), None);
    }
}
