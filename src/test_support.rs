//! Deterministic engines for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::Hyperparams;
use crate::error::MergeError;
use crate::fit::engine::{Estimate, Interpolant, RegressionEngine};
use crate::profile::{Point, Profile};

/// Piecewise-linear interpolation of the data (mean and err), flat outside.
#[derive(Debug, Clone)]
pub struct LinearInterpolant {
    nodes: Vec<(f64, f64, f64)>,
    hp: Hyperparams,
}

impl Interpolant for LinearInterpolant {
    fn evaluate(&self, q: f64) -> Estimate {
        let nodes = &self.nodes;
        let (first, last) = (nodes[0], nodes[nodes.len() - 1]);
        if q <= first.0 {
            return Estimate { mean: first.1, err: first.2 };
        }
        if q >= last.0 {
            return Estimate { mean: last.1, err: last.2 };
        }
        let k = nodes.partition_point(|n| n.0 <= q);
        let (lo, hi) = (nodes[k - 1], nodes[k]);
        let t = (q - lo.0) / (hi.0 - lo.0);
        Estimate {
            mean: lo.1 + t * (hi.1 - lo.1),
            err: lo.2 + t * (hi.2 - lo.2),
        }
    }

    fn hyperparams(&self) -> Hyperparams {
        self.hp
    }
}

/// Returns `init` from `fit` and a [`LinearInterpolant`] from `build`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearEngine;

impl RegressionEngine for LinearEngine {
    fn fit(&self, _points: &[Point], _n_reps: u32, init: &Hyperparams, _iterations: usize) -> Result<Hyperparams, MergeError> {
        Ok(*init)
    }

    fn build(&self, points: &[Point], _n_reps: u32, hp: &Hyperparams) -> Result<Arc<dyn Interpolant>, MergeError> {
        if points.is_empty() {
            return Err(MergeError::DegenerateInput("no points".to_string()));
        }
        let mut nodes: Vec<(f64, f64, f64)> = points.iter().map(|p| (p.q, p.i, p.err)).collect();
        nodes.sort_by(|a, b| a.0.total_cmp(&b.0));
        nodes.dedup_by(|a, b| a.0 == b.0);
        Ok(Arc::new(LinearInterpolant { nodes, hp: *hp }))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FitCall {
    pub n_points: usize,
    pub init: Hyperparams,
    pub iterations: usize,
}

/// Records every `fit` call; each fit returns `init` with `tau + 1`.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<FitCall>>,
    built: AtomicUsize,
}

impl RecordingEngine {
    pub fn calls(&self) -> Vec<FitCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Point count of the last `build`.
    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }
}

impl RegressionEngine for RecordingEngine {
    fn fit(&self, points: &[Point], _n_reps: u32, init: &Hyperparams, iterations: usize) -> Result<Hyperparams, MergeError> {
        self.calls.lock().unwrap().push(FitCall {
            n_points: points.len(),
            init: *init,
            iterations,
        });
        Ok(Hyperparams { tau: init.tau + 1.0, ..*init })
    }

    fn build(&self, points: &[Point], n_reps: u32, hp: &Hyperparams) -> Result<Arc<dyn Interpolant>, MergeError> {
        self.built.store(points.len(), Ordering::SeqCst);
        LinearEngine.build(points, n_reps, hp)
    }
}

/// Profile with a linear interpolant through its own points.
pub fn fitted(name: &str, n_reps: u32, rows: &[(f64, f64, f64)]) -> Profile {
    let p = Profile::new(name, n_reps, rows).unwrap();
    let model = LinearEngine.build(p.points(), n_reps, &Hyperparams::default()).unwrap();
    p.with_interpolant(model)
}
