//! Coarse-to-fine fitting driver.
//!
//! Each schedule step fits on every `stride`-th point, warm-started from the
//! previous step's hyperparameters. The final model is built on all points.

use std::sync::Arc;

use crate::domain::{Hyperparams, Schedule};
use crate::error::MergeError;
use crate::fit::engine::{Interpolant, RegressionEngine};
use crate::profile::Point;

/// Run `schedule` on `points` (given in increasing `q`) and build the final model.
pub fn fit_with_schedule(
    engine: &dyn RegressionEngine,
    points: &[Point],
    n_reps: u32,
    init: &Hyperparams,
    schedule: &Schedule,
) -> Result<Arc<dyn Interpolant>, MergeError> {
    if points.is_empty() {
        return Err(MergeError::DegenerateInput("no valid points to fit".to_string()));
    }

    let mut hp = *init;
    for step in schedule.steps() {
        let subset: Vec<Point> = points.iter().step_by(step.stride).copied().collect();
        log::trace!(
            "schedule step {}:{} on {} of {} points",
            step.stride,
            step.iterations,
            subset.len(),
            points.len()
        );
        hp = engine.fit(&subset, n_reps, &hp, step.iterations)?;
    }
    engine.build(points, n_reps, &hp)
}
