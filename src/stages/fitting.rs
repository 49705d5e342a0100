//! Stage 2: fit a regression model to each profile's valid points.
//!
//! Profiles are independent here, so they are fitted in parallel.

use rayon::prelude::*;

use crate::domain::{Hyperparams, Schedule};
use crate::error::MergeError;
use crate::fit::engine::RegressionEngine;
use crate::fit::schedule::fit_with_schedule;
use crate::profile::{Point, Profile, names};

pub fn run(
    profiles: Vec<Profile>,
    engine: &dyn RegressionEngine,
    init: &Hyperparams,
    schedule: &Schedule,
) -> Result<Vec<Profile>, MergeError> {
    log::info!("2. fitting ({} profiles)", profiles.len());
    profiles
        .into_par_iter()
        .map(|p| fit_profile(p, &[names::AGOOD], engine, init, schedule))
        .collect()
}

/// Fit `profile` on the points passing `filter` and attach the model.
pub fn fit_profile(
    profile: Profile,
    filter: &[&str],
    engine: &dyn RegressionEngine,
    init: &Hyperparams,
    schedule: &Schedule,
) -> Result<Profile, MergeError> {
    let points = sorted_by_q(profile.data(filter)?);
    let model = fit_with_schedule(engine, &points, profile.n_reps(), init, schedule).map_err(|e| match e {
        MergeError::DegenerateInput(msg) => MergeError::DegenerateInput(format!("{}: {msg}", profile.name())),
        other => other,
    })?;
    let hp = model.hyperparams();
    log::debug!(
        "   {}: a={:.4} b={:.4} tau={:.4} lambda={:.5} sigma={:.4}",
        profile.name(),
        hp.a,
        hp.b,
        hp.tau,
        hp.lambda,
        hp.sigma
    );
    Ok(profile.with_interpolant(model))
}

fn sorted_by_q(mut points: Vec<Point>) -> Vec<Point> {
    points.sort_by(|a, b| a.q.total_cmp(&b.q));
    points
}
