//! Shared merge pipeline used by the CLI and the tests.
//!
//! load -> cleanup -> fitting -> rescaling -> classification -> merging -> outputs

use crate::domain::MergeConfig;
use crate::error::{AppError, MergeError};
use crate::fit::engine::{GpEngine, RegressionEngine};
use crate::io::ingest::load_profiles;
use crate::profile::Profile;
use crate::stages::{classification, cleanup, fitting, merging, rescaling};

/// All computed outputs of a single merge run.
#[derive(Debug, Clone)]
pub struct MergeRun {
    /// Input profiles that went through every stage, in input order.
    pub profiles: Vec<Profile>,
    pub merged: Profile,
    /// Profiles dropped by cleanup (no valid point).
    pub discarded: Vec<Profile>,
}

/// Load the configured inputs and run the pipeline with the GP engine.
pub fn run_merge(config: &MergeConfig) -> Result<MergeRun, AppError> {
    let profiles = load_profiles(&config.inputs)?
        .into_iter()
        .map(|ingested| ingested.profile)
        .collect();
    Ok(run_merge_with_profiles(config, profiles, &GpEngine::default())?)
}

/// Run every stage on already loaded profiles.
pub fn run_merge_with_profiles(
    config: &MergeConfig,
    profiles: Vec<Profile>,
    engine: &dyn RegressionEngine,
) -> Result<MergeRun, MergeError> {
    let cleaned = cleanup::run(profiles, &config.cleanup)?;
    let fitted = fitting::run(cleaned.kept, engine, &config.initial, &config.fit_schedule)?;
    let rescaled = rescaling::run(fitted, &config.rescaling)?;
    let classified = classification::run(rescaled, &config.classification)?;

    let warm = merging::warm_start(&classified, config.rescaling.reference)?;
    let merged = merging::run(
        &classified,
        &config.output.merge_name,
        engine,
        &warm,
        &config.merging,
    )?;

    Ok(MergeRun {
        profiles: classified,
        merged,
        discarded: cleaned.discarded,
    })
}

/// Write the data/mean files, the summary and the optional JSON export.
pub fn write_outputs(run: &MergeRun, config: &MergeConfig) -> Result<(), AppError> {
    let opts = &config.output;
    crate::io::export::write_merge_outputs(&run.merged, &run.profiles, opts)?;

    let summary_path = opts.dest_dir.join(&opts.summary_name);
    let summary = crate::report::format_summary(run, config)?;
    std::fs::write(&summary_path, summary).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to write summary '{}': {e}", summary_path.display()),
        )
    })?;

    if let Some(path) = &opts.export_json {
        let curve = crate::io::curve::build_curve(&run.merged, &run.profiles, opts.mean_points)?;
        crate::io::curve::write_curve_json(path, &curve)?;
    }
    Ok(())
}
