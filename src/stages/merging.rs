//! Stage 5: pool the surviving points of every profile and fit them together.
//!
//! Rows are appended profile by profile (input order), each profile's rows in
//! coordinate order; the merged profile is not re-sorted.

use crate::domain::{Hyperparams, MergingOptions, Reference};
use crate::error::MergeError;
use crate::fit::engine::RegressionEngine;
use crate::profile::{FlagKind, Interval, Intervals, Profile, names};
use crate::stages::fitting::fit_profile;

/// Flags every input profile must carry, with their kinds.
const REQUIRED: [(&str, FlagKind); 4] = [
    (names::DGOOD, FlagKind::Bool),
    (names::DSELFREF, FlagKind::Bool),
    (names::DREFNUM, FlagKind::Int),
    (names::DREFNAME, FlagKind::Str),
];

/// Flags of the merged profile, in column order.
pub const MERGED_FLAGS: [(&str, FlagKind); 6] = [
    (names::DSELFREF, FlagKind::Bool),
    (names::DREFNUM, FlagKind::Int),
    (names::DREFNAME, FlagKind::Str),
    (names::EORIGIN, FlagKind::Int),
    (names::EORINAME, FlagKind::Str),
    (names::EEXTRAPOL, FlagKind::Bool),
];

/// Hyperparameters of the gamma reference profile, used to warm-start the merged fit.
pub fn warm_start(profiles: &[Profile], reference: Reference) -> Result<Hyperparams, MergeError> {
    let idx = reference
        .index(profiles.len())
        .ok_or_else(|| MergeError::DegenerateInput("no profiles to merge".to_string()))?;
    let profile = &profiles[idx];
    profile
        .hyperparams()
        .ok_or_else(|| MergeError::MissingInterpolant(profile.name().to_string()))
}

pub fn run(
    profiles: &[Profile],
    name: &str,
    engine: &dyn RegressionEngine,
    warm_start: &Hyperparams,
    opts: &MergingOptions,
) -> Result<Profile, MergeError> {
    log::info!("5. merging");
    check_schema(profiles)?;
    let mut merged = collect(profiles, name)?;

    let categorical: Vec<String> = merged
        .flag_columns()
        .iter()
        .filter(|c| c.kind != FlagKind::Float)
        .map(|c| c.name.clone())
        .collect();
    for flag in &categorical {
        merged.rebuild_intervals(flag)?;
    }
    let domain = extrapolation_domain(&merged, opts);
    merged.set_intervals(names::EEXTRAPOL, domain)?;

    log::info!("   fitting {} merged points", merged.len());
    fit_profile(merged, &[], engine, warm_start, &opts.schedule)
}

fn check_schema(profiles: &[Profile]) -> Result<(), MergeError> {
    for profile in profiles {
        for (flag, expected) in REQUIRED {
            match profile.flag_kind(flag) {
                None => {
                    return Err(MergeError::MissingFlag {
                        profile: profile.name().to_string(),
                        flag: flag.to_string(),
                    });
                }
                Some(found) if found != expected => {
                    return Err(MergeError::SchemaMismatch {
                        profile: profile.name().to_string(),
                        flag: flag.to_string(),
                        expected: expected.name(),
                        found: found.name(),
                    });
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

fn collect(profiles: &[Profile], name: &str) -> Result<Profile, MergeError> {
    let n_reps = profiles
        .iter()
        .map(Profile::n_reps)
        .min()
        .ok_or_else(|| MergeError::DegenerateInput("no profiles to merge".to_string()))?;
    let mut merged = Profile::empty(name, n_reps)?;
    for (flag, kind) in MERGED_FLAGS {
        merged.declare_flag(flag, kind)?;
    }

    for (origin, profile) in profiles.iter().enumerate() {
        let rows = profile.data(&[names::DGOOD])?;
        log::debug!("   {}: {} points", profile.name(), rows.len());
        for row in rows {
            let id = merged.push_point(row.q, row.i, row.err);
            for flag in [names::DSELFREF, names::DREFNUM, names::DREFNAME] {
                let value = profile
                    .flag(row.id, flag)?
                    .cloned()
                    .ok_or_else(|| MergeError::IncompleteFlag {
                        profile: profile.name().to_string(),
                        flag: flag.to_string(),
                        id: row.id,
                    })?;
                merged.set_flag(id, flag, value)?;
            }
            merged.set_flag(id, names::EORIGIN, origin as i64)?;
            merged.set_flag(id, names::EORINAME, profile.name())?;
            merged.set_flag(id, names::EEXTRAPOL, false)?;
        }
    }

    if merged.is_empty() {
        return Err(MergeError::DegenerateInput(
            "no point survived classification".to_string(),
        ));
    }
    Ok(merged)
}

/// `false` on the observed range, `true` below it and, if requested, above it.
fn extrapolation_domain(merged: &Profile, opts: &MergingOptions) -> Intervals {
    let (lo, hi) = merged
        .points()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.q), hi.max(p.q)));

    let mut domain = Intervals::default();
    domain.push(Interval {
        start: lo,
        end: hi,
        value: false.into(),
        end_inclusive: true,
    });
    if opts.no_extrapolate {
        return domain;
    }
    if lo > 0.0 {
        domain.push(Interval {
            start: 0.0,
            end: lo,
            value: true.into(),
            end_inclusive: false,
        });
    }
    if opts.extrapolate_pct > 0.0 {
        domain.push(Interval {
            start: hi,
            end: hi * (1.0 + opts.extrapolate_pct / 100.0),
            value: true.into(),
            end_inclusive: true,
        });
    }
    domain
}
