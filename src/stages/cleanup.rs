//! Stage 1: discard points whose signal is not significantly above zero.
//!
//! Points are visited in increasing `q`. Once an invalid point is seen at
//! `q >= q_cutoff`, every later point of that profile is invalid too.

use crate::domain::CleanupOptions;
use crate::error::MergeError;
use crate::math::one_sample_right_tailed;
use crate::profile::{FlagKind, Profile, names};

/// Profiles after cleanup.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub kept: Vec<Profile>,
    /// Profiles left without a single valid point.
    pub discarded: Vec<Profile>,
}

pub fn run(profiles: Vec<Profile>, opts: &CleanupOptions) -> Result<Cleaned, MergeError> {
    log::info!("1. cleanup");
    let mut kept = Vec::with_capacity(profiles.len());
    let mut discarded = Vec::new();

    for profile in profiles {
        let profile = annotate(profile, opts)?;
        let valid = profile.data(&[names::AGOOD])?.len();
        log::debug!("   {}: {} of {} points pass", profile.name(), valid, profile.len());
        if valid == 0 {
            log::warn!("discarding {}: no point passes cleanup", profile.name());
            discarded.push(profile);
        } else {
            kept.push(profile);
        }
    }

    if kept.is_empty() {
        return Err(MergeError::DegenerateInput(
            "no profile has a valid point after cleanup".to_string(),
        ));
    }
    Ok(Cleaned { kept, discarded })
}

/// Set `agood`/`apvalue` on every point and rebuild the `agood` intervals.
pub fn annotate(mut profile: Profile, opts: &CleanupOptions) -> Result<Profile, MergeError> {
    profile.declare_flag(names::AGOOD, FlagKind::Bool)?;
    profile.declare_flag(names::APVALUE, FlagKind::Float)?;

    let n_reps = profile.n_reps();
    let mut cascade = false;
    for id in profile.order_by_q() {
        let p = profile.points()[id];
        if p.err == 0.0 {
            profile.set_flag(id, names::AGOOD, false)?;
            profile.set_flag(id, names::APVALUE, -1.0)?;
            continue;
        }
        let test = one_sample_right_tailed(p.i, p.err, n_reps)?;
        let valid = !cascade && test.pvalue <= opts.alpha;
        if !valid && p.q >= opts.q_cutoff {
            cascade = true;
        }
        profile.set_flag(id, names::AGOOD, valid)?;
        profile.set_flag(id, names::APVALUE, test.pvalue)?;
    }

    profile.rebuild_intervals(names::AGOOD)?;
    Ok(profile)
}
