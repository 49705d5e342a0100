//! Stage 3: put every profile on a common intensity scale.
//!
//! Two roles are involved and they are configured independently:
//!
//! - the *pivot* is the profile every other one is compared with, over the
//!   range where both are valid (`cgood`)
//! - the *reference* is the profile whose gamma is normalized to exactly 1
//!
//! Gamma is estimated on `num_points` coordinates spread over the `cgood`
//! intervals, proportionally to their length.

use crate::domain::{GammaModel, RescalingOptions};
use crate::error::MergeError;
use crate::profile::{FlagKind, FlagValue, MeanPoint, Profile, names};

pub fn run(mut profiles: Vec<Profile>, opts: &RescalingOptions) -> Result<Vec<Profile>, MergeError> {
    log::info!("3. rescaling");
    let n = profiles.len();
    let (Some(pivot), Some(reference)) = (opts.pivot.index(n), opts.reference.index(n)) else {
        return Err(MergeError::DegenerateInput("no profiles to rescale".to_string()));
    };
    log::debug!(
        "   pivot: {}, reference: {}",
        profiles[pivot].name(),
        profiles[reference].name()
    );

    mark_overlap(&mut profiles, pivot)?;

    let raw = profiles
        .iter()
        .map(|p| raw_gamma(p, &profiles[pivot], opts))
        .collect::<Result<Vec<f64>, MergeError>>()?;

    let gamma_ref = raw[reference];
    profiles
        .into_iter()
        .zip(raw)
        .map(|(p, g)| {
            let gamma = g / gamma_ref;
            if !gamma.is_finite() || gamma <= 0.0 {
                return Err(MergeError::DegenerateInput(format!(
                    "{}: gamma is {gamma} after normalization",
                    p.name()
                )));
            }
            log::debug!("   {}: gamma = {gamma:.6}", p.name());
            Ok(p.with_gamma(gamma))
        })
        .collect()
}

/// Set `cgood` on every profile against `profiles[pivot]` and rebuild its intervals.
fn mark_overlap(profiles: &mut [Profile], pivot: usize) -> Result<(), MergeError> {
    for i in 0..profiles.len() {
        let cgood = overlap(&profiles[i], &profiles[pivot])?;
        let profile = &mut profiles[i];
        profile.declare_flag(names::CGOOD, FlagKind::Bool)?;
        for (id, good) in cgood.into_iter().enumerate() {
            profile.set_flag(id, names::CGOOD, good)?;
        }
        profile.rebuild_intervals(names::CGOOD)?;
    }
    Ok(())
}

/// `agood(P) AND agood(pivot at q)` for every point of `profile`.
///
/// A coordinate outside every interval of the pivot counts as not valid.
/// This is stricter than treating an uncovered coordinate as valid: only
/// the range both profiles cover is kept.
fn overlap(profile: &Profile, pivot: &Profile) -> Result<Vec<bool>, MergeError> {
    profile
        .points()
        .iter()
        .map(|p| {
            let own = matches!(profile.flag(p.id, names::AGOOD)?, Some(FlagValue::Bool(true)));
            let other = pivot.flag_at_or(p.q, names::AGOOD, FlagValue::Bool(false))? == FlagValue::Bool(true);
            Ok(own && other)
        })
        .collect()
}

/// Coordinates spread over the `cgood == true` intervals of `profile`.
pub fn sample_coordinates(profile: &Profile, num_points: usize) -> Result<Vec<f64>, MergeError> {
    let good: Vec<(f64, f64)> = profile
        .intervals(names::CGOOD)?
        .iter()
        .filter(|iv| iv.value == FlagValue::Bool(true))
        .map(|iv| (iv.start, iv.len()))
        .collect();
    let total: f64 = good.iter().map(|(_, len)| len).sum();
    if !(total > 0.0) {
        return Ok(Vec::new());
    }

    let mut qs = Vec::with_capacity(num_points);
    for (start, len) in good {
        let count = (len / total * num_points as f64).round() as usize;
        if count <= 1 {
            continue;
        }
        qs.extend((0..count).map(|i| start + i as f64 / (count - 1) as f64 * len));
    }
    Ok(qs)
}

fn raw_gamma(profile: &Profile, pivot: &Profile, opts: &RescalingOptions) -> Result<f64, MergeError> {
    let qs = sample_coordinates(profile, opts.num_points)?;
    if qs.is_empty() {
        return Err(MergeError::DegenerateInput(format!(
            "{}: no overlap with {} to estimate gamma",
            profile.name(),
            pivot.name()
        )));
    }
    let own = profile.mean(&qs)?;
    let other = pivot.mean(&qs)?;
    let gamma = match opts.model {
        GammaModel::Lognormal => gamma_lognormal(&other, &own),
        GammaModel::Normal => gamma_normal(&other, &own),
    }
    .map_err(|msg| MergeError::DegenerateInput(format!("{}: {msg}", profile.name())))?;
    log::trace!("   {}: raw gamma {gamma:.6} on {} samples", profile.name(), qs.len());
    Ok(gamma)
}

/// `exp` of the weighted mean of `ln(I_ref / I)`, weights `(err_ref/I_ref + err/I)^-2`.
pub fn gamma_lognormal(reference: &[MeanPoint], data: &[MeanPoint]) -> Result<f64, String> {
    let mut num = 0.0;
    let mut den = 0.0;
    for (r, d) in reference.iter().zip(data) {
        if r.i <= 0.0 || d.i <= 0.0 {
            return Err(format!("non-positive intensity at q={} (lognormal model)", d.q));
        }
        let w = (r.err / r.i + d.err / d.i).powi(-2);
        num += w * (r.i / d.i).ln();
        den += w;
    }
    finish(num, den).map(f64::exp)
}

/// Weighted mean of `I_ref / I`, weights `(err_ref² + err²)^-1`.
pub fn gamma_normal(reference: &[MeanPoint], data: &[MeanPoint]) -> Result<f64, String> {
    let mut num = 0.0;
    let mut den = 0.0;
    for (r, d) in reference.iter().zip(data) {
        let w = (r.err * r.err + d.err * d.err).recip();
        num += w * r.i / d.i;
        den += w;
    }
    finish(num, den)
}

fn finish(num: f64, den: f64) -> Result<f64, String> {
    let value = num / den;
    if den == 0.0 || !den.is_finite() || !value.is_finite() {
        return Err(format!("weighted mean is undefined (sum={num}, weights={den})"));
    }
    Ok(value)
}
