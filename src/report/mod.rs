//! Reporting: the summary file and terminal output.

pub mod format;

pub use format::*;

use crate::error::MergeError;
use crate::profile::{FlagValue, Profile, names};

/// Number of merged points contributed by each of `n_profiles` inputs.
pub fn origin_counts(merged: &Profile, n_profiles: usize) -> Result<Vec<usize>, MergeError> {
    let mut counts = vec![0; n_profiles];
    for id in 0..merged.len() {
        if let Some(FlagValue::Int(origin)) = merged.flag(id, names::EORIGIN)? {
            if let Some(slot) = usize::try_from(*origin).ok().and_then(|o| counts.get_mut(o)) {
                *slot += 1;
            }
        }
    }
    Ok(counts)
}

/// `(count, min q, max q)` of the points passing `filter`.
pub fn point_stats(profile: &Profile, filter: &[&str]) -> Result<(usize, Option<(f64, f64)>), MergeError> {
    let points = profile.data(filter)?;
    let range = points
        .iter()
        .map(|p| p.q)
        .fold(None, |acc: Option<(f64, f64)>, q| match acc {
            None => Some((q, q)),
            Some((lo, hi)) => Some((lo.min(q), hi.max(q))),
        });
    Ok((points.len(), range))
}
