//! Stage 4: keep points that agree with the earliest profile able to vouch for them.
//!
//! For a valid point of profile `i` at `q`, the reference is the first of
//! profiles `0..=i` whose `agood` is true at `q`. A profile that is its own
//! reference keeps the point; otherwise both rescaled means are compared with
//! Welch's test.

use crate::domain::ClassificationOptions;
use crate::error::MergeError;
use crate::math::welch_two_sample;
use crate::profile::{FlagKind, FlagValue, Profile, names};

/// Flags written by this stage, with their kinds.
pub const FLAGS: [(&str, FlagKind); 5] = [
    (names::DREFNUM, FlagKind::Int),
    (names::DREFNAME, FlagKind::Str),
    (names::DGOOD, FlagKind::Bool),
    (names::DSELFREF, FlagKind::Bool),
    (names::DPVALUE, FlagKind::Float),
];

struct Verdict {
    refnum: i64,
    refname: String,
    good: bool,
    selfref: bool,
    pvalue: f64,
}

impl Verdict {
    /// Stamped on points that did not pass cleanup.
    fn skipped() -> Self {
        Self {
            refnum: -1,
            refname: String::new(),
            good: false,
            selfref: false,
            pvalue: -1.0,
        }
    }
}

pub fn run(mut profiles: Vec<Profile>, opts: &ClassificationOptions) -> Result<Vec<Profile>, MergeError> {
    log::info!("4. classification");
    for i in 0..profiles.len() {
        let verdicts = classify(&profiles[..=i], opts)?;
        let profile = &mut profiles[i];
        for (name, kind) in FLAGS {
            profile.declare_flag(name, kind)?;
        }
        let mut kept = 0;
        for (id, v) in verdicts.into_iter().enumerate() {
            kept += usize::from(v.good);
            profile.set_flag(id, names::DREFNUM, v.refnum)?;
            profile.set_flag(id, names::DREFNAME, v.refname)?;
            profile.set_flag(id, names::DGOOD, v.good)?;
            profile.set_flag(id, names::DSELFREF, v.selfref)?;
            profile.set_flag(id, names::DPVALUE, v.pvalue)?;
        }
        for name in [names::DREFNUM, names::DREFNAME, names::DSELFREF, names::DGOOD] {
            profile.rebuild_intervals(name)?;
        }
        log::debug!("   {}: {} of {} points kept", profile.name(), kept, profile.len());
    }
    Ok(profiles)
}

/// Verdicts for every point of the last profile in `upto`.
fn classify(upto: &[Profile], opts: &ClassificationOptions) -> Result<Vec<Verdict>, MergeError> {
    let Some((profile, earlier)) = upto.split_last() else {
        return Ok(Vec::new());
    };
    if profile.interpolant().is_none() {
        return Err(MergeError::MissingInterpolant(profile.name().to_string()));
    }

    let mut verdicts = Vec::with_capacity(profile.len());
    for p in profile.points() {
        if !matches!(profile.flag(p.id, names::AGOOD)?, Some(FlagValue::Bool(true))) {
            verdicts.push(Verdict::skipped());
            continue;
        }

        let mut reference = None;
        for (k, candidate) in earlier.iter().enumerate() {
            if candidate.flag_at(p.q, names::AGOOD)? == Some(&FlagValue::Bool(true)) {
                reference = Some((k, candidate));
                break;
            }
        }

        let verdict = match reference {
            None => Verdict {
                refnum: earlier.len() as i64,
                refname: profile.name().to_string(),
                good: true,
                selfref: true,
                pvalue: 1.0,
            },
            Some((k, other)) => {
                let mine = profile.mean(&[p.q])?[0];
                let theirs = other.mean(&[p.q])?[0];
                let test = welch_two_sample(mine.i, mine.err, profile.n_reps(), theirs.i, theirs.err, other.n_reps())
                    .map_err(|e| match e {
                        MergeError::DegenerateInput(msg) => MergeError::DegenerateInput(format!(
                            "{} vs {} at q={}: {msg}",
                            profile.name(),
                            other.name(),
                            p.q
                        )),
                        other => other,
                    })?;
                Verdict {
                    refnum: k as i64,
                    refname: other.name().to_string(),
                    good: test.pvalue >= opts.alpha,
                    selfref: false,
                    pvalue: test.pvalue,
                }
            }
        };
        verdicts.push(verdict);
    }
    Ok(verdicts)
}
