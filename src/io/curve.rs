//! Merged-curve JSON export.
//!
//! The JSON carries the merged hyperparameters, one summary per input profile
//! and the merged mean curve sampled on a grid. The schema is
//! `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveFile, CurveGrid, CurveProfile};
use crate::error::AppError;
use crate::io::export::linspace;
use crate::profile::{Profile, names};
use crate::report::origin_counts;

/// Build the JSON document for a merge result.
pub fn build_curve(merged: &Profile, profiles: &[Profile], grid_points: usize) -> Result<CurveFile, AppError> {
    let hyperparams = merged
        .hyperparams()
        .ok_or_else(|| AppError::new(4, format!("Merged profile '{}' has not been fitted.", merged.name())))?;

    let domain = merged.intervals(names::EEXTRAPOL)?;
    let (lo, hi) = match (domain.min_start(), domain.max_end()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Err(AppError::new(3, "Merged profile has an empty domain.")),
    };
    let mean = merged.mean(&linspace(lo, hi, grid_points.max(2)))?;

    let counts = origin_counts(merged, profiles.len())?;
    let summaries = profiles
        .iter()
        .zip(counts)
        .map(|(p, merged_points)| CurveProfile {
            name: p.name().to_string(),
            n_reps: p.n_reps(),
            gamma: p.gamma(),
            hyperparams: p.hyperparams(),
            merged_points,
        })
        .collect();

    Ok(CurveFile {
        tool: env!("CARGO_PKG_NAME").to_string(),
        generated_at: chrono::Utc::now(),
        merge_name: merged.name().to_string(),
        n_reps: merged.n_reps(),
        n_points: merged.len(),
        hyperparams,
        profiles: summaries,
        grid: CurveGrid {
            q: mean.iter().map(|m| m.q).collect(),
            i: mean.iter().map(|m| m.i).collect(),
            err: mean.iter().map(|m| m.err).collect(),
        },
    })
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassificationOptions, CleanupOptions, Hyperparams, MergingOptions, Reference, Schedule};
    use crate::stages::{classification, cleanup, fitting, merging};
    use crate::test_support::LinearEngine;

    #[test]
    fn curve_json_describes_the_merge() {
        let inputs = vec![
            Profile::new("A", 10, &[(0.1, 10.0, 1.0), (0.2, 9.0, 1.0)]).unwrap(),
            Profile::new("B", 8, &[(0.1, 10.2, 1.0), (0.2, 9.1, 1.0)]).unwrap(),
        ];
        let schedule: Schedule = "1:1".parse().unwrap();
        let cleaned = cleanup::run(inputs, &CleanupOptions { alpha: 0.001, q_cutoff: 1.0 }).unwrap();
        let fitted = fitting::run(cleaned.kept, &LinearEngine, &Hyperparams::default(), &schedule).unwrap();
        let profiles = classification::run(fitted, &ClassificationOptions { alpha: 0.05 }).unwrap();
        let hp = merging::warm_start(&profiles, Reference::Last).unwrap();
        let opts = MergingOptions { schedule, extrapolate_pct: 0.0, no_extrapolate: false };
        let merged = merging::run(&profiles, "merged.dat", &LinearEngine, &hp, &opts).unwrap();

        let curve = build_curve(&merged, &profiles, 11).unwrap();
        assert_eq!(curve.n_points, 4);
        assert_eq!(curve.n_reps, 8);
        assert_eq!(curve.profiles[1].merged_points, 2);
        assert_eq!(curve.grid.q.len(), 11);
        assert_eq!(curve.grid.q[0], 0.0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");
        write_curve_json(&path, &curve).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["merge_name"], "merged.dat");
        assert_eq!(value["profiles"][0]["name"], "A");
    }
}
