//! Formatted output: the summary file and the short terminal report.
//!
//! We keep formatting code in one place so:
//! - the stages stay free of presentation concerns
//! - output changes are localized

use crate::app::pipeline::MergeRun;
use crate::domain::{Hyperparams, MergeConfig};
use crate::error::MergeError;
use crate::profile::{Profile, names};
use crate::report::{origin_counts, point_stats};

/// Full summary report written next to the merged files.
pub fn format_summary(run: &MergeRun, config: &MergeConfig) -> Result<String, MergeError> {
    let mut out = String::new();
    let merged = &run.merged;

    out.push_str("#STATISTICAL MERGE: SUMMARY\n\n");
    out.push_str(&format!(
        "Generated: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str("Ran with the following arguments:\n");
    out.push_str(&format!("{}\n\n", config.command_line));

    out.push_str("Merge file\n  General\n");
    out.push_str(&format!("   Filename: {}\n", merged.name()));
    let (n, range) = point_stats(merged, &[])?;
    out.push_str(&format!("   Number of points: {n}\n"));
    out.push_str(&format!("   Data range: {}\n", fmt_range(range)));
    for (i, (p, count)) in run.profiles.iter().zip(origin_counts(merged, run.profiles.len())?).enumerate() {
        out.push_str(&format!("   {count} points from profile {i} ({})\n", p.name()));
    }
    out.push_str("  Gaussian Process parameters\n");
    out.push_str(&fmt_params(merged.hyperparams()));
    out.push('\n');

    for (i, p) in run.profiles.iter().enumerate() {
        out.push_str(&format!("Input file {i}\n  General\n"));
        out.push_str(&profile_general(p));

        let (n, range) = point_stats(p, &[names::AGOOD])?;
        out.push_str("  1. Cleanup\n");
        out.push_str(&format!("   Number of significant points: {n}\n"));
        out.push_str(&format!("   Data range: {}\n", fmt_range(range)));

        out.push_str("  2. GP parameters (values for non-rescaled curve)\n");
        out.push_str(&fmt_params(p.hyperparams()));

        out.push_str("  3. Rescaling\n");
        out.push_str(&format!("   gamma : {:.6}\n", p.gamma()));

        let (n, range) = point_stats(p, &[names::DGOOD])?;
        out.push_str("  4. Classification\n");
        out.push_str(&format!("   Number of valid points: {n}\n"));
        out.push_str(&format!("   Data range: {}\n", fmt_range(range)));
        out.push('\n');
    }

    for p in &run.discarded {
        out.push_str("Discarded input file\n  General\n");
        out.push_str(&profile_general(p));
        out.push_str("  1. Cleanup\n   Number of significant points: 0\n\n");
    }

    Ok(out)
}

/// Short report printed on stdout after a run.
pub fn format_run_summary(run: &MergeRun) -> String {
    let mut out = String::new();
    out.push_str("=== saxs-merge ===\n");
    out.push_str(&format!(
        "Merged: {} points from {} profiles",
        run.merged.len(),
        run.profiles.len()
    ));
    if !run.discarded.is_empty() {
        out.push_str(&format!(" ({} discarded)", run.discarded.len()));
    }
    out.push('\n');

    let width = run.profiles.iter().map(|p| p.name().len()).max().unwrap_or(4).max(4);
    out.push_str(&format!("{:<width$} {:>10} {:>8}\n", "file", "gamma", "kept"));
    for p in &run.profiles {
        let kept = p.data(&[names::DGOOD]).map(|d| d.len()).unwrap_or(0);
        out.push_str(&format!("{:<width$} {:>10.4} {:>8}\n", p.name(), p.gamma(), format!("{kept}/{}", p.len())));
    }
    out
}

fn profile_general(p: &Profile) -> String {
    let (lo, hi) = p
        .points()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), pt| (lo.min(pt.q), hi.max(pt.q)));
    format!(
        "   Filename: {}\n   Number of points: {}\n   Data range: {lo:.5} {hi:.5}\n",
        p.name(),
        p.len()
    )
}

fn fmt_range(range: Option<(f64, f64)>) -> String {
    match range {
        Some((lo, hi)) => format!("{lo:.5} {hi:.5}"),
        None => "-".to_string(),
    }
}

fn fmt_params(hp: Option<Hyperparams>) -> String {
    match hp {
        Some(hp) => hp
            .named()
            .iter()
            .map(|(name, value)| format!("   {name} : {value:.6}\n"))
            .collect(),
        None => "   (not fitted)\n".to_string(),
    }
}
