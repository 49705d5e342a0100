//! Text exports of profiles: data files, mean curves and raw `q I err` files.
//!
//! Columns are space separated. Booleans are written as `0`/`1`; values that
//! are not set (or not defined at a mean-curve coordinate) are written as `NA`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::{OutputLevel, OutputOptions};
use crate::error::AppError;
use crate::profile::{Profile, names};

/// Flag columns of the merged data file; `None` means every flag.
pub fn merged_data_flags(level: OutputLevel) -> Option<&'static [&'static str]> {
    match level {
        OutputLevel::Sparse => Some(&[]),
        OutputLevel::Normal => Some(&[names::EORIGIN, names::EORINAME]),
        OutputLevel::Full => None,
    }
}

/// Flag columns of the merged mean curve; `None` means every flag with intervals.
pub fn merged_mean_flags(level: OutputLevel) -> Option<&'static [&'static str]> {
    match level {
        OutputLevel::Sparse => Some(&[]),
        OutputLevel::Normal => Some(&[names::EORIGIN, names::EORINAME, names::EEXTRAPOL]),
        OutputLevel::Full => None,
    }
}

/// `n` evenly spaced coordinates on `[lo, hi]`.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => (0..n).map(|k| lo + (hi - lo) * k as f64 / (n - 1) as f64).collect(),
    }
}

/// Write every point of `profile` (rescaled by gamma) with the chosen flags.
pub fn write_data(path: &Path, profile: &Profile, flags: Option<&[&str]>, header: bool) -> Result<(), AppError> {
    let flags = resolve_flags(profile, flags, false);
    let mut out = create(path)?;
    if header {
        write_header(&mut out, &flags).map_err(|e| write_err(path, e))?;
    }
    for p in profile.data(&[])? {
        let mut line = format!("{} {} {}", p.q, p.i, p.err);
        for flag in &flags {
            let cell = profile.flag(p.id, flag)?.map_or_else(|| "NA".to_string(), |v| v.to_column());
            line.push(' ');
            line.push_str(&cell);
        }
        writeln!(out, "{line}").map_err(|e| write_err(path, e))?;
    }
    out.flush().map_err(|e| write_err(path, e))
}

/// Write the mean curve of `profile` at `qs`; flags are read from their intervals.
pub fn write_mean(
    path: &Path,
    profile: &Profile,
    qs: &[f64],
    flags: Option<&[&str]>,
    header: bool,
) -> Result<(), AppError> {
    let flags = resolve_flags(profile, flags, true);
    let mut out = create(path)?;
    if header {
        write_header(&mut out, &flags).map_err(|e| write_err(path, e))?;
    }
    for m in profile.mean(qs)? {
        let mut line = format!("{} {} {}", m.q, m.i, m.err);
        for flag in &flags {
            let cell = profile
                .flag_at(m.q, flag)
                .ok()
                .flatten()
                .map_or_else(|| "NA".to_string(), |v| v.to_column());
            line.push(' ');
            line.push_str(&cell);
        }
        writeln!(out, "{line}").map_err(|e| write_err(path, e))?;
    }
    out.flush().map_err(|e| write_err(path, e))
}

/// Write raw `q I err` rows (used by `simulate`).
pub fn write_rows(path: &Path, rows: &[(f64, f64, f64)]) -> Result<(), AppError> {
    let mut out = create(path)?;
    for (q, i, err) in rows {
        writeln!(out, "{q} {i} {err}").map_err(|e| write_err(path, e))?;
    }
    out.flush().map_err(|e| write_err(path, e))
}

/// Paths written by [`write_merge_outputs`].
#[derive(Debug, Clone, Default)]
pub struct WrittenFiles {
    pub paths: Vec<PathBuf>,
}

/// Write the merged data and mean files, plus per-profile files with `all_files`.
pub fn write_merge_outputs(merged: &Profile, profiles: &[Profile], opts: &OutputOptions) -> Result<WrittenFiles, AppError> {
    std::fs::create_dir_all(&opts.dest_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output directory '{}': {e}", opts.dest_dir.display()),
        )
    })?;
    let mut written = WrittenFiles::default();

    if opts.all_files {
        for p in profiles {
            let base = base_name(p.name());
            let data_path = opts.dest_dir.join(format!("data_{base}"));
            write_data(&data_path, p, None, opts.header)?;
            written.paths.push(data_path);

            if p.interpolant().is_some() {
                let (lo, hi) = q_range(p);
                let mean_path = opts.dest_dir.join(format!("mean_{base}"));
                write_mean(&mean_path, p, &linspace(lo, hi, opts.mean_points), None, opts.header)?;
                written.paths.push(mean_path);
            }
        }
    }

    let data_path = opts.dest_dir.join(format!("data_{}", opts.merge_name));
    write_data(&data_path, merged, merged_data_flags(opts.level), opts.header)?;
    written.paths.push(data_path);

    let domain = merged.intervals(names::EEXTRAPOL)?;
    let (lo, hi) = match (domain.min_start(), domain.max_end()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => q_range(merged),
    };
    let mean_path = opts.dest_dir.join(format!("mean_{}", opts.merge_name));
    write_mean(
        &mean_path,
        merged,
        &linspace(lo, hi, opts.mean_points),
        merged_mean_flags(opts.level),
        opts.header,
    )?;
    written.paths.push(mean_path);

    for path in &written.paths {
        log::debug!("wrote {}", path.display());
    }
    Ok(written)
}

fn resolve_flags(profile: &Profile, flags: Option<&[&str]>, need_intervals: bool) -> Vec<String> {
    match flags {
        Some(list) => list.iter().map(|s| s.to_string()).collect(),
        None => profile
            .flag_columns()
            .iter()
            .filter(|c| !need_intervals || profile.intervals(&c.name).is_ok())
            .map(|c| c.name.clone())
            .collect(),
    }
}

fn write_header(out: &mut impl Write, flags: &[String]) -> std::io::Result<()> {
    let mut line = String::from("#1:q 2:I 3:err");
    for (k, flag) in flags.iter().enumerate() {
        line.push_str(&format!(" {}:{flag}", k + 4));
    }
    writeln!(out, "{line}")
}

fn q_range(profile: &Profile) -> (f64, f64) {
    profile
        .points()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.q), hi.max(p.q)))
}

fn base_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

fn create(path: &Path) -> Result<BufWriter<File>, AppError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
}

fn write_err(path: &Path, e: std::io::Error) -> AppError {
    AppError::new(2, format!("Failed to write '{}': {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FlagKind;
    use crate::test_support::fitted;

    fn annotated() -> Profile {
        let mut p = fitted("dir/a.dat", 10, &[(0.1, 10.0, 1.0), (0.2, 8.0, 1.0), (0.3, 6.0, 1.0)]);
        p.declare_flag(names::AGOOD, FlagKind::Bool).unwrap();
        p.declare_flag(names::DREFNAME, FlagKind::Str).unwrap();
        for id in 0..3 {
            p.set_flag(id, names::AGOOD, id != 1).unwrap();
        }
        p.set_flag(0, names::DREFNAME, "a.dat").unwrap();
        p.rebuild_intervals(names::AGOOD).unwrap();
        p.with_gamma(2.0)
    }

    #[test]
    fn data_file_has_header_bools_as_ints_and_na() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_a.dat");
        write_data(&path, &annotated(), None, true).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#1:q 2:I 3:err 4:agood 5:drefname");
        assert_eq!(lines[1], "0.1 20 2 1 a.dat");
        assert_eq!(lines[2], "0.2 16 2 0 NA");
    }

    #[test]
    fn mean_file_reads_flags_from_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mean_a.dat");
        let qs = linspace(0.1, 0.3, 3);
        write_mean(&path, &annotated(), &qs, None, false).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<Vec<&str>> = text.lines().map(|l| l.split(' ').collect()).collect();
        assert_eq!(rows.len(), 3);
        // Only `agood` has intervals; `drefname` was never compressed.
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[0][3], "1");
        assert_eq!(rows[1][3], "0");
        assert_eq!(rows[1][1], "16");
    }

    #[test]
    fn sparse_level_writes_three_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_sparse");
        write_data(&path, &annotated(), merged_data_flags(OutputLevel::Sparse), false).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().all(|l| l.split(' ').count() == 3));
    }

    #[test]
    fn linspace_endpoints() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn base_name_strips_directories() {
        assert_eq!(base_name("dir/a.dat"), "a.dat");
        assert_eq!(base_name("b.dat"), "b.dat");
    }
}
