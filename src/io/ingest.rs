//! Profile ingest.
//!
//! Input files are plain text, one point per line, whitespace separated:
//!
//! ```text
//! # q        I        err
//! 0.0105   102.31   2.04
//! ```
//!
//! - lines starting with `#` and lines with fewer than three fields are skipped
//! - only the first three fields are read; extra columns are ignored
//! - rows with non-numeric fields are skipped and reported

use std::path::{Path, PathBuf};

use crate::domain::ProfileSpec;
use crate::error::AppError;
use crate::profile::Profile;

/// Nreps used when a file is given without `=N`.
pub const DEFAULT_NREPS: u32 = 10;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the profile plus what happened to the rows.
#[derive(Debug, Clone)]
pub struct IngestedProfile {
    pub profile: Profile,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Parse a command-line file token, `path` or `path=N`.
pub fn parse_profile_arg(token: &str) -> Result<ProfileSpec, AppError> {
    let Some((path, n)) = token.rsplit_once('=') else {
        return Ok(ProfileSpec {
            path: PathBuf::from(token),
            n_reps: DEFAULT_NREPS,
        });
    };
    let n_reps: u32 = n
        .trim()
        .parse()
        .map_err(|_| AppError::new(2, format!("Invalid Nreps in '{token}' (expected path=N).")))?;
    if n_reps == 0 {
        return Err(AppError::new(2, format!("Nreps must be >= 1 in '{token}'.")));
    }
    if path.is_empty() {
        return Err(AppError::new(2, format!("Missing file name in '{token}'.")));
    }
    Ok(ProfileSpec {
        path: PathBuf::from(path),
        n_reps,
    })
}

/// Read one profile from disk.
pub fn load_profile(spec: &ProfileSpec) -> Result<IngestedProfile, AppError> {
    let text = std::fs::read_to_string(&spec.path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to read profile '{}': {e}", spec.path.display()),
        )
    })?;
    let ingested = parse_profile_text(&display_name(&spec.path), spec.n_reps, &text)?;
    for err in &ingested.row_errors {
        log::warn!("{}:{}: {}", spec.path.display(), err.line, err.message);
    }
    Ok(ingested)
}

pub fn load_profiles(specs: &[ProfileSpec]) -> Result<Vec<IngestedProfile>, AppError> {
    if specs.is_empty() {
        return Err(AppError::new(2, "No input profiles given."));
    }
    specs.iter().map(load_profile).collect()
}

/// Parse the text of one profile file.
pub fn parse_profile_text(name: &str, n_reps: u32, text: &str) -> Result<IngestedProfile, AppError> {
    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || fields[0].starts_with('#') {
            continue;
        }
        rows_read += 1;

        let parsed: Result<Vec<f64>, _> = fields[..3].iter().map(|f| f.parse::<f64>()).collect();
        match parsed {
            Ok(v) => rows.push((v[0], v[1], v[2])),
            Err(e) => row_errors.push(RowError {
                line: idx + 1,
                message: format!("non-numeric field ({e})"),
            }),
        }
    }

    if rows.is_empty() {
        return Err(AppError::new(2, format!("Profile '{name}' contains no data rows.")));
    }
    let rows_used = rows.len();
    let profile = Profile::new(name, n_reps, &rows)?;
    Ok(IngestedProfile {
        profile,
        rows_read,
        rows_used,
        row_errors,
    })
}

fn display_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_nreps_suffix() {
        let spec = parse_profile_arg("data/a.dat=5").unwrap();
        assert_eq!(spec.path, PathBuf::from("data/a.dat"));
        assert_eq!(spec.n_reps, 5);

        let spec = parse_profile_arg("b.dat").unwrap();
        assert_eq!(spec.n_reps, DEFAULT_NREPS);

        // Only the last '=' separates the count.
        let spec = parse_profile_arg("run=3/c.dat=7").unwrap();
        assert_eq!(spec.path, PathBuf::from("run=3/c.dat"));
        assert_eq!(spec.n_reps, 7);

        assert_eq!(parse_profile_arg("a.dat=x").unwrap_err().exit_code(), 2);
        assert!(parse_profile_arg("a.dat=0").is_err());
    }

    #[test]
    fn skips_comments_short_lines_and_bad_rows() {
        let text = "# q I err\n\
                    0.02 9.0 0.5 extra\n\
                    0.01 10.0 0.5\n\
                    \n\
                    0.03 8.0\n\
                    0.04 oops 0.5\n";
        let ingested = parse_profile_text("a.dat", 10, text).unwrap();
        assert_eq!(ingested.rows_read, 3);
        assert_eq!(ingested.rows_used, 2);
        assert_eq!(ingested.row_errors.len(), 1);
        assert_eq!(ingested.row_errors[0].line, 6);

        let qs: Vec<f64> = ingested.profile.points().iter().map(|p| p.q).collect();
        assert_eq!(qs, vec![0.01, 0.02]);
    }

    #[test]
    fn empty_file_is_an_input_error() {
        let err = parse_profile_text("a.dat", 10, "# nothing\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.1 5.0 0.1").unwrap();
        writeln!(file, "0.2 4.0 0.1").unwrap();
        let spec = ProfileSpec {
            path: file.path().to_path_buf(),
            n_reps: 4,
        };
        let ingested = load_profile(&spec).unwrap();
        assert_eq!(ingested.profile.len(), 2);
        assert_eq!(ingested.profile.n_reps(), 4);

        let missing = ProfileSpec {
            path: PathBuf::from("/nonexistent/profile.dat"),
            n_reps: 10,
        };
        assert_eq!(load_profile(&missing).unwrap_err().exit_code(), 2);
    }
}
