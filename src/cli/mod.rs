//! Command-line parsing for the profile merger.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the statistics and fitting code. Option names follow the
//! stage they configure: `a*` cleanup, `b*` fitting, `c*` rescaling,
//! `d*` classification, `e*` merging.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{GammaModel, OutputLevel, Reference, Schedule};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "saxs-merge",
    version,
    about = "Statistical merging of SAXS profiles"
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge profiles (the default when no subcommand is given).
    Merge(MergeArgs),
    /// Write synthetic profiles to a directory.
    Simulate(SimulateArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct MergeArgs {
    /// Input profiles, as `FILE` or `FILE=NREPS` (NREPS defaults to 10).
    #[arg(required = true, value_name = "FILE[=NREPS]")]
    pub files: Vec<String>,

    // Output.
    /// Directory for every output file (created if missing).
    #[arg(long, default_value = ".")]
    pub destdir: PathBuf,

    /// Merged file name; written as data_<NAME> and mean_<NAME>.
    #[arg(long, default_value = "merged.dat")]
    pub mergename: String,

    /// Summary file name.
    #[arg(long, default_value = "summary.txt")]
    pub sumname: String,

    /// Write a `#1:q 2:I ...` header line in every data file.
    #[arg(long)]
    pub header: bool,

    /// Column set of the merged files.
    #[arg(long, value_enum, default_value_t = OutputLevel::Normal)]
    pub outlevel: OutputLevel,

    /// Also write data and mean files for every input profile.
    #[arg(long)]
    pub allfiles: bool,

    /// Number of points of the written mean curves.
    #[arg(long, default_value_t = 200)]
    pub npoints: usize,

    /// Export the merged curve (hyperparameters, gammas, grid) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    // Cleanup.
    /// Type I error of the signal-to-noise test.
    #[arg(long, default_value_t = 1e-7)]
    pub aalpha: f64,

    /// Once a point at q >= ACUTOFF is discarded, discard the rest of the profile.
    #[arg(long, default_value_t = 0.1)]
    pub acutoff: f64,

    // Fitting.
    /// Initial slope of the mean function.
    ///
    /// The GP engine re-estimates `a` and `b` by least squares at every
    /// step, so this only matters to engines that search them.
    #[arg(long, default_value_t = -100.0, allow_hyphen_values = true)]
    pub ba: f64,

    /// Initial intercept of the mean function (see `--ba`).
    #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
    pub bb: f64,

    /// Initial covariance amplitude.
    #[arg(long, default_value_t = 10.0)]
    pub btau: f64,

    /// Initial covariance length scale.
    #[arg(long, default_value_t = 0.05)]
    pub blambda: f64,

    /// Initial noise scale.
    #[arg(long, default_value_t = 10.0)]
    pub bsigma: f64,

    /// Fitting schedule, `STRIDE:ITERATIONS` steps separated by `/`.
    #[arg(long, default_value = "10:10000/5:1000/1:100")]
    pub bschedule: Schedule,

    // Rescaling.
    /// Profile whose gamma is set to 1.
    #[arg(long, value_enum, default_value_t = Reference::Last)]
    pub creference: Reference,

    /// Profile every other one is compared with to estimate gamma.
    #[arg(long, value_enum, default_value_t = Reference::Last)]
    pub cpivot: Reference,

    /// Use the normal model for gamma instead of the lognormal one.
    #[arg(long)]
    pub cnormal: bool,

    /// Number of points used to estimate gamma.
    #[arg(long, default_value_t = 200)]
    pub cnpoints: usize,

    // Classification.
    /// Type I error of the compatibility test.
    #[arg(long, default_value_t = 0.05)]
    pub dalpha: f64,

    // Merging.
    /// Fitting schedule of the merged profile.
    #[arg(long, default_value = "10:10000/5:1000/1:100")]
    pub eschedule: Schedule,

    /// Extend the mean curve this many percent beyond the last point.
    #[arg(long, default_value_t = 0.0)]
    pub eextrapolate: f64,

    /// Do not extrapolate at all (neither below the first point nor above the last).
    #[arg(long)]
    pub enoextrapolate: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Output directory for the generated files.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Number of profiles.
    #[arg(short = 'n', long, default_value_t = 3)]
    pub profiles: usize,

    /// Points per profile.
    #[arg(long, default_value_t = 120)]
    pub points: usize,

    /// Relative error of the first profile.
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    /// Largest q.
    #[arg(long, default_value_t = 0.3)]
    pub qmax: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
