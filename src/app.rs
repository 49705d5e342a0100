//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - runs the merge pipeline and writes its outputs
//! - generates synthetic profiles

use clap::Parser;

use crate::cli::{Command, MergeArgs, SimulateArgs};
use crate::data::{SimulateConfig, generate_profiles};
use crate::domain::{
    ClassificationOptions, CleanupOptions, GammaModel, Hyperparams, MergeConfig, MergingOptions, OutputOptions,
    RescalingOptions,
};
use crate::error::AppError;
use crate::io::ingest::parse_profile_arg;

pub mod pipeline;

/// Entry point for the `saxs-merge` binary.
pub fn run() -> Result<(), AppError> {
    // `saxs-merge a.dat b.dat` behaves like `saxs-merge merge a.dat b.dat`.
    let argv: Vec<String> = std::env::args().collect();
    let command_line = argv.join(" ");
    let cli = crate::cli::Cli::parse_from(rewrite_args(argv));
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Merge(args) => handle_merge(&args, command_line),
        Command::Simulate(args) => handle_simulate(&args),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    // A second init (tests) is harmless.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn handle_merge(args: &MergeArgs, command_line: String) -> Result<(), AppError> {
    let config = merge_config_from_args(args, command_line)?;
    let run = pipeline::run_merge(&config)?;
    pipeline::write_outputs(&run, &config)?;

    println!("{}", crate::report::format_run_summary(&run));
    log::info!(
        "wrote outputs to {}",
        config.output.dest_dir.display()
    );
    Ok(())
}

fn handle_simulate(args: &SimulateArgs) -> Result<(), AppError> {
    let config = SimulateConfig {
        n_profiles: args.profiles,
        n_points: args.points,
        q_max: args.qmax,
        noise: args.noise,
        seed: args.seed,
        ..SimulateConfig::default()
    };
    let profiles = generate_profiles(&config)?;

    std::fs::create_dir_all(&args.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create '{}': {e}", args.out_dir.display()),
        )
    })?;
    for p in &profiles {
        let path = args.out_dir.join(&p.name);
        crate::io::export::write_rows(&path, &p.rows)?;
        println!("{} (scale {:.4})", path.display(), p.scale);
    }
    Ok(())
}

pub fn merge_config_from_args(args: &MergeArgs, command_line: String) -> Result<MergeConfig, AppError> {
    let inputs = args
        .files
        .iter()
        .map(|token| parse_profile_arg(token))
        .collect::<Result<Vec<_>, _>>()?;

    if !(args.aalpha > 0.0 && args.aalpha < 1.0) || !(args.dalpha > 0.0 && args.dalpha < 1.0) {
        return Err(AppError::new(2, "Type I errors (--aalpha, --dalpha) must lie in (0, 1)."));
    }
    if args.cnpoints == 0 || args.npoints == 0 {
        return Err(AppError::new(2, "--cnpoints and --npoints must be > 0."));
    }
    if !(args.eextrapolate.is_finite() && args.eextrapolate >= 0.0) {
        return Err(AppError::new(2, "--eextrapolate must be a non-negative percentage."));
    }

    Ok(MergeConfig {
        inputs,
        cleanup: CleanupOptions {
            alpha: args.aalpha,
            q_cutoff: args.acutoff,
        },
        initial: Hyperparams {
            a: args.ba,
            b: args.bb,
            tau: args.btau,
            lambda: args.blambda,
            sigma: args.bsigma,
        },
        fit_schedule: args.bschedule.clone(),
        rescaling: RescalingOptions {
            reference: args.creference,
            pivot: args.cpivot,
            model: if args.cnormal {
                GammaModel::Normal
            } else {
                GammaModel::Lognormal
            },
            num_points: args.cnpoints,
        },
        classification: ClassificationOptions { alpha: args.dalpha },
        merging: MergingOptions {
            schedule: args.eschedule.clone(),
            extrapolate_pct: args.eextrapolate,
            no_extrapolate: args.enoextrapolate,
        },
        output: OutputOptions {
            dest_dir: args.destdir.clone(),
            merge_name: args.mergename.clone(),
            summary_name: args.sumname.clone(),
            header: args.header,
            level: args.outlevel,
            all_files: args.allfiles,
            mean_points: args.npoints,
            export_json: args.export_json.clone(),
        },
        command_line,
    })
}

/// Rewrite argv so `saxs-merge` defaults to `saxs-merge merge`.
///
/// Rules:
/// - `saxs-merge --help/--version/-h`  -> unchanged (top-level help/version)
/// - `saxs-merge merge|simulate ...`   -> unchanged
/// - anything else (files, flags)      -> `saxs-merge merge ...`
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    let is_subcommand = matches!(arg1.as_str(), "merge" | "simulate");
    if !is_top_level_help_or_version && !is_subcommand {
        argv.insert(1, "merge".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OutputLevel, Reference};

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn files_default_to_merge() {
        assert_eq!(
            rewrite_args(argv(&["saxs-merge", "a.dat", "b.dat=5"])),
            argv(&["saxs-merge", "merge", "a.dat", "b.dat=5"])
        );
        assert_eq!(
            rewrite_args(argv(&["saxs-merge", "--header", "a.dat"])),
            argv(&["saxs-merge", "merge", "--header", "a.dat"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            argv(&["saxs-merge", "simulate", "-n", "2"]),
            argv(&["saxs-merge", "merge", "a.dat"]),
            argv(&["saxs-merge", "--help"]),
            argv(&["saxs-merge"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    fn parse(args: &[&str]) -> MergeArgs {
        let cli = crate::cli::Cli::parse_from(rewrite_args(argv(args)));
        match cli.command {
            Command::Merge(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn defaults_map_to_config() {
        let config = merge_config_from_args(&parse(&["saxs-merge", "a.dat", "b.dat=3"]), String::new()).unwrap();
        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.inputs[0].n_reps, 10);
        assert_eq!(config.inputs[1].n_reps, 3);
        assert_eq!(config.cleanup.alpha, 1e-7);
        assert_eq!(config.cleanup.q_cutoff, 0.1);
        assert_eq!(config.initial, Hyperparams::default());
        assert_eq!(config.fit_schedule.steps().len(), 3);
        assert_eq!(config.rescaling.reference, Reference::Last);
        assert_eq!(config.rescaling.model, GammaModel::Lognormal);
        assert_eq!(config.rescaling.num_points, 200);
        assert_eq!(config.output.level, OutputLevel::Normal);
        assert_eq!(config.output.merge_name, "merged.dat");
        assert!(!config.merging.no_extrapolate);
    }

    #[test]
    fn flags_map_to_config() {
        let args = parse(&[
            "saxs-merge",
            "--ba",
            "-50",
            "--creference",
            "first",
            "--cnormal",
            "--bschedule",
            "2:30",
            "--outlevel",
            "full",
            "--enoextrapolate",
            "-v",
            "a.dat",
        ]);
        let config = merge_config_from_args(&args, String::new()).unwrap();
        assert_eq!(config.initial.a, -50.0);
        assert_eq!(config.rescaling.reference, Reference::First);
        assert_eq!(config.rescaling.pivot, Reference::Last);
        assert_eq!(config.rescaling.model, GammaModel::Normal);
        assert_eq!(config.fit_schedule.steps()[0].stride, 2);
        assert_eq!(config.output.level, OutputLevel::Full);
        assert!(config.merging.no_extrapolate);
    }

    #[test]
    fn rejects_bad_alpha_and_nreps() {
        let err = merge_config_from_args(&parse(&["saxs-merge", "--aalpha", "1.5", "a.dat"]), String::new()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = merge_config_from_args(&parse(&["saxs-merge", "a.dat=0"]), String::new()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
