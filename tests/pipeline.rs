use clap::Parser;

use saxs_merge::app::{merge_config_from_args, pipeline};
use saxs_merge::cli::{Cli, Command};
use saxs_merge::data::{SimulateConfig, generate_profiles};
use saxs_merge::io::export::write_rows;

#[test]
fn simulated_profiles_merge_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let sim = SimulateConfig {
        n_profiles: 3,
        n_points: 40,
        ..SimulateConfig::default()
    };
    let profiles = generate_profiles(&sim).unwrap();
    let mut argv = vec!["saxs-merge".to_string(), "merge".to_string()];
    for p in &profiles {
        let path = dir.path().join(&p.name);
        write_rows(&path, &p.rows).unwrap();
        argv.push(format!("{}=10", path.display()));
    }
    let out = dir.path().join("out");
    argv.extend(
        [
            "--destdir",
            out.to_str().unwrap(),
            "--bschedule",
            "2:40/1:20",
            "--eschedule",
            "2:40/1:20",
            "--npoints",
            "50",
            "--header",
            "--allfiles",
        ]
        .map(String::from),
    );

    let Command::Merge(args) = Cli::parse_from(argv.clone()).command else {
        panic!("expected the merge command");
    };
    let config = merge_config_from_args(&args, argv.join(" ")).unwrap();
    let run = pipeline::run_merge(&config).unwrap();

    assert_eq!(run.profiles.len(), 3);
    assert!(run.discarded.is_empty());
    // The last profile is the reference.
    assert_eq!(run.profiles[2].gamma(), 1.0);
    for (fitted, truth) in run.profiles.iter().zip(&profiles) {
        let expected = profiles[2].scale / truth.scale;
        assert!(
            (fitted.gamma() / expected - 1.0).abs() < 0.1,
            "{}: gamma {} vs {expected}",
            fitted.name(),
            fitted.gamma()
        );
    }
    // The first profile references itself everywhere.
    assert!(run.merged.len() >= 40);
    assert!(run.merged.hyperparams().is_some());

    pipeline::write_outputs(&run, &config).unwrap();
    for file in ["data_merged.dat", "mean_merged.dat", "summary.txt", "data_profile_1.dat", "mean_profile_3.dat"] {
        assert!(out.join(file).exists(), "{file}");
    }
    let mean = std::fs::read_to_string(out.join("mean_merged.dat")).unwrap();
    assert_eq!(mean.lines().count(), 51);
    let summary = std::fs::read_to_string(out.join("summary.txt")).unwrap();
    assert!(summary.starts_with("#STATISTICAL MERGE: SUMMARY"));
    assert!(summary.contains("profile_2.dat"));
}
