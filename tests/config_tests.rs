use clap::Parser;
use pathscan::engine::Cli;
use pathscan::utils::config::{PackagePaths, QueueConsts, Tuning};
use log::{Level, LevelFilter};
use pathscan::utils::logger::{crate_level, format_line};
use pathscan::utils::opts_from_toml_str;
use pathscan::{EntryType, FilterRule, RuleKind};
use std::path::PathBuf;
use std::time::Duration;

// --- config file ---

#[test]
fn test_empty_config_gives_defaults() {
    let opts = opts_from_toml_str("").unwrap();
    assert!(opts.rules.is_empty());
    assert!(!opts.verbose);
    assert!(!opts.summary);
    assert_eq!(
        opts.tuning.generator_output_capacity,
        QueueConsts::GENERATOR_MAX_OUTPUT_QUEUE_SIZE
    );
}

#[test]
fn test_filter_tables_keep_order() {
    let opts = opts_from_toml_str(
        r#"
[[filter]]
entry = "dir"
kind = "exclude"
pattern = ".git"

[[filter]]
entry = "file"
kind = "include"
pattern = "*.txt"
"#,
    )
    .unwrap();
    assert_eq!(
        opts.rules,
        vec![
            FilterRule::exclude_dir(".git"),
            FilterRule::include_file("*.txt")
        ]
    );
}

#[test]
fn test_settings_and_tuning_override_defaults() {
    let opts = opts_from_toml_str(
        r#"
[settings]
verbose = true
summary = true

[tuning]
generator_queue_size = 8
idle_sleep_ms = 3
quit_check_ticks = 7
log_read_timeout_ms = 40
"#,
    )
    .unwrap();
    assert!(opts.verbose);
    assert!(opts.summary);
    assert_eq!(opts.tuning.generator_output_capacity, 8);
    assert_eq!(opts.tuning.idle_sleep, Duration::from_millis(3));
    assert_eq!(opts.tuning.cancel_check_ticks, 7);
    assert_eq!(opts.tuning.log_read_timeout, Duration::from_millis(40));
    // untouched keys stay at their defaults
    let defaults = Tuning::default();
    assert_eq!(opts.tuning.filter_output_capacity, defaults.filter_output_capacity);
    assert_eq!(opts.tuning.cancel_check_interval, defaults.cancel_check_interval);
}

#[test]
fn test_unknown_entry_type_is_error() {
    let res = opts_from_toml_str(
        r#"
[[filter]]
entry = "symlink"
kind = "include"
pattern = "*"
"#,
    );
    assert!(res.is_err());
}

// --- command line ---

#[test]
fn test_cli_defaults_to_current_dir() {
    let cli = Cli::parse_from(["pathscan"]);
    assert_eq!(cli.dir, PathBuf::from("."));
    assert!(cli.filter_rules().is_empty());
    assert_eq!(cli.config_path(), PathBuf::from("./.pathscan.toml"));
}

#[test]
fn test_cli_rules_dir_first_includes_before_excludes() {
    let cli = Cli::parse_from([
        "pathscan",
        "proj",
        "-x",
        "*.log",
        "-i",
        "*.rs",
        "-X",
        "target",
        "--include-dir",
        "src",
    ]);
    assert_eq!(cli.dir, PathBuf::from("proj"));
    assert_eq!(
        cli.filter_rules(),
        vec![
            FilterRule::include_dir("src"),
            FilterRule::exclude_dir("target"),
            FilterRule::include_file("*.rs"),
            FilterRule::exclude_file("*.log"),
        ]
    );
}

#[test]
fn test_cli_pattern_flag_takes_one_value_before_dir() {
    let cli = Cli::parse_from(["pathscan", "-X", "target", "src"]);
    assert_eq!(cli.dir, PathBuf::from("src"));
    assert_eq!(cli.filter_rules(), vec![FilterRule::exclude_dir("target")]);
}

#[test]
fn test_cli_pattern_flags_repeat() {
    let cli = Cli::parse_from(["pathscan", "-i", "*.rs", "-i", "*.toml", "--include-dir", "src"]);
    assert_eq!(cli.dir, PathBuf::from("."));
    assert_eq!(
        cli.filter_rules(),
        vec![
            FilterRule::include_dir("src"),
            FilterRule::include_file("*.rs"),
            FilterRule::include_file("*.toml"),
        ]
    );
}

#[test]
fn test_cli_bool_flags_without_value() {
    let cli = Cli::parse_from(["pathscan", "-s", "-v", "--filter-debug"]);
    assert_eq!(cli.summary, Some(true));
    assert_eq!(cli.verbose, Some(true));
    assert_eq!(cli.filter_debug, Some(true));
    let quiet = Cli::parse_from(["pathscan", "--summary=false"]);
    assert_eq!(quiet.summary, Some(false));
}

#[test]
fn test_explicit_config_path_wins() {
    let cli = Cli::parse_from(["pathscan", "-c", "/tmp/scan.toml", "somewhere"]);
    assert_eq!(cli.config_path(), PathBuf::from("/tmp/scan.toml"));
}

#[test]
fn test_rule_constructors_match_new() {
    assert_eq!(
        FilterRule::new(EntryType::Dir, RuleKind::Exclude, "x"),
        FilterRule::exclude_dir("x")
    );
}

// --- package names ---

#[test]
fn test_package_derived_names() {
    let paths = PackagePaths::get();
    assert_eq!(paths.pkg_name(), "pathscan");
    assert_eq!(paths.config_filename(), ".pathscan.toml");
    assert_eq!(paths.env_var("FILTER_DEBUG"), "PATHSCAN_FILTER_DEBUG");
    assert_eq!(paths.thread_name("generator"), "pathscan-generator");
}

// --- log lines ---

#[test]
fn test_log_line_format() {
    colored::control::set_override(false);
    assert_eq!(
        format_line(Level::Info, "pathscan::pipeline::context", "generator: running"),
        "[pathscan] generator: running"
    );
    assert_eq!(
        format_line(Level::Warn, "pathscan::pipeline::context", "executor: sink failed"),
        "[pathscan WARN pipeline::context] executor: sink failed"
    );
    assert_eq!(
        format_line(Level::Error, "ctrlc", "boom"),
        "[pathscan ERROR ctrlc] boom"
    );
}

#[test]
fn test_verbose_selects_debug_level() {
    assert_eq!(crate_level(true), LevelFilter::Debug);
}
