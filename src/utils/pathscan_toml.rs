//! Load `.pathscan.toml` (CLI only). Lib callers pass rules and [`Tuning`] directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::utils::config::{PackagePaths, Tuning};
use crate::{FilterRule, Opts};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PathscanToml {
    #[serde(default)]
    settings: SettingsSection,
    #[serde(default)]
    tuning: TuningSection,
    #[serde(default)]
    filter: Vec<FilterRule>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    verbose: Option<bool>,
    summary: Option<bool>,
}

/// Durations are in milliseconds.
#[derive(Debug, Default, Deserialize)]
struct TuningSection {
    generator_queue_size: Option<usize>,
    filter_queue_size: Option<usize>,
    executor_queue_size: Option<usize>,
    idle_sleep_ms: Option<u64>,
    quit_check_ticks: Option<u64>,
    quit_check_interval_ms: Option<u64>,
    progress_log_ticks: Option<u64>,
    log_drain_batch: Option<usize>,
    result_drain_batch: Option<usize>,
    log_read_timeout_ms: Option<u64>,
    filter_debug: Option<bool>,
}

/// Load `.pathscan.toml` from `dir` if present. Returns None if the file is missing or unreadable.
pub(crate) fn load_pathscan_toml(dir: &Path) -> Option<PathscanToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    toml::from_str(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

/// Load an explicitly requested config file. Unlike the per-directory file, a missing or
/// malformed file is an error.
pub(crate) fn load_config_file(path: &Path) -> Result<PathscanToml> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse config file {}", path.display()))
}

/// Overwrite a field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $target:expr, $field:ident => $target_field:ident) => {
        if let Some(v) = $section.$field {
            $target.$target_field = v;
        }
    };
    ($section:expr, $target:expr, $field:ident => $target_field:ident, ms) => {
        if let Some(v) = $section.$field {
            $target.$target_field = Duration::from_millis(v);
        }
    };
}

fn apply_tuning(section: &TuningSection, tuning: &mut Tuning) {
    apply_file_opt!(section, tuning, generator_queue_size => generator_output_capacity);
    apply_file_opt!(section, tuning, filter_queue_size => filter_output_capacity);
    apply_file_opt!(section, tuning, executor_queue_size => executor_output_capacity);
    apply_file_opt!(section, tuning, idle_sleep_ms => idle_sleep, ms);
    apply_file_opt!(section, tuning, quit_check_ticks => cancel_check_ticks);
    apply_file_opt!(section, tuning, quit_check_interval_ms => cancel_check_interval, ms);
    apply_file_opt!(section, tuning, progress_log_ticks => progress_log_ticks);
    apply_file_opt!(section, tuning, log_drain_batch => log_drain_batch);
    apply_file_opt!(section, tuning, result_drain_batch => result_drain_batch);
    apply_file_opt!(section, tuning, log_read_timeout_ms => log_read_timeout, ms);
    apply_file_opt!(section, tuning, filter_debug => filter_debug);
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_opts(file: &PathscanToml, opts: &mut Opts) {
    apply_file_opt!(file.settings, opts, verbose => verbose);
    apply_file_opt!(file.settings, opts, summary => summary);
    apply_tuning(&file.tuning, &mut opts.tuning);
    opts.rules.extend(file.filter.iter().cloned());
}

/// Parse a config document. Used by tests and by callers embedding their own config.
pub fn opts_from_toml_str(s: &str) -> Result<Opts> {
    let file: PathscanToml = toml::from_str(s).context("parse pathscan config")?;
    let mut opts = Opts {
        tuning: Tuning::from_env(),
        ..Opts::default()
    };
    apply_file_to_opts(&file, &mut opts);
    Ok(opts)
}
