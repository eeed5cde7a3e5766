//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    env_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                env_prefix: pkg.to_uppercase(),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Per-directory config file, e.g. `.pathscan.toml`.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Environment variable name for `suffix`, e.g. `PATHSCAN_FILTER_DEBUG`.
    pub fn env_var(&self, suffix: &str) -> String {
        format!("{}_{}", self.env_prefix, suffix)
    }

    /// Thread name for a pipeline stage, e.g. `pathscan-generator`.
    pub fn thread_name(&self, stage: &str) -> String {
        format!("{}-{}", self.pkg_name(), stage)
    }
}

/// True when the env var is set to a non-zero integer (`1`, `2`, ...).
pub fn env_flag(suffix: &str) -> bool {
    std::env::var(PackagePaths::get().env_var(suffix))
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .is_some_and(|v| v != 0)
}

// ---- Workers ----

/// Output queue bounds per stage. A full queue blocks the producer.
pub struct QueueConsts;

impl QueueConsts {
    pub const GENERATOR_MAX_OUTPUT_QUEUE_SIZE: usize = 1000;
    pub const FILTER_MAX_OUTPUT_QUEUE_SIZE: usize = 1000;
    /// The executor only ever pushes its end-of-stream marker.
    pub const EXECUTOR_MAX_OUTPUT_QUEUE_SIZE: usize = 16;
}

/// Worker loop intervals.
pub struct WorkerConsts;

impl WorkerConsts {
    /// Sleep between polls of an empty input queue.
    pub const WORKER_IDLE_SLEEP: Duration = Duration::from_millis(10);
    /// Inspect the cancel flag every this many ticks...
    pub const QUIT_CHECK_TICK_INTERVAL: u64 = 100;
    /// ...or when this long has passed since the last inspection.
    pub const QUIT_CHECK_INTERVAL: Duration = Duration::from_millis(500);
    /// Emit a progress log record every this many ticks.
    pub const PROGRESS_LOG_TICK_INTERVAL: u64 = 1000;
    /// Poll interval while waiting for the log queue to empty at shutdown.
    pub const SHUTDOWN_LOG_DEPLETE_CHECK_INTERVAL: Duration = Duration::from_millis(5);
}

/// Orchestrator drain sizes and waits.
pub struct DrainConsts;

impl DrainConsts {
    /// Max log records relayed per coordination step.
    pub const LOG_DRAIN_BATCH_SIZE: usize = 100;
    /// Max results pulled from the terminal stage per coordination step.
    pub const RESULT_DRAIN_BATCH_SIZE: usize = 500;
    /// Bounded wait on an empty log queue when no results arrived this step.
    pub const LOG_READ_BLOCK_TIMEOUT: Duration = Duration::from_millis(20);
}

/// Effective pipeline tuning. Defaults come from the consts above; `.pathscan.toml`
/// `[tuning]` and env vars may override individual fields.
#[derive(Clone, Debug)]
pub struct Tuning {
    pub generator_output_capacity: usize,
    pub filter_output_capacity: usize,
    pub executor_output_capacity: usize,
    pub idle_sleep: Duration,
    pub cancel_check_ticks: u64,
    pub cancel_check_interval: Duration,
    pub progress_log_ticks: u64,
    pub log_flush_poll: Duration,
    pub log_drain_batch: usize,
    pub result_drain_batch: usize,
    pub log_read_timeout: Duration,
    /// Send every admission decision as a debug log record.
    pub filter_debug: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            generator_output_capacity: QueueConsts::GENERATOR_MAX_OUTPUT_QUEUE_SIZE,
            filter_output_capacity: QueueConsts::FILTER_MAX_OUTPUT_QUEUE_SIZE,
            executor_output_capacity: QueueConsts::EXECUTOR_MAX_OUTPUT_QUEUE_SIZE,
            idle_sleep: WorkerConsts::WORKER_IDLE_SLEEP,
            cancel_check_ticks: WorkerConsts::QUIT_CHECK_TICK_INTERVAL,
            cancel_check_interval: WorkerConsts::QUIT_CHECK_INTERVAL,
            progress_log_ticks: WorkerConsts::PROGRESS_LOG_TICK_INTERVAL,
            log_flush_poll: WorkerConsts::SHUTDOWN_LOG_DEPLETE_CHECK_INTERVAL,
            log_drain_batch: DrainConsts::LOG_DRAIN_BATCH_SIZE,
            result_drain_batch: DrainConsts::RESULT_DRAIN_BATCH_SIZE,
            log_read_timeout: DrainConsts::LOG_READ_BLOCK_TIMEOUT,
            filter_debug: false,
        }
    }
}

impl Tuning {
    /// Defaults plus environment overrides (`PATHSCAN_FILTER_DEBUG`).
    pub fn from_env() -> Self {
        Self {
            filter_debug: env_flag("FILTER_DEBUG"),
            ..Self::default()
        }
    }
}
