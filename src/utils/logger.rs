//! CLI logging. Stage records arrive through the orchestrator as `"<component>: <message>"`,
//! so one line format covers both pipeline and front-end messages.

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

use crate::utils::config::env_flag;

/// Level for pathscan's own modules. `PATHSCAN_DEBUG_LOG=1` forces Debug.
pub fn crate_level(verbose: bool) -> LevelFilter {
    if verbose || env_flag("DEBUG_LOG") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// `[pathscan] msg`, or `[pathscan WARN module] msg` for warnings and errors. The module is
/// shown without the crate prefix.
pub fn format_line(level: Level, target: &str, message: &str) -> String {
    let name = env!("CARGO_PKG_NAME");
    let level_str = match level {
        Level::Warn => "WARN".yellow(),
        Level::Error => "ERROR".red(),
        _ => return format!("[{}] {}", name.cyan(), message),
    };
    let module = target
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(target);
    format!("[{} {} {}] {}", name.cyan(), level_str, module.white(), message)
}

/// Install `env_logger` for the CLI: dependencies at Warn, pathscan at [`crate_level`].
/// A logger that is already installed is left in place.
pub fn setup_logging(verbose: bool) {
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), crate_level(verbose))
        .format(|buf, record| {
            let line = format_line(record.level(), record.target(), &record.args().to_string());
            writeln!(buf, "{line}")
        })
        .try_init();
}
