pub mod config;
pub mod logger;
pub mod pathscan_toml;

pub use config::*;
pub use logger::setup_logging;
pub use pathscan_toml::opts_from_toml_str;
