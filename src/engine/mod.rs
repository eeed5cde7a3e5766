//! Engine module: admission rules and the CLI front end

pub mod arg_parser;
pub mod cli;
pub mod filter;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use filter::{Admission, CATCH_ALL_PATTERN, FilterRuleSet};
