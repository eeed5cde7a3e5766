use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::utils::config::PackagePaths;
use crate::{EntryType, FilterRule, RuleKind};

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Search a filesystem using zero or more file and directory filters.
#[derive(Clone, Parser)]
#[command(name = "pathscan")]
#[command(
    about = "Recursively list a directory, keeping only entries admitted by the include/exclude globs."
)]
pub struct Cli {
    /// Directory to scan. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Only descend into directories whose name matches (glob). Repeat for more patterns.
    #[arg(long, action = ArgAction::Append, value_name = "PATTERN")]
    pub include_dir: Vec<String>,

    /// Never descend into directories whose name matches (glob). Repeat for more patterns.
    #[arg(long, short = 'X', action = ArgAction::Append, value_name = "PATTERN")]
    pub exclude_dir: Vec<String>,

    /// Only list files whose name matches (glob). Repeat for more patterns.
    #[arg(long, short = 'i', action = ArgAction::Append, value_name = "PATTERN")]
    pub include_file: Vec<String>,

    /// Skip files whose name matches (glob). Repeat for more patterns.
    #[arg(long, short = 'x', action = ArgAction::Append, value_name = "PATTERN")]
    pub exclude_file: Vec<String>,

    /// Run the full generate/filter/execute pipeline and print totals instead of paths.
    #[arg(long, short = 's', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub summary: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Log every include/exclude decision (debug level; combine with -v).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub filter_debug: Option<bool>,

    /// Config file. Default: `.pathscan.toml` in DIR, if present.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Filter rules from the command line, dir rules first, includes before excludes.
    pub fn filter_rules(&self) -> Vec<FilterRule> {
        let groups = [
            (EntryType::Dir, RuleKind::Include, &self.include_dir),
            (EntryType::Dir, RuleKind::Exclude, &self.exclude_dir),
            (EntryType::File, RuleKind::Include, &self.include_file),
            (EntryType::File, RuleKind::Exclude, &self.exclude_file),
        ];
        groups
            .into_iter()
            .flat_map(|(entry_type, kind, patterns)| {
                patterns
                    .iter()
                    .map(move |p| FilterRule::new(entry_type, kind, p.clone()))
            })
            .collect()
    }

    /// Config path to load: `--config`, else the per-directory file.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.dir.join(PackagePaths::get().config_filename()))
    }
}
