//! Public and internal types for the pathscan API and pipeline.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::utils::config::Tuning;

/// Kind of filesystem object a rule or entry refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Dir,
    File,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Dir => "dir",
            EntryType::File => "file",
        }
    }

    /// One-letter marker used by the CLI listing (`d` / `f`).
    pub fn marker(&self) -> char {
        match self {
            EntryType::Dir => 'd',
            EntryType::File => 'f',
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered filesystem object. Produced only by the generator stage.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    pub entry_type: EntryType,
    pub path: PathBuf,
}

impl Entry {
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            entry_type: EntryType::Dir,
            path: path.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            entry_type: EntryType::File,
            path: path.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Include,
    Exclude,
}

/// One filter rule: `(entry_type, kind, glob pattern)`.
///
/// In `.pathscan.toml` this is a `[[filter]]` table with `entry`, `kind` and `pattern` keys.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FilterRule {
    #[serde(rename = "entry")]
    pub entry_type: EntryType,
    pub kind: RuleKind,
    pub pattern: String,
}

impl FilterRule {
    pub fn new(entry_type: EntryType, kind: RuleKind, pattern: impl Into<String>) -> Self {
        Self {
            entry_type,
            kind,
            pattern: pattern.into(),
        }
    }

    pub fn include_dir(pattern: impl Into<String>) -> Self {
        Self::new(EntryType::Dir, RuleKind::Include, pattern)
    }

    pub fn exclude_dir(pattern: impl Into<String>) -> Self {
        Self::new(EntryType::Dir, RuleKind::Exclude, pattern)
    }

    pub fn include_file(pattern: impl Into<String>) -> Self {
        Self::new(EntryType::File, RuleKind::Include, pattern)
    }

    pub fn exclude_file(pattern: impl Into<String>) -> Self {
        Self::new(EntryType::File, RuleKind::Exclude, pattern)
    }
}

/// Pipeline stages. Also the key of the pipeline state table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    Generator,
    Filter,
    Executor,
}

impl Component {
    pub fn name(&self) -> &'static str {
        match self {
            Component::Generator => "generator",
            Component::Filter => "filter",
            Component::Executor => "executor",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle of one component. Ordered; a component never moves backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComponentState {
    Initial,
    Running,
    Finished,
    Stopped,
}

/// What travels on every inter-stage channel: real items, then exactly one end marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message<T> {
    Item(T),
    EndOfStream,
}

/// A log line produced inside a worker thread, relayed to the host logger by the orchestrator.
#[derive(Clone, Debug)]
pub struct LogRecord {
    pub component: Component,
    pub level: log::Level,
    pub message: String,
}

/// One-shot cancellation signal shared between a controller and its worker. Never cleared.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options assembled by the CLI from `.pathscan.toml` and command-line flags.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    /// Filter rules in the order they were given (file rules first, then CLI rules).
    pub rules: Vec<FilterRule>,
    /// Debug-level logging for our crate.
    pub verbose: bool,
    /// Run the full generate/filter/execute pipeline and print totals instead of listing paths.
    pub summary: bool,
    /// Queue sizes, intervals and batch sizes for the pipeline.
    pub tuning: Tuning,
}
