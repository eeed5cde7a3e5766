//! Generator stage: recursively lists directories from a root and emits admitted entries.
//!
//! Subdirectories are fed back through a local queue that always takes precedence over the
//! shared input, which only ever carries the seed path. Once both are empty the stage ends.

use log::Level;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::{Flow, Worker, WorkerContext};
use crate::engine::filter::FilterRuleSet;
use crate::{Component, Entry, EntryType, Message};

pub struct GeneratorWorker {
    rules: FilterRuleSet,
    /// Set after the first (root) item has been taken.
    processed_first: bool,
    local_queue: VecDeque<PathBuf>,
}

impl GeneratorWorker {
    pub fn new(rules: FilterRuleSet) -> Self {
        Self {
            rules,
            processed_first: false,
            local_queue: VecDeque::new(),
        }
    }

    fn permits(&self, ctx: &WorkerContext<PathBuf>, entry_type: EntryType, name: &str) -> bool {
        let admission = self.rules.check(entry_type, name);
        if ctx.tuning().filter_debug {
            ctx.log(Level::Debug, admission.describe(entry_type, name));
        }
        admission.is_admitted()
    }
}

/// Last path component, or the whole path when there is none (`/`, `.`).
fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

impl Worker for GeneratorWorker {
    type Input = PathBuf;

    fn component(&self) -> Component {
        Component::Generator
    }

    fn next_item(&mut self, ctx: &mut WorkerContext<PathBuf>) -> Option<Message<PathBuf>> {
        if let Some(path) = self.local_queue.pop_front() {
            return Some(Message::Item(path));
        }
        ctx.try_next_input()
    }

    fn pre_loop_hook(&mut self, ctx: &mut WorkerContext<PathBuf>) {
        ctx.log(Level::Debug, format!("Final rules:\n{}", self.rules));
    }

    fn process_item(&mut self, ctx: &mut WorkerContext<PathBuf>, entry_path: PathBuf) -> Flow {
        // The first item is the scan root: exempt from the rules and emitted as-is.
        if self.processed_first {
            if !self.permits(ctx, EntryType::Dir, &base_name(&entry_path)) {
                return Flow::Continue;
            }
        } else {
            self.processed_first = true;
            if !ctx.push_to_output(Entry::dir(entry_path.clone())) {
                return Flow::Stop;
            }
        }

        let listing = match std::fs::read_dir(&entry_path) {
            Ok(listing) => listing,
            Err(e) => {
                ctx.log(
                    Level::Warn,
                    format!("Skipping unreadable directory: [{}]: {e}", entry_path.display()),
                );
                return Flow::Continue;
            }
        };

        for dir_entry in listing {
            if ctx.check_cancel() {
                ctx.log(
                    Level::Warn,
                    format!(
                        "Generator has been told to quit before finishing. WITHIN=[{}]",
                        entry_path.display()
                    ),
                );
                return Flow::Stop;
            }

            let dir_entry = match dir_entry {
                Ok(d) => d,
                Err(e) => {
                    ctx.log(
                        Level::Warn,
                        format!("Skipping unreadable entry in [{}]: {e}", entry_path.display()),
                    );
                    continue;
                }
            };

            let file_path = dir_entry.path();
            let entry_type = if file_path.is_dir() {
                EntryType::Dir
            } else {
                EntryType::File
            };

            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if !self.permits(ctx, entry_type, &name) {
                continue;
            }

            if ctx.progress_due() {
                ctx.log(
                    Level::Debug,
                    format!("Generator progress: ({})", ctx.tick_count()),
                );
            }

            if entry_type == EntryType::Dir {
                self.local_queue.push_back(file_path.clone());
            }
            if !ctx.push_to_output(Entry {
                entry_type,
                path: file_path,
            }) {
                return Flow::Stop;
            }

            ctx.increment_tick();
        }

        Flow::Continue
    }

    fn terminate_on_idle(&self) -> bool {
        true
    }
}
