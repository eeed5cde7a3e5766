//! Executor stage: hands every entry to a pluggable [`EntrySink`].

use anyhow::Result;
use log::Level;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Flow, Worker, WorkerContext};
use crate::{Component, Entry, EntryType};

/// Consumer of scanned entries. A failed entry is logged by the executor and skipped.
pub trait EntrySink: Send {
    fn handle(&mut self, entry: &Entry) -> Result<()>;

    /// Called once after the last entry.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<F> EntrySink for F
where
    F: FnMut(&Entry) -> Result<()> + Send,
{
    fn handle(&mut self, entry: &Entry) -> Result<()> {
        self(entry)
    }
}

#[derive(Debug, Default)]
struct SinkCounts {
    dirs: AtomicU64,
    files: AtomicU64,
}

/// Tallies entries by type. Clones share the same counters, so keep one to read totals after
/// handing another to the pipeline.
#[derive(Clone, Debug, Default)]
pub struct CountingSink {
    counts: Arc<SinkCounts>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dirs(&self) -> u64 {
        self.counts.dirs.load(Ordering::Relaxed)
    }

    pub fn files(&self) -> u64 {
        self.counts.files.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.dirs() + self.files()
    }
}

impl EntrySink for CountingSink {
    fn handle(&mut self, entry: &Entry) -> Result<()> {
        let counter = match entry.entry_type {
            EntryType::Dir => &self.counts.dirs,
            EntryType::File => &self.counts.files,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

pub struct ExecutorWorker {
    sink: Box<dyn EntrySink>,
    failed: u64,
}

impl ExecutorWorker {
    pub fn new(sink: Box<dyn EntrySink>) -> Self {
        Self { sink, failed: 0 }
    }
}

impl Worker for ExecutorWorker {
    type Input = Entry;

    fn component(&self) -> Component {
        Component::Executor
    }

    fn upstream_component(&self) -> Option<Component> {
        Some(Component::Filter)
    }

    fn process_item(&mut self, ctx: &mut WorkerContext<Entry>, item: Entry) -> Flow {
        if let Err(e) = self.sink.handle(&item) {
            self.failed += 1;
            ctx.log(
                Level::Warn,
                format!(
                    "Sink failed for ({}) [{}]: {e:#}",
                    item.entry_type,
                    item.path.display()
                ),
            );
        }
        Flow::Continue
    }

    fn post_loop_hook(&mut self, ctx: &mut WorkerContext<Entry>) {
        if let Err(e) = self.sink.finish() {
            ctx.log(Level::Warn, format!("Sink failed to finish: {e:#}"));
        }
        if self.failed > 0 {
            ctx.log(
                Level::Warn,
                format!("Sink rejected {} of {} entries.", self.failed, ctx.read_count()),
            );
        }
        ctx.set_finished();
    }
}
