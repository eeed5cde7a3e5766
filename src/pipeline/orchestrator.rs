use anyhow::{Context, Result, bail};
use log::{error, info};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::context::{PipelineChannels, RunningPipeline, ScanSummary};
use crate::engine::filter::FilterRuleSet;
use crate::utils::config::Tuning;
use crate::workers::{Controller, EntrySink, ExecutorWorker, FilterWorker, GeneratorWorker};
use crate::{CancelFlag, Component, Entry, FilterRule};

/// Which stages to run. The generator is always first; results are taken from the last stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Topology {
    /// Generator only.
    Generate,
    /// Generator → filter.
    #[default]
    GenerateFilter,
    /// Generator → filter → executor (needs a sink).
    GenerateFilterExecute,
}

impl Topology {
    pub fn components(&self) -> &'static [Component] {
        match self {
            Topology::Generate => &[Component::Generator],
            Topology::GenerateFilter => &[Component::Generator, Component::Filter],
            Topology::GenerateFilterExecute => &[
                Component::Generator,
                Component::Filter,
                Component::Executor,
            ],
        }
    }
}

/// Builds and drives one scan.
///
/// ```ignore
/// let rules = [FilterRule::exclude_dir(".git"), FilterRule::include_file("*.rs")];
/// for entry in Orchestrator::new("src", &rules)?.stream()? {
///     println!("{} {}", entry.entry_type, entry.path.display());
/// }
/// ```
pub struct Orchestrator {
    root: PathBuf,
    rules: FilterRuleSet,
    topology: Topology,
    sink: Option<Box<dyn EntrySink>>,
    tuning: Tuning,
    cancel: CancelFlag,
}

impl Orchestrator {
    /// `root` must be an existing directory; `rules` are compiled here (bad globs fail).
    pub fn new(root: impl AsRef<Path>, rules: &[FilterRule]) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let meta = std::fs::metadata(&root)
            .with_context(|| format!("read scan root {}", root.display()))?;
        if !meta.is_dir() {
            bail!("scan root is not a directory: {}", root.display());
        }
        Ok(Self {
            root,
            rules: FilterRuleSet::new(rules)?,
            topology: Topology::default(),
            sink: None,
            tuning: Tuning::from_env(),
            cancel: CancelFlag::new(),
        })
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Attach the executor's sink and switch to the three-stage topology.
    pub fn with_sink(mut self, sink: Box<dyn EntrySink>) -> Self {
        self.sink = Some(sink);
        self.topology = Topology::GenerateFilterExecute;
        self
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Setting this flag (e.g. from a Ctrl+C handler) cancels every stage.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn build_controllers(self, channels: &PipelineChannels) -> Result<Vec<Controller>> {
        let Self {
            rules,
            topology,
            sink,
            tuning,
            ..
        } = self;

        if topology == Topology::GenerateFilterExecute && sink.is_none() {
            bail!("executor stage needs a sink");
        }

        let mut controllers = Vec::with_capacity(topology.components().len());
        let generator = Controller::new(
            GeneratorWorker::new(rules),
            channels.links(channels.seed_rx.clone()),
            tuning.generator_output_capacity,
            tuning.clone(),
            None,
        );
        let mut upstream = generator.output();
        controllers.push(generator);

        if topology != Topology::Generate {
            let filter = Controller::new(
                FilterWorker::new(),
                channels.links(upstream),
                tuning.filter_output_capacity,
                tuning.clone(),
                None,
            );
            upstream = filter.output();
            controllers.push(filter);
        }

        if let Some(sink) = sink.filter(|_| topology == Topology::GenerateFilterExecute) {
            let executor = Controller::new(
                ExecutorWorker::new(sink),
                channels.links(upstream),
                tuning.executor_output_capacity,
                tuning,
                None,
            );
            controllers.push(executor);
        }

        Ok(controllers)
    }

    fn launch(self) -> Result<RunningPipeline> {
        let tuning = self.tuning.clone();
        let cancel = self.cancel.clone();
        let channels = PipelineChannels::new(self.topology.components(), self.root.clone());
        let controllers = self.build_controllers(&channels)?;
        RunningPipeline::launch(channels, controllers, tuning, cancel)
    }

    /// Run to completion, counting (and discarding) whatever the last stage emits.
    pub fn run(self) -> Result<ScanSummary> {
        info!("Orchestrator running.");
        let mut pipeline = self.launch()?;
        let mut discard = |_e: Entry| {};
        while !pipeline.step(&mut discard) {}
        pipeline.drain_remaining(&mut discard);
        pipeline.shutdown()?;
        Ok(pipeline.summary())
    }

    /// Start the pipeline and return a lazy iterator over the last stage's entries.
    pub fn stream(self) -> Result<ScanStream> {
        info!("Orchestrator streaming.");
        Ok(ScanStream {
            pipeline: self.launch()?,
            buffer: VecDeque::new(),
            done: false,
            error: None,
        })
    }
}

/// Entries in discovery order, pulled batch by batch from a running pipeline.
/// Dropping it early cancels the scan and joins every worker.
pub struct ScanStream {
    pipeline: RunningPipeline,
    buffer: VecDeque<Entry>,
    done: bool,
    error: Option<anyhow::Error>,
}

impl ScanStream {
    /// Cancel the scan. Entries already buffered are still yielded.
    pub fn cancel(&mut self) {
        self.pipeline.cancel_all();
    }

    pub fn summary(&self) -> ScanSummary {
        self.pipeline.summary()
    }

    /// Discard whatever is left, shut down, and report the summary or the shutdown error.
    pub fn finish(mut self) -> Result<ScanSummary> {
        for _ in self.by_ref() {}
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self.pipeline.summary()),
        }
    }
}

impl Iterator for ScanStream {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Some(entry);
            }
            if self.done {
                return None;
            }
            let mut push = |e: Entry| self.buffer.push_back(e);
            if self.pipeline.step(&mut push) {
                self.pipeline.drain_remaining(&mut push);
                if let Err(e) = self.pipeline.shutdown() {
                    error!("Pipeline shutdown failed: {e:#}");
                    self.error = Some(e);
                }
                self.done = true;
            }
        }
    }
}
