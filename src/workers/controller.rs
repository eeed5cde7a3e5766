//! Controller: owns one worker's thread, bounded output queue and cancel flag.

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, bounded};
use log::info;
use std::thread::{self, JoinHandle};

use super::{StageLinks, Worker, WorkerContext};
use crate::utils::config::{PackagePaths, Tuning};
use crate::{CancelFlag, Component, Entry, Message};

type Boot = Box<dyn FnOnce() + Send + 'static>;

/// Wraps exactly one [`Worker`]. `start` spawns it; `stop` cancels and joins.
pub struct Controller {
    component: Component,
    output_rx: Receiver<Message<Entry>>,
    cancel: CancelFlag,
    boot: Option<Boot>,
    handle: Option<JoinHandle<()>>,
}

impl Controller {
    /// Build the worker's context and output queue (`output_capacity` items, at least 1).
    /// The cancel flag is created when `cancel` is None.
    pub fn new<W: Worker>(
        worker: W,
        links: StageLinks<W::Input>,
        output_capacity: usize,
        tuning: Tuning,
        cancel: Option<CancelFlag>,
    ) -> Self {
        let component = worker.component();
        let cancel = cancel.unwrap_or_default();
        let (output_tx, output_rx) = bounded::<Message<Entry>>(output_capacity.max(1));
        let ctx = WorkerContext::new(component, links, output_tx, cancel.clone(), tuning);
        let boot: Boot = Box::new(move || super::run(worker, ctx));
        Self {
            component,
            output_rx,
            cancel,
            boot: Some(boot),
            handle: None,
        }
    }

    pub fn component(&self) -> Component {
        self.component
    }

    /// Receiving half of this stage's output, for the downstream stage or the orchestrator.
    pub fn output(&self) -> Receiver<Message<Entry>> {
        self.output_rx.clone()
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Spawn the worker thread. Returns immediately.
    pub fn start(&mut self) -> Result<()> {
        let boot = self
            .boot
            .take()
            .ok_or_else(|| anyhow!("{} worker already started", self.component))?;
        info!("Starting {}.", self.component);
        let handle = thread::Builder::new()
            .name(PackagePaths::get().thread_name(self.component.name()))
            .spawn(boot)
            .with_context(|| format!("spawn {} worker thread", self.component))?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Set the cancel flag without waiting.
    pub fn cancel(&self) {
        self.cancel.set();
    }

    /// True once the worker thread has exited (or was never started).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Set the cancel flag and block until the worker thread exits.
    /// A worker that panicked (lifecycle contract violation) is reported as an error.
    pub fn stop(&mut self) -> Result<()> {
        info!("Stopping {}.", self.component);
        self.cancel.set();
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("{} worker thread panicked", self.component))?;
        }
        Ok(())
    }
}
