//! A launched pipeline: controllers, the terminal output, the shared log channel, and the
//! coordination step both orchestrator modes are built on.

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::state::PipelineState;
use crate::utils::config::Tuning;
use crate::workers::{Controller, StageLinks};
use crate::{CancelFlag, Component, ComponentState, Entry, LogRecord, Message};

/// Outcome of a finished (or cancelled) scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Items received from the terminal stage.
    pub emitted: u64,
    /// Pushed-item count of every stage that reached `Finished`.
    pub final_counts: BTreeMap<Component, u64>,
    /// True when the run was cut short by a cancel request or a crashed stage.
    pub cancelled: bool,
}

/// Shared channels every stage is wired to.
pub(crate) struct PipelineChannels {
    pub state: PipelineState,
    pub log_tx: Sender<LogRecord>,
    pub log_rx: Receiver<LogRecord>,
    /// Kept alive so the generator never sees its input disconnect.
    pub seed_tx: Sender<Message<PathBuf>>,
    pub seed_rx: Receiver<Message<PathBuf>>,
}

impl PipelineChannels {
    /// State table at `Initial` for `components`; seed queue holding `root`.
    pub fn new(components: &[Component], root: PathBuf) -> Self {
        let (log_tx, log_rx) = unbounded();
        let (seed_tx, seed_rx) = unbounded();
        // Receiver is held right here, so the send can not fail.
        let _ = seed_tx.send(Message::Item(root));
        Self {
            state: PipelineState::new(components),
            log_tx,
            log_rx,
            seed_tx,
            seed_rx,
        }
    }

    pub fn links<I>(&self, input: Receiver<Message<I>>) -> StageLinks<I> {
        StageLinks {
            state: self.state.clone(),
            input,
            log_tx: self.log_tx.clone(),
        }
    }
}

pub(crate) struct RunningPipeline {
    state: PipelineState,
    controllers: Vec<Controller>,
    terminal: Receiver<Message<Entry>>,
    log_rx: Receiver<LogRecord>,
    _seed_tx: Sender<Message<PathBuf>>,
    tuning: Tuning,
    cancel: CancelFlag,
    terminal_done: bool,
    cancelled: bool,
    emitted: u64,
    stopped: bool,
}

impl RunningPipeline {
    /// Start `controllers` upstream-to-downstream. If one fails to start, the ones already
    /// running are cancelled and joined and the start error is returned.
    pub fn launch(
        channels: PipelineChannels,
        controllers: Vec<Controller>,
        tuning: Tuning,
        cancel: CancelFlag,
    ) -> Result<Self> {
        let terminal = match controllers.last() {
            Some(c) => c.output(),
            None => anyhow::bail!("pipeline has no stages"),
        };
        let mut pipeline = Self {
            state: channels.state,
            controllers: Vec::with_capacity(controllers.len()),
            terminal,
            log_rx: channels.log_rx,
            _seed_tx: channels.seed_tx,
            tuning,
            cancel,
            terminal_done: false,
            cancelled: false,
            emitted: 0,
            stopped: false,
        };
        for mut controller in controllers {
            let started = controller.start();
            pipeline.controllers.push(controller);
            if let Err(e) = started {
                pipeline.abort();
                return Err(e);
            }
        }
        Ok(pipeline)
    }

    /// Ask every stage to stop at its next cancel checkpoint.
    pub fn cancel_all(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            for c in &self.controllers {
                c.cancel();
            }
        }
    }

    /// A stage whose thread exited without reaching `Stopped` panicked.
    fn crashed_stage(&self) -> Option<Component> {
        self.controllers
            .iter()
            .find(|c| {
                c.is_finished()
                    && self
                        .state
                        .state(c.component())
                        .is_some_and(|s| s < ComponentState::Stopped)
            })
            .map(Controller::component)
    }

    /// One coordination round: relay up to a batch of results to `on_item`, then up to a batch
    /// of log records. Returns true once the run is over (terminal end-of-stream seen, every
    /// stage stopped, or a stage crashed).
    pub fn step<F: FnMut(Entry)>(&mut self, on_item: &mut F) -> bool {
        if self.cancel.is_set() && !self.cancelled {
            info!("Cancellation requested; stopping pipeline.");
            self.cancel_all();
        }

        let received = self.drain_results(on_item);
        self.drain_logs(received == 0);

        if self.terminal_done || self.state.all_at_least(ComponentState::Stopped) {
            return true;
        }
        if let Some(component) = self.crashed_stage() {
            warn!("{component} worker exited without stopping cleanly.");
            self.cancel_all();
            return true;
        }
        false
    }

    fn drain_results<F: FnMut(Entry)>(&mut self, on_item: &mut F) -> usize {
        let mut received = 0;
        while !self.terminal_done && received < self.tuning.result_drain_batch.max(1) {
            match self.terminal.try_recv() {
                Ok(Message::Item(entry)) => {
                    received += 1;
                    self.emitted += 1;
                    on_item(entry);
                }
                Ok(Message::EndOfStream) | Err(TryRecvError::Disconnected) => {
                    debug!("Terminal stage reached end of stream.");
                    self.terminal_done = true;
                }
                Err(TryRecvError::Empty) => break,
            }
        }
        received
    }

    /// Relay buffered log records through the host logger. Waits up to the log read timeout
    /// for the first one when `wait` is set.
    fn drain_logs(&mut self, wait: bool) {
        let first = if wait {
            match self.log_rx.recv_timeout(self.tuning.log_read_timeout) {
                Ok(r) => Some(r),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
            }
        } else {
            self.log_rx.try_recv().ok()
        };
        let Some(first) = first else {
            return;
        };
        emit_log(first);
        for _ in 1..self.tuning.log_drain_batch.max(1) {
            match self.log_rx.try_recv() {
                Ok(r) => emit_log(r),
                Err(_) => break,
            }
        }
    }

    /// Pull whatever results are already buffered after the stages have stopped.
    pub fn drain_remaining<F: FnMut(Entry)>(&mut self, on_item: &mut F) {
        while !self.terminal_done && self.drain_results(on_item) > 0 {}
    }

    /// Wait for every worker thread to exit while keeping the terminal output and the log
    /// channel drained, then join controllers downstream-to-upstream.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        info!("Terminating workers.");

        let mut discard = |_e: Entry| {};
        while !self.controllers.iter().all(Controller::is_finished) {
            self.drain_results(&mut discard);
            self.drain_logs(true);
        }

        let mut first_err = None;
        for controller in self.controllers.iter_mut().rev() {
            if let Err(e) = controller.stop() {
                first_err.get_or_insert(e);
            }
        }
        while let Ok(r) = self.log_rx.try_recv() {
            emit_log(r);
        }
        debug!("Final component states: {:?}", self.state.snapshot());
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Cancel everything and shut down, logging instead of returning errors.
    pub fn abort(&mut self) {
        self.cancel_all();
        if let Err(e) = self.shutdown() {
            warn!("Pipeline shutdown after abort failed: {e:#}");
        }
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            emitted: self.emitted,
            final_counts: self.state.final_counts(),
            cancelled: self.cancelled,
        }
    }
}

impl Drop for RunningPipeline {
    fn drop(&mut self) {
        if !self.stopped {
            self.abort();
        }
    }
}

fn emit_log(record: LogRecord) {
    log::log!(record.level, "{}: {}", record.component, record.message);
}
