//! Per-worker context: channels, counters and the throttled cancel check.

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TryRecvError};
use log::Level;
use std::thread;
use std::time::Instant;

use crate::pipeline::state::PipelineState;
use crate::utils::config::Tuning;
use crate::{CancelFlag, Component, ComponentState, Entry, LogRecord, Message};

/// Handles a stage shares with the rest of the pipeline: the state table, its input and the
/// log channel. The output channel belongs to the stage's controller.
#[derive(Clone)]
pub struct StageLinks<I> {
    pub state: PipelineState,
    pub input: Receiver<Message<I>>,
    pub log_tx: Sender<LogRecord>,
}

/// Everything a worker touches while running. Owned by the worker's thread.
pub struct WorkerContext<I> {
    component: Component,
    state: PipelineState,
    input: Receiver<Message<I>>,
    output: Sender<Message<Entry>>,
    log_tx: Sender<LogRecord>,
    cancel: CancelFlag,
    tuning: Tuning,
    tick: u64,
    push_count: u64,
    read_count: u64,
    last_cancel_check: Option<Instant>,
}

impl<I> WorkerContext<I> {
    pub(crate) fn new(
        component: Component,
        links: StageLinks<I>,
        output: Sender<Message<Entry>>,
        cancel: CancelFlag,
        tuning: Tuning,
    ) -> Self {
        Self {
            component,
            state: links.state,
            input: links.input,
            output,
            log_tx: links.log_tx,
            cancel,
            tuning,
            tick: 0,
            push_count: 0,
            read_count: 0,
            last_cancel_check: None,
        }
    }

    pub fn component(&self) -> Component {
        self.component
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Send a record to the orchestrator. Dropped silently if the orchestrator is gone.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        let _ = self.log_tx.send(LogRecord {
            component: self.component,
            level,
            message: message.into(),
        });
    }

    /// Non-blocking pop from the shared input. A disconnected upstream reads as end of stream.
    pub fn try_next_input(&self) -> Option<Message<I>> {
        match self.input.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Message::EndOfStream),
        }
    }

    /// Push one entry downstream, blocking while the output is full.
    /// Returns false when the push was abandoned (stage cancelled while blocked, or output gone).
    pub fn push_to_output(&mut self, entry: Entry) -> bool {
        if self.send_blocking(Message::Item(entry)) {
            self.push_count += 1;
            true
        } else {
            false
        }
    }

    fn send_blocking(&self, msg: Message<Entry>) -> bool {
        let mut msg = msg;
        loop {
            match self.output.send_timeout(msg, self.tuning.idle_sleep) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(m)) => {
                    if self.cancel.is_set() {
                        return false;
                    }
                    msg = m;
                }
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }

    /// Throttled look at the cancel flag: inspected on the first call, every
    /// `cancel_check_ticks` ticks, or once `cancel_check_interval` has passed since the last look.
    pub fn check_cancel(&mut self) -> bool {
        let ticks = self.tuning.cancel_check_ticks.max(1);
        let due = self.tick % ticks == 0
            || self
                .last_cancel_check
                .is_none_or(|t| t.elapsed() >= self.tuning.cancel_check_interval);
        if !due {
            return false;
        }
        if self.cancel.is_set() {
            self.log(Level::Info, format!("[{}] component terminated.", self.component));
            return true;
        }
        self.last_cancel_check = Some(Instant::now());
        false
    }

    /// Call once per loop cycle so periodic checks can interleave.
    pub fn increment_tick(&mut self) {
        self.tick += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn push_count(&self) -> u64 {
        self.push_count
    }

    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    pub(crate) fn record_read(&mut self) {
        self.read_count += 1;
    }

    /// True on ticks where a progress record is due.
    pub fn progress_due(&self) -> bool {
        self.tick % self.tuning.progress_log_ticks.max(1) == 0
    }

    pub(crate) fn set_state(&self, next: ComponentState) {
        self.state.set_state(self.component, next);
    }

    /// Store the pushed count and move this component to `Finished`.
    /// Done by default after the loop exits; a stage may call it sooner.
    ///
    /// # Panics
    /// If the component is not `Running`.
    pub fn set_finished(&self) {
        self.log(
            Level::Info,
            format!("Component [{}] is being marked as finished.", self.component),
        );
        self.state.mark_finished(self.component, self.push_count);
    }

    /// Wait until the orchestrator has drained every pending log record.
    pub(crate) fn wait_for_log_empty(&self) {
        while !self.log_tx.is_empty() {
            thread::sleep(self.tuning.log_flush_poll);
        }
    }

    /// Push the end-of-stream marker. Blocks like a normal push.
    pub(crate) fn emit_end_of_stream(&self) -> bool {
        self.send_blocking(Message::EndOfStream)
    }
}
