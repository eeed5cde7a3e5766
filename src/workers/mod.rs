//! Pipeline workers: the generic run-loop, its controller, and the concrete stages.
//!
//! A worker runs on its own thread (see [`Controller`]). Its loop pulls items without
//! blocking, hands them to [`Worker::process_item`], and on exit always records its count,
//! flushes its log records, pushes exactly one end-of-stream marker and reaches `Stopped`.

pub mod context;
pub mod controller;
pub mod executor;
pub mod filter;
pub mod generator;

pub use context::{StageLinks, WorkerContext};
pub use controller::Controller;
pub use executor::{CountingSink, EntrySink, ExecutorWorker};
pub use filter::FilterWorker;
pub use generator::GeneratorWorker;

use log::Level;
use std::thread;

use crate::{Component, ComponentState, Message};

/// Returned by hooks to keep the loop going or end it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Stage-specific behaviour plugged into [`run`].
pub trait Worker: Send + 'static {
    type Input: Send + 'static;

    fn component(&self) -> Component;

    /// Only used to say whose end-of-stream marker was received.
    fn upstream_component(&self) -> Option<Component> {
        None
    }

    /// Handle one item. Per-item failures are the stage's to log and swallow;
    /// return [`Flow::Stop`] only to end the whole loop.
    fn process_item(&mut self, ctx: &mut WorkerContext<Self::Input>, item: Self::Input) -> Flow;

    /// Where the next item comes from. Default: non-blocking pop of the shared input.
    fn next_item(&mut self, ctx: &mut WorkerContext<Self::Input>) -> Option<Message<Self::Input>> {
        ctx.try_next_input()
    }

    fn pre_loop_hook(&mut self, _ctx: &mut WorkerContext<Self::Input>) {}

    /// Default: record the pushed count and move to `Finished`.
    fn post_loop_hook(&mut self, ctx: &mut WorkerContext<Self::Input>) {
        ctx.set_finished();
    }

    /// Called while idle, after the cancel check. [`Flow::Stop`] ends the loop.
    fn loop_idle_hook(&mut self, _ctx: &mut WorkerContext<Self::Input>) -> Flow {
        Flow::Continue
    }

    /// Stages that produce their own work (no upstream) end as soon as they run dry.
    fn terminate_on_idle(&self) -> bool {
        false
    }
}

fn handle_idle<W: Worker>(worker: &mut W, ctx: &mut WorkerContext<W::Input>) -> Flow {
    let component = ctx.component();

    if worker.terminate_on_idle() {
        ctx.log(
            Level::Debug,
            format!("Component [{component}] is idle and was told to quit when idle."),
        );
        return Flow::Stop;
    }

    if ctx.check_cancel() {
        ctx.log(
            Level::Debug,
            format!("Component [{component}] saw a quit-signal."),
        );
        return Flow::Stop;
    }

    if worker.loop_idle_hook(ctx) == Flow::Stop {
        ctx.log(
            Level::Info,
            format!("Component [{component}] is idle and we've been told to break."),
        );
        return Flow::Stop;
    }

    thread::sleep(ctx.tuning().idle_sleep);
    ctx.increment_tick();
    Flow::Continue
}

/// Run `worker` to completion on the current thread.
///
/// # Panics
/// On lifecycle contract violations (e.g. finishing from a state other than `Running`).
pub fn run<W: Worker>(mut worker: W, mut ctx: WorkerContext<W::Input>) {
    let component = ctx.component();

    ctx.set_state(ComponentState::Running);
    ctx.log(Level::Info, format!("[{component}] component running."));

    worker.pre_loop_hook(&mut ctx);

    loop {
        let item = match worker.next_item(&mut ctx) {
            None => {
                if handle_idle(&mut worker, &mut ctx) == Flow::Stop {
                    break;
                }
                continue;
            }
            Some(Message::EndOfStream) => {
                let upstream = worker
                    .upstream_component()
                    .map_or("<none>", |c| c.name());
                ctx.log(
                    Level::Info,
                    format!(
                        "Component [{component}] received termination message from upstream component [{upstream}]."
                    ),
                );
                break;
            }
            Some(Message::Item(item)) => item,
        };

        ctx.record_read();

        if ctx.check_cancel() {
            break;
        }

        if ctx.progress_due() {
            ctx.log(
                Level::Debug,
                format!("Component [{component}] progress: ({})", ctx.tick_count()),
            );
        }

        if worker.process_item(&mut ctx, item) == Flow::Stop {
            ctx.log(
                Level::Info,
                format!("Item process for component [{component}] has requested loop termination."),
            );
            break;
        }

        ctx.increment_tick();
    }

    worker.post_loop_hook(&mut ctx);

    ctx.log(
        Level::Info,
        format!(
            "Component [{component}] loop has terminated (read {}, pushed {}).",
            ctx.read_count(),
            ctx.push_count()
        ),
    );

    ctx.wait_for_log_empty();

    if !ctx.emit_end_of_stream() {
        // Cancelled with a full output nobody reads.
        ctx.log(
            Level::Warn,
            format!("Component [{component}] could not deliver its termination message."),
        );
    }

    ctx.set_state(ComponentState::Stopped);
}
