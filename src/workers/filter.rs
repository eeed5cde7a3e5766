//! Filter stage: relays generator output unchanged. Admission already happened during
//! traversal; this stage keeps its own counts and lifecycle so a third stage can hang off it.

use super::{Flow, Worker, WorkerContext};
use crate::{Component, Entry};

#[derive(Debug, Default)]
pub struct FilterWorker;

impl FilterWorker {
    pub fn new() -> Self {
        Self
    }
}

impl Worker for FilterWorker {
    type Input = Entry;

    fn component(&self) -> Component {
        Component::Filter
    }

    fn upstream_component(&self) -> Option<Component> {
        Some(Component::Generator)
    }

    fn process_item(&mut self, ctx: &mut WorkerContext<Entry>, item: Entry) -> Flow {
        match ctx.push_to_output(item) {
            true => Flow::Continue,
            false => Flow::Stop,
        }
    }
}
