//! Shared pipeline state table: component → lifecycle state and final pushed count.
//!
//! Each entry is written only by the worker that owns it; the orchestrator and peers read.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::{Component, ComponentState};

/// State of one component as stored in [`PipelineState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentStatus {
    pub state: ComponentState,
    /// Items pushed downstream; recorded when the component reaches `Finished`.
    pub final_count: Option<u64>,
}

impl Default for ComponentStatus {
    fn default() -> Self {
        Self {
            state: ComponentState::Initial,
            final_count: None,
        }
    }
}

/// Cheap-to-clone handle on the shared table.
#[derive(Clone, Debug, Default)]
pub struct PipelineState {
    inner: Arc<RwLock<HashMap<Component, ComponentStatus>>>,
}

impl PipelineState {
    /// Table with every component in `components` at `Initial`.
    pub fn new(components: &[Component]) -> Self {
        let map = components
            .iter()
            .map(|c| (*c, ComponentStatus::default()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub fn status(&self, component: Component) -> Option<ComponentStatus> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&component).copied()
    }

    pub fn state(&self, component: Component) -> Option<ComponentState> {
        self.status(component).map(|s| s.state)
    }

    pub fn final_count(&self, component: Component) -> Option<u64> {
        self.status(component).and_then(|s| s.final_count)
    }

    /// Move `component` to `next`.
    ///
    /// # Panics
    /// If `next` is behind the current state. States never revert.
    pub fn set_state(&self, component: Component, next: ComponentState) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let status = map.entry(component).or_default();
        assert!(
            next >= status.state,
            "component [{component}] can not move from {:?} back to {:?}",
            status.state,
            next
        );
        status.state = next;
    }

    /// Record the final pushed count and move `component` from `Running` to `Finished`.
    ///
    /// # Panics
    /// If the component is not `Running`.
    pub fn mark_finished(&self, component: Component, count: u64) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let status = map.entry(component).or_default();
        assert!(
            status.state == ComponentState::Running,
            "can not change [{component}] to 'finished' from unsupported state: ({:?})",
            status.state
        );
        status.final_count = Some(count);
        status.state = ComponentState::Finished;
    }

    /// True when every registered component is at or beyond `state`. False for an empty table.
    pub fn all_at_least(&self, state: ComponentState) -> bool {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        !map.is_empty() && map.values().all(|s| s.state >= state)
    }

    /// Final counts of every component that reached `Finished`.
    pub fn final_counts(&self) -> BTreeMap<Component, u64> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.iter()
            .filter_map(|(c, s)| s.final_count.map(|n| (*c, n)))
            .collect()
    }

    /// Sorted copy of the whole table (diagnostics).
    pub fn snapshot(&self) -> BTreeMap<Component, ComponentStatus> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.iter().map(|(c, s)| (*c, *s)).collect()
    }
}
