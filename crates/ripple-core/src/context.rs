use std::cell::Cell;

use web_time::Instant;

use crate::{Engine, EntityId};

/// The "current observer" slot. Only the top of the nesting stack is
/// materialized; each guard carries the entry it displaced.
#[derive(Default)]
pub(crate) struct ObservationContext {
    current: Cell<Option<EntityId>>,
    depth: Cell<usize>,
    // bumped by `clear`; guards from an older epoch leave the slot alone
    epoch: Cell<u64>,
}

impl ObservationContext {
    pub fn current(&self) -> Option<EntityId> {
        self.current.get()
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    fn push(&self, observer: EntityId) -> (Option<EntityId>, u64) {
        self.depth.set(self.depth.get() + 1);
        (self.current.replace(Some(observer)), self.epoch.get())
    }

    fn pop(&self, prev: Option<EntityId>, epoch: u64) {
        if epoch != self.epoch.get() {
            return;
        }
        self.depth.set(self.depth.get().saturating_sub(1));
        self.current.set(prev);
    }

    pub fn clear(&self) {
        self.current.set(None);
        self.depth.set(0);
        self.epoch.set(self.epoch.get() + 1);
    }
}

/// Keeps `observer` as the current observer until dropped.
///
/// Dropping restores whatever was current before, on every exit path
/// including `?` returns and panics.
#[must_use = "the context ends as soon as the guard is dropped"]
pub struct ContextGuard {
    engine: Engine,
    observer: EntityId,
    prev: Option<EntityId>,
    epoch: u64,
    started: Option<Instant>,
}

impl ContextGuard {
    pub(crate) fn begin(engine: &Engine, observer: EntityId) -> Self {
        let (prev, epoch) = engine.context().push(observer);
        let started = log::log_enabled!(log::Level::Trace).then(Instant::now);
        ContextGuard {
            engine: engine.clone(),
            observer,
            prev,
            epoch,
            started,
        }
    }

    pub fn observer(&self) -> EntityId {
        self.observer
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let ctx = self.engine.context();
        if let Some(started) = self.started {
            log::trace!(
                "context {:?} exited at depth {} after {:?}",
                self.observer,
                ctx.depth(),
                started.elapsed()
            );
        }
        ctx.pop(self.prev, self.epoch);
    }
}
