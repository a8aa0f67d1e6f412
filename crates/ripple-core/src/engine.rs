use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::SlotMap;
use web_time::Instant;

use crate::context::{ContextGuard, ObservationContext};
use crate::reactive::DepGraph;
use crate::scheduler::{PendingWrite, UpdateScheduler};
use crate::store::StateStore;
use crate::{Clock, EngineConfig, Error, Result, StateAccess, StateKey, SystemClock, Value};

slotmap::new_key_type! {
    /// Identity of an owner or observer registered with an [`Engine`].
    pub struct EntityId;
}

/// Anything that wants to hear about state changes.
///
/// `from` is the owner whose key changed, or `None` when an owner is told
/// about its own write because nobody else was listening.
pub trait Observer {
    fn update(&self, from: Option<EntityId>, name: &str, value: &Value);
}

struct Entity {
    notifier: Option<Weak<dyn Observer>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub entities: usize,
    pub cells: usize,
    pub edges: usize,
    pub pending_sets: usize,
    pub buffered_writes: usize,
}

/// The reactive runtime: state cells, the dependency graph, the current
/// observer slot and the deferred-write buffer.
///
/// `Engine` is a cheap handle; clones share the same runtime. It is meant to
/// be created once per UI thread (or once per test) and passed around.
#[derive(Clone)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    clock: Rc<dyn Clock>,
    entities: RefCell<SlotMap<EntityId, Entity>>,
    store: RefCell<StateStore>,
    graph: RefCell<DepGraph>,
    scheduler: RefCell<UpdateScheduler>,
    context: ObservationContext,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("current", &self.current_observer())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: EngineConfig, clock: impl Clock) -> Self {
        Self {
            inner: Rc::new(EngineInner {
                config,
                clock: Rc::new(clock),
                entities: RefCell::new(SlotMap::with_key()),
                store: RefCell::new(StateStore::default()),
                graph: RefCell::new(DepGraph::default()),
                scheduler: RefCell::new(UpdateScheduler::default()),
                context: ObservationContext::default(),
            }),
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.inner.config
    }

    pub(crate) fn context(&self) -> &ObservationContext {
        &self.inner.context
    }

    // Entities

    /// Registers an observer. The engine keeps only a weak reference.
    pub fn register<O: Observer + 'static>(&self, observer: &Rc<O>) -> EntityId {
        let strong: Rc<dyn Observer> = observer.clone();
        let notifier = Some(Rc::downgrade(&strong));
        self.inner.entities.borrow_mut().insert(Entity { notifier })
    }

    /// Registers an owner that never receives notifications.
    pub fn register_inert(&self) -> EntityId {
        self.inner
            .entities
            .borrow_mut()
            .insert(Entity { notifier: None })
    }

    pub fn is_registered(&self, id: EntityId) -> bool {
        self.inner.entities.borrow().contains_key(id)
    }

    fn notifier(&self, id: EntityId) -> Option<Rc<dyn Observer>> {
        self.inner
            .entities
            .borrow()
            .get(id)
            .and_then(|e| e.notifier.as_ref())
            .and_then(Weak::upgrade)
    }

    /// Purges every cell, buffered write and graph edge belonging to `owner`
    /// and unregisters it. Returns false if it wasn't registered.
    pub fn dispose_owner(&self, owner: EntityId) -> bool {
        let cells = self.inner.store.borrow_mut().purge(owner);
        self.inner.scheduler.borrow_mut().purge_owner(owner);
        self.inner.graph.borrow_mut().purge_owner(owner);
        let known = self.inner.entities.borrow_mut().remove(owner).is_some();
        log::debug!("disposed owner {owner:?} ({cells} cells)");
        known
    }

    /// Back to a freshly constructed engine. Config and clock are kept.
    ///
    /// Guards still alive from before the reset no longer restore anything
    /// when they drop.
    pub fn reset(&self) {
        self.inner.store.borrow_mut().clear();
        self.inner.graph.borrow_mut().clear();
        self.inner.scheduler.borrow_mut().clear();
        self.inner.entities.borrow_mut().clear();
        self.inner.context.clear();
    }

    pub fn stats(&self) -> EngineStats {
        let graph = self.inner.graph.borrow();
        EngineStats {
            entities: self.inner.entities.borrow().len(),
            cells: self.inner.store.borrow().cell_count(),
            edges: graph.edge_count(),
            pending_sets: graph.pending_count(),
            buffered_writes: self.inner.scheduler.borrow().len(),
        }
    }

    // Store

    /// Shallow-merges `values` into the owner's cells. Does not notify.
    pub fn initialize<K: Into<String>>(
        &self,
        owner: EntityId,
        values: impl IntoIterator<Item = (K, Value)>,
    ) {
        self.inner
            .store
            .borrow_mut()
            .initialize(owner, values.into_iter().map(|(k, v)| (k.into(), v)));
    }

    /// Tracked read: records the key against the current observer, if any.
    pub fn read(&self, owner: EntityId, name: &str) -> Option<Value> {
        if let Some(obs) = self.inner.context.current() {
            self.record(obs, owner, name);
        }
        self.peek(owner, name)
    }

    /// Tracked read recorded against `observer` instead of the current one.
    pub fn read_as(&self, owner: EntityId, name: &str, observer: EntityId) -> Option<Value> {
        self.record(observer, owner, name);
        self.peek(owner, name)
    }

    // Disposed observers record nothing, even inside a scope still open for them.
    fn record(&self, obs: EntityId, owner: EntityId, name: &str) {
        if !self.is_registered(obs) {
            return;
        }
        self.inner.graph.borrow_mut().record(obs, owner, name);
        log::trace!("{obs:?} read {owner:?}.{name}");
    }

    /// Untracked read.
    pub fn peek(&self, owner: EntityId, name: &str) -> Option<Value> {
        self.inner.store.borrow().read(owner, name)
    }

    pub fn get<T: Clone + 'static>(&self, owner: EntityId, name: &str) -> Option<T> {
        self.read(owner, name).and_then(|v| v.get::<T>())
    }

    /// Replaces the stored value without notifying anyone.
    pub fn write(&self, owner: EntityId, name: &str, value: Value) {
        self.inner.store.borrow_mut().write(owner, name, value);
    }

    // Context

    pub fn enter(&self, observer: EntityId) -> ContextGuard {
        if self.is_registered(observer) && self.inner.graph.borrow_mut().open(observer) {
            log::trace!("opened pending set for {observer:?}");
        }
        ContextGuard::begin(self, observer)
    }

    /// Runs `f` with `observer` as the current observer.
    pub fn track<R>(&self, observer: EntityId, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter(observer);
        f()
    }

    pub fn current_observer(&self) -> Option<EntityId> {
        self.inner.context.current()
    }

    // Graph

    /// Makes the keys recorded since the last commit the observer's
    /// dependency set, replacing the previous one.
    pub fn commit(&self, observer: EntityId) -> Result<()> {
        let n = self
            .inner
            .graph
            .borrow_mut()
            .commit(observer)
            .ok_or_else(|| Error::no_context(Some(observer)))?;
        log::debug!("committed {n} dependencies for {observer:?}");
        Ok(())
    }

    pub fn commit_current(&self) -> Result<()> {
        let observer = self.current_observer().ok_or_else(|| Error::no_context(None))?;
        self.commit(observer)
    }

    /// Retires an observer for good. Call exactly once.
    pub fn remove(&self, observer: EntityId) -> Result<()> {
        if !self.inner.graph.borrow_mut().remove(observer) {
            return Err(Error::no_context(Some(observer)));
        }
        log::debug!("removed observer {observer:?}");
        Ok(())
    }

    pub fn remove_current(&self) -> Result<()> {
        let observer = self.current_observer().ok_or_else(|| Error::no_context(None))?;
        self.remove(observer)
    }

    pub fn is_observing(&self, owner: EntityId, name: &str, observer: EntityId) -> bool {
        self.inner.graph.borrow().is_observing(owner, name, observer)
    }

    pub fn will_observe(&self, owner: EntityId, name: &str, observer: EntityId) -> bool {
        self.inner.graph.borrow().will_observe(owner, name, observer)
    }

    pub fn observers_of(&self, owner: EntityId, name: &str) -> Vec<EntityId> {
        self.inner.graph.borrow().observers_of(owner, name).to_vec()
    }

    pub fn dependencies_of(&self, observer: EntityId) -> Vec<StateKey> {
        self.inner.graph.borrow().dependencies_of(observer)
    }

    pub fn pending_dependencies_of(&self, observer: EntityId) -> Vec<StateKey> {
        self.inner.graph.borrow().pending_of(observer)
    }

    // Writes and notification

    /// Stores `value` and notifies, either now or with the next flush.
    /// Returns the value written.
    pub fn set_state(&self, owner: EntityId, name: &str, value: Value, deferred: bool) -> Value {
        self.write(owner, name, value.clone());
        if deferred {
            let now = self.inner.clock.now();
            let window = self.inner.config.coalesce_window;
            let scheduled =
                self.inner
                    .scheduler
                    .borrow_mut()
                    .enqueue(owner, name, value.clone(), now, window);
            if scheduled {
                log::debug!("flush scheduled in {window:?}");
            }
        } else {
            self.notify(owner, name, &value);
        }
        value
    }

    pub fn set(&self, owner: EntityId, name: &str, value: Value) -> Value {
        self.set_state(owner, name, value, false)
    }

    pub fn set_deferred(&self, owner: EntityId, name: &str, value: Value) -> Value {
        self.set_state(owner, name, value, true)
    }

    /// Delivers a change to every committed observer of the key, falling
    /// back to the owner itself when it wasn't among them. Returns the
    /// number of `update` calls made.
    pub fn notify(&self, owner: EntityId, name: &str, value: &Value) -> usize {
        // Snapshot: observers may commit or remove while being notified.
        let observers = self.inner.graph.borrow().observers_of(owner, name);
        let mut delivered = 0;
        let mut owner_notified = false;

        for obs in observers {
            match self.notifier(obs) {
                Some(target) => {
                    target.update(Some(owner), name, value);
                    delivered += 1;
                    if obs == owner {
                        owner_notified = true;
                    }
                }
                None => log::warn!("{obs:?} observes {owner:?}.{name} but cannot be notified"),
            }
        }

        if !owner_notified && let Some(target) = self.notifier(owner) {
            target.update(None, name, value);
            delivered += 1;
        }
        delivered
    }

    /// Deadline of the scheduled flush, if any.
    pub fn next_flush_at(&self) -> Option<Instant> {
        self.inner.scheduler.borrow().deadline()
    }

    /// Runs the scheduled flush if its deadline has passed. Hosts call this
    /// from their event loop. Returns the number of keys delivered.
    pub fn flush_due(&self) -> usize {
        let now = self.inner.clock.now();
        let writes = self.inner.scheduler.borrow_mut().take_due(now);
        writes.map(|w| self.dispatch(w)).unwrap_or(0)
    }

    /// Runs the scheduled flush immediately.
    pub fn flush_now(&self) -> usize {
        let writes = self.inner.scheduler.borrow_mut().take();
        writes.map(|w| self.dispatch(w)).unwrap_or(0)
    }

    fn dispatch(&self, writes: Vec<PendingWrite>) -> usize {
        log::debug!("flushing {} coalesced writes", writes.len());
        for w in &writes {
            self.notify(w.key.owner, &w.key.name, &w.value);
        }
        writes.len()
    }

    // Sugar

    pub fn access(&self, owner: EntityId) -> StateAccess {
        StateAccess::new(self, owner)
    }
}
