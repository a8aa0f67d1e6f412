use std::cell::Cell;
use std::rc::Rc;

use ripple_core::{Engine, EntityId, Observer, Result, StateAccess, Value};

use crate::{ComponentApi, NativeComponent};

/// A UI component driven by Ripple state.
pub trait Component: 'static {
    type Output;

    /// Seeded into the component's own cells on mount.
    fn initial_state(&self) -> Vec<(String, Value)> {
        Vec::new()
    }

    /// Reads made through `state` (or through the engine) are tracked.
    fn render(&self, state: &StateAccess) -> Self::Output;

    /// Called for every change to a key the last render read.
    fn state_changed(&self, _from: Option<EntityId>, _name: &str, _value: &Value) {}
}

struct Shell<C> {
    component: C,
    native: Option<Rc<dyn NativeComponent>>,
    dirty: Cell<bool>,
}

impl<C: Component> Observer for Shell<C> {
    fn update(&self, from: Option<EntityId>, name: &str, value: &Value) {
        self.dirty.set(true);
        self.component.state_changed(from, name, value);
        if let Some(native) = &self.native
            && native.is_mounted()
        {
            native.force_update();
        }
    }
}

/// A component registered with an engine, between mount and unmount.
///
/// Each [`Mounted::render`] is one tracked pass followed by a commit, so the
/// component is re-notified only for keys its latest render actually read.
pub struct Mounted<C: Component> {
    engine: Engine,
    id: EntityId,
    shell: Rc<Shell<C>>,
    api: ComponentApi,
    rendered: Cell<bool>,
}

impl<C: Component> Mounted<C> {
    pub fn mount(engine: &Engine, component: C, native: Option<Rc<dyn NativeComponent>>) -> Self {
        let initial = component.initial_state();
        let api = native.clone().map(ComponentApi::new).unwrap_or_default();
        let shell = Rc::new(Shell {
            component,
            native,
            dirty: Cell::new(true),
        });
        let id = engine.register(&shell);
        engine.initialize(id, initial);
        log::debug!("mounted component {id:?}");
        Self {
            engine: engine.clone(),
            id,
            shell,
            api,
            rendered: Cell::new(false),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn component(&self) -> &C {
        &self.shell.component
    }

    pub fn api(&self) -> &ComponentApi {
        &self.api
    }

    pub fn state(&self) -> StateAccess {
        self.engine.access(self.id)
    }

    /// True until the first render, and after any notification since the
    /// last one.
    pub fn needs_render(&self) -> bool {
        self.shell.dirty.get()
    }

    pub fn render(&self) -> Result<C::Output> {
        let state = self.state();
        let out = {
            let _guard = self.engine.enter(self.id);
            self.shell.component.render(&state)
        };
        self.engine.commit(self.id)?;
        self.shell.dirty.set(false);
        self.rendered.set(true);
        Ok(out)
    }

    /// Stops observing and drops the component's state.
    pub fn unmount(self) -> Result<()> {
        if self.rendered.get() {
            self.engine.remove(self.id)?;
        }
        self.engine.dispose_owner(self.id);
        log::debug!("unmounted component {:?}", self.id);
        Ok(())
    }
}
