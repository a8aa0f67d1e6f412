use std::rc::Rc;

use crate::{Engine, EntityId, Error, Result, Value};

/// Keyed access to one owner's state.
///
/// `get`/`set` are the plain forms. `assign` and `bind` are the two sugar
/// forms: set-and-return-previous, and a handle bound to a single key.
/// An access created with [`StateAccess::unbound`] has no owner behind it and
/// every operation fails with [`Error::MissingOwnerBinding`].
#[derive(Clone)]
pub struct StateAccess {
    engine: Engine,
    owner: Option<EntityId>,
}

impl StateAccess {
    pub fn new(engine: &Engine, owner: EntityId) -> Self {
        Self {
            engine: engine.clone(),
            owner: Some(owner),
        }
    }

    pub fn unbound(engine: &Engine) -> Self {
        Self {
            engine: engine.clone(),
            owner: None,
        }
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn bound(&self, name: &str) -> Result<EntityId> {
        self.owner.ok_or_else(|| Error::missing_owner(name))
    }

    /// Tracked read.
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        let owner = self.bound(name)?;
        Ok(self.engine.read(owner, name))
    }

    /// Synchronous write; observers hear about it before this returns.
    pub fn set(&self, name: &str, value: Value) -> Result<Value> {
        let owner = self.bound(name)?;
        Ok(self.engine.set(owner, name, value))
    }

    /// Writes `value` and hands back what was there before.
    pub fn assign(&self, name: &str, value: Value) -> Result<Option<Value>> {
        let owner = self.bound(name)?;
        let previous = self.engine.read(owner, name);
        self.engine.set(owner, name, value);
        Ok(previous)
    }

    /// A handle on one key. Binding counts as a read of that key.
    pub fn bind(&self, name: &str) -> Result<ObservableHandle> {
        let owner = self.bound(name)?;
        self.engine.read(owner, name);
        Ok(ObservableHandle {
            engine: self.engine.clone(),
            owner,
            name: Rc::from(name),
        })
    }
}

/// One owner's key, readable and writable without repeating the name.
#[derive(Clone)]
pub struct ObservableHandle {
    engine: Engine,
    owner: EntityId,
    name: Rc<str>,
}

impl ObservableHandle {
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current stored value (untracked).
    pub fn get(&self) -> Option<Value> {
        self.engine.peek(self.owner, &self.name)
    }

    pub fn set(&self, value: Value) -> Value {
        self.engine.set(self.owner, &self.name, value)
    }

    /// Computes the next value from the current one and stores it.
    pub fn update(&self, f: impl FnOnce(Option<&Value>) -> Value) -> Value {
        let next = f(self.get().as_ref());
        self.set(next)
    }
}
