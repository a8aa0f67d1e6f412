use std::collections::HashMap;
use std::rc::Rc;

use crate::{EntityId, Value};

/// Identifies one storage cell: a named slot on an owner.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub owner: EntityId,
    pub name: Rc<str>,
}

impl StateKey {
    pub fn new(owner: EntityId, name: &str) -> Self {
        Self {
            owner,
            name: Rc::from(name),
        }
    }

    pub fn matches(&self, owner: EntityId, name: &str) -> bool {
        self.owner == owner && &*self.name == name
    }
}

/// Per-owner value cells. Pure storage; tracking happens in the engine.
#[derive(Default)]
pub(crate) struct StateStore {
    cells: HashMap<EntityId, HashMap<String, Value>>,
}

impl StateStore {
    /// Shallow merge: keys not present in `values` keep their current value.
    pub fn initialize(
        &mut self,
        owner: EntityId,
        values: impl IntoIterator<Item = (String, Value)>,
    ) {
        self.cells.entry(owner).or_default().extend(values);
    }

    pub fn read(&self, owner: EntityId, name: &str) -> Option<Value> {
        self.cells.get(&owner).and_then(|c| c.get(name)).cloned()
    }

    pub fn write(&mut self, owner: EntityId, name: &str, value: Value) {
        let cells = self.cells.entry(owner).or_default();
        match cells.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                cells.insert(name.to_owned(), value);
            }
        }
    }

    /// Drops every cell of `owner`, returning how many were removed.
    pub fn purge(&mut self, owner: EntityId) -> usize {
        self.cells.remove(&owner).map(|c| c.len()).unwrap_or(0)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.values().map(HashMap::len).sum()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
