use std::collections::HashMap;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::{EntityId, StateKey};

pub(crate) type KeySet = SmallVec<[StateKey; 8]>;
pub(crate) type ObserverSet = SmallVec<[EntityId; 4]>;

/// Dependency bookkeeping: the pending sets recorded during tracked passes,
/// the committed sets from the last completed pass, and the reverse index
/// from each key to the observers whose committed set contains it.
///
/// `edges` and `committed` mirror each other after every public method
/// returns.
#[derive(Default)]
pub(crate) struct DepGraph {
    // observer -> keys read during the pass in progress
    pending: HashMap<EntityId, KeySet>,
    // observer -> keys read during the last committed pass
    committed: HashMap<EntityId, KeySet>,
    // owner -> name -> observers
    edges: HashMap<EntityId, HashMap<Rc<str>, ObserverSet>>,
}

fn contains(set: &KeySet, owner: EntityId, name: &str) -> bool {
    set.iter().any(|k| k.matches(owner, name))
}

impl DepGraph {
    /// Opens a pending set for `obs` unless one is already open.
    /// Returns true if a new set was opened.
    pub fn open(&mut self, obs: EntityId) -> bool {
        let mut opened = false;
        self.pending.entry(obs).or_insert_with(|| {
            opened = true;
            KeySet::new()
        });
        opened
    }

    pub fn record(&mut self, obs: EntityId, owner: EntityId, name: &str) {
        let set = self.pending.entry(obs).or_default();
        if !contains(set, owner, name) {
            set.push(StateKey::new(owner, name));
        }
    }

    fn unlink(&mut self, obs: EntityId, keys: &KeySet) {
        for key in keys {
            if let Some(names) = self.edges.get_mut(&key.owner) {
                if let Some(set) = names.get_mut(&key.name) {
                    set.retain(|o| *o != obs);
                    if set.is_empty() {
                        names.remove(&key.name);
                    }
                }
                if names.is_empty() {
                    self.edges.remove(&key.owner);
                }
            }
        }
    }

    fn link(&mut self, obs: EntityId, keys: &KeySet) {
        for key in keys {
            let set = self
                .edges
                .entry(key.owner)
                .or_default()
                .entry(key.name.clone())
                .or_default();
            if !set.contains(&obs) {
                set.push(obs);
            }
        }
    }

    /// Replaces the committed set of `obs` with its pending set.
    /// Returns the new dependency count, or `None` if nothing was pending.
    pub fn commit(&mut self, obs: EntityId) -> Option<usize> {
        let next = self.pending.remove(&obs)?;
        if let Some(old) = self.committed.remove(&obs) {
            self.unlink(obs, &old);
        }
        self.link(obs, &next);
        let n = next.len();
        self.committed.insert(obs, next);
        Some(n)
    }

    /// Drops every edge of `obs` along with any open pending set.
    /// Returns false if `obs` had neither.
    pub fn remove(&mut self, obs: EntityId) -> bool {
        let had_pending = self.pending.remove(&obs).is_some();
        match self.committed.remove(&obs) {
            Some(old) => {
                self.unlink(obs, &old);
                true
            }
            None => had_pending,
        }
    }

    pub fn is_observing(&self, owner: EntityId, name: &str, obs: EntityId) -> bool {
        self.committed
            .get(&obs)
            .is_some_and(|set| contains(set, owner, name))
    }

    pub fn will_observe(&self, owner: EntityId, name: &str, obs: EntityId) -> bool {
        self.pending
            .get(&obs)
            .is_some_and(|set| contains(set, owner, name))
    }

    pub fn observers_of(&self, owner: EntityId, name: &str) -> ObserverSet {
        self.edges
            .get(&owner)
            .and_then(|names| names.get(name))
            .cloned()
            .unwrap_or_default()
    }

    pub fn dependencies_of(&self, obs: EntityId) -> Vec<StateKey> {
        self.committed
            .get(&obs)
            .map(|set| set.to_vec())
            .unwrap_or_default()
    }

    pub fn pending_of(&self, obs: EntityId) -> Vec<StateKey> {
        self.pending
            .get(&obs)
            .map(|set| set.to_vec())
            .unwrap_or_default()
    }

    /// Forgets `owner` entirely: its keys vanish from every pending and
    /// committed set (with their reverse edges), and its own role as an
    /// observer is dropped.
    pub fn purge_owner(&mut self, owner: EntityId) {
        self.remove(owner);
        if let Some(names) = self.edges.remove(&owner) {
            for obs in names.into_values().flatten() {
                if let Some(set) = self.committed.get_mut(&obs) {
                    set.retain(|k| k.owner != owner);
                }
            }
        }
        for set in self.pending.values_mut() {
            set.retain(|k| k.owner != owner);
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges
            .values()
            .flat_map(HashMap::values)
            .map(|set| set.len())
            .sum()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.committed.clear();
        self.edges.clear();
    }

    /// Checks that the reverse index and the committed sets mirror each other.
    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        let forward = self
            .committed
            .iter()
            .flat_map(|(obs, keys)| keys.iter().map(move |k| (*obs, k)))
            .all(|(obs, k)| self.observers_of(k.owner, &k.name).contains(&obs));
        let backward = self.edges.iter().all(|(owner, names)| {
            names.iter().all(|(name, set)| {
                set.iter().all(|obs| self.is_observing(*owner, name, *obs))
            })
        });
        let committed: usize = self.committed.values().map(|s| s.len()).sum();
        forward && backward && committed == self.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<EntityId> {
        let mut map: SlotMap<EntityId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn record_deduplicates_in_first_read_order() {
        let v = ids(2);
        let (obs, owner) = (v[0], v[1]);
        let mut g = DepGraph::default();
        g.open(obs);
        for name in ["b", "a", "b", "a", "c"] {
            g.record(obs, owner, name);
        }
        let names: Vec<String> = g.pending_of(obs).iter().map(|k| k.name.to_string()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn commit_drops_stale_edges() {
        let v = ids(2);
        let (obs, owner) = (v[0], v[1]);
        let mut g = DepGraph::default();

        g.record(obs, owner, "x");
        g.record(obs, owner, "y");
        assert_eq!(g.commit(obs), Some(2));

        g.record(obs, owner, "y");
        assert_eq!(g.commit(obs), Some(1));

        assert!(!g.is_observing(owner, "x", obs));
        assert!(g.is_observing(owner, "y", obs));
        assert!(g.observers_of(owner, "x").is_empty());
        assert!(g.is_consistent());
    }

    #[test]
    fn commit_without_pending_is_none() {
        let obs = ids(1)[0];
        let mut g = DepGraph::default();
        assert_eq!(g.commit(obs), None);
    }

    #[test]
    fn purge_owner_scrubs_both_directions() {
        let v = ids(3);
        let (obs, a, b) = (v[0], v[1], v[2]);
        let mut g = DepGraph::default();
        g.record(obs, a, "x");
        g.record(obs, b, "y");
        g.commit(obs);
        g.record(obs, a, "z");

        g.purge_owner(a);

        assert_eq!(g.dependencies_of(obs), vec![StateKey::new(b, "y")]);
        assert!(g.pending_of(obs).is_empty());
        assert!(g.observers_of(a, "x").is_empty());
        assert!(g.is_consistent());
    }
}
