use ripple_core::Value;

/// Opaque handle to the host's rendered node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef(pub u64);

/// How a patch is applied to the native component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchKind {
    /// Merge into the current props.
    SetProps,
    /// Replace the props entirely.
    ReplaceProps,
    /// Merge into the current state.
    SetState,
    /// Replace the state entirely.
    ReplaceState,
}

/// A shallow set of named values handed to the host in one call.
#[derive(Clone, Debug, Default)]
pub struct StatePatch {
    entries: Vec<(String, Value)>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Later inserts of the same name replace the earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for StatePatch {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut patch = StatePatch::new();
        for (k, v) in iter {
            patch.insert(k, v);
        }
        patch
    }
}

/// The host UI runtime's component instance.
///
/// Implemented by platform glue; Ripple only forwards to it.
pub trait NativeComponent {
    fn dom_node(&self) -> Option<NodeRef>;
    fn is_mounted(&self) -> bool;
    fn force_update(&self);
    /// Applies `patch`; `on_done` runs once the host has processed it.
    fn apply(&self, kind: PatchKind, patch: StatePatch, on_done: Option<Box<dyn FnOnce()>>);
}
