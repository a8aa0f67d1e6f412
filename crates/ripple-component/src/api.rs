use std::rc::Rc;

use ripple_core::{Error, Result};

use crate::{NativeComponent, NodeRef, PatchKind, StatePatch};

/// Component-facing calls that forward to the native instance.
///
/// Without a native instance attached every call fails with
/// [`Error::MissingOwnerBinding`].
#[derive(Clone, Default)]
pub struct ComponentApi {
    native: Option<Rc<dyn NativeComponent>>,
}

impl ComponentApi {
    pub fn new(native: Rc<dyn NativeComponent>) -> Self {
        Self {
            native: Some(native),
        }
    }

    pub fn detached() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.native.is_some()
    }

    fn native(&self, op: &str) -> Result<&Rc<dyn NativeComponent>> {
        self.native.as_ref().ok_or_else(|| Error::missing_owner(op))
    }

    pub fn dom_node(&self) -> Result<Option<NodeRef>> {
        Ok(self.native("dom_node")?.dom_node())
    }

    pub fn is_mounted(&self) -> Result<bool> {
        Ok(self.native("is_mounted")?.is_mounted())
    }

    pub fn force_update(&self) -> Result<()> {
        self.native("force_update")?.force_update();
        Ok(())
    }

    pub fn set_props(&self, patch: StatePatch) -> Result<()> {
        self.apply(PatchKind::SetProps, patch, None)
    }

    pub fn replace_props(&self, patch: StatePatch) -> Result<()> {
        self.apply(PatchKind::ReplaceProps, patch, None)
    }

    pub fn set_state(&self, patch: StatePatch) -> Result<()> {
        self.apply(PatchKind::SetState, patch, None)
    }

    pub fn replace_state(&self, patch: StatePatch) -> Result<()> {
        self.apply(PatchKind::ReplaceState, patch, None)
    }

    /// Forwards `patch` and runs `on_done` after the host applied it.
    pub fn apply_then(
        &self,
        kind: PatchKind,
        patch: StatePatch,
        on_done: impl FnOnce() + 'static,
    ) -> Result<()> {
        self.apply(kind, patch, Some(Box::new(on_done)))
    }

    fn apply(
        &self,
        kind: PatchKind,
        patch: StatePatch,
        on_done: Option<Box<dyn FnOnce()>>,
    ) -> Result<()> {
        let native = self.native(patch_op_name(kind))?;
        log::trace!("{kind:?} with {} entries", patch.len());
        native.apply(kind, patch, on_done);
        Ok(())
    }
}

fn patch_op_name(kind: PatchKind) -> &'static str {
    match kind {
        PatchKind::SetProps => "set_props",
        PatchKind::ReplaceProps => "replace_props",
        PatchKind::SetState => "set_state",
        PatchKind::ReplaceState => "replace_state",
    }
}
