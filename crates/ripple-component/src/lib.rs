//! Glue between Ripple's engine and a host UI runtime.
//!
//! The host supplies a [`NativeComponent`] per rendered instance. Ripple
//! wraps it in a [`ComponentApi`] for prop/state patches, and [`Mounted`]
//! ties a [`Component`] to the engine: one tracked pass per render, a commit
//! afterwards, removal on unmount.

pub mod api;
pub mod mount;
pub mod native;

pub use api::*;
pub use mount::*;
pub use native::*;

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use ripple_core::prelude::*;

    use super::*;

    #[derive(Default)]
    struct FakeNative {
        mounted: bool,
        calls: RefCell<Vec<String>>,
    }

    impl NativeComponent for FakeNative {
        fn dom_node(&self) -> Option<NodeRef> {
            Some(NodeRef(7))
        }
        fn is_mounted(&self) -> bool {
            self.mounted
        }
        fn force_update(&self) {
            self.calls.borrow_mut().push("force_update".into());
        }
        fn apply(&self, kind: PatchKind, patch: StatePatch, on_done: Option<Box<dyn FnOnce()>>) {
            self.calls
                .borrow_mut()
                .push(format!("{kind:?}:{}", patch.len()));
            if let Some(done) = on_done {
                done();
            }
        }
    }

    struct Label {
        store: EntityId,
    }

    impl Component for Label {
        type Output = String;

        fn initial_state(&self) -> Vec<(String, Value)> {
            vec![("prefix".into(), value("count"))]
        }

        fn render(&self, state: &StateAccess) -> String {
            let prefix = state
                .get("prefix")
                .ok()
                .flatten()
                .and_then(|v| v.get::<&str>())
                .unwrap_or_default();
            let engine = state.engine();
            let n = engine.get::<i32>(self.store, "count").unwrap_or(0);
            format!("{prefix}: {n}")
        }
    }

    #[test]
    fn test_render_tracks_and_rerenders_on_change() {
        let engine = Engine::new();
        let store = engine.register_inert();
        engine.initialize(store, [("count", value(1))]);

        let native = Rc::new(FakeNative {
            mounted: true,
            ..Default::default()
        });
        let host: Rc<dyn NativeComponent> = native.clone();
        let label = Mounted::mount(&engine, Label { store }, Some(host));

        assert!(label.needs_render());
        assert_eq!(label.render().unwrap(), "count: 1");
        assert!(!label.needs_render());
        assert!(engine.is_observing(store, "count", label.id()));
        assert!(engine.is_observing(label.id(), "prefix", label.id()));

        engine.set(store, "count", value(2));
        assert!(label.needs_render());
        assert_eq!(*native.calls.borrow(), vec!["force_update".to_string()]);
        assert_eq!(label.render().unwrap(), "count: 2");
    }

    #[test]
    fn test_unmount_releases_everything() {
        let engine = Engine::new();
        let store = engine.register_inert();
        let label = Mounted::mount(&engine, Label { store }, None);
        label.render().unwrap();
        let id = label.id();

        label.unmount().unwrap();

        assert!(engine.observers_of(store, "count").is_empty());
        assert!(!engine.is_registered(id));
        assert_eq!(engine.stats().cells, 0);
    }

    #[test]
    fn test_unmount_before_render() {
        let engine = Engine::new();
        let store = engine.register_inert();
        let label = Mounted::mount(&engine, Label { store }, None);
        assert!(label.unmount().is_ok());
    }

    #[test]
    fn test_api_forwards_to_native() {
        let native = Rc::new(FakeNative::default());
        let api = ComponentApi::new(native.clone());
        assert!(api.is_attached());
        let done = Rc::new(RefCell::new(false));

        assert_eq!(api.dom_node().unwrap(), Some(NodeRef(7)));
        assert!(!api.is_mounted().unwrap());
        api.set_props(StatePatch::new().with("a", value(1))).unwrap();
        api.replace_state([("a", value(1)), ("b", value(2))].into_iter().collect())
            .unwrap();
        let flag = done.clone();
        api.apply_then(PatchKind::SetState, StatePatch::new(), move || {
            *flag.borrow_mut() = true
        })
        .unwrap();

        assert!(*done.borrow());
        assert_eq!(
            *native.calls.borrow(),
            vec!["SetProps:1", "ReplaceState:2", "SetState:0"]
        );
    }

    #[test]
    fn test_detached_api_fails() {
        let api = ComponentApi::detached();
        assert!(!api.is_attached());
        assert!(matches!(
            api.force_update(),
            Err(Error::MissingOwnerBinding { .. })
        ));
        assert!(matches!(
            api.set_state(StatePatch::new()),
            Err(Error::MissingOwnerBinding { ref name }) if name == "set_state"
        ));
    }

    #[test]
    fn test_patch_insert_replaces_in_place() {
        let patch = StatePatch::new()
            .with("a", value(1))
            .with("b", value(2))
            .with("a", value(3));
        let names: Vec<&str> = patch.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(patch.get("a").and_then(|v| v.get::<i32>()), Some(3));
    }
}
