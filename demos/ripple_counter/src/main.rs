use std::rc::Rc;
use std::thread;

use ripple_component::{Component, Mounted, NativeComponent, NodeRef, PatchKind, StatePatch};
use ripple_core::prelude::*;
use web_time::Instant;

/// Stands in for the host UI's component instance.
struct ConsoleNative;

impl NativeComponent for ConsoleNative {
    fn dom_node(&self) -> Option<NodeRef> {
        None
    }
    fn is_mounted(&self) -> bool {
        true
    }
    fn force_update(&self) {
        log::info!("host asked to re-render");
    }
    fn apply(&self, kind: PatchKind, patch: StatePatch, on_done: Option<Box<dyn FnOnce()>>) {
        log::info!("host applied {kind:?} ({} entries)", patch.len());
        if let Some(done) = on_done {
            done();
        }
    }
}

struct CounterLabel {
    counter: EntityId,
}

impl Component for CounterLabel {
    type Output = String;

    fn render(&self, state: &StateAccess) -> String {
        let n = state.engine().get::<i32>(self.counter, "count").unwrap_or(0);
        format!("Count: {n}")
    }

    fn state_changed(&self, _from: Option<EntityId>, name: &str, value: &Value) {
        log::info!("{name} -> {:?}", value.get::<i32>());
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let engine = Engine::new();
    let counter = engine.register_inert();
    engine.initialize(counter, [("count", value(0))]);

    let native: Rc<dyn NativeComponent> = Rc::new(ConsoleNative);
    let label = Mounted::mount(&engine, CounterLabel { counter }, Some(native));
    println!("{}", label.render()?);

    // A burst of increments inside one window yields a single notification.
    for _ in 0..5 {
        let next = engine.get::<i32>(counter, "count").unwrap_or(0) + 1;
        engine.set_deferred(counter, "count", value(next));
    }

    while let Some(at) = engine.next_flush_at() {
        thread::sleep(at.saturating_duration_since(Instant::now()));
        engine.flush_due();
    }

    if label.needs_render() {
        println!("{}", label.render()?);
    }

    label.api().set_state(StatePatch::new().with("count", value(5)))?;
    label.unmount()?;
    engine.dispose_owner(counter);
    log::info!("{:?}", engine.stats());
    Ok(())
}
