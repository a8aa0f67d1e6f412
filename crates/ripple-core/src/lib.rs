//! # State, Observers, and Flushes
//!
//! Ripple keeps named values per owner and works out on its own who depends
//! on what. There are three main pieces:
//!
//! - the store: `(owner, name)` cells holding opaque [`Value`]s.
//! - tracked passes: reads made inside [`Engine::enter`] are recorded against
//!   the current observer and become its dependencies on [`Engine::commit`].
//! - writes: [`Engine::set_state`] notifies the observers of a key, either
//!   right away or coalesced into one deferred flush.
//!
//! ## Tracking
//!
//! ```rust
//! use std::rc::Rc;
//! use ripple_core::*;
//!
//! struct Printer;
//! impl Observer for Printer {
//!     fn update(&self, _from: Option<EntityId>, name: &str, _value: &Value) {
//!         println!("{name} changed");
//!     }
//! }
//!
//! let engine = Engine::new();
//! let counter = engine.register_inert();
//! let printer = Rc::new(Printer);
//! let view = engine.register(&printer);
//!
//! engine.initialize(counter, [("count", value(0))]);
//! engine.track(view, || engine.get::<i32>(counter, "count"));
//! engine.commit(view)?;
//!
//! assert!(engine.is_observing(counter, "count", view));
//! engine.set(counter, "count", value(1)); // prints "count changed"
//! # Ok::<(), ripple_core::Error>(())
//! ```
//!
//! A pass replaces the observer's previous dependencies wholesale, so a key
//! that is no longer read stops triggering updates after the next commit.
//!
//! ## Deferred writes
//!
//! `set_deferred` stores the value immediately but delays notification by
//! [`EngineConfig::coalesce_window`]. Writes to the same key inside the
//! window collapse into one notification carrying the last value. The flush
//! runs when the host calls [`Engine::flush_due`] (or [`Engine::flush_now`]).
//!
//! ## Self-notification
//!
//! An owner that can receive updates and isn't among the observers of its
//! own key is told about the write with `from == None`.

pub mod access;
pub mod clock;
pub mod config;
mod context;
pub mod engine;
pub mod error;
pub mod prelude;
mod reactive;
mod scheduler;
mod store;
pub mod value;

pub use access::*;
pub use clock::*;
pub use config::*;
pub use context::ContextGuard;
pub use engine::*;
pub use error::*;
pub use store::StateKey;
pub use value::*;
