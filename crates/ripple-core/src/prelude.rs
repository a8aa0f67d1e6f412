pub use crate::{
    Clock, ContextGuard, Engine, EngineConfig, EntityId, Error, ObservableHandle, Observer,
    Result, StateAccess, StateKey, SystemClock, TestClock, Value, value,
};
