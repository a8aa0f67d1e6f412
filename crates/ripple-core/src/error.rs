use thiserror::Error;

use crate::EntityId;

/// Usage errors raised by the engine.
///
/// Both variants describe a programming mistake in the caller (a missing
/// `enter` scope, a double unmount, an access handle with nothing behind it)
/// rather than a runtime condition. Propagate them; don't paper over them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no active observation context (observer: {observer:?})")]
    NoActiveContext { observer: Option<EntityId> },

    #[error("no owner bound for state access to `{name}`")]
    MissingOwnerBinding { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn no_context(observer: Option<EntityId>) -> Self {
        let err = Error::NoActiveContext { observer };
        log::error!("{err}");
        err
    }

    pub fn missing_owner(name: impl Into<String>) -> Self {
        let err = Error::MissingOwnerBinding { name: name.into() };
        log::error!("{err}");
        err
    }
}
