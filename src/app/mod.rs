//! Application runtime composition modules.

pub(crate) mod credentials;
pub(crate) mod report;
pub(crate) mod runtime;
pub(crate) mod terminal;
