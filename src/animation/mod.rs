pub(crate) mod animator;
pub(crate) mod config;
pub(crate) mod ease;
pub(crate) mod host;
