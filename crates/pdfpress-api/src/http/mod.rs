//! HTTP routing, handlers, and middleware.

pub(crate) mod constants;
pub(crate) mod control;
pub(crate) mod errors;
pub(crate) mod health;
pub(crate) mod logs;
pub mod router;
pub(crate) mod settings;
pub(crate) mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
