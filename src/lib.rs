//! courier — resilient batch relay from an upstream record source to a
//! downstream queue
//!
//! The root crate wires the pieces together: configuration loading, trigger
//! dispatch, and the relay service that runs fetch → validate → publish →
//! mark delivered.

pub mod config;
pub mod dispatch;
pub mod service;

pub use tracing;
