//! Ports - Traits the application layer talks to.

pub mod engine;
