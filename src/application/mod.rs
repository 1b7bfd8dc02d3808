//! Application layer - Services that use ports.

pub mod orchestrator;
pub mod probe;
pub mod source;
pub mod transcode;
