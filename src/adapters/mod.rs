//! Adapters - Concrete implementations of ports, and the inbound HTTP surface.

pub mod ffmpeg;
pub mod http;
