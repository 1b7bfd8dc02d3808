//! reelsplit - cuts an uploaded video into fixed-length, reframed clips.
//!
//! Hexagonal Architecture:
//! - domain/: Pure logic (options, geometry, segment planning, outcomes)
//! - ports/: Trait definitions (the transcoding engine)
//! - adapters/: Concrete implementations (ffmpeg CLI, HTTP)
//! - application/: Services driving the ports (probe, transcode, orchestrator, staging)
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use adapters::ffmpeg::RealTranscodeExecutor;
pub use application::orchestrator::OrchestratorService;
pub use application::source::{SourceStore, SourceVideo};
pub use config::Config;
pub use error::{PipelineError, Rejection};
