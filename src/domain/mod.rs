//! Domain layer - Pure business logic.

pub mod geometry;
pub mod jobs;
pub mod options;
pub mod outcome;
pub mod segments;
