//! Core resolution logic.
//!
//! This module contains:
//! - ArtifactResolver: list, rank, probe poll rounds
//! - ResolutionDriver: cadence and lifecycle of a polling run

pub mod resolver;
pub mod scheduler;

// Re-export commonly used types
pub use resolver::{ArtifactResolver, PollOutcome, ResolverSettings};
pub use scheduler::{DriverHandle, ResolutionDriver};
