//! Domain types for the resolution client.
//!
//! This module contains the core data structures:
//! - Descriptor: identity of an upload, and the key naming convention
//! - Candidate: result objects discovered by a listing round
//! - Session: resolution state machine bookkeeping
//! - Highlights: view of the producer's highlight documents

pub mod candidate;
pub mod descriptor;
pub mod highlights;
pub mod session;

// Re-export commonly used types
pub use candidate::Candidate;
pub use descriptor::{sanitize_file_name, KeyError, UploadDescriptor, RANDOM_ID_BYTES};
pub use highlights::HighlightsDocument;
pub use session::{
    FailureReason, ResolutionSession, ResolvedArtifact, SessionError, SessionState,
};
