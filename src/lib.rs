//! reelscout - Upload videos and resolve their highlight artifacts
//!
//! A client for an asynchronous highlights pipeline: videos go up to
//! object storage through presigned URLs, a backend derives a
//! highlights artifact on its own schedule, and this crate discovers
//! that artifact by polling the store's listing and ranking what it
//! finds against the upload's identity.
//!
//! # Architecture
//!
//! Resolution is built around three pieces:
//! - Keys carry identity: every upload is keyed
//!   `<prefix>/<timestamp>-<id>-<name>`, and candidate results are
//!   matched back through those components in confidence tiers
//! - A session state machine caps poll attempts and settles exactly
//!   once (found, timed out, or cancelled)
//! - A driver paces poll rounds and streams progress to the caller
//!
//! # Modules
//!
//! - `adapters`: Service API client and presigned upload transfer
//! - `core`: Resolution engine (ArtifactResolver, ResolutionDriver)
//! - `domain`: Data structures (UploadDescriptor, ResolutionSession)
//! - `ranking`: Tiered candidate ranking
//! - `media`: Supported media formats
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Upload a video and wait for its highlights
//! reelscout upload demo.mp4
//!
//! # Resume waiting for an earlier upload
//! reelscout resolve input-videos/20250517120000-abcd1234-demo.mp4
//!
//! # Show active configuration
//! reelscout config
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod media;
pub mod ranking;

// Re-export main types at crate root for convenience
pub use crate::core::{ArtifactResolver, PollOutcome, ResolutionDriver, ResolverSettings};
pub use domain::{
    Candidate, FailureReason, ResolutionSession, ResolvedArtifact, SessionState, UploadDescriptor,
};
pub use ranking::MatchTier;

// Service access
pub use adapters::{ResultStore, ServiceClient, StoreError, UploadTicket};
