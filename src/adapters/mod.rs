//! Adapters for the resolution service and object storage.
//!
//! The service fronts an object store. Uploads go directly to storage
//! through presigned URLs; discovery goes through the service's listing
//! and artifact endpoints. Everything behind [`ResultStore`] is
//! swappable, which is how the resolver is tested without a network.

pub mod api;
pub mod transfer;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Candidate, ResolvedArtifact};

pub use api::ServiceClient;
pub use transfer::{upload_file, ProgressCallback, TransferError, UploadProgress};

/// Errors surfaced by service-backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure (connect, timeout, TLS, body read)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered 2xx but the payload did not decode
    #[error("malformed service response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Grant for one direct-to-storage upload.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    /// URL the file body is PUT to
    pub presigned_url: String,

    /// Object key the service assigned to the upload
    pub s3_key: String,

    /// Bucket the key lives in
    pub bucket: String,
}

/// Read access to the store where produced artifacts appear.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// List candidate objects under `prefix`. Order is whatever the
    /// store returns; callers rank the result themselves.
    async fn list_candidates(
        &self,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<Candidate>, StoreError>;

    /// Check whether `key` is retrievable right now.
    ///
    /// `Ok(None)` means the object is not available yet, which is the
    /// expected answer while the producer is still working.
    async fn probe(&self, key: &str) -> Result<Option<ResolvedArtifact>, StoreError>;
}
