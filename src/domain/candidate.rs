//! Candidate result objects returned by a listing round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One object discovered in the result listing.
///
/// Candidates are produced fresh on every poll round and discarded after
/// ranking; nothing holds them across rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Object key as listed
    pub key: String,

    /// Last-modified time reported by the listing
    pub last_modified: DateTime<Utc>,
}

impl Candidate {
    pub fn new(key: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            last_modified,
        }
    }
}
