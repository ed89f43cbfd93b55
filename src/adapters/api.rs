//! HTTP client for the resolution service.
//!
//! Three endpoints matter: `/uploads` grants presigned upload tickets,
//! `/results` lists objects under a prefix, and `/artifacts` answers
//! whether a specific key is retrievable (404 simply means "not yet").

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{ResultStore, StoreError, UploadTicket};
use crate::domain::{Candidate, ResolvedArtifact};

/// Client for the resolution service API
#[derive(Debug, Clone)]
pub struct ServiceClient {
    /// Base URL, no trailing slash
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Response from POST /uploads
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TicketResponse {
    presigned_url: String,
    s3_key: String,
    bucket: String,
}

/// Response from GET /results. `objects` is required; a 2xx body
/// without it is a malformed response, not an empty listing.
#[derive(Debug, Deserialize)]
struct ListingResponse {
    objects: Vec<serde_json::Value>,
}

/// One listing entry; decoded per-object so a bad entry cannot
/// poison the whole round
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectEntry {
    key: String,
    last_modified: String,
}

/// Response from GET /artifacts
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactResponse {
    key: String,
    #[serde(default)]
    download_url: Option<String>,
}

/// Error body the service sends on failures
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Pull the service's error message out of a failure body. Bodies that
/// are not the service's `{"error": ...}` shape pass through as-is.
fn error_message(body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        return err.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error detail".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Decode one listing object; a bad entry is dropped, not the round.
fn decode_entry(object: serde_json::Value) -> Option<Candidate> {
    let entry: ObjectEntry = match serde_json::from_value(object) {
        Ok(entry) => entry,
        Err(err) => {
            debug!(error = %err, "skipping undecodable listing entry");
            return None;
        }
    };
    match DateTime::parse_from_rfc3339(&entry.last_modified) {
        Ok(ts) => Some(Candidate::new(entry.key, ts.with_timezone(&Utc))),
        Err(err) => {
            debug!(key = %entry.key, error = %err, "skipping entry with bad timestamp");
            None
        }
    }
}

impl ServiceClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build an endpoint URL
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turn a non-success response into [`StoreError::Api`].
    async fn api_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Api {
            status,
            message: error_message(&body),
        }
    }

    /// Request a presigned upload ticket for a new file.
    pub async fn request_upload_ticket(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadTicket, StoreError> {
        let response = self
            .client
            .post(self.endpoint("uploads"))
            .json(&serde_json::json!({
                "fileName": file_name,
                "contentType": content_type,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let ticket: TicketResponse = serde_json::from_str(&response.text().await?)?;
        Ok(UploadTicket {
            presigned_url: ticket.presigned_url,
            s3_key: ticket.s3_key,
            bucket: ticket.bucket,
        })
    }

    /// Fetch the body behind a download URL as text.
    pub async fn fetch_document(&self, url: &str) -> Result<String, StoreError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ResultStore for ServiceClient {
    async fn list_candidates(
        &self,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<Candidate>, StoreError> {
        let response = self
            .client
            .get(self.endpoint("results"))
            .query(&[("prefix", prefix), ("maxResults", &max_results.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let listing: ListingResponse = serde_json::from_str(&response.text().await?)?;
        Ok(listing.objects.into_iter().filter_map(decode_entry).collect())
    }

    async fn probe(&self, key: &str) -> Result<Option<ResolvedArtifact>, StoreError> {
        let response = self
            .client
            .get(self.endpoint("artifacts"))
            .query(&[("key", key)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let artifact: ArtifactResponse = serde_json::from_str(&response.text().await?)?;
        Ok(Some(ResolvedArtifact {
            key: artifact.key,
            download_url: artifact.download_url,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_endpoint_normalizes_slashes() {
        let client =
            ServiceClient::new("https://svc.example.com/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("/results"),
            "https://svc.example.com/api/results"
        );
        assert_eq!(
            client.endpoint("uploads"),
            "https://svc.example.com/api/uploads"
        );
    }

    #[test]
    fn test_malformed_listing_entries_are_dropped() {
        let raw = r#"{
            "objects": [
                {"key": "highlight-videos/good.mp4", "lastModified": "2025-05-17T12:00:00Z"},
                {"lastModified": "2025-05-17T12:05:00Z"},
                {"key": "highlight-videos/bad-ts.mp4", "lastModified": "five past noon"}
            ]
        }"#;
        let listing: ListingResponse = serde_json::from_str(raw).unwrap();
        let candidates: Vec<_> = listing.objects.into_iter().filter_map(decode_entry).collect();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].key, "highlight-videos/good.mp4");
        assert_eq!(
            candidates[0].last_modified,
            Utc.with_ymd_and_hms(2025, 5, 17, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_listing_requires_the_objects_field() {
        let empty: ListingResponse = serde_json::from_str(r#"{"objects": []}"#).unwrap();
        assert!(empty.objects.is_empty());

        // An error payload served with a 200 must surface as a decode
        // failure, not read as an empty listing.
        assert!(serde_json::from_str::<ListingResponse>(r#"{"error": "wrong shape"}"#).is_err());
    }

    #[test]
    fn test_error_message_prefers_the_error_field() {
        assert_eq!(
            error_message(r#"{"error": "File name is required"}"#),
            "File name is required"
        );
        assert_eq!(error_message("  gateway timeout  "), "gateway timeout");
        assert_eq!(error_message(""), "no error detail");
    }

    #[test]
    fn test_ticket_decode_shape() {
        let raw = r#"{
            "presignedUrl": "https://bucket.s3.amazonaws.com/put?sig=abc",
            "s3Key": "input-videos/20250517120000-abcd1234-clip.mp4",
            "bucket": "bucket"
        }"#;
        let ticket: TicketResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(ticket.bucket, "bucket");
        assert!(ticket.s3_key.starts_with("input-videos/"));
    }
}
