//! Upload descriptors and the object-key naming convention.
//!
//! Every upload is identified by a source key of the form
//! `<prefix>/<14-digit-timestamp>-<hex-id>-<sanitized-name>`. The
//! processing service derives its output names from the same components,
//! so the descriptor is what later lets us recognize our artifact among
//! the listed results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of random bytes behind a generated id (24 hex characters).
pub const RANDOM_ID_BYTES: usize = 12;

/// `chrono` format string for the 14-digit key timestamp.
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Errors from parsing a source key.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key does not follow <prefix>/<timestamp>-<id>-<name>: {0}")]
    Unrecognized(String),
}

/// Identity of one uploaded asset, fixed at upload time.
///
/// Created once per upload and never mutated; the resolution session
/// that owns it reads the components when ranking candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDescriptor {
    /// File name as the user supplied it
    pub original_name: String,

    /// Original name reduced to `[A-Za-z0-9._-]`
    pub sanitized_name: String,

    /// 14-digit upload timestamp (YYYYMMDDHHMMSS, UTC)
    pub timestamp: String,

    /// Lowercase hex random component
    pub random_id: String,

    /// Full object key, `<prefix>/<timestamp>-<random_id>-<sanitized_name>`
    pub source_key: String,
}

impl UploadDescriptor {
    /// Derive a descriptor for a new upload.
    ///
    /// Pure: the clock and the randomness are injected. Production call
    /// sites pass [`RANDOM_ID_BYTES`] bytes drawn from a v4 UUID; tests
    /// pass fixed bytes. Total over any input: a name that sanitizes to
    /// nothing falls back to `"unnamed"` rather than failing.
    pub fn generate(
        prefix: &str,
        original_name: &str,
        now: DateTime<Utc>,
        random_bytes: &[u8],
    ) -> Self {
        let mut sanitized_name = sanitize_file_name(original_name);
        if sanitized_name.is_empty() {
            sanitized_name = "unnamed".to_string();
        }

        let timestamp = now.format(KEY_TIMESTAMP_FORMAT).to_string();
        let random_id = hex::encode(random_bytes);
        let source_key = format!(
            "{}/{}-{}-{}",
            prefix.trim_end_matches('/'),
            timestamp,
            random_id,
            sanitized_name
        );

        Self {
            original_name: original_name.to_string(),
            sanitized_name,
            timestamp,
            random_id,
            source_key,
        }
    }

    /// Rebuild a descriptor from an existing source key.
    ///
    /// Inverse of [`generate`](Self::generate); used when the service
    /// assigns the key at ticket issuance and for `resolve <source-key>`.
    /// Accepts ids of 8 to 32 hex characters so keys minted by older
    /// service revisions still parse.
    pub fn parse(source_key: &str) -> Result<Self, KeyError> {
        let file_part = match source_key.rsplit_once('/') {
            Some((_, file)) => file,
            None => source_key,
        };

        let err = || KeyError::Unrecognized(source_key.to_string());

        let (timestamp, rest) = file_part.split_at_checked(14).ok_or_else(err)?;
        if !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let rest = rest.strip_prefix('-').ok_or_else(err)?;
        let (random_id, name) = rest.split_once('-').ok_or_else(err)?;
        if !(8..=32).contains(&random_id.len())
            || !random_id
                .bytes()
                .all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            return Err(err());
        }
        if name.is_empty() {
            return Err(err());
        }

        Ok(Self {
            original_name: name.to_string(),
            sanitized_name: name.to_string(),
            timestamp: timestamp.to_string(),
            random_id: random_id.to_string(),
            source_key: source_key.to_string(),
        })
    }

    /// Sanitized name without its final extension segment.
    pub fn base_name(&self) -> &str {
        match self.sanitized_name.rsplit_once('.') {
            Some((stem, _ext)) => stem,
            None => &self.sanitized_name,
        }
    }

    /// The `<timestamp>-<random_id>` pair shared with derived artifacts.
    pub fn timestamp_id_pair(&self) -> String {
        format!("{}-{}", self.timestamp, self.random_id)
    }
}

/// Strip every character outside `[A-Za-z0-9._-]`.
///
/// Tighter than the service's own sanitizer, which replaces oddball
/// characters with hyphens; stripping client-side means the name we send
/// is already in the intersection both sides accept.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize_file_name("my-video_v2.final.mp4"), "my-video_v2.final.mp4");
        assert_eq!(sanitize_file_name("my video (1).mp4"), "myvideo1.mp4");
        assert_eq!(sanitize_file_name("clip@2x!.mov"), "clip2x.mov");
    }

    #[test]
    fn test_sanitize_drops_non_ascii() {
        assert_eq!(sanitize_file_name("démo vidéo.mp4"), "dmovido.mp4");
    }

    #[test]
    fn test_generate_composes_key() {
        let d = UploadDescriptor::generate(
            "input-videos",
            "my video.mp4",
            test_clock(),
            &[0xab, 0xcd, 0x12, 0x34],
        );

        assert_eq!(d.timestamp, "20250517120000");
        assert_eq!(d.random_id, "abcd1234");
        assert_eq!(d.sanitized_name, "myvideo.mp4");
        assert_eq!(d.source_key, "input-videos/20250517120000-abcd1234-myvideo.mp4");
    }

    #[test]
    fn test_generate_trims_trailing_slash_in_prefix() {
        let d = UploadDescriptor::generate("input-videos/", "a.mp4", test_clock(), &[0x01; 4]);
        assert!(d.source_key.starts_with("input-videos/2025"));
    }

    #[test]
    fn test_generate_unusable_name_falls_back() {
        let d = UploadDescriptor::generate("input-videos", "视频", test_clock(), &[0x01; 4]);
        assert_eq!(d.sanitized_name, "unnamed");
    }

    #[test]
    fn test_generate_parse_round_trip() {
        let d = UploadDescriptor::generate(
            "input-videos",
            "myvideo.mp4",
            test_clock(),
            &[0xab; RANDOM_ID_BYTES],
        );
        let parsed = UploadDescriptor::parse(&d.source_key).unwrap();

        assert_eq!(parsed.timestamp, d.timestamp);
        assert_eq!(parsed.random_id, d.random_id);
        assert_eq!(parsed.sanitized_name, d.sanitized_name);
        assert_eq!(parsed.source_key, d.source_key);
    }

    #[test]
    fn test_parse_accepts_short_legacy_ids() {
        let d = UploadDescriptor::parse("input-videos/20250517120000-abcd1234-myvideo.mp4").unwrap();
        assert_eq!(d.random_id, "abcd1234");
        assert_eq!(d.base_name(), "myvideo");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for key in [
            "input-videos/not-a-key.mp4",
            "input-videos/2025051712000-abcd1234-x.mp4",  // 13-digit timestamp
            "input-videos/20250517120000-ABCD1234-x.mp4", // uppercase id
            "input-videos/20250517120000-zzzz9999-x.mp4", // non-hex id
            "input-videos/20250517120000-abcd1234-",      // empty name
            "input-videos/20250517120000-abc-x.mp4",      // id too short
            "",
        ] {
            assert!(UploadDescriptor::parse(key).is_err(), "accepted {key:?}");
        }
    }

    #[test]
    fn test_base_name_strips_final_extension_only() {
        let d = UploadDescriptor::parse("v/20250517120000-abcd1234-tape.backup.mp4").unwrap();
        assert_eq!(d.base_name(), "tape.backup");

        let d = UploadDescriptor::parse("v/20250517120000-abcd1234-noext").unwrap();
        assert_eq!(d.base_name(), "noext");
    }

    #[test]
    fn test_timestamp_id_pair() {
        let d = UploadDescriptor::parse("v/20250517120000-abcd1234-x.mp4").unwrap();
        assert_eq!(d.timestamp_id_pair(), "20250517120000-abcd1234");
    }
}
