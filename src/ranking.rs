//! Tiered candidate ranking.
//!
//! The producer derives result names from the upload's key components,
//! but the exact scheme has drifted across service revisions: sometimes
//! the full `<timestamp>-<id>-<name>` survives into the output key,
//! sometimes a fresh timestamp is prepended, sometimes only the random
//! id is carried through. Ranking therefore degrades through confidence
//! tiers instead of demanding one exact shape, while never letting a
//! clearly unrelated object outrank a plausible one.
//!
//! Everything here is pure: same inputs, same output order.

use std::cmp::Ordering;

use crate::domain::{Candidate, UploadDescriptor};

/// Confidence bucket for one candidate key, strongest first.
///
/// A key is assigned the first tier it satisfies; the derived `Ord`
/// makes earlier variants sort ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    /// Ends with `<timestamp>-<id>-<base name><expected suffix>`
    ExactSuffix,

    /// Contains the `<timestamp>-<id>` pair somewhere in the key
    TimestampAndId,

    /// Contains the random id alone
    IdOnly,

    /// Shares nothing with the upload; excluded from consideration
    NoMatch,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::ExactSuffix => "exact_suffix",
            MatchTier::TimestampAndId => "timestamp_and_id",
            MatchTier::IdOnly => "id_only",
            MatchTier::NoMatch => "no_match",
        }
    }
}

/// The strongest key suffix a conforming producer would emit:
/// `<timestamp>-<id>-<base name><expected_suffix>`.
pub fn exact_key_suffix(descriptor: &UploadDescriptor, expected_suffix: &str) -> String {
    format!(
        "{}-{}-{}{}",
        descriptor.timestamp,
        descriptor.random_id,
        descriptor.base_name(),
        expected_suffix
    )
}

/// Assign a candidate key to its confidence tier.
pub fn classify(descriptor: &UploadDescriptor, key: &str, expected_suffix: &str) -> MatchTier {
    classify_key(
        key,
        &exact_key_suffix(descriptor, expected_suffix),
        &descriptor.timestamp_id_pair(),
        &descriptor.random_id,
    )
}

fn classify_key(key: &str, exact_suffix: &str, pair: &str, id: &str) -> MatchTier {
    if key.ends_with(exact_suffix) {
        MatchTier::ExactSuffix
    } else if key.contains(pair) {
        MatchTier::TimestampAndId
    } else if !id.is_empty() && key.contains(id) {
        // an empty id would substring-match every key
        MatchTier::IdOnly
    } else {
        MatchTier::NoMatch
    }
}

/// Order candidates from most to least likely to be the upload's
/// artifact.
///
/// Candidates are bucketed by [`MatchTier`] (first tier wins), `NoMatch`
/// is dropped outright, and within a tier newer `last_modified` ranks
/// first. The sort is stable, so identical inputs always produce the
/// identical ordering.
pub fn rank(
    descriptor: &UploadDescriptor,
    candidates: Vec<Candidate>,
    expected_suffix: &str,
) -> Vec<Candidate> {
    let exact_suffix = exact_key_suffix(descriptor, expected_suffix);
    let pair = descriptor.timestamp_id_pair();

    let mut tiered: Vec<(MatchTier, Candidate)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            match classify_key(&candidate.key, &exact_suffix, &pair, &descriptor.random_id) {
                MatchTier::NoMatch => None,
                tier => Some((tier, candidate)),
            }
        })
        .collect();

    tiered.sort_by(|(tier_a, cand_a), (tier_b, cand_b)| {
        match tier_a.cmp(tier_b) {
            Ordering::Equal => cand_b.last_modified.cmp(&cand_a.last_modified),
            unequal => unequal,
        }
    });

    tiered.into_iter().map(|(_, candidate)| candidate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn descriptor() -> UploadDescriptor {
        UploadDescriptor::parse("input-videos/20250517120000-abcd1234-myvideo.mp4").unwrap()
    }

    fn at(minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 17, 13, minute, 0).unwrap()
    }

    #[test]
    fn test_exact_key_suffix_uses_base_name() {
        assert_eq!(
            exact_key_suffix(&descriptor(), "-highlights.mp4"),
            "20250517120000-abcd1234-myvideo-highlights.mp4"
        );
    }

    #[test]
    fn test_classify_priority_order() {
        let d = descriptor();
        let suffix = "-highlights.mp4";

        // Exact matches also contain the pair; the exact tier wins.
        assert_eq!(
            classify(&d, "highlight-videos/20250517120000-abcd1234-myvideo-highlights.mp4", suffix),
            MatchTier::ExactSuffix
        );
        // Producer prepended its own timestamp: pair survives mid-key.
        assert_eq!(
            classify(&d, "highlight-videos/20250517120500-20250517120000-abcd1234-myvideo.mp4", suffix),
            MatchTier::TimestampAndId
        );
        // Only the id survives.
        assert_eq!(
            classify(&d, "highlight-videos/render-abcd1234-final.mp4", suffix),
            MatchTier::IdOnly
        );
        assert_eq!(
            classify(&d, "highlight-videos/99999999999999-zzzz9999-other.mp4", suffix),
            MatchTier::NoMatch
        );
    }

    #[test]
    fn test_rank_drops_unrelated_keys() {
        let ranked = rank(
            &descriptor(),
            vec![
                Candidate::new("highlight-videos/20250517120000-abcd1234-myvideo-highlights.mp4", at(0)),
                Candidate::new("highlight-videos/99999999999999-zzzz9999-other-highlights.mp4", at(1)),
            ],
            "-highlights.mp4",
        );

        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].key.contains("abcd1234-myvideo"));
    }

    #[test]
    fn test_rank_recency_breaks_ties_within_tier() {
        let older = Candidate::new("r/20250517120000-abcd1234-take1.mp4", at(0));
        let newer = Candidate::new("r/20250517120000-abcd1234-take2.mp4", at(5));

        let ranked = rank(
            &descriptor(),
            vec![older.clone(), newer.clone()],
            "-highlights.mp4",
        );
        assert_eq!(ranked, vec![newer, older]);
    }

    #[test]
    fn test_rank_empty_input() {
        assert!(rank(&descriptor(), Vec::new(), "-highlights.mp4").is_empty());
    }

    #[test]
    fn test_tier_ordering_is_strongest_first() {
        assert!(MatchTier::ExactSuffix < MatchTier::TimestampAndId);
        assert!(MatchTier::TimestampAndId < MatchTier::IdOnly);
        assert!(MatchTier::IdOnly < MatchTier::NoMatch);
    }
}
