//! Scorer configuration.
//!
//! Every point value is a knob. The defaults encode the intended relative
//! ordering (exact track count dominates, edition keywords punish hard); a
//! deployment can retune them without touching code.

use serde::{Deserialize, Serialize};

/// Configuration for both scoring entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Bonus when a candidate's track count equals the local file count.
    #[serde(default = "default_exact_track_count_bonus")]
    pub exact_track_count_bonus: i64,

    /// Base for the decaying near-miss bonus; divided by (diff + 1).
    #[serde(default = "default_close_track_count_bonus")]
    pub close_track_count_bonus: i64,

    /// Bonus per matched filename/track-title position.
    #[serde(default = "default_filename_match_bonus")]
    pub filename_match_bonus: i64,

    /// Penalty applied once when the title contains any edition keyword.
    #[serde(default = "default_edition_keyword_penalty")]
    pub edition_keyword_penalty: i64,

    /// Lower-cased substrings that mark special editions.
    #[serde(default = "default_edition_keywords")]
    pub edition_keywords: Vec<String>,

    /// Bonus for the worldwide region code ("XW").
    #[serde(default = "default_worldwide_region_bonus")]
    pub worldwide_region_bonus: i64,

    /// Bonus for a preferred major-market region.
    #[serde(default = "default_preferred_region_bonus")]
    pub preferred_region_bonus: i64,

    /// Region allowlist for the smaller bonus.
    #[serde(default = "default_preferred_regions")]
    pub preferred_regions: Vec<String>,

    /// Bonus when the candidate's primary type is Album.
    #[serde(default = "default_album_type_bonus")]
    pub album_type_bonus: i64,

    /// Per-track penalty for distance from the ideal track-count band center
    /// (default-candidate selection only).
    #[serde(default = "default_band_distance_penalty")]
    pub band_distance_penalty: i64,
}

fn default_exact_track_count_bonus() -> i64 {
    10_000
}

fn default_close_track_count_bonus() -> i64 {
    1_000
}

fn default_filename_match_bonus() -> i64 {
    250
}

fn default_edition_keyword_penalty() -> i64 {
    5_000
}

fn default_edition_keywords() -> Vec<String> {
    [
        "deluxe",
        "anniversary",
        "expanded",
        "remaster",
        "special",
        "bonus",
        "tour",
        "collector",
        "edition",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_worldwide_region_bonus() -> i64 {
    500
}

fn default_preferred_region_bonus() -> i64 {
    250
}

fn default_preferred_regions() -> Vec<String> {
    vec!["US".to_string()]
}

fn default_album_type_bonus() -> i64 {
    2_000
}

fn default_band_distance_penalty() -> i64 {
    300
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            exact_track_count_bonus: default_exact_track_count_bonus(),
            close_track_count_bonus: default_close_track_count_bonus(),
            filename_match_bonus: default_filename_match_bonus(),
            edition_keyword_penalty: default_edition_keyword_penalty(),
            edition_keywords: default_edition_keywords(),
            worldwide_region_bonus: default_worldwide_region_bonus(),
            preferred_region_bonus: default_preferred_region_bonus(),
            preferred_regions: default_preferred_regions(),
            album_type_bonus: default_album_type_bonus(),
            band_distance_penalty: default_band_distance_penalty(),
        }
    }
}

impl ScorerConfig {
    /// True when the lower-cased title contains any edition keyword.
    pub fn title_has_edition_keyword(&self, title: &str) -> bool {
        let lower = title.to_lowercase();
        self.edition_keywords.iter().any(|kw| lower.contains(kw))
    }

    /// Region bonus for an optional country code.
    pub fn region_bonus(&self, country: Option<&str>) -> i64 {
        match country {
            Some("XW") => self.worldwide_region_bonus,
            Some(c) if self.preferred_regions.iter().any(|r| r == c) => {
                self.preferred_region_bonus
            }
            _ => 0,
        }
    }
}
