//! Types for the metadata catalog contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A partially known release date (year, optionally month and day).
///
/// Catalogs frequently report only "1994" or "1994-06". Ordering treats
/// missing components as late within their precision, so a fully known date
/// sorts before a vaguer one in the same year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDate {
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

impl PartialDate {
    /// Parse a partial ISO date string: "YYYY", "YYYY-MM" or "YYYY-MM-DD".
    ///
    /// Returns `None` when the year is absent or unparseable; trailing junk
    /// components are ignored rather than failing the whole date.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().splitn(3, '-');
        let year: i32 = parts.next()?.parse().ok()?;
        let month = parts.next().and_then(|m| m.parse::<u32>().ok());
        let month = month.filter(|m| (1..=12).contains(m));
        let day = if month.is_some() {
            parts
                .next()
                .and_then(|d| d.parse::<u32>().ok())
                .filter(|d| (1..=31).contains(d))
        } else {
            None
        };
        Some(Self {
            year: Some(year),
            month,
            day,
        })
    }

    /// Sort key where unknown components order after known ones.
    pub fn sort_key(&self) -> (i32, u32, u32) {
        (
            self.year.unwrap_or(i32::MAX),
            self.month.unwrap_or(13),
            self.day.unwrap_or(32),
        )
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.year, self.month, self.day) {
            (Some(y), Some(m), Some(d)) => write!(f, "{y:04}-{m:02}-{d:02}"),
            (Some(y), Some(m), None) => write!(f, "{y:04}-{m:02}"),
            (Some(y), None, _) => write!(f, "{y:04}"),
            _ => write!(f, "????"),
        }
    }
}

/// Release status as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    Official,
    #[default]
    Other,
}

/// Primary type of a release group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryType {
    Album,
    Ep,
    Single,
    #[default]
    Other,
}

/// One release variant of a release group, as returned by the catalog.
///
/// Immutable snapshot fetched per scoring pass; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    /// Catalog id of this specific release variant.
    pub external_id: String,
    /// Release title as printed on this variant.
    pub title: String,
    /// ISO country code, "XW" for worldwide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Official vs. bootleg/promo/other.
    #[serde(default)]
    pub status: ReleaseStatus,
    /// Primary type of the owning release group.
    #[serde(default)]
    pub primary_type: PrimaryType,
    /// Total track count across all media.
    pub track_count: u32,
    /// Track titles in release order (may be empty when the catalog was
    /// queried without recordings).
    #[serde(default)]
    pub track_titles: Vec<String>,
    /// Release date, possibly partial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<PartialDate>,
    /// Whether the variant is flagged as a demo.
    #[serde(default)]
    pub is_demo: bool,
}

/// One track of a resolved release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogTrack {
    /// 1-based position within the release.
    pub number: u32,
    /// Recording title.
    pub title: String,
    /// Duration if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}
