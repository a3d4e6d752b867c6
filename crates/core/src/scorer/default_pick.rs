//! Import-time default candidate selection.
//!
//! Used once per release at import, before anything has been fetched, so
//! there is no local-file signal. Filters to official non-demo variants and
//! prefers canonical pressings: right region, plausible track count for the
//! primary type, no special editions, earliest date.

use tracing::debug;

use crate::metadata::{PrimaryType, ReleaseCandidate};

use super::config::ScorerConfig;
use super::types::ScoredCandidate;

/// Ideal track-count band (inclusive) per primary type.
fn ideal_band(primary_type: PrimaryType) -> (u32, u32) {
    match primary_type {
        PrimaryType::Album => (8, 20),
        PrimaryType::Ep => (3, 8),
        PrimaryType::Single => (1, 4),
        PrimaryType::Other => (1, 20),
    }
}

/// Distance from the band center, in tracks, for the penalty term.
fn band_distance(candidate: &ReleaseCandidate) -> i64 {
    let (lo, hi) = ideal_band(candidate.primary_type);
    let center = (lo + hi) as i64 / 2;
    (candidate.track_count as i64 - center).abs()
}

/// Rank official, non-demo candidates for import-time selection.
///
/// Ordering: score descending, then smallest band distance, then earliest
/// release date (unknown dates last), then input order.
pub fn rank_default_candidates(
    config: &ScorerConfig,
    candidates: &[ReleaseCandidate],
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<(usize, i64, ScoredCandidate)> = candidates
        .iter()
        .filter(|c| c.status == crate::metadata::ReleaseStatus::Official && !c.is_demo)
        .enumerate()
        .map(|(idx, c)| {
            let mut score: i64 = 0;
            let mut reasons: Vec<String> = Vec::new();

            let region = config.region_bonus(c.country.as_deref());
            if region > 0 {
                reasons.push(format!(
                    "preferred region {} (+{region})",
                    c.country.as_deref().unwrap_or("?")
                ));
                score += region;
            }

            let distance = band_distance(c);
            if distance > 0 {
                let penalty = distance * config.band_distance_penalty;
                score -= penalty;
                reasons.push(format!(
                    "{} tracks is {distance} from the ideal {:?} band (-{penalty})",
                    c.track_count, c.primary_type
                ));
            } else {
                reasons.push(format!(
                    "{} tracks fits the ideal {:?} band",
                    c.track_count, c.primary_type
                ));
            }

            if config.title_has_edition_keyword(&c.title) {
                score -= config.edition_keyword_penalty;
                reasons.push(format!(
                    "special edition keyword in title (-{})",
                    config.edition_keyword_penalty
                ));
            }

            (
                idx,
                distance,
                ScoredCandidate {
                    candidate: c.clone(),
                    score,
                    reasons,
                },
            )
        })
        .collect();

    scored.sort_by(|(a_idx, a_dist, a), (b_idx, b_dist, b)| {
        b.score
            .cmp(&a.score)
            .then(a_dist.cmp(b_dist))
            .then_with(|| {
                let a_date = a
                    .candidate
                    .release_date
                    .map(|d| d.sort_key())
                    .unwrap_or((i32::MAX, 13, 32));
                let b_date = b
                    .candidate
                    .release_date
                    .map(|d| d.sort_key())
                    .unwrap_or((i32::MAX, 13, 32));
                a_date.cmp(&b_date)
            })
            .then(a_idx.cmp(b_idx))
    });

    scored.into_iter().map(|(_, _, s)| s).collect()
}

/// Pick the variant the workflow should fetch when nothing is on disk yet.
pub fn pick_default_candidate(
    config: &ScorerConfig,
    candidates: &[ReleaseCandidate],
) -> Option<ScoredCandidate> {
    let ranked = rank_default_candidates(config, candidates);
    let best = ranked.into_iter().next();
    if let Some(ref b) = best {
        debug!(
            title = %b.candidate.title,
            external_id = %b.candidate.external_id,
            score = b.score,
            "selected default candidate"
        );
    }
    best
}
