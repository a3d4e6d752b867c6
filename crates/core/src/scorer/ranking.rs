//! Filename-aware candidate ranking.

use tracing::debug;

use crate::metadata::{PrimaryType, ReleaseCandidate};

use super::config::ScorerConfig;
use super::types::ScoredCandidate;

/// Positions compared during filename/title overlap.
const MAX_OVERLAP_POSITIONS: usize = 30;

/// Normalize a title or file base-name for matching: lower-case, every
/// non-alphanumeric run becomes a single space, trimmed.
pub fn normalize_for_match(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            for lc in c.to_lowercase() {
                out.push(lc);
            }
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// True when two normalized strings are considered a match: one contains the
/// other, or they share at least two whitespace-split tokens.
fn titles_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.contains(b) || b.contains(a) {
        return true;
    }
    let b_tokens: Vec<&str> = b.split_whitespace().collect();
    let shared = a
        .split_whitespace()
        .filter(|t| b_tokens.contains(t))
        .count();
    shared >= 2
}

/// Score release candidates against what is already on disk.
///
/// Pure function: identical inputs produce identical ordering and reasons.
/// Result is sorted descending by score; ties keep input order (stable sort).
/// `local_file_names` are base-names without extension, pre-normalization is
/// done here.
pub fn score_candidates(
    config: &ScorerConfig,
    candidates: &[ReleaseCandidate],
    local_file_count: usize,
    local_file_names: &[String],
) -> Vec<ScoredCandidate> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let normalized_files: Vec<String> = local_file_names
        .iter()
        .map(|n| normalize_for_match(n))
        .collect();

    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|c| score_one(config, c, local_file_count, &normalized_files))
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));

    if let Some(best) = scored.first() {
        debug!(
            title = %best.candidate.title,
            score = best.score,
            "best candidate after scoring"
        );
    }

    scored
}

fn score_one(
    config: &ScorerConfig,
    candidate: &ReleaseCandidate,
    local_file_count: usize,
    normalized_files: &[String],
) -> ScoredCandidate {
    let mut score: i64 = 0;
    let mut reasons: Vec<String> = Vec::new();

    // Track-count terms only apply when there are local files to compare to.
    if local_file_count > 0 {
        let count = candidate.track_count as i64;
        let local = local_file_count as i64;
        if count == local {
            score += config.exact_track_count_bonus;
            reasons.push(format!(
                "exact track count match ({local} tracks, +{})",
                config.exact_track_count_bonus
            ));
        } else {
            let diff = (count - local).abs();
            let bonus = config.close_track_count_bonus / (diff + 1);
            if bonus > 0 {
                score += bonus;
                reasons.push(format!(
                    "track count {count} vs {local} local files (+{bonus})"
                ));
            }
        }

        let matches = overlap_matches(&candidate.track_titles, normalized_files);
        if matches > 0 {
            let bonus = matches as i64 * config.filename_match_bonus;
            score += bonus;
            reasons.push(format!("{matches} track title(s) match local files (+{bonus})"));
        }
    }

    if config.title_has_edition_keyword(&candidate.title) {
        score -= config.edition_keyword_penalty;
        reasons.push(format!(
            "special edition keyword in title (-{})",
            config.edition_keyword_penalty
        ));
    }

    let region = config.region_bonus(candidate.country.as_deref());
    if region > 0 {
        reasons.push(format!(
            "preferred region {} (+{region})",
            candidate.country.as_deref().unwrap_or("?")
        ));
        score += region;
    }

    if candidate.primary_type == PrimaryType::Album {
        score += config.album_type_bonus;
        reasons.push(format!("album primary type (+{})", config.album_type_bonus));
    }

    ScoredCandidate {
        candidate: candidate.clone(),
        score,
        reasons,
    }
}

/// Count position-wise matches between candidate track titles and local file
/// names, over the first min(30, both lengths) positions.
fn overlap_matches(track_titles: &[String], normalized_files: &[String]) -> usize {
    let positions = MAX_OVERLAP_POSITIONS
        .min(track_titles.len())
        .min(normalized_files.len());

    (0..positions)
        .filter(|&i| {
            let title = normalize_for_match(&track_titles[i]);
            titles_match(&title, &normalized_files[i])
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ReleaseStatus;

    fn make_candidate(title: &str, track_count: u32) -> ReleaseCandidate {
        ReleaseCandidate {
            external_id: format!("id-{title}"),
            title: title.to_string(),
            country: None,
            status: ReleaseStatus::Official,
            primary_type: PrimaryType::Album,
            track_count,
            track_titles: vec![],
            release_date: None,
            is_demo: false,
        }
    }

    #[test]
    fn test_normalize_for_match() {
        assert_eq!(normalize_for_match("01 - Mojo Pin.flac"), "01 mojo pin flac");
        assert_eq!(normalize_for_match("Hallelujah!!!"), "hallelujah");
        assert_eq!(normalize_for_match("  (Live) "), "live");
        assert_eq!(normalize_for_match(""), "");
    }

    #[test]
    fn test_titles_match_containment() {
        assert!(titles_match("mojo pin", "01 mojo pin flac"));
        assert!(titles_match("01 mojo pin flac", "mojo pin"));
    }

    #[test]
    fn test_titles_match_shared_tokens() {
        // No containment, but two shared tokens
        assert!(titles_match("so real acoustic", "so real demo take"));
        // Single shared token is not enough
        assert!(!titles_match("grace outro", "grace"));
        assert!(!titles_match("", "anything"));
    }

    #[test]
    fn test_empty_candidates_empty_result() {
        let config = ScorerConfig::default();
        let scored = score_candidates(&config, &[], 10, &[]);
        assert!(scored.is_empty());
    }

    #[test]
    fn test_zero_local_files_skips_file_terms() {
        let config = ScorerConfig::default();
        let mut candidate = make_candidate("Grace", 10);
        candidate.track_titles = vec!["Mojo Pin".to_string()];

        let scored = score_candidates(&config, &[candidate], 0, &[]);
        // Only the album-type bonus applies
        assert_eq!(scored[0].score, config.album_type_bonus);
        assert_eq!(scored[0].reasons.len(), 1);
    }

    #[test]
    fn test_exact_count_outranks_off_by_one() {
        let config = ScorerConfig::default();
        let exact = make_candidate("Grace", 10);
        let off_by_one = make_candidate("Grace", 11);

        let scored = score_candidates(&config, &[off_by_one, exact], 10, &[]);
        assert_eq!(scored[0].candidate.track_count, 10);
        assert!(scored[0].score > scored[1].score);
    }

    #[test]
    fn test_edition_keyword_scores_strictly_lower() {
        let config = ScorerConfig::default();
        let plain = make_candidate("OK Computer", 12);
        let deluxe = make_candidate("OK Computer (Deluxe Edition)", 12);

        let scored = score_candidates(&config, &[deluxe, plain], 12, &[]);
        assert_eq!(scored[0].candidate.title, "OK Computer");
        assert!(scored[0].score > scored[1].score);
    }

    #[test]
    fn test_spec_scenario_exact_vs_deluxe() {
        // 12 local files; A: 12 tracks "Album", B: 14 tracks "Album (Deluxe
        // Edition)". A must outrank B.
        let config = ScorerConfig::default();
        let a = make_candidate("Album", 12);
        let b = make_candidate("Album (Deluxe Edition)", 14);

        let scored = score_candidates(&config, &[b, a], 12, &[]);
        assert_eq!(scored[0].candidate.title, "Album");
    }

    #[test]
    fn test_filename_overlap_bonus() {
        let config = ScorerConfig::default();
        let mut with_titles = make_candidate("Grace", 3);
        with_titles.track_titles = vec![
            "Mojo Pin".to_string(),
            "Grace".to_string(),
            "Last Goodbye".to_string(),
        ];
        let without_titles = make_candidate("Grace", 3);

        let files = vec![
            "01 - Mojo Pin".to_string(),
            "02 - Grace".to_string(),
            "03 - Last Goodbye".to_string(),
        ];

        let scored = score_candidates(&config, &[without_titles, with_titles], 3, &files);
        assert!(scored[0].candidate.track_titles.len() == 3);
        assert_eq!(
            scored[0].score - scored[1].score,
            3 * config.filename_match_bonus
        );
    }

    #[test]
    fn test_region_bonus_applied() {
        let config = ScorerConfig::default();
        let mut xw = make_candidate("Album", 10);
        xw.country = Some("XW".to_string());
        let mut us = make_candidate("Album", 10);
        us.country = Some("US".to_string());
        let mut jp = make_candidate("Album", 10);
        jp.country = Some("JP".to_string());

        let scored = score_candidates(&config, &[jp, us, xw], 10, &[]);
        assert_eq!(scored[0].candidate.country.as_deref(), Some("XW"));
        assert_eq!(scored[1].candidate.country.as_deref(), Some("US"));
    }

    #[test]
    fn test_pure_and_stable() {
        let config = ScorerConfig::default();
        let a = make_candidate("Album A", 10);
        let b = make_candidate("Album B", 10);
        let candidates = vec![a, b];

        let first = score_candidates(&config, &candidates, 10, &[]);
        let second = score_candidates(&config, &candidates, 10, &[]);

        // Identical inputs, identical output
        assert_eq!(first.len(), second.len());
        for (x, y) in first.iter().zip(second.iter()) {
            assert_eq!(x.candidate.external_id, y.candidate.external_id);
            assert_eq!(x.score, y.score);
            assert_eq!(x.reasons, y.reasons);
        }
        // Equal scores keep input order
        assert_eq!(first[0].candidate.title, "Album A");
    }

    #[test]
    fn test_decaying_bonus_prefers_closer_count() {
        let config = ScorerConfig::default();
        let close = make_candidate("Album", 11);
        let far = make_candidate("Album", 15);

        let scored = score_candidates(&config, &[far, close], 10, &[]);
        assert_eq!(scored[0].candidate.track_count, 11);
    }
}
