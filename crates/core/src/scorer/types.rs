//! Types for candidate scoring.

use serde::{Deserialize, Serialize};

use crate::metadata::ReleaseCandidate;

/// A candidate with its computed score and the reasons behind it.
///
/// Produced fresh on every scoring pass and never mutated. `reasons` is
/// ordered in the same order the scoring terms were applied, so a log line or
/// UI tooltip reads as an explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: ReleaseCandidate,
    pub score: i64,
    pub reasons: Vec<String>,
}
