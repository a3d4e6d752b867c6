//! Release candidate scoring.
//!
//! Two entry points:
//! - [`score_candidates`]: filename-aware ranking used when files already
//!   exist on disk and the user asks to fix a mismatched variant.
//! - [`pick_default_candidate`]: import-time selection when there is no local
//!   file signal yet.
//!
//! Both are pure functions of their inputs. Point values are policy, carried
//! by [`ScorerConfig`], not hard-coded.

mod config;
mod default_pick;
mod ranking;
mod types;

pub use config::ScorerConfig;
pub use default_pick::{pick_default_candidate, rank_default_candidates};
pub use ranking::{normalize_for_match, score_candidates};
pub use types::ScoredCandidate;
