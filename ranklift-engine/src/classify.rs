// Quick-win and falling-star classification over the latest-snapshot view

use crate::model::{FallingStar, Intent, KeywordSnapshot, QuickWin};
use crate::opportunity::{opportunity_score, position_delta};
use serde::{Deserialize, Serialize};

/// Thresholds for the quick-win classifier. Stored per project as JSON;
/// fields left unset fall back to these defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickWinConfig {
    /// Lowest (best) position still considered a quick win.
    pub min_position: u32,
    /// Highest (worst) position still considered a quick win.
    pub max_position: u32,
    /// Minimum monthly search volume.
    pub min_volume: u32,
    /// Maximum keyword difficulty.
    pub max_difficulty: f64,
    /// Intents that make the keyword commercially worth pushing.
    pub valid_intents: Vec<Intent>,
}

impl Default for QuickWinConfig {
    fn default() -> Self {
        Self {
            min_position: 6,
            max_position: 20,
            min_volume: 50,
            max_difficulty: 70.0,
            valid_intents: vec![Intent::Commercial, Intent::Transactional],
        }
    }
}

/// Thresholds for the falling-star classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallingStarConfig {
    /// How far back the comparison snapshot is taken from. Consumed by the
    /// storage view that resolves `previous_position`; kept here so the
    /// whole classifier configuration lives in one place.
    pub window_days: u32,
    /// Minimum number of positions lost.
    pub min_drop_positions: u32,
    /// The keyword must previously have ranked at or above this position.
    pub min_previous_position: u32,
    /// Minimum monthly search volume (0 = no volume filter).
    pub min_volume: u32,
}

impl Default for FallingStarConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            min_drop_positions: 5,
            min_previous_position: 10,
            min_volume: 0,
        }
    }
}

/// Active keywords sitting just off page one with volume, beatable
/// difficulty and buying intent, ordered by opportunity score descending.
pub fn quick_wins(snapshots: &[KeywordSnapshot], config: &QuickWinConfig) -> Vec<QuickWin> {
    let mut wins: Vec<QuickWin> = snapshots
        .iter()
        .filter(|s| s.is_active)
        .filter_map(|s| {
            let position = s.position?;
            if position < config.min_position || position > config.max_position {
                return None;
            }

            let volume = s.search_volume.unwrap_or(0);
            if volume < config.min_volume {
                return None;
            }

            // Missing difficulty degrades the score to 0 rather than
            // excluding the keyword outright.
            let difficulty = s.difficulty.unwrap_or(0.0);
            if difficulty > config.max_difficulty {
                return None;
            }

            if !config.valid_intents.contains(&s.intent) {
                return None;
            }

            Some(QuickWin {
                keyword_id: s.keyword_id,
                keyword: s.keyword.clone(),
                position,
                search_volume: volume,
                difficulty,
                intent: s.intent,
                opportunity_score: opportunity_score(s.search_volume, s.difficulty, s.position),
            })
        })
        .collect();

    wins.sort_by(|a, b| {
        b.opportunity_score
            .cmp(&a.opportunity_score)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    wins
}

/// Active keywords that previously ranked well and dropped hard, ordered by
/// position delta ascending (worst drops first).
pub fn falling_stars(
    snapshots: &[KeywordSnapshot],
    config: &FallingStarConfig,
) -> Vec<FallingStar> {
    let mut stars: Vec<FallingStar> = snapshots
        .iter()
        .filter(|s| s.is_active)
        .filter_map(|s| {
            let previous = s.previous_position?;
            if previous > config.min_previous_position {
                return None;
            }

            let current = s.position?;
            let delta = position_delta(Some(previous), Some(current))?;
            if delta > -(config.min_drop_positions as i64) {
                return None;
            }

            let volume = s.search_volume.unwrap_or(0);
            if volume < config.min_volume {
                return None;
            }

            Some(FallingStar {
                keyword_id: s.keyword_id,
                keyword: s.keyword.clone(),
                previous_position: previous,
                current_position: current,
                position_delta: delta,
                search_volume: volume,
            })
        })
        .collect();

    stars.sort_by(|a, b| {
        a.position_delta
            .cmp(&b.position_delta)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    stars
}
