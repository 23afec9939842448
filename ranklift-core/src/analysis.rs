// Analysis views: storage rows in, engine-derived decision signals out.
// Every view recomputes from scratch against whatever the database currently
// holds; there is no caching layer.

use crate::data::Database;
use crate::error::Result;
use ranklift_engine::model::{
    CompetitorPressure, FallingStar, GapAnalysis, Intent, QuickWin,
};
use ranklift_engine::{
    analyze_backlink_gaps, competitor_pressure, falling_stars, fallback_pressure_index,
    opportunity_score, position_delta, quick_wins,
};
use serde::{Deserialize, Serialize};

/// One row of the latest-per-keyword ranking view served to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordOverview {
    pub keyword_id: i64,
    pub keyword: String,
    pub cluster: Option<String>,
    pub target_url: Option<String>,
    pub current_position: Option<u32>,
    pub position_delta: Option<i64>,
    pub search_volume: Option<u32>,
    pub difficulty: Option<f64>,
    pub intent: Intent,
    pub opportunity_score: u32,
    pub is_core_page: bool,
}

/// Competitor pressure table plus whether the degraded index was used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressureTable {
    pub competitors: Vec<CompetitorPressure>,
    pub degraded: bool,
}

pub fn keyword_overview(db: &Database, project_id: &str) -> Result<Vec<KeywordOverview>> {
    let snapshots = db.latest_snapshots(project_id, None)?;

    Ok(snapshots
        .into_iter()
        .map(|s| KeywordOverview {
            keyword_id: s.keyword_id,
            keyword: s.keyword,
            cluster: s.cluster,
            target_url: s.target_url,
            current_position: s.position,
            position_delta: position_delta(s.previous_position, s.position),
            search_volume: s.search_volume,
            difficulty: s.difficulty,
            intent: s.intent,
            opportunity_score: opportunity_score(s.search_volume, s.difficulty, s.position),
            is_core_page: s.is_core_page,
        })
        .collect())
}

pub fn project_quick_wins(db: &Database, project_id: &str) -> Result<Vec<QuickWin>> {
    let config = db.quick_win_config(project_id)?;
    let snapshots = db.latest_snapshots(project_id, None)?;
    Ok(quick_wins(&snapshots, &config))
}

pub fn project_falling_stars(db: &Database, project_id: &str) -> Result<Vec<FallingStar>> {
    let config = db.falling_star_config(project_id)?;
    let snapshots = db.latest_snapshots(project_id, Some(config.window_days))?;
    Ok(falling_stars(&snapshots, &config))
}

/// Per-competitor pressure table. Until the volume-weighted index has been
/// computed at least once for the project, rows carry the degraded
/// above-us/shared ratio instead.
pub fn pressure_table(db: &Database, project_id: &str) -> Result<PressureTable> {
    let rows = db.competitor_positions(project_id)?;
    let mut competitors = competitor_pressure(&rows);

    let degraded = db.pressure_computed_at(project_id)?.is_none();
    if degraded {
        for row in &mut competitors {
            row.pressure_index =
                fallback_pressure_index(row.shared_keywords, row.keywords_above_us);
        }
    }
    if !competitors.is_empty() {
        db.mark_pressure_computed(project_id)?;
    }

    Ok(PressureTable {
        competitors,
        degraded,
    })
}

/// Backlink gap analysis, optionally scoped to a single competitor's
/// backlink profile. Our own live domain set is always the full one.
pub fn gap_analysis(
    db: &Database,
    project_id: &str,
    competitor_domain: Option<&str>,
) -> Result<GapAnalysis> {
    let ours = db.backlinks(project_id)?;
    let theirs = db.competitor_backlinks(project_id, competitor_domain)?;
    Ok(analyze_backlink_gaps(&ours, &theirs))
}
