use crate::error::{Result, StoreError};
use chrono::NaiveDate;
use ranklift_engine::classify::{FallingStarConfig, QuickWinConfig};
use ranklift_engine::model::{
    Backlink, CompetitorBacklink, CompetitorPosition, Intent, KeywordSnapshot, LinkType,
};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

pub struct Database {
    conn: Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CrawlType {
    Rankings,
    Competitors,
    Backlinks,
}

impl CrawlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlType::Rankings => "rankings",
            CrawlType::Competitors => "competitors",
            CrawlType::Backlinks => "backlinks",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub created_at: i64,
    pub pressure_computed_at: Option<i64>,
}

fn default_true() -> bool {
    true
}

/// One keyword row as ingested from a crawl export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordImport {
    pub keyword: String,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub search_volume: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<f64>,
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_core_page: bool,
}

/// One daily ranking observation for a keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingImport {
    pub keyword: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorPositionImport {
    pub keyword: String,
    pub competitor_domain: String,
    pub position: u32,
    #[serde(default)]
    pub our_position: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklinkImport {
    #[serde(default)]
    pub competitor_domain: Option<String>,
    #[serde(default)]
    pub source_domain: Option<String>,
    pub source_url: String,
    pub target_url: String,
    pub link_type: LinkType,
    #[serde(default)]
    pub domain_authority: Option<f64>,
    #[serde(default)]
    pub spam_score: Option<u32>,
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn domain_from_url(source_url: &str) -> Option<String> {
    Url::parse(source_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| StoreError::InvalidDate(s.to_string()))
}

impl Database {
    pub fn drop(path: &Path) {
        fs::remove_file(path).unwrap();
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Optimize for concurrent writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        db.cancel_orphaned_sessions()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- Tracked websites
            CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT UNIQUE NOT NULL,
    domain TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    pressure_computed_at INTEGER
);

-- Per-project classifier thresholds, stored as JSON
CREATE TABLE IF NOT EXISTS project_settings (
    project_id TEXT PRIMARY KEY,
    quick_win TEXT,
    falling_star TEXT,
    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    keyword TEXT NOT NULL,
    cluster TEXT,
    target_url TEXT,
    search_volume INTEGER,
    difficulty REAL,
    intent TEXT NOT NULL CHECK(intent IN ('informational', 'commercial', 'transactional', 'navigational')),
    is_active BOOLEAN NOT NULL DEFAULT 1,
    is_core_page BOOLEAN NOT NULL DEFAULT 0,

    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE,
    UNIQUE(project_id, keyword)
);

CREATE INDEX IF NOT EXISTS idx_keywords_project ON keywords(project_id);
CREATE INDEX IF NOT EXISTS idx_keywords_active ON keywords(project_id, is_active);

-- One row per keyword per calendar day; immutable once the day has passed
CREATE TABLE IF NOT EXISTS keyword_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    position INTEGER,
    previous_position INTEGER,

    FOREIGN KEY(keyword_id) REFERENCES keywords(id) ON DELETE CASCADE,
    UNIQUE(keyword_id, date)
);

CREATE INDEX IF NOT EXISTS idx_snapshots_keyword ON keyword_snapshots(keyword_id, date);

-- Latest observed competitor rank per (keyword, domain); upsert on re-crawl
CREATE TABLE IF NOT EXISTS competitor_positions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    keyword_id INTEGER NOT NULL,
    competitor_domain TEXT NOT NULL,
    position INTEGER NOT NULL,
    our_position INTEGER,

    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE,
    FOREIGN KEY(keyword_id) REFERENCES keywords(id) ON DELETE CASCADE,
    UNIQUE(keyword_id, competitor_domain)
);

CREATE INDEX IF NOT EXISTS idx_competitor_positions_project ON competitor_positions(project_id);
CREATE INDEX IF NOT EXISTS idx_competitor_positions_domain ON competitor_positions(project_id, competitor_domain);

CREATE TABLE IF NOT EXISTS backlinks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    source_domain TEXT NOT NULL,
    source_url TEXT NOT NULL,
    target_url TEXT NOT NULL,
    link_type TEXT NOT NULL CHECK(link_type IN ('dofollow', 'nofollow', 'sponsored', 'ugc')),
    is_live BOOLEAN NOT NULL DEFAULT 1,
    domain_authority REAL,
    spam_score INTEGER,
    first_seen_at INTEGER NOT NULL,
    last_seen_at INTEGER NOT NULL,
    lost_at INTEGER,

    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE,
    UNIQUE(project_id, source_url, target_url)
);

CREATE INDEX IF NOT EXISTS idx_backlinks_project ON backlinks(project_id);
CREATE INDEX IF NOT EXISTS idx_backlinks_live ON backlinks(project_id, is_live);

CREATE TABLE IF NOT EXISTS competitor_backlinks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT NOT NULL,
    competitor_domain TEXT NOT NULL,
    source_domain TEXT NOT NULL,
    source_url TEXT NOT NULL,
    target_url TEXT NOT NULL,
    link_type TEXT NOT NULL CHECK(link_type IN ('dofollow', 'nofollow', 'sponsored', 'ugc')),
    is_live BOOLEAN NOT NULL DEFAULT 1,
    domain_authority REAL,
    spam_score INTEGER,
    first_seen_at INTEGER NOT NULL,
    last_seen_at INTEGER NOT NULL,
    lost_at INTEGER,

    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE,
    UNIQUE(project_id, competitor_domain, source_url, target_url)
);

CREATE INDEX IF NOT EXISTS idx_competitor_backlinks_project ON competitor_backlinks(project_id);
CREATE INDEX IF NOT EXISTS idx_competitor_backlinks_domain ON competitor_backlinks(project_id, competitor_domain);
CREATE INDEX IF NOT EXISTS idx_competitor_backlinks_live ON competitor_backlinks(project_id, is_live);

-- Crawl sessions; at most one running per (project, crawl_type)
CREATE TABLE IF NOT EXISTS crawl_sessions (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    crawl_type TEXT NOT NULL CHECK(crawl_type IN ('rankings', 'competitors', 'backlinks')),
    status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed', 'cancelled')),
    started_at INTEGER NOT NULL,
    finished_at INTEGER,

    FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_project ON crawl_sessions(project_id, crawl_type, status);
            ",
        )?;
        Ok(())
    }

    // Project management

    pub fn create_project(&self, name: &str, domain: &str) -> Result<String> {
        let project_id = uuid::Uuid::new_v4().to_string();
        let timestamp = current_timestamp();

        self.conn.execute(
            "INSERT INTO projects (id, name, domain, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![&project_id, name, domain, timestamp],
        )?;

        Ok(project_id)
    }

    pub fn project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, domain, created_at, pressure_computed_at FROM projects WHERE name = ?1",
        )?;

        let project = stmt
            .query_row(params![name], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    domain: row.get(2)?,
                    created_at: row.get(3)?,
                    pressure_computed_at: row.get(4)?,
                })
            })
            .optional()?;
        Ok(project)
    }

    pub fn projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, domain, created_at, pressure_computed_at FROM projects ORDER BY name",
        )?;

        let projects = stmt
            .query_map([], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    domain: row.get(2)?,
                    created_at: row.get(3)?,
                    pressure_computed_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(projects)
    }

    pub fn pressure_computed_at(&self, project_id: &str) -> Result<Option<i64>> {
        let computed_at: Option<i64> = self
            .conn
            .query_row(
                "SELECT pressure_computed_at FROM projects WHERE id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(computed_at)
    }

    pub fn mark_pressure_computed(&self, project_id: &str) -> Result<()> {
        let timestamp = current_timestamp();
        self.conn.execute(
            "UPDATE projects SET pressure_computed_at = ?1 WHERE id = ?2",
            params![timestamp, project_id],
        )?;
        Ok(())
    }

    // Classifier settings, JSON round-tripped through the engine config structs

    pub fn set_quick_win_config(&self, project_id: &str, config: &QuickWinConfig) -> Result<()> {
        let json = serde_json::to_string(config)?;
        self.conn.execute(
            "INSERT INTO project_settings (project_id, quick_win) VALUES (?1, ?2)
             ON CONFLICT(project_id) DO UPDATE SET quick_win = excluded.quick_win",
            params![project_id, json],
        )?;
        Ok(())
    }

    pub fn quick_win_config(&self, project_id: &str) -> Result<QuickWinConfig> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT quick_win FROM project_settings WHERE project_id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(QuickWinConfig::default()),
        }
    }

    pub fn set_falling_star_config(
        &self,
        project_id: &str,
        config: &FallingStarConfig,
    ) -> Result<()> {
        let json = serde_json::to_string(config)?;
        self.conn.execute(
            "INSERT INTO project_settings (project_id, falling_star) VALUES (?1, ?2)
             ON CONFLICT(project_id) DO UPDATE SET falling_star = excluded.falling_star",
            params![project_id, json],
        )?;
        Ok(())
    }

    pub fn falling_star_config(&self, project_id: &str) -> Result<FallingStarConfig> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT falling_star FROM project_settings WHERE project_id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(FallingStarConfig::default()),
        }
    }

    // Keyword operations

    pub fn upsert_keyword(&self, project_id: &str, keyword: &KeywordImport) -> Result<i64> {
        let intent = keyword.intent.unwrap_or(Intent::Informational);

        self.conn.execute(
            "INSERT INTO keywords (
                project_id, keyword, cluster, target_url, search_volume,
                difficulty, intent, is_active, is_core_page
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(project_id, keyword) DO UPDATE SET
                cluster = excluded.cluster,
                target_url = excluded.target_url,
                search_volume = excluded.search_volume,
                difficulty = excluded.difficulty,
                intent = excluded.intent,
                is_active = excluded.is_active,
                is_core_page = excluded.is_core_page",
            params![
                project_id,
                &keyword.keyword,
                &keyword.cluster,
                &keyword.target_url,
                keyword.search_volume,
                keyword.difficulty,
                intent.as_str(),
                keyword.is_active,
                keyword.is_core_page,
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM keywords WHERE project_id = ?1 AND keyword = ?2",
            params![project_id, &keyword.keyword],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn keyword_id(&self, project_id: &str, keyword: &str) -> Result<Option<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM keywords WHERE project_id = ?1 AND keyword = ?2")?;

        let result = stmt
            .query_row(params![project_id, keyword], |row| row.get(0))
            .optional()?;
        Ok(result)
    }

    // Snapshot operations

    /// Record (or refresh, within the same day) a keyword's daily ranking
    /// observation. The previous position is captured from the most recent
    /// earlier snapshot that had one.
    pub fn record_snapshot(
        &self,
        keyword_id: i64,
        date: NaiveDate,
        position: Option<u32>,
    ) -> Result<()> {
        let previous = self.position_on_or_before(keyword_id, date.pred_opt().unwrap_or(date))?;

        self.conn.execute(
            "INSERT INTO keyword_snapshots (keyword_id, date, position, previous_position)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(keyword_id, date) DO UPDATE SET position = excluded.position",
            params![
                keyword_id,
                date.format("%Y-%m-%d").to_string(),
                position,
                previous,
            ],
        )?;
        Ok(())
    }

    /// Most recent ranked position observed on or before `date`.
    pub fn position_on_or_before(&self, keyword_id: i64, date: NaiveDate) -> Result<Option<u32>> {
        let mut stmt = self.conn.prepare(
            "SELECT position FROM keyword_snapshots
             WHERE keyword_id = ?1 AND date <= ?2 AND position IS NOT NULL
             ORDER BY date DESC LIMIT 1",
        )?;

        let position = stmt
            .query_row(
                params![keyword_id, date.format("%Y-%m-%d").to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(position)
    }

    /// Latest-per-keyword view: for each active keyword, the most recent
    /// dated snapshot with a non-null position. When `window_days` is given,
    /// the previous position is re-resolved against the snapshot that many
    /// days back instead of the stored day-over-day value.
    pub fn latest_snapshots(
        &self,
        project_id: &str,
        window_days: Option<u32>,
    ) -> Result<Vec<KeywordSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT k.id, k.keyword, k.cluster, k.target_url, s.date, s.position,
                    s.previous_position, k.search_volume, k.difficulty, k.intent,
                    k.is_active, k.is_core_page
             FROM keywords k
             JOIN keyword_snapshots s ON s.keyword_id = k.id
             WHERE k.project_id = ?1
               AND s.position IS NOT NULL
               AND s.date = (
                   SELECT MAX(s2.date) FROM keyword_snapshots s2
                   WHERE s2.keyword_id = k.id AND s2.position IS NOT NULL
               )
             ORDER BY k.keyword",
        )?;

        let raw = stmt
            .query_map(params![project_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<u32>>(5)?,
                    row.get::<_, Option<u32>>(6)?,
                    row.get::<_, Option<u32>>(7)?,
                    row.get::<_, Option<f64>>(8)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, bool>(10)?,
                    row.get::<_, bool>(11)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut snapshots = Vec::with_capacity(raw.len());
        for (
            id,
            keyword,
            cluster,
            target_url,
            date,
            position,
            previous,
            volume,
            difficulty,
            intent,
            is_active,
            is_core_page,
        ) in raw
        {
            let date = parse_date(&date)?;
            let previous_position = match window_days {
                Some(days) => {
                    let cutoff = date - chrono::Duration::days(days as i64);
                    self.position_on_or_before(id, cutoff)?.or(previous)
                }
                None => previous,
            };

            snapshots.push(KeywordSnapshot {
                keyword_id: id,
                keyword,
                cluster,
                target_url,
                date,
                position,
                previous_position,
                search_volume: volume,
                difficulty,
                intent: Intent::from_str(&intent)?,
                is_active,
                is_core_page,
            });
        }

        Ok(snapshots)
    }

    // Competitor position operations

    pub fn upsert_competitor_position(
        &self,
        project_id: &str,
        keyword_id: i64,
        competitor_domain: &str,
        position: u32,
        our_position: Option<u32>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO competitor_positions (
                project_id, keyword_id, competitor_domain, position, our_position
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(keyword_id, competitor_domain) DO UPDATE SET
                position = excluded.position,
                our_position = excluded.our_position",
            params![
                project_id,
                keyword_id,
                &competitor_domain.to_lowercase(),
                position,
                our_position,
            ],
        )?;
        Ok(())
    }

    pub fn competitor_positions(&self, project_id: &str) -> Result<Vec<CompetitorPosition>> {
        let mut stmt = self.conn.prepare(
            "SELECT cp.keyword_id, cp.competitor_domain, cp.position, cp.our_position,
                    COALESCE(k.search_volume, 0)
             FROM competitor_positions cp
             JOIN keywords k ON k.id = cp.keyword_id
             WHERE cp.project_id = ?1",
        )?;

        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(CompetitorPosition {
                    keyword_id: row.get(0)?,
                    competitor_domain: row.get(1)?,
                    competitor_position: row.get(2)?,
                    our_position: row.get(3)?,
                    search_volume: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    // Backlink operations

    /// Insert or refresh one of our backlinks. Re-seeing a link refreshes
    /// last_seen_at, revives it and clears any lost marker.
    pub fn upsert_backlink(&self, project_id: &str, link: &BacklinkImport) -> Result<()> {
        let timestamp = current_timestamp();
        let source_domain = resolve_source_domain(link);

        self.conn.execute(
            "INSERT INTO backlinks (
                project_id, source_domain, source_url, target_url, link_type,
                is_live, domain_authority, spam_score, first_seen_at, last_seen_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8, ?8)
            ON CONFLICT(project_id, source_url, target_url) DO UPDATE SET
                link_type = excluded.link_type,
                is_live = 1,
                domain_authority = excluded.domain_authority,
                spam_score = excluded.spam_score,
                last_seen_at = excluded.last_seen_at,
                lost_at = NULL",
            params![
                project_id,
                source_domain,
                &link.source_url,
                &link.target_url,
                link.link_type.as_str(),
                link.domain_authority,
                link.spam_score,
                timestamp,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_competitor_backlink(
        &self,
        project_id: &str,
        competitor_domain: &str,
        link: &BacklinkImport,
    ) -> Result<()> {
        let timestamp = current_timestamp();
        let source_domain = resolve_source_domain(link);

        self.conn.execute(
            "INSERT INTO competitor_backlinks (
                project_id, competitor_domain, source_domain, source_url, target_url,
                link_type, is_live, domain_authority, spam_score, first_seen_at, last_seen_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?9, ?9)
            ON CONFLICT(project_id, competitor_domain, source_url, target_url) DO UPDATE SET
                link_type = excluded.link_type,
                is_live = 1,
                domain_authority = excluded.domain_authority,
                spam_score = excluded.spam_score,
                last_seen_at = excluded.last_seen_at,
                lost_at = NULL",
            params![
                project_id,
                &competitor_domain.to_lowercase(),
                source_domain,
                &link.source_url,
                &link.target_url,
                link.link_type.as_str(),
                link.domain_authority,
                link.spam_score,
                timestamp,
            ],
        )?;
        Ok(())
    }

    /// Mark our backlinks not refreshed since `seen_since` as lost.
    pub fn mark_lost_backlinks(&self, project_id: &str, seen_since: i64) -> Result<usize> {
        let timestamp = current_timestamp();
        let changed = self.conn.execute(
            "UPDATE backlinks SET is_live = 0, lost_at = ?1
             WHERE project_id = ?2 AND is_live = 1 AND last_seen_at < ?3",
            params![timestamp, project_id, seen_since],
        )?;
        Ok(changed)
    }

    pub fn mark_lost_competitor_backlinks(
        &self,
        project_id: &str,
        competitor_domain: Option<&str>,
        seen_since: i64,
    ) -> Result<usize> {
        let timestamp = current_timestamp();
        let changed = match competitor_domain {
            Some(domain) => self.conn.execute(
                "UPDATE competitor_backlinks SET is_live = 0, lost_at = ?1
                 WHERE project_id = ?2 AND competitor_domain = ?3
                   AND is_live = 1 AND last_seen_at < ?4",
                params![timestamp, project_id, domain.to_lowercase(), seen_since],
            )?,
            None => self.conn.execute(
                "UPDATE competitor_backlinks SET is_live = 0, lost_at = ?1
                 WHERE project_id = ?2 AND is_live = 1 AND last_seen_at < ?3",
                params![timestamp, project_id, seen_since],
            )?,
        };
        Ok(changed)
    }

    pub fn backlinks(&self, project_id: &str) -> Result<Vec<Backlink>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_domain, source_url, target_url, link_type, is_live,
                    domain_authority, spam_score
             FROM backlinks WHERE project_id = ?1",
        )?;

        let raw = stmt
            .query_map(params![project_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, Option<u32>>(6)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.into_iter()
            .map(
                |(source_domain, source_url, target_url, link_type, is_live, da, spam)| {
                    Ok(Backlink {
                        source_domain,
                        source_url,
                        target_url,
                        link_type: LinkType::from_str(&link_type)?,
                        is_live,
                        domain_authority: da,
                        spam_score: spam,
                    })
                },
            )
            .collect()
    }

    pub fn competitor_backlinks(
        &self,
        project_id: &str,
        competitor_domain: Option<&str>,
    ) -> Result<Vec<CompetitorBacklink>> {
        let mut stmt = self.conn.prepare(
            "SELECT competitor_domain, source_domain, source_url, target_url, link_type,
                    is_live, domain_authority, spam_score
             FROM competitor_backlinks
             WHERE project_id = ?1
               AND (?2 IS NULL OR competitor_domain = ?2)",
        )?;

        let filter = competitor_domain.map(|d| d.to_lowercase());
        let raw = stmt
            .query_map(params![project_id, filter], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, bool>(5)?,
                    row.get::<_, Option<f64>>(6)?,
                    row.get::<_, Option<u32>>(7)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.into_iter()
            .map(
                |(
                    competitor_domain,
                    source_domain,
                    source_url,
                    target_url,
                    link_type,
                    is_live,
                    da,
                    spam,
                )| {
                    Ok(CompetitorBacklink {
                        competitor_domain,
                        source_domain,
                        source_url,
                        target_url,
                        link_type: LinkType::from_str(&link_type)?,
                        is_live,
                        domain_authority: da,
                        spam_score: spam,
                    })
                },
            )
            .collect()
    }

    // Session management

    /// Open a crawl session. Fails when one is already running for the same
    /// project and crawl type.
    pub fn start_session(&self, project_id: &str, crawl_type: CrawlType) -> Result<String> {
        let running: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawl_sessions
             WHERE project_id = ?1 AND crawl_type = ?2 AND status = 'running'",
            params![project_id, crawl_type.as_str()],
            |row| row.get(0),
        )?;
        if running > 0 {
            return Err(StoreError::CrawlInProgress {
                crawl_type: crawl_type.as_str().to_string(),
            });
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let timestamp = current_timestamp();

        self.conn.execute(
            "INSERT INTO crawl_sessions (id, project_id, crawl_type, status, started_at)
             VALUES (?1, ?2, ?3, 'running', ?4)",
            params![&session_id, project_id, crawl_type.as_str(), timestamp],
        )?;

        Ok(session_id)
    }

    pub fn session_started_at(&self, session_id: &str) -> Result<i64> {
        let started: i64 = self.conn.query_row(
            "SELECT started_at FROM crawl_sessions WHERE id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(started)
    }

    pub fn complete_session(&self, session_id: &str) -> Result<()> {
        let timestamp = current_timestamp();
        self.conn.execute(
            "UPDATE crawl_sessions SET status = 'completed', finished_at = ?1 WHERE id = ?2",
            params![timestamp, session_id],
        )?;
        Ok(())
    }

    pub fn fail_session(&self, session_id: &str) -> Result<()> {
        let timestamp = current_timestamp();
        self.conn.execute(
            "UPDATE crawl_sessions SET status = 'failed', finished_at = ?1 WHERE id = ?2",
            params![timestamp, session_id],
        )?;
        Ok(())
    }

    /// A session left 'running' across a process restart is orphaned; nothing
    /// can finish it, so it is cancelled when the database is reopened.
    fn cancel_orphaned_sessions(&self) -> Result<()> {
        let timestamp = current_timestamp();
        self.conn.execute(
            "UPDATE crawl_sessions SET status = 'cancelled', finished_at = ?1
             WHERE status = 'running'",
            params![timestamp],
        )?;
        Ok(())
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

fn resolve_source_domain(link: &BacklinkImport) -> String {
    link.source_domain
        .as_ref()
        .map(|d| d.to_lowercase())
        .or_else(|| domain_from_url(&link.source_url))
        .unwrap_or_else(|| link.source_url.to_lowercase())
}
