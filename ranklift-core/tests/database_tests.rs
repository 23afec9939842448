// Tests for database operations

use chrono::NaiveDate;
use ranklift_core::data::{BacklinkImport, CrawlType, Database, KeywordImport};
use ranklift_core::error::StoreError;
use ranklift_engine::classify::{FallingStarConfig, QuickWinConfig};
use ranklift_engine::model::{Intent, LinkType};
use tempfile::TempDir;

fn test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&dir.path().join("test.db")).unwrap();
    (dir, db)
}

fn keyword(
    name: &str,
    search_volume: Option<u32>,
    difficulty: Option<f64>,
    intent: Intent,
) -> KeywordImport {
    KeywordImport {
        keyword: name.to_string(),
        cluster: None,
        target_url: None,
        search_volume,
        difficulty,
        intent: Some(intent),
        is_active: true,
        is_core_page: false,
    }
}

fn backlink(source_url: &str, target_url: &str, link_type: LinkType) -> BacklinkImport {
    BacklinkImport {
        competitor_domain: None,
        source_domain: None,
        source_url: source_url.to_string(),
        target_url: target_url.to_string(),
        link_type,
        domain_authority: Some(50.0),
        spam_score: Some(10),
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ============================================================================
// Project Tests
// ============================================================================

#[test]
fn test_create_and_fetch_project() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.example.com").unwrap();

    let project = db.project_by_name("shop").unwrap().unwrap();
    assert_eq!(project.id, id);
    assert_eq!(project.domain, "shop.example.com");
    assert_eq!(project.pressure_computed_at, None);
}

#[test]
fn test_project_by_name_missing() {
    let (_dir, db) = test_db();
    assert!(db.project_by_name("ghost").unwrap().is_none());
}

#[test]
fn test_projects_ordered_by_name() {
    let (_dir, db) = test_db();
    db.create_project("zeta", "z.com").unwrap();
    db.create_project("alpha", "a.com").unwrap();

    let names: Vec<String> = db.projects().unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[test]
fn test_duplicate_project_name_rejected() {
    let (_dir, db) = test_db();
    db.create_project("shop", "shop.com").unwrap();
    assert!(db.create_project("shop", "other.com").is_err());
}

#[test]
fn test_mark_pressure_computed() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    assert!(db.pressure_computed_at(&id).unwrap().is_none());
    db.mark_pressure_computed(&id).unwrap();
    assert!(db.pressure_computed_at(&id).unwrap().is_some());
}

// ============================================================================
// Classifier Settings Tests
// ============================================================================

#[test]
fn test_configs_default_when_unset() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    let qw = db.quick_win_config(&id).unwrap();
    assert_eq!(qw.min_position, QuickWinConfig::default().min_position);

    let fs = db.falling_star_config(&id).unwrap();
    assert_eq!(fs.window_days, FallingStarConfig::default().window_days);
}

#[test]
fn test_config_round_trip() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    let custom = QuickWinConfig {
        min_volume: 250,
        ..QuickWinConfig::default()
    };
    db.set_quick_win_config(&id, &custom).unwrap();
    assert_eq!(db.quick_win_config(&id).unwrap().min_volume, 250);

    let custom = FallingStarConfig {
        min_drop_positions: 3,
        ..FallingStarConfig::default()
    };
    db.set_falling_star_config(&id, &custom).unwrap();
    assert_eq!(db.falling_star_config(&id).unwrap().min_drop_positions, 3);
}

// ============================================================================
// Keyword Tests
// ============================================================================

#[test]
fn test_upsert_keyword_is_idempotent() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    let first = db
        .upsert_keyword(&id, &keyword("buy widgets", Some(100), Some(30.0), Intent::Commercial))
        .unwrap();
    let second = db
        .upsert_keyword(&id, &keyword("buy widgets", Some(200), Some(35.0), Intent::Commercial))
        .unwrap();

    assert_eq!(first, second);
    // the refreshed volume is visible through the snapshot view
    db.record_snapshot(first, date("2026-08-10"), Some(8)).unwrap();
    let snapshots = db.latest_snapshots(&id, None).unwrap();
    assert_eq!(snapshots[0].search_volume, Some(200));
}

#[test]
fn test_keyword_id_lookup() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();
    let kw_id = db
        .upsert_keyword(&id, &keyword("buy widgets", None, None, Intent::Commercial))
        .unwrap();

    assert_eq!(db.keyword_id(&id, "buy widgets").unwrap(), Some(kw_id));
    assert_eq!(db.keyword_id(&id, "sell widgets").unwrap(), None);
}

// ============================================================================
// Snapshot Tests
// ============================================================================

#[test]
fn test_record_snapshot_captures_previous_position() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();
    let kw = db
        .upsert_keyword(&id, &keyword("buy widgets", Some(100), Some(30.0), Intent::Commercial))
        .unwrap();

    db.record_snapshot(kw, date("2026-08-09"), Some(5)).unwrap();
    db.record_snapshot(kw, date("2026-08-10"), Some(12)).unwrap();

    let snapshots = db.latest_snapshots(&id, None).unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].date, date("2026-08-10"));
    assert_eq!(snapshots[0].position, Some(12));
    assert_eq!(snapshots[0].previous_position, Some(5));
}

#[test]
fn test_record_snapshot_same_day_refresh() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();
    let kw = db
        .upsert_keyword(&id, &keyword("buy widgets", Some(100), Some(30.0), Intent::Commercial))
        .unwrap();

    db.record_snapshot(kw, date("2026-08-10"), Some(12)).unwrap();
    db.record_snapshot(kw, date("2026-08-10"), Some(9)).unwrap();

    let snapshots = db.latest_snapshots(&id, None).unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].position, Some(9));
}

#[test]
fn test_previous_position_skips_unranked_days() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();
    let kw = db
        .upsert_keyword(&id, &keyword("buy widgets", Some(100), Some(30.0), Intent::Commercial))
        .unwrap();

    db.record_snapshot(kw, date("2026-08-08"), Some(5)).unwrap();
    db.record_snapshot(kw, date("2026-08-09"), None).unwrap();
    db.record_snapshot(kw, date("2026-08-10"), Some(12)).unwrap();

    let snapshots = db.latest_snapshots(&id, None).unwrap();
    assert_eq!(snapshots[0].previous_position, Some(5));
}

#[test]
fn test_latest_snapshots_excludes_never_ranked_keywords() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();
    let kw = db
        .upsert_keyword(&id, &keyword("buy widgets", Some(100), Some(30.0), Intent::Commercial))
        .unwrap();
    db.record_snapshot(kw, date("2026-08-10"), None).unwrap();

    assert!(db.latest_snapshots(&id, None).unwrap().is_empty());
}

#[test]
fn test_latest_snapshots_window_override() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();
    let kw = db
        .upsert_keyword(&id, &keyword("buy widgets", Some(100), Some(30.0), Intent::Commercial))
        .unwrap();

    db.record_snapshot(kw, date("2026-08-01"), Some(4)).unwrap();
    db.record_snapshot(kw, date("2026-08-09"), Some(6)).unwrap();
    db.record_snapshot(kw, date("2026-08-10"), Some(12)).unwrap();

    // day-over-day view sees yesterday's position
    let daily = db.latest_snapshots(&id, None).unwrap();
    assert_eq!(daily[0].previous_position, Some(6));

    // a 7-day window reaches back past it
    let weekly = db.latest_snapshots(&id, Some(7)).unwrap();
    assert_eq!(weekly[0].previous_position, Some(4));
}

// ============================================================================
// Competitor Position Tests
// ============================================================================

#[test]
fn test_competitor_position_upsert_and_join() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();
    let kw = db
        .upsert_keyword(&id, &keyword("buy widgets", Some(900), Some(30.0), Intent::Commercial))
        .unwrap();

    db.upsert_competitor_position(&id, kw, "Rival.COM", 3, Some(10))
        .unwrap();
    db.upsert_competitor_position(&id, kw, "rival.com", 2, Some(9))
        .unwrap();

    let rows = db.competitor_positions(&id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].competitor_domain, "rival.com");
    assert_eq!(rows[0].competitor_position, 2);
    assert_eq!(rows[0].our_position, Some(9));
    assert_eq!(rows[0].search_volume, 900);
}

#[test]
fn test_competitor_position_missing_volume_defaults_to_zero() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();
    let kw = db
        .upsert_keyword(&id, &keyword("buy widgets", None, None, Intent::Commercial))
        .unwrap();

    db.upsert_competitor_position(&id, kw, "rival.com", 3, None)
        .unwrap();

    let rows = db.competitor_positions(&id).unwrap();
    assert_eq!(rows[0].search_volume, 0);
}

// ============================================================================
// Backlink Tests
// ============================================================================

#[test]
fn test_backlink_source_domain_derived_from_url() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    db.upsert_backlink(
        &id,
        &backlink("https://Blog.Example.org/post", "https://shop.com/", LinkType::Dofollow),
    )
    .unwrap();

    let links = db.backlinks(&id).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].source_domain, "blog.example.org");
    assert!(links[0].is_live);
}

#[test]
fn test_backlink_explicit_source_domain_wins() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    let mut link = backlink("https://blog.example.org/post", "https://shop.com/", LinkType::Dofollow);
    link.source_domain = Some("CDN.example.org".to_string());
    db.upsert_backlink(&id, &link).unwrap();

    let links = db.backlinks(&id).unwrap();
    assert_eq!(links[0].source_domain, "cdn.example.org");
}

#[test]
fn test_mark_lost_backlinks_and_revival() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();
    let link = backlink("https://blog.example.org/post", "https://shop.com/", LinkType::Dofollow);
    db.upsert_backlink(&id, &link).unwrap();

    // backdate the link so a later crawl pass no longer covers it
    db.get_connection()
        .execute(
            "UPDATE backlinks SET last_seen_at = last_seen_at - 3600",
            [],
        )
        .unwrap();

    let session = db.start_session(&id, CrawlType::Backlinks).unwrap();
    let started_at = db.session_started_at(&session).unwrap();
    let lost = db.mark_lost_backlinks(&id, started_at).unwrap();
    db.complete_session(&session).unwrap();

    assert_eq!(lost, 1);
    let links = db.backlinks(&id).unwrap();
    assert!(!links[0].is_live);

    // re-seeing the link revives it
    db.upsert_backlink(&id, &link).unwrap();
    let links = db.backlinks(&id).unwrap();
    assert!(links[0].is_live);
}

#[test]
fn test_mark_lost_competitor_backlinks_scoped_to_domain() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    let link = backlink("https://blog.example.org/post", "https://rival1.com/", LinkType::Dofollow);
    db.upsert_competitor_backlink(&id, "rival1.com", &link).unwrap();
    let link = backlink("https://blog.example.org/post", "https://rival2.com/", LinkType::Dofollow);
    db.upsert_competitor_backlink(&id, "rival2.com", &link).unwrap();

    db.get_connection()
        .execute(
            "UPDATE competitor_backlinks SET last_seen_at = last_seen_at - 3600",
            [],
        )
        .unwrap();

    let session = db.start_session(&id, CrawlType::Backlinks).unwrap();
    let started_at = db.session_started_at(&session).unwrap();
    let lost = db
        .mark_lost_competitor_backlinks(&id, Some("rival1.com"), started_at)
        .unwrap();
    db.complete_session(&session).unwrap();

    assert_eq!(lost, 1);
    let rival2 = db.competitor_backlinks(&id, Some("rival2.com")).unwrap();
    assert!(rival2[0].is_live);
}

#[test]
fn test_competitor_backlinks_filter() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    let link = backlink("https://a.org/post", "https://rival1.com/", LinkType::Dofollow);
    db.upsert_competitor_backlink(&id, "rival1.com", &link).unwrap();
    let link = backlink("https://b.org/post", "https://rival2.com/", LinkType::Nofollow);
    db.upsert_competitor_backlink(&id, "rival2.com", &link).unwrap();

    assert_eq!(db.competitor_backlinks(&id, None).unwrap().len(), 2);
    let filtered = db.competitor_backlinks(&id, Some("RIVAL1.com")).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].competitor_domain, "rival1.com");
}

// ============================================================================
// Crawl Session Tests
// ============================================================================

#[test]
fn test_concurrent_sessions_of_same_type_rejected() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    let _session = db.start_session(&id, CrawlType::Rankings).unwrap();
    let err = db.start_session(&id, CrawlType::Rankings).unwrap_err();
    assert!(matches!(err, StoreError::CrawlInProgress { .. }));

    // a different crawl type may run in parallel
    assert!(db.start_session(&id, CrawlType::Backlinks).is_ok());
}

#[test]
fn test_completed_session_frees_the_slot() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    let session = db.start_session(&id, CrawlType::Rankings).unwrap();
    db.complete_session(&session).unwrap();
    assert!(db.start_session(&id, CrawlType::Rankings).is_ok());
}

#[test]
fn test_failed_session_frees_the_slot() {
    let (_dir, db) = test_db();
    let id = db.create_project("shop", "shop.com").unwrap();

    let session = db.start_session(&id, CrawlType::Rankings).unwrap();
    db.fail_session(&session).unwrap();
    assert!(db.start_session(&id, CrawlType::Rankings).is_ok());
}

#[test]
fn test_orphaned_sessions_cancelled_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    let db = Database::new(&path).unwrap();
    let id = db.create_project("shop", "shop.com").unwrap();
    db.start_session(&id, CrawlType::Rankings).unwrap();
    drop(db);

    // reopen simulates a process restart mid-crawl
    let db = Database::new(&path).unwrap();
    assert!(db.start_session(&id, CrawlType::Rankings).is_ok());
}
