// Tests for report generation

use chrono::NaiveDate;
use ranklift_core::data::{BacklinkImport, Database, KeywordImport, Project};
use ranklift_core::report::{
    ReportFormat, gather_report_data, generate_json_report, generate_markdown_report,
    generate_text_report, save_report,
};
use ranklift_engine::model::{Intent, LinkType};
use tempfile::TempDir;

fn test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&dir.path().join("test.db")).unwrap();
    (dir, db)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A project with one quick win, one falling star, one competitor and one
/// backlink gap, enough to exercise every report section.
fn seeded_project(db: &Database) -> Project {
    let id = db.create_project("shop", "shop.com").unwrap();

    let kw = db
        .upsert_keyword(
            &id,
            &KeywordImport {
                keyword: "buy widgets".to_string(),
                cluster: None,
                target_url: None,
                search_volume: Some(1000),
                difficulty: Some(30.0),
                intent: Some(Intent::Commercial),
                is_active: true,
                is_core_page: true,
            },
        )
        .unwrap();
    db.record_snapshot(kw, date("2026-08-10"), Some(8)).unwrap();

    let falling = db
        .upsert_keyword(
            &id,
            &KeywordImport {
                keyword: "widget reviews".to_string(),
                cluster: None,
                target_url: None,
                search_volume: Some(400),
                difficulty: Some(25.0),
                intent: Some(Intent::Informational),
                is_active: true,
                is_core_page: false,
            },
        )
        .unwrap();
    db.record_snapshot(falling, date("2026-08-09"), Some(4)).unwrap();
    db.record_snapshot(falling, date("2026-08-10"), Some(15)).unwrap();

    db.upsert_competitor_position(&id, kw, "rival.com", 3, Some(8))
        .unwrap();

    for competitor in ["rival1.com", "rival2.com"] {
        db.upsert_competitor_backlink(
            &id,
            competitor,
            &BacklinkImport {
                competitor_domain: None,
                source_domain: None,
                source_url: "https://hub.com/roundup".to_string(),
                target_url: format!("https://{}/", competitor),
                link_type: LinkType::Dofollow,
                domain_authority: Some(60.0),
                spam_score: Some(5),
            },
        )
        .unwrap();
    }

    db.project_by_name("shop").unwrap().unwrap()
}

// ============================================================================
// Format Parsing Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json)));
    assert!(matches!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown)));
    assert!(ReportFormat::from_str("pdf").is_none());
}

// ============================================================================
// Data Gathering Tests
// ============================================================================

#[test]
fn test_gather_report_data_covers_all_sections() {
    let (_dir, db) = test_db();
    let project = seeded_project(&db);

    let data = gather_report_data(&db, &project, false).unwrap();
    assert_eq!(data.project_name, "shop");
    assert_eq!(data.tracked_keywords, 2);
    assert_eq!(data.quick_wins.len(), 1);
    assert_eq!(data.falling_stars.len(), 1);
    assert_eq!(data.pressure.competitors.len(), 1);
    assert_eq!(data.gap_analysis.summary.total_gaps, 1);
    assert!(data.overview.is_none());
}

#[test]
fn test_gather_report_data_with_overview() {
    let (_dir, db) = test_db();
    let project = seeded_project(&db);

    let data = gather_report_data(&db, &project, true).unwrap();
    assert_eq!(data.overview.as_ref().unwrap().len(), 2);
}

// ============================================================================
// Rendering Tests
// ============================================================================

#[test]
fn test_text_report_sections() {
    let (_dir, db) = test_db();
    let project = seeded_project(&db);
    let data = gather_report_data(&db, &project, false).unwrap();

    let report = generate_text_report(&data);
    assert!(report.contains("QUICK WINS"));
    assert!(report.contains("FALLING STARS"));
    assert!(report.contains("COMPETITOR PRESSURE"));
    assert!(report.contains("BACKLINK GAPS"));
    assert!(report.contains("buy widgets"));
    assert!(report.contains("widget reviews"));
    assert!(report.contains("hub.com"));
}

#[test]
fn test_json_report_structure() {
    let (_dir, db) = test_db();
    let project = seeded_project(&db);
    let data = gather_report_data(&db, &project, false).unwrap();

    let json = generate_json_report(&data).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed["report"]["metadata"]["generator"], "Ranklift");
    assert_eq!(parsed["report"]["project"]["name"], "shop");
    assert_eq!(parsed["report"]["project"]["tracked_keywords"], 2);
    assert!(parsed["report"]["quick_wins"].is_array());
    assert!(parsed["report"]["backlink_gaps"]["gaps"].is_array());
}

#[test]
fn test_markdown_report_tables() {
    let (_dir, db) = test_db();
    let project = seeded_project(&db);
    let data = gather_report_data(&db, &project, false).unwrap();

    let report = generate_markdown_report(&data);
    assert!(report.contains("# Ranklift Report: shop"));
    assert!(report.contains("## Quick Wins"));
    assert!(report.contains("| Keyword | Position |"));
    assert!(report.contains("| buy widgets |"));
}

#[test]
fn test_save_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.md");

    save_report("# Report\n", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n");
}
