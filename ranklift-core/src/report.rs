// Report generation from analysis views

use crate::analysis::{self, KeywordOverview, PressureTable};
use crate::data::{Database, Project};
use crate::error::Result;
use ranklift_engine::model::{FallingStar, GapAnalysis, QuickWin};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub project_name: String,
    pub project_domain: String,
    pub generated_at: i64,
    pub tracked_keywords: usize,
    pub quick_wins: Vec<QuickWin>,
    pub falling_stars: Vec<FallingStar>,
    pub pressure: PressureTable,
    pub gap_analysis: GapAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<Vec<KeywordOverview>>,
}

pub fn gather_report_data(
    db: &Database,
    project: &Project,
    include_overview: bool,
) -> Result<ReportData> {
    let overview = analysis::keyword_overview(db, &project.id)?;
    let tracked_keywords = overview.len();

    Ok(ReportData {
        project_name: project.name.clone(),
        project_domain: project.domain.clone(),
        generated_at: chrono::Utc::now().timestamp(),
        tracked_keywords,
        quick_wins: analysis::project_quick_wins(db, &project.id)?,
        falling_stars: analysis::project_falling_stars(db, &project.id)?,
        pressure: analysis::pressure_table(db, &project.id)?,
        gap_analysis: analysis::gap_analysis(db, &project.id, None)?,
        overview: include_overview.then_some(overview),
    })
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                      RANKLIFT COMPETITIVE SIGNAL REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!("Project:       {}\n", data.project_name));
    report.push_str(&format!("Domain:        {}\n", data.project_domain));
    report.push_str(&format!(
        "Generated:     {}\n",
        format_timestamp(data.generated_at)
    ));
    report.push_str(&format!("Keywords:      {} tracked\n", data.tracked_keywords));
    report.push('\n');

    // Quick wins
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("QUICK WINS\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if data.quick_wins.is_empty() {
        report.push_str("  (none)\n\n");
    } else {
        for (idx, win) in data.quick_wins.iter().enumerate() {
            report.push_str(&format!(
                "[{}] {}  (score {})\n",
                idx + 1,
                win.keyword,
                win.opportunity_score
            ));
            report.push_str(&format!(
                "    Position: {}   Volume: {}/mo   Difficulty: {:.0}   Intent: {}\n",
                win.position,
                win.search_volume,
                win.difficulty,
                win.intent.as_str()
            ));
        }
        report.push('\n');
    }

    // Falling stars
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("FALLING STARS\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if data.falling_stars.is_empty() {
        report.push_str("  (none)\n\n");
    } else {
        for star in &data.falling_stars {
            report.push_str(&format!(
                "  {}  {} → {} ({} positions)   volume {}/mo\n",
                star.keyword,
                star.previous_position,
                star.current_position,
                star.position_delta,
                star.search_volume
            ));
        }
        report.push('\n');
    }

    // Competitor pressure
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("COMPETITOR PRESSURE\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if data.pressure.degraded {
        report.push_str("  Note: first pass - showing the simple outranked-share index.\n\n");
    }

    if data.pressure.competitors.is_empty() {
        report.push_str("  (no competitor data)\n\n");
    } else {
        for comp in &data.pressure.competitors {
            report.push_str(&format!(
                "  {}  pressure {}/100\n",
                comp.competitor_domain, comp.pressure_index
            ));
            report.push_str(&format!(
                "    Shared keywords: {}   Above us: {}   Avg position: {:.1} (ours: {})\n",
                comp.shared_keywords,
                comp.keywords_above_us,
                comp.avg_competitor_position,
                comp.avg_our_position
                    .map(|p| format!("{:.1}", p))
                    .unwrap_or_else(|| "-".to_string())
            ));
        }
        report.push('\n');
    }

    // Backlink gaps
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("BACKLINK GAPS\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    let summary = &data.gap_analysis.summary;
    report.push_str(&format!(
        "Gap domains: {} ({} high priority)   Avg DA: {}   Our domains: {}   Competitor domains: {}\n\n",
        summary.total_gaps,
        summary.high_priority_gaps,
        summary.avg_gap_domain_authority,
        summary.our_backlink_domains,
        summary.competitor_backlink_domains
    ));

    for gap in &data.gap_analysis.gaps {
        let marker = if gap.is_high_priority { "[!]" } else { "   " };
        report.push_str(&format!(
            "{} {}  DA {}  spam {}  {} competitor(s): {}\n",
            marker,
            gap.source_domain,
            gap.avg_domain_authority,
            gap.avg_spam_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            gap.competitor_count,
            gap.competitors.join(", ")
        ));
    }
    if !data.gap_analysis.gaps.is_empty() {
        report.push('\n');
    }

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                          End of Report\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("\nGenerated by Ranklift - keyword rank tracking and competitive analysis\n\n");

    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Ranklift",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": format_iso8601_timestamp(data.generated_at),
                "format": "json"
            },
            "project": {
                "name": data.project_name,
                "domain": data.project_domain,
                "tracked_keywords": data.tracked_keywords
            },
            "quick_wins": data.quick_wins,
            "falling_stars": data.falling_stars,
            "competitor_pressure": data.pressure,
            "backlink_gaps": data.gap_analysis,
            "overview": data.overview
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(&format!("# Ranklift Report: {}\n\n", data.project_name));
    report.push_str(&format!(
        "Domain `{}` - generated {} - {} keywords tracked\n\n",
        data.project_domain,
        format_timestamp(data.generated_at),
        data.tracked_keywords
    ));

    report.push_str("## Quick Wins\n\n");
    if data.quick_wins.is_empty() {
        report.push_str("_None._\n\n");
    } else {
        report.push_str("| Keyword | Position | Volume | Difficulty | Intent | Score |\n");
        report.push_str("|---|---|---|---|---|---|\n");
        for win in &data.quick_wins {
            report.push_str(&format!(
                "| {} | {} | {} | {:.0} | {} | {} |\n",
                win.keyword,
                win.position,
                win.search_volume,
                win.difficulty,
                win.intent.as_str(),
                win.opportunity_score
            ));
        }
        report.push('\n');
    }

    report.push_str("## Falling Stars\n\n");
    if data.falling_stars.is_empty() {
        report.push_str("_None._\n\n");
    } else {
        report.push_str("| Keyword | Was | Now | Delta | Volume |\n");
        report.push_str("|---|---|---|---|---|\n");
        for star in &data.falling_stars {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                star.keyword,
                star.previous_position,
                star.current_position,
                star.position_delta,
                star.search_volume
            ));
        }
        report.push('\n');
    }

    report.push_str("## Competitor Pressure\n\n");
    if data.pressure.competitors.is_empty() {
        report.push_str("_No competitor data._\n\n");
    } else {
        report.push_str("| Competitor | Shared | Above us | Avg pos | Our avg | Volume | Pressure |\n");
        report.push_str("|---|---|---|---|---|---|---|\n");
        for comp in &data.pressure.competitors {
            report.push_str(&format!(
                "| {} | {} | {} | {:.1} | {} | {} | {} |\n",
                comp.competitor_domain,
                comp.shared_keywords,
                comp.keywords_above_us,
                comp.avg_competitor_position,
                comp.avg_our_position
                    .map(|p| format!("{:.1}", p))
                    .unwrap_or_else(|| "-".to_string()),
                comp.total_volume,
                comp.pressure_index
            ));
        }
        report.push('\n');
    }

    report.push_str("## Backlink Gaps\n\n");
    let summary = &data.gap_analysis.summary;
    report.push_str(&format!(
        "{} gap domains ({} high priority), average DA {}.\n\n",
        summary.total_gaps, summary.high_priority_gaps, summary.avg_gap_domain_authority
    ));
    if !data.gap_analysis.gaps.is_empty() {
        report.push_str("| Domain | Competitors | Avg DA | Avg spam | Dominant type | Priority |\n");
        report.push_str("|---|---|---|---|---|---|\n");
        for gap in &data.gap_analysis.gaps {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                gap.source_domain,
                gap.competitor_count,
                gap.avg_domain_authority,
                gap.avg_spam_score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                gap.dominant_link_type.as_str(),
                if gap.is_high_priority { "high" } else { "normal" }
            ));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn format_timestamp(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_iso8601_timestamp(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    datetime.to_rfc3339()
}
