use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use ranklift_core::data::{
    BacklinkImport, CompetitorPositionImport, CrawlType, Database, KeywordImport, Project,
    RankingImport,
};
use ranklift_core::{analysis, report};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

// Helper functions

/// Expand a user-supplied database path (tilde included) to a real path.
pub fn resolve_database_path(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    PathBuf::from(expanded.as_ref())
}

/// Load and parse a JSON array import file.
pub fn load_import_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file {}", path.display()))?;
    let rows: Vec<T> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    if rows.is_empty() {
        bail!("No rows found in {}", path.display());
    }
    Ok(rows)
}

fn open_database(args: &ArgMatches) -> Result<Database> {
    let raw = args.get_one::<String>("database").unwrap();
    let path = resolve_database_path(raw);
    if !Database::exists(&path) {
        bail!(
            "No database at {} - run `ranklift init` first",
            path.display()
        );
    }
    Ok(Database::new(&path)?)
}

fn resolve_project(db: &Database, args: &ArgMatches) -> Result<Project> {
    let name = args.get_one::<String>("project").unwrap();
    db.project_by_name(name)?
        .with_context(|| format!("Unknown project '{}'", name))
}

fn import_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush().unwrap();
    let mut response = String::new();
    io::stdin().read_line(&mut response).unwrap();
    response.trim().to_lowercase()
}

// Command handlers

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  RANKLIFT INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let raw_dir = args.get_one::<String>("PATH").unwrap();
    let force = args.get_flag("force");
    let config_dir = resolve_database_path(raw_dir);
    let db_path = config_dir.join("ranklift.db");

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    if Database::exists(&db_path) {
        if force {
            println!(
                "{} Deleting existing database (force mode)",
                "→".yellow().bold()
            );
            Database::drop(&db_path);
        } else {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!("Database already exists at:");
            println!(
                "  {} {}",
                "•".yellow(),
                db_path.display().to_string().bright_white()
            );
            println!();

            let response = print_prompt("Would you like to overwrite it? [y/N]:");
            println!();

            if response != "y" && response != "yes" {
                println!("{} Keeping existing database", "→".blue());
                return Ok(());
            }
            Database::drop(&db_path);
            println!("{} Existing database removed", "✓".green().bold());
            println!();
        }
    }

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    println!("{} Creating database...", "→".blue());
    Database::new(&db_path)?;

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

pub fn handle_project_add(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let name = args.get_one::<String>("name").unwrap();
    let domain = args.get_one::<String>("domain").unwrap();

    let project_id = db.create_project(name, domain)?;
    println!(
        "{} Project '{}' created ({})",
        "✓".green().bold(),
        name.bright_white(),
        project_id
    );
    Ok(())
}

pub fn handle_project_list(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let projects = db.projects()?;

    if projects.is_empty() {
        println!("No projects yet. Add one with `ranklift project add`.");
        return Ok(());
    }

    for project in projects {
        println!(
            "  {} {}  {}",
            "•".blue(),
            project.name.bright_white().bold(),
            project.domain
        );
    }
    Ok(())
}

pub fn handle_import_keywords(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let project = resolve_project(&db, args)?;
    let file = args.get_one::<PathBuf>("file").unwrap();
    let rows: Vec<KeywordImport> = load_import_file(file)?;

    let pb = import_spinner("Importing keywords...");
    let mut imported = 0usize;
    for row in &rows {
        db.upsert_keyword(&project.id, row)?;
        imported += 1;
        pb.set_message(format!("Importing keywords... {}", imported));
        pb.tick();
    }
    pb.finish_with_message(format!("✓ {} keywords imported", imported));
    Ok(())
}

pub fn handle_import_rankings(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let project = resolve_project(&db, args)?;
    let file = args.get_one::<PathBuf>("file").unwrap();
    let rows: Vec<RankingImport> = load_import_file(file)?;

    let session = db.start_session(&project.id, CrawlType::Rankings)?;
    let pb = import_spinner("Importing rankings...");

    let result = (|| -> Result<(usize, usize)> {
        let mut imported = 0usize;
        let mut skipped = 0usize;
        for row in &rows {
            match db.keyword_id(&project.id, &row.keyword)? {
                Some(keyword_id) => {
                    db.record_snapshot(keyword_id, row.date, row.position)?;
                    imported += 1;
                }
                None => {
                    warn!(keyword = %row.keyword, "skipping ranking for untracked keyword");
                    skipped += 1;
                }
            }
            pb.set_message(format!("Importing rankings... {}", imported));
            pb.tick();
        }
        Ok((imported, skipped))
    })();

    match result {
        Ok((imported, skipped)) => {
            db.complete_session(&session)?;
            pb.finish_with_message(format!(
                "✓ {} snapshots recorded ({} skipped)",
                imported, skipped
            ));
            Ok(())
        }
        Err(e) => {
            db.fail_session(&session)?;
            pb.finish_and_clear();
            Err(e)
        }
    }
}

pub fn handle_import_competitors(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let project = resolve_project(&db, args)?;
    let file = args.get_one::<PathBuf>("file").unwrap();
    let rows: Vec<CompetitorPositionImport> = load_import_file(file)?;

    let session = db.start_session(&project.id, CrawlType::Competitors)?;
    let pb = import_spinner("Importing competitor positions...");

    let result = (|| -> Result<usize> {
        let mut imported = 0usize;
        for row in &rows {
            match db.keyword_id(&project.id, &row.keyword)? {
                Some(keyword_id) => {
                    db.upsert_competitor_position(
                        &project.id,
                        keyword_id,
                        &row.competitor_domain,
                        row.position,
                        row.our_position,
                    )?;
                    imported += 1;
                }
                None => {
                    warn!(keyword = %row.keyword, "skipping competitor row for untracked keyword");
                }
            }
            pb.set_message(format!("Importing competitor positions... {}", imported));
            pb.tick();
        }
        Ok(imported)
    })();

    match result {
        Ok(imported) => {
            db.complete_session(&session)?;
            pb.finish_with_message(format!("✓ {} competitor positions imported", imported));
            Ok(())
        }
        Err(e) => {
            db.fail_session(&session)?;
            pb.finish_and_clear();
            Err(e)
        }
    }
}

pub fn handle_import_backlinks(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let project = resolve_project(&db, args)?;
    let file = args.get_one::<PathBuf>("file").unwrap();
    let competitor = args.get_one::<String>("competitor");
    let rows: Vec<BacklinkImport> = load_import_file(file)?;

    let session = db.start_session(&project.id, CrawlType::Backlinks)?;
    let started_at = db.session_started_at(&session)?;
    let pb = import_spinner("Importing backlinks...");

    let result = (|| -> Result<(usize, usize)> {
        let mut imported = 0usize;
        for row in &rows {
            match competitor {
                Some(domain) => db.upsert_competitor_backlink(&project.id, domain, row)?,
                None => db.upsert_backlink(&project.id, row)?,
            }
            imported += 1;
            pb.set_message(format!("Importing backlinks... {}", imported));
            pb.tick();
        }

        // Links present before this pass but not refreshed by it are lost.
        let lost = match competitor {
            Some(domain) => {
                db.mark_lost_competitor_backlinks(&project.id, Some(domain.as_str()), started_at)?
            }
            None => db.mark_lost_backlinks(&project.id, started_at)?,
        };
        Ok((imported, lost))
    })();

    match result {
        Ok((imported, lost)) => {
            db.complete_session(&session)?;
            pb.finish_with_message(format!(
                "✓ {} backlinks imported, {} marked lost",
                imported, lost
            ));
            Ok(())
        }
        Err(e) => {
            db.fail_session(&session)?;
            pb.finish_and_clear();
            Err(e)
        }
    }
}

pub fn handle_quickwins(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let project = resolve_project(&db, args)?;
    let wins = analysis::project_quick_wins(&db, &project.id)?;

    if wins.is_empty() {
        println!("No quick wins right now.");
        return Ok(());
    }

    print_divider();
    println!(
        "{}",
        format!("  QUICK WINS - {}", project.name)
            .bright_white()
            .bold()
    );
    print_divider();
    for win in &wins {
        println!(
            "  {} {}  {}",
            format!("[{}]", win.opportunity_score).green().bold(),
            win.keyword.bright_white(),
            format!(
                "pos {} · {}/mo · kd {:.0} · {}",
                win.position,
                win.search_volume,
                win.difficulty,
                win.intent.as_str()
            )
            .dimmed()
        );
    }
    Ok(())
}

pub fn handle_movers(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let project = resolve_project(&db, args)?;
    let stars = analysis::project_falling_stars(&db, &project.id)?;

    if stars.is_empty() {
        println!("No falling stars - nothing dropped hard recently.");
        return Ok(());
    }

    print_divider();
    println!(
        "{}",
        format!("  FALLING STARS - {}", project.name)
            .bright_white()
            .bold()
    );
    print_divider();
    for star in &stars {
        println!(
            "  {} {}  {} → {}  {}",
            format!("{:+}", star.position_delta).red().bold(),
            star.keyword.bright_white(),
            star.previous_position,
            star.current_position,
            format!("{}/mo", star.search_volume).dimmed()
        );
    }
    Ok(())
}

pub fn handle_pressure(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let project = resolve_project(&db, args)?;
    let table = analysis::pressure_table(&db, &project.id)?;

    if table.competitors.is_empty() {
        println!("No competitor position data yet.");
        return Ok(());
    }

    print_divider();
    println!(
        "{}",
        format!("  COMPETITOR PRESSURE - {}", project.name)
            .bright_white()
            .bold()
    );
    print_divider();
    if table.degraded {
        println!(
            "  {}",
            "first pass: simple outranked-share index".yellow()
        );
    }
    for comp in &table.competitors {
        let index = match comp.pressure_index {
            70.. => comp.pressure_index.to_string().red().bold(),
            40..=69 => comp.pressure_index.to_string().yellow().bold(),
            _ => comp.pressure_index.to_string().green().bold(),
        };
        println!(
            "  {} {}  {}",
            index,
            comp.competitor_domain.bright_white(),
            format!(
                "{} shared · {} above us · avg pos {:.1}",
                comp.shared_keywords, comp.keywords_above_us, comp.avg_competitor_position
            )
            .dimmed()
        );
    }
    Ok(())
}

pub fn handle_gaps(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let project = resolve_project(&db, args)?;
    let competitor = args.get_one::<String>("competitor").map(String::as_str);
    let result = analysis::gap_analysis(&db, &project.id, competitor)?;

    print_divider();
    println!(
        "{}",
        format!("  BACKLINK GAPS - {}", project.name)
            .bright_white()
            .bold()
    );
    print_divider();
    println!(
        "  {} gaps, {} high priority · our domains: {} · competitor domains: {}",
        result.summary.total_gaps,
        result.summary.high_priority_gaps,
        result.summary.our_backlink_domains,
        result.summary.competitor_backlink_domains
    );
    println!();

    for gap in &result.gaps {
        let marker = if gap.is_high_priority {
            "!".red().bold()
        } else {
            "·".dimmed()
        };
        println!(
            "  {} {}  {}",
            marker,
            gap.source_domain.bright_white(),
            format!(
                "DA {} · spam {} · {} · links to {}",
                gap.avg_domain_authority,
                gap.avg_spam_score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                gap.dominant_link_type.as_str(),
                gap.competitors.join(", ")
            )
            .dimmed()
        );
    }
    Ok(())
}

pub fn handle_report(args: &ArgMatches) -> Result<()> {
    let db = open_database(args)?;
    let project = resolve_project(&db, args)?;
    let format = report::ReportFormat::from_str(args.get_one::<String>("format").unwrap())
        .context("Unknown report format")?;
    let output = args.get_one::<PathBuf>("output");
    let include_overview = args.get_flag("include-overview");

    let data = report::gather_report_data(&db, &project, include_overview)?;
    let content = match format {
        report::ReportFormat::Text => report::generate_text_report(&data),
        report::ReportFormat::Json => report::generate_json_report(&data)?,
        report::ReportFormat::Markdown => report::generate_markdown_report(&data),
    };

    match output {
        Some(path) => {
            report::save_report(&content, path)?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}
