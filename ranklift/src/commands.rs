use crate::CLAP_STYLING;
use clap::{Arg, arg, command};

const DEFAULT_DB_DIR: &str = "~/.config/ranklift/";

fn database_arg() -> Arg {
    arg!(-D --"database" <PATH>)
        .required(false)
        .help("Path to the ranklift database")
        .default_value("~/.config/ranklift/ranklift.db")
}

fn project_arg() -> Arg {
    arg!(-p --"project" <NAME>)
        .required(true)
        .help("The project to operate on")
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("ranklift")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("ranklift")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the ranklift database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the ranklift database")
                        .default_value(DEFAULT_DB_DIR),
                )
                .arg(
                    arg!(-f - -"force")
                        .help(
                            "Forces the overwriting of any existing database at the specified \
                        location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("project")
                .about("Manage tracked projects")
                .subcommand(
                    command!("add")
                        .about("Adds a project")
                        .arg(
                            arg!(-n --"name" <NAME>)
                                .required(true)
                                .help("The name of the project"),
                        )
                        .arg(
                            arg!(-d --"domain" <DOMAIN>)
                                .required(true)
                                .help("The website domain the project tracks"),
                        )
                        .arg(database_arg()),
                )
                .subcommand(command!("list").about("List all projects").arg(database_arg())),
        )
        .subcommand(
            command!("import")
                .about(
                    "Import crawl exports into a project. Ranking, competitor and backlink \
                imports run inside a crawl session; backlinks not seen in the pass are marked \
                lost.",
                )
                .subcommand(
                    command!("keywords")
                        .about("Import or refresh tracked keywords")
                        .arg(project_arg())
                        .arg(
                            arg!(-f --"file" <PATH>)
                                .required(true)
                                .help("JSON array of keyword rows")
                                .value_parser(clap::value_parser!(std::path::PathBuf)),
                        )
                        .arg(database_arg()),
                )
                .subcommand(
                    command!("rankings")
                        .about("Import daily ranking snapshots")
                        .arg(project_arg())
                        .arg(
                            arg!(-f --"file" <PATH>)
                                .required(true)
                                .help("JSON array of {keyword, date, position} rows")
                                .value_parser(clap::value_parser!(std::path::PathBuf)),
                        )
                        .arg(database_arg()),
                )
                .subcommand(
                    command!("competitors")
                        .about("Import per-keyword competitor positions")
                        .arg(project_arg())
                        .arg(
                            arg!(-f --"file" <PATH>)
                                .required(true)
                                .help("JSON array of competitor position rows")
                                .value_parser(clap::value_parser!(std::path::PathBuf)),
                        )
                        .arg(database_arg()),
                )
                .subcommand(
                    command!("backlinks")
                        .about("Import a backlink crawl pass (ours or a competitor's)")
                        .arg(project_arg())
                        .arg(
                            arg!(-f --"file" <PATH>)
                                .required(true)
                                .help("JSON array of backlink rows")
                                .value_parser(clap::value_parser!(std::path::PathBuf)),
                        )
                        .arg(
                            arg!(-c --"competitor" <DOMAIN>)
                                .required(false)
                                .help("Import as this competitor's backlink profile"),
                        )
                        .arg(database_arg()),
                ),
        )
        .subcommand(
            command!("quickwins")
                .about("Keywords worth pushing right now, ranked by opportunity score")
                .arg(project_arg())
                .arg(database_arg()),
        )
        .subcommand(
            command!("movers")
                .about("Previously well-ranking keywords that dropped hard (falling stars)")
                .arg(project_arg())
                .arg(database_arg()),
        )
        .subcommand(
            command!("pressure")
                .about("Per-competitor pressure table over shared keywords")
                .arg(project_arg())
                .arg(database_arg()),
        )
        .subcommand(
            command!("gaps")
                .about("Domains linking to competitors but not to us, ranked for outreach")
                .arg(project_arg())
                .arg(
                    arg!(-c --"competitor" <DOMAIN>)
                        .required(false)
                        .help("Restrict the analysis to a single competitor's profile"),
                )
                .arg(database_arg()),
        )
        .subcommand(
            command!("report")
                .about("Full competitive signal report for a project")
                .arg(project_arg())
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"include-overview")
                        .required(false)
                        .help("Include the full latest-ranking keyword table in the report")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(database_arg()),
        )
}
