use colored::Colorize;
use commands::command_argument_builder;
use ranklift::handlers;
use ranklift_core::print_banner;

mod commands;

fn main() {
    tracing_subscriber::fmt::init();

    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handlers::handle_init(primary_command),
        Some(("project", primary_command)) => match primary_command.subcommand() {
            Some(("add", secondary_command)) => handlers::handle_project_add(secondary_command),
            Some(("list", secondary_command)) => handlers::handle_project_list(secondary_command),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some(("import", primary_command)) => match primary_command.subcommand() {
            Some(("keywords", secondary_command)) => {
                handlers::handle_import_keywords(secondary_command)
            }
            Some(("rankings", secondary_command)) => {
                handlers::handle_import_rankings(secondary_command)
            }
            Some(("competitors", secondary_command)) => {
                handlers::handle_import_competitors(secondary_command)
            }
            Some(("backlinks", secondary_command)) => {
                handlers::handle_import_backlinks(secondary_command)
            }
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some(("quickwins", primary_command)) => handlers::handle_quickwins(primary_command),
        Some(("movers", primary_command)) => handlers::handle_movers(primary_command),
        Some(("pressure", primary_command)) => handlers::handle_pressure(primary_command),
        Some(("gaps", primary_command)) => handlers::handle_gaps(primary_command),
        Some(("report", primary_command)) => handlers::handle_report(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
