#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "flowboard: kanban issue tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a flowboard project",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    fb init\n\n    # Start with sample issues\n    fb init --demo"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Create an issue",
        after_help = "EXAMPLES:\n    # Create a bug\n    fb create \"Crash on save\" --type bug --priority high\n\n    # Emit machine-readable output\n    fb create \"Crash on save\" --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Read",
        about = "List issues",
        after_help = "EXAMPLES:\n    # Open work sorted by priority\n    fb list --status todo,in-progress --sort priority\n\n    # Unassigned issues mentioning login\n    fb list --assignee '' -q login"
    )]
    List(cmd::list::ListArgs),

    #[command(next_help_heading = "Read", about = "Show issues grouped by status column")]
    Board(cmd::board::BoardArgs),

    #[command(next_help_heading = "Read", about = "Show one issue")]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Search issues by text",
        after_help = "EXAMPLES:\n    # Search the database\n    fb search login\n\n    # Search the loaded issues with full Unicode case folding\n    fb search CAFÉ --local"
    )]
    Search(cmd::search::SearchArgs),

    #[command(next_help_heading = "Read", about = "Dashboard figures")]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Update",
        about = "Edit issue fields",
        after_help = "EXAMPLES:\n    # Rename and reassign\n    fb edit 12 --title \"Crash on save (macOS)\" --assignee \"Sarah Chen\"\n\n    # Unassign\n    fb edit 12 --assignee ''"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(
        name = "move",
        next_help_heading = "Update",
        about = "Move an issue to another column",
        after_help = "EXAMPLES:\n    # Start work\n    fb move 12 in-progress\n\n    # Reopen\n    fb move 12 backlog"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(next_help_heading = "Update", about = "Change an issue's priority")]
    Priority(cmd::priority::PriorityArgs),

    #[command(next_help_heading = "Update", about = "Add a comment to an issue")]
    Comment(cmd::comment::CommentArgs),

    #[command(next_help_heading = "Update", about = "Delete an issue")]
    Delete(cmd::delete::DeleteArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("FLOWBOARD_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "flowboard=debug,info"
        } else {
            "flowboard=info,warn"
        })
    });

    let format = env::var("FLOWBOARD_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let cwd = env::current_dir()?;
    let json = cli.json;

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, json, &cwd),
        Commands::Create(args) => cmd::create::run_create(args, json, &cwd),
        Commands::List(args) => cmd::list::run_list(&args, json, &cwd),
        Commands::Board(args) => cmd::board::run_board(&args, json, &cwd),
        Commands::Show(args) => cmd::show::run_show(&args, json, &cwd),
        Commands::Search(args) => cmd::search::run_search(&args, json, &cwd),
        Commands::Stats(args) => cmd::stats::run_stats(&args, json, &cwd),
        Commands::Edit(args) => cmd::edit::run_edit(&args, json, &cwd),
        Commands::Move(args) => cmd::move_cmd::run_move(&args, json, &cwd),
        Commands::Priority(args) => cmd::priority::run_priority(&args, json, &cwd),
        Commands::Comment(args) => cmd::comment::run_comment(&args, json, &cwd),
        Commands::Delete(args) => cmd::delete::run_delete(&args, json, &cwd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["fb", "list", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::List(_)));
    }

    #[test]
    fn move_subcommand_is_named_move() {
        let cli = Cli::parse_from(["fb", "move", "3", "done"]);
        assert!(matches!(cli.command, Commands::Move(_)));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
