use anyhow::Result;

use rivalry_tracker::cli::Command;
use rivalry_tracker::{
    handle_completions, handle_init_db, handle_recalculate, handle_serve, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Serve { port } => handle_serve(*port),
        Command::InitDb => handle_init_db(),
        Command::Recalculate { dry_run, user_id } => handle_recalculate(*dry_run, *user_id),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
