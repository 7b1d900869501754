pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod pagination;
pub mod rating;
pub mod services;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use cli::Cli;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::database::setup;
use crate::services::recalculation::RecalculationService;
use crate::services::server::ServerService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let config = AppConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_init_db() -> Result<()> {
    let config = AppConfig::from_env()?;
    let pool = database::create_pool(&config.server.database_path)?;
    setup::init_schema(&*database::get_connection(&pool)?)?;
    log::info!("Database schema ready at {}", config.server.database_path);
    Ok(())
}

pub fn handle_recalculate(dry_run: bool, user_id: Option<i64>) -> Result<()> {
    let config = AppConfig::from_env()?;
    let pool = database::create_pool(&config.server.database_path)?;
    setup::init_schema(&*database::get_connection(&pool)?)?;

    let report = RecalculationService::new(&pool, &config)
        .run(dry_run, user_id)
        .context("Recalculation failed")?;
    println!("{}", report);
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}
