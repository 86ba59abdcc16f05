use std::{net::IpAddr, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_db::{DbPool, connect, ensure_database};
use platform_obs::{ObsConfig, init_tracing};
use server::{
    AppConfig, AppState, ServeConfig,
    http::{self, Hr},
    scheduler,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "employee-server",
    version,
    about = "Employee & department directory"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server and the daily inactivity sweep.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Run the inactivity sweep once and exit.
    Sweep,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, help = "Bind address (defaults to HOST)")]
    host: Option<IpAddr>,
    #[arg(long, help = "Listen port (defaults to PORT)")]
    port: Option<u16>,
    #[arg(long, help = "Start without creating the database or applying migrations")]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig {
        otlp_endpoint: std::env::var("OTLP_ENDPOINT").ok(),
        ..ObsConfig::default()
    })?;
    let cli = Cli::parse();
    let config = Arc::new(AppConfig::load()?);
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, config).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up(&config).await,
            MigrateCommand::Down => migrate_down(&config).await,
        },
        Command::Sweep => run_sweep(&config).await,
    }
}

async fn setup_pool(config: &AppConfig) -> Result<DbPool> {
    connect(&config.database)
        .await
        .context("failed to connect to database")
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    if !cmd.skip_migrations {
        ensure_database(&config.database)
            .await
            .context("failed to create database")?;
    }
    let pool = setup_pool(&config).await?;
    if !cmd.skip_migrations {
        Migrator::up(&pool, None).await?;
        info!("database migrations applied");
    }

    let state = AppState::new(pool, config.clone());
    let sweep = config.sweep.enabled.then(|| {
        scheduler::spawn_daily_sweep(state.hr.employees.clone(), config.sweep.schedule)
    });
    if sweep.is_none() {
        info!("automatic deactivation disabled");
    }

    let serve_config = ServeConfig::new(
        cmd.host.unwrap_or(config.host),
        cmd.port.unwrap_or(config.port),
    );
    let result = http::serve(serve_config, state).await;
    if let Some(handle) = sweep {
        handle.abort();
    }
    result
}

async fn run_sweep(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    let hr = Hr::new(products_hr::SeaOrmStore::new(pool))
        .with_stale_after_months(config.sweep.stale_after_months);
    let report = hr.employees.deactivate_inactive_employees().await?;
    info!(
        deactivated = report.deactivated_count,
        ids = ?report.employee_ids,
        "inactivity sweep finished"
    );
    Ok(())
}

async fn migrate_up(config: &AppConfig) -> Result<()> {
    ensure_database(&config.database).await?;
    let pool = setup_pool(config).await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}
