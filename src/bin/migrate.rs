use anyhow::Context;
use clap::{Parser, Subcommand};
use migrations::{Migrator, MigratorTrait};
use tracing::info;

use bizdesk_api as api;

#[derive(Parser)]
#[command(name = "bizdesk-migrate", about = "Apply or inspect BizDesk schema migrations", version)]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up {
        #[arg(long, help = "Apply at most this many migrations")]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1, help = "Number of migrations to roll back")]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = api::config::load_config().context("loading configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    let db = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("connecting to database")?;

    match cli.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => {
            info!("applying migrations");
            Migrator::up(&db, steps).await?;
        }
        Command::Down { steps } => {
            info!(steps, "rolling back migrations");
            Migrator::down(&db, Some(steps)).await?;
        }
        Command::Status => {
            Migrator::status(&db).await?;
        }
        Command::Fresh => {
            info!("dropping all tables and re-applying migrations");
            Migrator::fresh(&db).await?;
        }
    }

    info!("migration command completed");
    Ok(())
}
