//! # School Administration API Main Entry Point
//!
//! Runs the HTTP server by default; the remaining subcommands cover the
//! one-off administrative tasks (migrations, role seeding, superuser).

use anyhow::Context;
use clap::{Parser, Subcommand};
use school_admin::{
    config::ConfigLoader,
    db::{init_pool, run_migrations},
    seeds::{create_superuser, seed_roles},
    server::run_server,
    telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(name = "school-admin", version, about = "School administration API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Migrate, seed role groups and serve the API (default)
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Create or refresh the role groups and their permissions
    Seed,
    /// Create an administrator account
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SCHOOL_SUPERUSER_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted) = config.redacted_json() {
        tracing::debug!(config = %redacted, "Effective configuration");
    }

    let db = init_pool(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            run_migrations(&db).await?;
            seed_roles(&db).await?;
            run_server(config, db).await
        }
        Command::Migrate => run_migrations(&db).await,
        Command::Seed => {
            run_migrations(&db).await?;
            seed_roles(&db).await
        }
        Command::CreateSuperuser {
            username,
            email,
            password,
        } => {
            run_migrations(&db).await?;
            seed_roles(&db).await?;
            create_superuser(&db, &username, &email, &password).await?;
            tracing::info!(%username, "Superuser created");
            Ok(())
        }
    }
}
