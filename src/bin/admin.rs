//! CLI administration tool for linkcentral.
//!
//! Provides commands for managing API tokens and tracking data without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a new API token
//! cargo run --bin admin -- token create --name "CI deploy" --role editor
//!
//! # List all tokens
//! cargo run --bin admin -- token list
//!
//! # Revoke a token
//! cargo run --bin admin -- token revoke "CI deploy"
//!
//! # Purge tracking data older than the configured expiry
//! cargo run --bin admin -- purge
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `TOKEN_SIGNING_SECRET` (required for token commands)

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

use linkcentral::application::services::{AuthService, SettingsService};
use linkcentral::domain::repositories::{ClickRepository, TokenRepository};
use linkcentral::infrastructure::persistence::{
    PgClickRepository, PgSettingsRepository, PgTokenRepository,
};

/// CLI tool for managing linkcentral.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Purge tracking data past the configured (or given) expiry
    Purge {
        /// Override the expiry window in days
        #[arg(short, long)]
        days: Option<u32>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Token management subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Create a new API token
    Create {
        /// Token name (e.g., "CI deploy", "Dashboard")
        #[arg(short, long)]
        name: Option<String>,

        /// Role granted to the token: administrator, editor, or viewer
        #[arg(short, long, default_value = "editor")]
        role: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token by name
    Revoke { name: String },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = Arc::new(PgPool::connect(&database_url).await?);

    match cli.command {
        Commands::Token { action } => handle_token(action, pool).await,
        Commands::Purge { days, yes } => handle_purge(days, yes, pool).await,
        Commands::Db { action } => handle_db(action, pool).await,
    }
}

async fn handle_token(action: TokenAction, pool: Arc<PgPool>) -> Result<()> {
    let repository = Arc::new(PgTokenRepository::new(pool));

    match action {
        TokenAction::Create { name, role, yes } => {
            let signing_secret = std::env::var("TOKEN_SIGNING_SECRET")
                .context("TOKEN_SIGNING_SECRET must be set to create tokens")?;
            let service = AuthService::new(repository, signing_secret);

            let name = match name {
                Some(name) => name,
                None => Input::new().with_prompt("Token name").interact_text()?,
            };

            if !["administrator", "editor", "viewer"].contains(&role.as_str()) {
                anyhow::bail!("role must be administrator, editor, or viewer");
            }

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Create token '{name}' with role '{role}'?"))
                    .default(true)
                    .interact()?;
                if !confirmed {
                    println!("{}", "Aborted.".yellow());
                    return Ok(());
                }
            }

            let (record, raw) = service.issue(&name, &role).await?;

            println!("{}", "Token created.".green().bold());
            println!("  Name: {}", record.name);
            println!("  Role: {}", record.role);
            println!();
            println!("  {}", raw.bold());
            println!();
            println!(
                "{}",
                "Store this token now - it cannot be shown again.".yellow()
            );
        }

        TokenAction::List => {
            let tokens = repository.list().await?;

            if tokens.is_empty() {
                println!("No tokens.");
                return Ok(());
            }

            for token in tokens {
                let status = if token.revoked {
                    "revoked".red()
                } else {
                    "active".green()
                };
                let last_used = token
                    .last_used_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());

                println!(
                    "{:<24} {:<14} {:<9} created {}  last used {}",
                    token.name.bold(),
                    token.role,
                    status,
                    token.created_at.date_naive(),
                    last_used
                );
            }
        }

        TokenAction::Revoke { name } => {
            if repository.revoke(&name).await? {
                println!("{} token '{name}' revoked", "OK".green().bold());
            } else {
                println!("{} no token named '{name}'", "!!".red().bold());
            }
        }
    }

    Ok(())
}

async fn handle_purge(days: Option<u32>, yes: bool, pool: Arc<PgPool>) -> Result<()> {
    let clicks = PgClickRepository::new(pool.clone());
    let settings_service = SettingsService::new(Arc::new(PgSettingsRepository::new(pool)));

    let days = match days {
        Some(days) => days,
        None => {
            let settings = settings_service.current().await?;
            if !settings.enable_data_expiry {
                println!(
                    "{}",
                    "Data expiry is disabled; pass --days to purge anyway.".yellow()
                );
                return Ok(());
            }
            settings.data_expiry_days
        }
    };

    if days == 0 {
        anyhow::bail!("expiry window must be at least 1 day");
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete all clicks older than {days} days?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
    }

    let cutoff = Utc::now() - chrono::Duration::days(days as i64);
    let removed = clicks.purge_older_than(cutoff).await?;

    println!("{} {removed} clicks purged", "OK".green().bold());
    Ok(())
}

async fn handle_db(action: DbAction, pool: Arc<PgPool>) -> Result<()> {
    match action {
        DbAction::Check => {
            sqlx::query("SELECT 1").execute(pool.as_ref()).await?;
            println!("{} database connection ok", "OK".green().bold());
        }
    }

    Ok(())
}
