//! CLI administration tool for shortlinks.
//!
//! Provides commands for managing admin API tokens, the IP blacklist,
//! viewing statistics, and checking the database without HTTP access.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin token
//! cargo run --bin admin -- token create
//!
//! # List / revoke tokens
//! cargo run --bin admin -- token list
//! cargo run --bin admin -- token revoke "Ops laptop"
//!
//! # Block an address from the public shorten endpoint
//! cargo run --bin admin -- blacklist add 203.0.113.9 --reason "spam"
//!
//! # Overview of links and clicks
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (or `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`)
//! - `TOKEN_SIGNING_SECRET`: must match the server's, or created tokens
//!   will not authenticate

use shortlinks::application::services::auth_service::hash_token;
use shortlinks::application::services::{BlacklistService, LinkService};
use shortlinks::config::{self, Config};
use shortlinks::domain::repositories::TokenRepository;
use shortlinks::infrastructure::persistence::{
    PgBlacklistRepository, PgLinkRepository, PgTokenRepository,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing shortlinks.
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
    /// Manage admin API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Manage blocked client addresses
    Blacklist {
        #[command(subcommand)]
        action: BlacklistAction,
    },

    /// Show link and click totals
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Token management subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Create a new admin token
    Create {
        /// Token name (e.g., "Ops laptop", "Portal sync")
        #[arg(short, long)]
        name: Option<String>,

        /// Custom token value (optional, auto-generated if not provided)
        #[arg(short, long)]
        token: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or ID to revoke
        name_or_id: String,
    },
}

/// Blacklist subcommands.
#[derive(Subcommand)]
enum BlacklistAction {
    /// Block an address
    Add {
        ip: String,

        /// Stored with the entry; defaults to "Spam/abuse"
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Unblock an address
    Remove { ip: String },

    /// List blocked addresses
    List,
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Token { action } => handle_token_action(action, &pool, &config).await?,
        Commands::Blacklist { action } => handle_blacklist_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool, &config).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches token management commands.
async fn handle_token_action(action: TokenAction, pool: &PgPool, config: &Config) -> Result<()> {
    let repo = Arc::new(PgTokenRepository::new(Arc::new(pool.clone())));

    match action {
        TokenAction::Create { name, token, yes } => {
            create_token(repo, &config.token_signing_secret, name, token, yes).await?;
        }
        TokenAction::List => {
            list_tokens(repo).await?;
        }
        TokenAction::Revoke { name_or_id } => {
            revoke_token(repo, name_or_id).await?;
        }
    }

    Ok(())
}

/// Creates a new admin token with interactive prompts.
///
/// Only the HMAC-SHA256 of the token (keyed by `TOKEN_SIGNING_SECRET`) is
/// stored. The raw value is shown once.
async fn create_token(
    repo: Arc<PgTokenRepository>,
    signing_secret: &str,
    name: Option<String>,
    token: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔑 Create Admin Token".bright_blue().bold());
    println!();

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("Ops laptop")
            .interact_text()?,
    };

    let token_value = match token {
        Some(t) => {
            println!("{}", "⚠️  Using provided token value".yellow());
            t
        }
        None => {
            let generated = generate_token();
            println!("{}", "✨ Generated new token".green());
            generated
        }
    };

    println!();
    println!("{}", "Token details:".bright_white().bold());
    println!("  Name:  {}", token_name.cyan());
    println!("  Token: {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let token_hash = hash_token(signing_secret, &token_value);

    repo.create_token(&token_name, &token_hash)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!();
    println!("{}", "✅ Token created successfully!".green().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/admin/stats/overview",
        token_value.bright_yellow()
    );
    println!();

    Ok(())
}

/// Lists all admin tokens with status indicators.
async fn list_tokens(repo: Arc<PgTokenRepository>) -> Result<()> {
    println!("{}", "📋 Admin Tokens".bright_blue().bold());
    println!();

    let tokens = repo
        .list_tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "  No tokens found".yellow());
        println!();
        println!(
            "  Create one with: {} admin token create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<4} {:<30} {:<18} {:<18} {:<10}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(86).bright_black());

    for token in &tokens {
        let status = if token.is_revoked() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };
        let last_used = token
            .last_used_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:<4} {:<30} {:<18} {:<18} {}",
            token.id.to_string().bright_black(),
            token.name.cyan(),
            token
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            last_used.bright_black(),
            status
        );
    }

    println!();
    println!(
        "  Total: {}",
        tokens.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Revokes a token by name or ID with confirmation prompt.
///
/// Numeric input is treated as an ID, anything else as an exact name.
async fn revoke_token(repo: Arc<PgTokenRepository>, name_or_id: String) -> Result<()> {
    println!("{}", "🔒 Revoke Admin Token".bright_blue().bold());
    println!();

    let token = match name_or_id.parse::<i64>() {
        Ok(id) => repo
            .find_by_id(id)
            .await
            .map_err(|e| anyhow::anyhow!("Database error: {}", e))?,
        Err(_) => repo
            .find_by_name(&name_or_id)
            .await
            .map_err(|e| anyhow::anyhow!("Database error: {}", e))?,
    };

    let token = token.context("Token not found")?;

    if token.is_revoked() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {}", token.name.cyan());
    println!("  ID:    {}", token.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    repo.revoke_token(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!();
    println!("{}", "✅ Token revoked successfully!".green().bold());
    println!();

    Ok(())
}

/// Dispatches blacklist commands.
async fn handle_blacklist_action(action: BlacklistAction, pool: &PgPool) -> Result<()> {
    let service = BlacklistService::new(Arc::new(PgBlacklistRepository::new(Arc::new(
        pool.clone(),
    ))));

    match action {
        BlacklistAction::Add { ip, reason } => {
            let entry = service
                .block(&ip, reason)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to block {}: {}", ip, e))?;

            println!(
                "{} {} ({})",
                "⛔ Blocked".red().bold(),
                entry.ip_address.bright_white(),
                entry.reason.unwrap_or_default().bright_black()
            );
        }
        BlacklistAction::Remove { ip } => {
            service
                .unblock(&ip)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to unblock {}: {}", ip, e))?;

            println!("{} {}", "✅ Unblocked".green().bold(), ip.bright_white());
        }
        BlacklistAction::List => {
            println!("{}", "⛔ Blocked addresses".bright_blue().bold());
            println!();

            let entries = service
                .list()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list blacklist: {}", e))?;

            if entries.is_empty() {
                println!("{}", "  Blacklist is empty".yellow());
                return Ok(());
            }

            for entry in &entries {
                println!(
                    "  {:<40} {:<18} {}",
                    entry.ip_address.cyan(),
                    entry
                        .blocked_at
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                        .bright_black(),
                    entry.reason.as_deref().unwrap_or("")
                );
            }
            println!();
        }
    }

    Ok(())
}

/// Displays the same overview as `GET /admin/stats/overview`.
async fn handle_stats(pool: &PgPool, config: &Config) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let pool = Arc::new(pool.clone());
    let service = LinkService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        Arc::new(PgBlacklistRepository::new(pool)),
        config.base_url.clone(),
        config.short_code_length,
    );

    let overview = service
        .overview()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load statistics: {}", e))?;

    println!(
        "  Links:         {} ({} active)",
        overview.total_links.to_string().bright_green().bold(),
        overview.active_links.to_string().green()
    );
    println!(
        "  Clicks:        {}",
        overview.total_clicks.to_string().bright_green().bold()
    );
    println!(
        "  Unique clicks: {}",
        overview.total_unique_clicks.to_string().bright_green().bold()
    );
    println!();

    if !overview.top_links.is_empty() {
        println!("{}", "  Top links:".bright_white().bold());
        for link in &overview.top_links {
            println!(
                "  {:>8} {:>8}  {}  {}",
                link.clicks_count.to_string().bright_green(),
                link.unique_clicks_count.to_string().green(),
                service.short_url(&link.code).cyan(),
                link.original_url.bright_black()
            );
        }
        println!();
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}

/// Generates a random 48-character alphanumeric token.
fn generate_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const TOKEN_LEN: usize = 48;

    let mut rng = rand::rng();

    (0..TOKEN_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}
