mod demo;
mod mailbox;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use orchestrator::{RefereeConfig, RefereeRunner, SeasonOrchestrator};
use protocol::{dispatch, EmailSubject};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use demo::DemoAi;
use mailbox::MailboxTransport;

const REFEREE_DIR: &str = ".q21-referee";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_NAME: &str = "referee.db";

#[derive(Parser)]
#[command(name = "q21-referee")]
#[command(about = "Referee runtime for the Q21 league", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and mailbox layout
    Init {
        #[arg(long, default_value = "REF01")]
        referee_id: String,

        #[arg(long, default_value = "referee@example.com")]
        email: String,

        #[arg(long, default_value = "league.manager@example.com")]
        league_manager: String,
    },
    /// Poll the mailbox and referee games until Ctrl-C
    Run {
        /// Config file, defaults to .q21-referee/config.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a message given as JSON text or a path to a .json file
    Validate { input: String },
    /// Encode or decode mail subject lines
    Subject {
        #[command(subcommand)]
        action: SubjectAction,
    },
}

#[derive(Subcommand)]
enum SubjectAction {
    Encode {
        #[arg(long, default_value = "league.v2")]
        protocol: String,
        #[arg(long, default_value = "REFEREE")]
        role: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        transaction_id: String,
        #[arg(long)]
        message_type: String,
    },
    Decode { subject: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            referee_id,
            email,
            league_manager,
        } => init_project(&referee_id, &email, &league_manager).await,
        Commands::Run { config } => run(config).await,
        Commands::Validate { input } => validate(&input),
        Commands::Subject { action } => subject(action),
    }
}

async fn init_project(referee_id: &str, email: &str, league_manager: &str) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let referee_dir = cwd.join(REFEREE_DIR);
    let config_path = referee_dir.join(CONFIG_FILE);

    if config_path.exists() {
        println!("Already initialized at {}", referee_dir.display());
        return Ok(());
    }

    let db_path = referee_dir.join(DEFAULT_DB_NAME);
    let config = RefereeConfig::new(referee_id, email)
        .with_league_manager(league_manager)
        .with_database_url(format!("sqlite:{}", db_path.display()));
    write_config(&config_path, &config).await?;

    let mailbox = MailboxTransport::new(cwd.join(&config.mailbox_dir));
    mailbox
        .prepare()
        .await
        .context("Failed to create mailbox directories")?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    println!();
    println!("Initialized Q21 referee '{}'", referee_id);
    println!();
    println!("Created:");
    println!("  {}/", REFEREE_DIR);
    println!("  ├── {}", CONFIG_FILE);
    println!("  └── {}", DEFAULT_DB_NAME);
    println!("  {}/", config.mailbox_dir);
    println!("  ├── inbox/");
    println!("  ├── processed/");
    println!("  └── outbox/");
    println!();
    println!("Next steps:");
    println!("  1. Set league_id, season_id and group_id in {}", config_path.display());
    println!("  2. Run 'q21-referee run'");

    Ok(())
}

async fn run(config_path: Option<PathBuf>) -> Result<()> {
    init_tracing();

    let config_path = match config_path {
        Some(path) => path,
        None => std::env::current_dir()?.join(REFEREE_DIR).join(CONFIG_FILE),
    };
    let config = load_config(&config_path).await;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    tracing::info!(database = %config.database_url, mailbox = %config.mailbox_dir, "Starting referee");
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let mailbox = MailboxTransport::new(&config.mailbox_dir);
    mailbox.prepare().await?;

    let orchestrator = SeasonOrchestrator::new(config, Arc::new(DemoAi::default()), pool).await?;
    let mut runner = RefereeRunner::new(orchestrator, mailbox);

    println!();
    println!("Q21 referee running, press Ctrl+C to stop");
    println!();

    runner.run().await?;
    Ok(())
}

/// Reads the TOML config; an unreadable or unparsable file falls back to
/// defaults with a warning.
async fn load_config(path: &Path) -> RefereeConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Config not readable, using defaults");
            return RefereeConfig::default();
        }
    };
    parse_config(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Config not parsable, using defaults");
        RefereeConfig::default()
    })
}

fn parse_config(content: &str) -> Result<RefereeConfig> {
    Ok(toml::from_str(content)?)
}

async fn write_config(path: &Path, config: &RefereeConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn validate(input: &str) -> Result<()> {
    let outcome = dispatch(input);
    println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);
    if outcome.is_success() {
        eprintln!("{}", "valid".green().bold());
        Ok(())
    } else {
        eprintln!("{}", "invalid".red().bold());
        bail!("message failed validation")
    }
}

fn subject(action: SubjectAction) -> Result<()> {
    match action {
        SubjectAction::Encode {
            protocol,
            role,
            email,
            transaction_id,
            message_type,
        } => {
            let subject = EmailSubject::new(protocol, role, email, transaction_id, message_type);
            println!("{subject}");
        }
        SubjectAction::Decode { subject } => {
            let parsed = EmailSubject::parse(&subject)?;
            let value = serde_json::json!({
                "protocol": parsed.protocol,
                "role": parsed.role,
                "email": parsed.email,
                "transaction_id": parsed.transaction_id,
                "message_type": parsed.message_type,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "q21_referee=info,orchestrator=info,protocol=info,db=info".into()
            }),
        )
        .init();
}
