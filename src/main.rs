use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tablekeep::auth::PasswordHasher;
use tablekeep::config::{Locale, ServerConfig};
use tablekeep::server::{AppState, create_router};
use tablekeep::store::{SqliteStore, Store};
use tablekeep::types::Role;

const NOT_INITIALIZED: &str =
    "Server not initialized. Run 'tablekeep admin init' first to create the database and an administrator.";

#[derive(Parser)]
#[command(name = "tablekeep")]
#[command(about = "A self-hosted database administration service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, env = "TABLEKEEP_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, env = "TABLEKEEP_PORT", default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, env = "TABLEKEEP_DATA_DIR", default_value = "./data")]
        data_dir: String,

        /// Lifetime of a login session in seconds
        #[arg(long, env = "TABLEKEEP_SESSION_TTL_SECS", default_value = "28800")]
        session_ttl_secs: u64,

        /// Language of user-facing messages (en, de)
        #[arg(long, env = "TABLEKEEP_LOCALE", default_value = "en")]
        locale: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and first administrator)
    Init {
        /// Data directory for the database
        #[arg(long, env = "TABLEKEEP_DATA_DIR", default_value = "./data")]
        data_dir: String,

        /// Username of the administrator
        #[arg(long, default_value = "admin")]
        username: String,

        /// Password of the administrator. Prompted for when omitted.
        #[arg(long, env = "TABLEKEEP_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

fn open_store(db_path: &Path) -> anyhow::Result<SqliteStore> {
    let store = SqliteStore::new(db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    store.initialize()?;
    Ok(store)
}

fn prompt_password() -> anyhow::Result<String> {
    let password = inquire::Password::new("Administrator password:")
        .with_validator(|input: &str| {
            if input.is_empty() {
                Err("Password cannot be empty".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;
    Ok(password)
}

fn run_init(
    data_dir: String,
    username: String,
    password: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let data_path: PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let config = ServerConfig {
        data_dir: data_path,
        ..ServerConfig::default()
    };
    let store = open_store(&config.db_path())?;

    if store.has_admin()? {
        bail!(
            "Server already initialized. An administrator exists in {}",
            config.db_path().display()
        );
    }

    let username = username.trim().to_string();
    if username.is_empty() || username.contains(char::is_whitespace) {
        bail!("Username cannot be empty or contain whitespace");
    }

    let password = match password.filter(|p| !p.is_empty()) {
        Some(password) => password,
        None if non_interactive => {
            bail!("--password (or TABLEKEEP_ADMIN_PASSWORD) is required with --non-interactive")
        }
        None => prompt_password()?,
    };

    let hash = PasswordHasher::new().hash(&password)?;
    let admin = store.create_user(&username, &hash, Role::Admin)?;

    println!();
    println!("========================================");
    println!("Created administrator '{}' (id {})", admin.username, admin.id);
    println!("Database: {}", config.db_path().display());
    println!("========================================");
    println!();

    Ok(())
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let db_path = config.db_path();
    if !db_path.exists() {
        bail!(NOT_INITIALIZED);
    }

    let store = open_store(&db_path)?;
    if !store.has_admin()? {
        bail!(NOT_INITIALIZED);
    }

    let state = Arc::new(AppState::new(Arc::new(store), &config));
    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {} (locale {})", addr, config.locale);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tablekeep=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                username,
                password,
                non_interactive,
            } => {
                run_init(data_dir, username, password, non_interactive)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            session_ttl_secs,
            locale,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                session_ttl_secs,
                locale: locale.parse::<Locale>()?,
            };
            run_serve(config).await?;
        }
    }

    Ok(())
}
