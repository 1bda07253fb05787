//! Bootstrap an ADMIN account
//!
//! Roster uploads require an administrator, so the first one has to be
//! created out of band:
//!
//! ```text
//! portal-create-admin --username principal --email principal@school.edu
//! ```
//!
//! The password is read from `--password`/`PORTAL_ADMIN_PASSWORD`, or a
//! random temporary password is generated and printed once.

use anyhow::{bail, Context, Result};
use clap::Parser;
use portal_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use portal_common::{Role, Secret};
use tracing::info;

use portal_server::{
    config::Config,
    credentials,
    db::{self, PgRecordStore, RecordStore},
    features::accounts::queries::authenticate,
    models::Account,
};

#[derive(Parser, Debug)]
#[command(name = "portal-create-admin", version, about = "Create the first ADMIN account")]
struct Cli {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    /// Generated when omitted
    #[arg(long, env = "PORTAL_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Apply pending migrations first
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(LogLevel::Info)
        .output(LogOutput::Console)
        .log_file_prefix("portal-create-admin")
        .build()
        .merge_env()?;
    init_logging(&log_config)?;

    let username = cli.username.trim().to_string();
    if username.is_empty() {
        bail!("--username cannot be empty");
    }

    let config = Config::load()?;
    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to the record store")?;
    if cli.migrate {
        db::run_migrations(&pool).await?;
    }
    let store = PgRecordStore::new(pool);

    if store.get_account(&username).await?.is_some() {
        bail!("User '{}' already exists", username);
    }

    let (password, generated) = match cli.password.filter(|p| !p.is_empty()) {
        Some(p) => (Secret::new(p), false),
        None => (credentials::temporary_password(), true),
    };

    let hash = credentials::hash_password_blocking(password.clone()).await?;
    let account = Account::new(&username, hash, Role::Admin, cli.email.trim());
    let batch = store.put_accounts(std::slice::from_ref(&account)).await?;
    if batch.count() == 0 {
        bail!("User '{}' already exists", username);
    }

    // Read back through the same path the API uses
    if authenticate(&store, &username, password.clone()).await?.is_none() {
        bail!("Account '{}' was written but its password does not verify", username);
    }

    info!(username = %username, "Admin account created");
    if generated {
        println!("Temporary password for {}: {}", username, password.expose());
        println!("Change it after the first login.");
    }

    Ok(())
}
