//! Bazaar CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bazaar-cli migrate
//!
//! # Load markets and products from a YAML file
//! bazaar-cli seed fixtures/markets.yaml
//!
//! # Mark a user verified without an OTP
//! bazaar-cli user verify alice
//! ```
//!
//! All commands read `BAZAAR_DATABASE_URL` (or `DATABASE_URL`), loading
//! `.env` first if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert markets and their products from a YAML file
    Seed {
        /// Path to the YAML seed file
        file: PathBuf,
    },
    /// Support actions on user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Mark a user verified, skipping the signup OTP
    Verify {
        /// Username of the account
        username: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::markets(&file).await?,
        Commands::User { action } => match action {
            UserAction::Verify { username } => commands::user::verify(&username).await?,
        },
    }
    Ok(())
}
