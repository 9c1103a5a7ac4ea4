//! Elegance CLI - database migrations and store management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! elegance migrate
//!
//! # Load the catalog from YAML (skipped if products already exist)
//! elegance seed products --file crates/cli/data/catalog.yaml
//!
//! # Give an existing account access to the admin API
//! elegance user grant-admin --email owner@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "elegance")]
#[command(author, version, about = "Elegance store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage user roles
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load products from a YAML catalog file
    Products {
        /// Path to the catalog file
        #[arg(short, long)]
        file: String,

        /// Seed even if the catalog already has products
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Grant the admin role
    GrantAdmin {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke the admin role
    RevokeAdmin {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file, force } => {
                commands::seed::products(&file, force).await?;
            }
        },
        Commands::User { action } => match action {
            UserAction::GrantAdmin { email } => {
                commands::user::set_role(&email, elegance_core::UserRole::Admin).await?;
            }
            UserAction::RevokeAdmin { email } => {
                commands::user::set_role(&email, elegance_core::UserRole::User).await?;
            }
        },
    }
    Ok(())
}
