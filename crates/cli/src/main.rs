//! dsc CLI - Database migrations and profile management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! dsc-cli migrate
//!
//! # Provision a profile for a login
//! dsc-cli profile create --login alice --name "Alice"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dsc-cli")]
#[command(author, version, about = "dsc CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Create a profile for a login
    Create {
        /// Login the profile belongs to
        #[arg(short, long)]
        login: String,

        /// Optional display name
        #[arg(short, long)]
        name: Option<String>,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Profile { action } => match action {
            ProfileAction::Create { login, name } => {
                commands::profile::create(&login, name).await?;
            }
        },
    }
    Ok(())
}
