//! Hubkit CLI
//!
//! Mint keys and tokens for a storage hub, and check tokens against a hub
//! configuration without touching storage.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "hubkit")]
#[command(about = "Hubkit CLI - Mint and check storage hub credentials", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a signing key and show its address
    Keygen {
        /// Derive from an existing hex secret instead of generating one
        #[arg(long)]
        secret: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the challenge texts a hub accepts
    Challenge {
        /// Hub server name
        server_name: String,
    },

    /// Mint a bearer token
    Token {
        /// Hex secret of the signing key
        #[arg(long)]
        secret: String,

        /// Hub server name
        #[arg(long)]
        server_name: String,

        /// Produce a legacy token instead of a v1 token
        #[arg(long)]
        legacy: bool,

        /// Sign the 2018 legacy challenge instead of the current one
        #[arg(long, requires = "legacy")]
        legacy_2018: bool,

        /// Hub URL to bind the token to
        #[arg(long)]
        hub_url: Option<String>,

        /// Write scope, as `putFile:<path>` or `putFilePrefix:<prefix>` (repeatable)
        #[arg(long = "scope")]
        scopes: Vec<String>,

        /// Issue time in seconds since the epoch (defaults to now)
        #[arg(long, conflicts_with = "no_issued_at")]
        issued_at: Option<i64>,

        /// Omit the issue time
        #[arg(long)]
        no_issued_at: bool,

        /// Expiry time in seconds since the epoch
        #[arg(long)]
        expires_at: Option<i64>,

        /// Hex secret of a parent key that delegates to the signing key
        #[arg(long)]
        associate_secret: Option<String>,
    },

    /// Check a credential against a hub configuration
    Verify {
        /// Hub configuration file (JSON)
        #[arg(short, long)]
        config: String,

        /// Address being written to
        #[arg(short, long)]
        address: String,

        /// Full `Authorization` header value
        #[arg(long)]
        header: String,

        /// Also authorize a write to this path
        #[arg(long)]
        path: Option<String>,

        /// Simulate a revocation floor for the address
        #[arg(long)]
        floor: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("hubkit=debug,hubkit_lib=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("hubkit=info,hubkit_lib=warn")
            .init();
    }

    // Dispatch commands
    match cli.command {
        Commands::Keygen { secret, json } => {
            commands::keygen::run(secret.as_deref(), json, cli.verbose)?;
        }
        Commands::Challenge { server_name } => {
            commands::challenge::run(&server_name, cli.verbose)?;
        }
        Commands::Token {
            secret,
            server_name,
            legacy,
            legacy_2018,
            hub_url,
            scopes,
            issued_at,
            no_issued_at,
            expires_at,
            associate_secret,
        } => {
            let options = commands::token::TokenOptions {
                legacy,
                legacy_2018,
                hub_url,
                scopes,
                issued_at,
                no_issued_at,
                expires_at,
                associate_secret,
            };
            commands::token::run(&secret, &server_name, options, cli.verbose)?;
        }
        Commands::Verify {
            config,
            address,
            header,
            path,
            floor,
        } => {
            let passed = commands::verify::run(
                &config,
                &address,
                &header,
                path.as_deref(),
                floor,
                cli.verbose,
            )
            .await?;
            if !passed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
