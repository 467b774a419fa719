//! CLI module for the game configuration service
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `hash-password`: produce an admin password hash for configuration
//! - `rebuild-cache`: recompute every game's cache artifact from the store

pub mod hash_password;
pub mod rebuild_cache;
pub mod serve;

use clap::{Parser, Subcommand};

/// Game Configuration Service - per-game configuration for game clients
#[derive(Parser)]
#[command(name = "game-config-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Hash an admin password into an Argon2 PHC string
    HashPassword(hash_password::HashPasswordArgs),

    /// Rebuild the configuration cache for all games
    RebuildCache,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["game-config-service", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));

        let cli = Cli::try_parse_from(["game-config-service", "rebuild-cache"]).unwrap();
        assert!(matches!(cli.command, Command::RebuildCache));

        let cli =
            Cli::try_parse_from(["game-config-service", "hash-password", "s3cret"]).unwrap();
        match cli.command {
            Command::HashPassword(args) => assert_eq!(args.password.as_deref(), Some("s3cret")),
            _ => panic!("expected hash-password"),
        }
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["game-config-service"]).is_err());
    }
}
