use clap::{Parser, Subcommand};

use crate::auth;
use crate::config::AppConfig;
use crate::routes::route_table;
use crate::server::{self, API_TITLE};
use crate::state::AppState;
use crate::store::JsonUserStore;

#[derive(Parser)]
#[command(name = "user-portal-api")]
#[command(about = "User portal API server and maintenance commands")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Override the listen port (PORT)")]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Print the generated OpenAPI document")]
    Docs {
        #[arg(long, help = "Pretty-print the JSON")]
        pretty: bool,
    },

    #[command(about = "Print a bcrypt hash for seeding the users file")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
        #[arg(long, help = "bcrypt cost (defaults to BCRYPT_COST or the bcrypt default)")]
        cost: Option<u32>,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => server::serve(config).await,
        Commands::Docs { pretty } => {
            let state = AppState::new(config, std::sync::Arc::new(JsonUserStore::in_memory()));
            let doc = route_table(&state).openapi(API_TITLE, env!("CARGO_PKG_VERSION"));
            let out = if pretty {
                serde_json::to_string_pretty(&doc)?
            } else {
                serde_json::to_string(&doc)?
            };
            println!("{}", out);
            Ok(())
        }
        Commands::HashPassword { password, cost } => {
            let cost = cost.unwrap_or(config.security.bcrypt_cost);
            println!("{}", auth::hash_password(&password, cost)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["user-portal-api"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_hash_password() {
        let cli = Cli::parse_from(["user-portal-api", "hash-password", "s3cret", "--cost", "5"]);
        match cli.command {
            Some(Commands::HashPassword { password, cost }) => {
                assert_eq!(password, "s3cret");
                assert_eq!(cost, Some(5));
            }
            _ => panic!("expected hash-password"),
        }
    }

    #[test]
    fn global_port_flag() {
        let cli = Cli::parse_from(["user-portal-api", "--port", "4000", "serve"]);
        assert_eq!(cli.port, Some(4000));
        assert!(matches!(cli.command, Some(Commands::Serve)));
    }
}
