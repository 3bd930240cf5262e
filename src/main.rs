use anyhow::Result;
use clap::{Parser, Subcommand};
use cryptoserver::core::log::init_logging;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the crypto price HTTP API (default)
    Serve {
        /// Port to listen on, overriding PORT and the config file
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
    },
    /// Run a local fake CoinGecko API
    FakeGecko {
        /// Address to listen on
        #[arg(long, default_value = cryptoserver::fakegecko::DEFAULT_ADDR)]
        addr: SocketAddr,
        /// CoinGecko-style coin list to serve
        #[arg(long = "list", default_value = "crypto_list.json")]
        list_path: PathBuf,
    },
}

impl From<Commands> for cryptoserver::AppCommand {
    fn from(cmd: Commands) -> cryptoserver::AppCommand {
        match cmd {
            Commands::Serve { port } => cryptoserver::AppCommand::Serve { port },
            Commands::FakeGecko { addr, list_path } => {
                cryptoserver::AppCommand::FakeGecko { addr, list_path }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Serve { port: None });
    let result = match command {
        Commands::Setup => cryptoserver::cli::setup::setup(),
        cmd => cryptoserver::run_command(cmd.into(), cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_port_range() {
        let cli = Cli::try_parse_from(["cryptoserver", "serve", "--port", "9090"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Serve { port: Some(9090) })
        ));

        assert!(Cli::try_parse_from(["cryptoserver", "serve", "--port", "0"]).is_err());
        assert!(Cli::try_parse_from(["cryptoserver", "serve", "--port", "65536"]).is_err());
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["cryptoserver", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }
}
