//! Devserver - CLI Entry Point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use devserver::config::{load_table, MockConfig};
use devserver::contract::{load_contract, ContractVersion};
use devserver::server::{self, DEFAULT_PORT};
use devserver::{EchoHandler, MockRouter, ServerConfig};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "devserver",
    about = "Devserver allows you to create echo and mock servers for development",
    version
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a mock server
    Mock {
        /// Path to the mock configuration file
        config: PathBuf,

        /// Contract whose examples are used as defaults, overridden by the config
        #[arg(long)]
        contract: Option<PathBuf>,

        /// Contract type
        #[arg(short = 't', long, value_enum, default_value_t = ContractType::V3)]
        contract_type: ContractType,

        #[command(flatten)]
        listen: ListenArgs,
    },

    /// Start echo server
    Echo {
        #[command(flatten)]
        listen: ListenArgs,
    },

    /// Read an API contract and export it as a mock configuration
    Contract {
        /// Path to the contract (JSON or YAML)
        contract: PathBuf,

        /// Path of the configuration file to write
        output: PathBuf,

        /// Contract type
        #[arg(short = 't', long, value_enum, default_value_t = ContractType::V3)]
        contract_type: ContractType,
    },
}

#[derive(clap::Args, Debug)]
struct ListenArgs {
    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,
}

impl ListenArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ContractType {
    V2,
    V3,
}

impl From<ContractType> for ContractVersion {
    fn from(value: ContractType) -> Self {
        match value {
            ContractType::V2 => ContractVersion::V2,
            ContractType::V3 => ContractVersion::V3,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Mock {
            config,
            contract,
            contract_type,
            listen,
        } => {
            let overrides = load_table(&config)
                .with_context(|| format!("Unable to load mock config {}", config.display()))?;

            let table = match contract {
                Some(contract) => {
                    let base = load_contract(&contract, contract_type.into()).with_context(
                        || format!("Unable to load contract {}", contract.display()),
                    )?;
                    info!(
                        contract_paths = base.len(),
                        config_paths = overrides.len(),
                        "Merging config over contract"
                    );
                    base.merge(overrides)
                }
                None => overrides,
            };

            let router = MockRouter::new(table);
            server::run(listen.server_config(), Arc::new(router))
                .await
                .context("Unable to start server")?;
        }

        Command::Echo { listen } => {
            server::run(listen.server_config(), Arc::new(EchoHandler::new()))
                .await
                .context("Unable to start server")?;
        }

        Command::Contract {
            contract,
            output,
            contract_type,
        } => {
            let table = load_contract(&contract, contract_type.into())
                .with_context(|| format!("Unable to load contract {}", contract.display()))?;
            MockConfig::from_table(&table)
                .write_to_file(&output)
                .with_context(|| format!("Unable to export config to file {}", output.display()))?;
        }
    }

    Ok(())
}
