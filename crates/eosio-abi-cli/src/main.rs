mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use config::{CliConfig, OutputFormat};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "eosio-abi")]
#[command(about = "Inspect EOSIO contract ABIs and convert values to and from the binary format", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Format for encoded bytes (overrides config)
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved schema as JSON
    Schema {
        /// Path to ABI JSON file
        abi: String,

        /// Only print this struct
        #[arg(long = "struct")]
        struct_name: Option<String>,
    },

    /// Encode a JSON value as a type from the ABI
    Encode {
        /// Path to ABI JSON file
        abi: String,

        /// Struct, variant, alias or type string such as "name[]"
        type_name: String,

        /// Value as JSON text
        value: String,
    },

    /// Decode hex bytes as a type from the ABI
    Decode {
        /// Path to ABI JSON file
        abi: String,

        /// Struct, variant, alias or type string such as "name[]"
        type_name: String,

        /// Hex-encoded bytes
        data: String,
    },

    /// Encode action data by action name
    Action {
        /// Path to ABI JSON file
        abi: String,

        /// Action name
        action: String,

        /// Action data as JSON text
        value: String,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = CliConfig::load(args.config.as_deref())?;
    if let Some(output) = args.output {
        config.output = output;
    }
    init_logging(&config.log_level);

    match args.command {
        Commands::Schema { abi, struct_name } => {
            commands::schema(&config, &abi, struct_name.as_deref())?;
        }
        Commands::Encode { abi, type_name, value } => {
            commands::encode(&config, &abi, &type_name, &value)?;
        }
        Commands::Decode { abi, type_name, data } => {
            commands::decode(&config, &abi, &type_name, &data)?;
        }
        Commands::Action { abi, action, value } => {
            commands::action(&config, &abi, &action, &value)?;
        }
    }

    Ok(())
}

// Logs go to stderr so stdout stays pipeable
fn init_logging(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("eosio_abi={}", default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
