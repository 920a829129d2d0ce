use std::net::SocketAddr;
use std::path::PathBuf;

use airframe_server::BackendKind;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "airframe",
    about = "Airframe -- object store with signature-derived ownership",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP API server
    Serve(ServeArgs),
    /// Generate a new secp256k1 signing key
    Keygen,
    /// Print the hash a writer must sign for an object
    Hash(ObjectArgs),
    /// Sign an object write with a secret key
    Sign(SignArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Storage backend: memory or document
    #[arg(short, long)]
    pub backend: Option<BackendKind>,
    #[arg(long)]
    pub table_prefix: Option<String>,
    /// Enable development mode (debug logs, human-readable output)
    #[arg(short, long)]
    pub dev: bool,
}

#[derive(Args)]
pub struct ObjectArgs {
    #[arg(value_name = "TYPE")]
    pub typ: String,
    pub id: String,
    /// Object data as a JSON object
    pub data: String,
}

#[derive(Args)]
pub struct SignArgs {
    /// Hex-encoded 32-byte secret key
    #[arg(short, long)]
    pub key: String,
    #[command(flatten)]
    pub object: ObjectArgs,
}
