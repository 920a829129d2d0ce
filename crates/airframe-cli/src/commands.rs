use airframe_crypto::{Address, ObjectHasher, SigningKey};
use airframe_server::{AirframeServer, Profile, ServerConfig};
use airframe_types::Payload;
use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    // `serve` installs its own subscriber once the profile is known.
    if !matches!(cli.command, Command::Serve(_)) {
        crate::init_tracing(if cli.verbose { "debug" } else { "warn" }, false)?;
    }
    match cli.command {
        Command::Serve(args) => cmd_serve(args, cli.verbose, &cli.format),
        Command::Keygen => cmd_keygen(&cli.format),
        Command::Hash(args) => cmd_hash(args, &cli.format),
        Command::Sign(args) => cmd_sign(args, &cli.format),
    }
}

/// Merge the config file (if any) with command-line overrides.
fn resolve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        config.bind_addr.set_port(port);
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(prefix) = &args.table_prefix {
        config.table_prefix = prefix.clone();
    }
    if args.dev {
        config.profile = Profile::Dev;
    }
    Ok(config)
}

/// Log level and format for `serve`. `--verbose` raises the profile's level
/// to debug; `--format json` forces JSON logs.
fn serve_logging(config: &ServerConfig, verbose: bool, format: &OutputFormat) -> (&'static str, bool) {
    let level = if verbose { "debug" } else { config.profile.default_log_level() };
    let json = config.profile.json_logs() || matches!(format, OutputFormat::Json);
    (level, json)
}

fn cmd_serve(args: ServeArgs, verbose: bool, format: &OutputFormat) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let (level, json) = serve_logging(&config, verbose, format);
    crate::init_tracing(level, json)?;
    tracing::debug!(?config, "resolved configuration");

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(AirframeServer::new(config).serve())?;
    Ok(())
}

fn cmd_keygen(format: &OutputFormat) -> anyhow::Result<()> {
    let key = SigningKey::generate();
    let public = key.public_key();
    let address = Address::from_public_key(&public)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "secretKey": key.to_hex(),
                "publicKey": public.to_hex(),
                "address": address.to_checksum_hex(),
            })
        ),
        OutputFormat::Text => {
            println!("{} Generated signing key", "✓".green().bold());
            println!("  Secret:  {}", key.to_hex().red());
            println!("  Public:  {}", public.to_hex().cyan());
            println!("  Address: {}", address.to_checksum_hex().yellow());
        }
    }
    Ok(())
}

fn parse_payload(raw: &str) -> anyhow::Result<Payload> {
    match serde_json::from_str(raw).context("object data is not valid JSON")? {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("object data must be a JSON object, got {other}"),
    }
}

fn cmd_hash(args: ObjectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let data = parse_payload(&args.data)?;
    let hash = ObjectHasher::hash(&args.typ, &args.id, &data);
    match format {
        OutputFormat::Json => println!("{}", json!({ "hash": hash.to_string() })),
        OutputFormat::Text => println!("{}", hash.to_string().yellow()),
    }
    Ok(())
}

fn cmd_sign(args: SignArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let key = SigningKey::from_hex(&args.key).context("invalid secret key")?;
    let data = parse_payload(&args.object.data)?;
    let signature = key.sign_object(&args.object.typ, &args.object.id, &data)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "data": data, "signature": signature.to_hex() })
        ),
        OutputFormat::Text => println!("{}", signature.to_hex()),
    }
    Ok(())
}
