//! Getui CLI - send pushes and inspect envelopes from the command line.
//!
//! # Commands
//!
//! - `getui auth` - Authenticate with the gateway
//! - `getui push --token <id>...` - Push to one client or a list
//! - `getui broadcast` - Push to every client of the app
//! - `getui encode` - Print the envelope for a message
//! - `getui decode <envelope>` - Print the action chain of an envelope
//!
//! Credentials come from `--config <file.toml>` or `GETUI_*` environment
//! variables (a `.env` file is read when present).

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use getui_push::{ActionBody, GetuiConfig, GetuiPush, MessageBody, MessageEncoder, PushMessage};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod error;

use error::{CliError, CliResult};

/// Getui CLI - push gateway client
#[derive(Parser)]
#[command(name = "getui")]
#[command(version)]
#[command(about = "Send pushes through the Getui gateway and inspect envelopes")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (otherwise environment variables are used)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Environment variable prefix
    #[arg(long, global = true, default_value = "GETUI")]
    env_prefix: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with the gateway
    Auth,

    /// Push to one client, or to a list when several tokens are given
    #[command(alias = "p")]
    Push(PushArgs),

    /// Push to every client of the app
    #[command(alias = "b")]
    Broadcast(MessageArgs),

    /// Print the base64 envelope for a message
    Encode(MessageArgs),

    /// Print the action chain of a base64 envelope
    Decode {
        /// Envelope to decode
        envelope: String,
    },
}

#[derive(Args)]
struct PushArgs {
    /// Client id; repeat for a list push
    #[arg(short, long = "token", required = true)]
    tokens: Vec<String>,

    #[command(flatten)]
    message: MessageArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    /// User-visible notification
    Notify,
    /// Silent data message
    Transmission,
}

#[derive(Args)]
struct MessageArgs {
    /// Message type
    #[arg(short, long, value_enum, default_value = "notify")]
    kind: Kind,

    /// Title (required for notifications)
    #[arg(long)]
    title: Option<String>,

    /// Message text
    #[arg(long)]
    text: String,

    /// Payload delivered to the app
    #[arg(long, default_value = "")]
    payload: String,
}

impl MessageArgs {
    fn to_message(&self) -> CliResult<PushMessage> {
        let body = match self.kind {
            Kind::Notify => MessageBody::Notify {
                title: self.title.clone().ok_or_else(|| {
                    CliError::InvalidArgument("--title is required for notifications".to_string())
                })?,
                text: self.text.clone(),
            },
            Kind::Transmission => MessageBody::Transmission {
                title: self.title.clone(),
                text: self.text.clone(),
            },
        };

        Ok(PushMessage::from_body(body).payload(self.payload.clone()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> CliResult<GetuiConfig> {
    let config = match &cli.config {
        Some(path) => GetuiConfig::from_file(path)?,
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                debug!(path = %path.display(), "Loaded .env");
            }
            GetuiConfig::from_env_prefixed(&cli.env_prefix)?
        }
    };
    debug!(?config, "Configuration loaded");
    Ok(config)
}

async fn run(cli: Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Auth => {
            let push = GetuiPush::new(load_config(&cli)?)?;
            let session = push.auth().await?;
            if !cli.quiet {
                println!(
                    "{} session signed at {}",
                    "✓".green(),
                    session.timestamp.to_string().bold()
                );
            }
        }
        Commands::Push(args) => {
            let push = GetuiPush::new(load_config(&cli)?)?;
            let message = args.message.to_message()?;
            let body = match args.tokens.as_slice() {
                [token] => push.push_one(token, &message).await?,
                tokens => push.push_list(tokens, &message).await?,
            };
            print_json(&body)?;
        }
        Commands::Broadcast(args) => {
            let push = GetuiPush::new(load_config(&cli)?)?;
            let body = push.push_all(&args.to_message()?).await?;
            print_json(&body)?;
        }
        Commands::Encode(args) => {
            let config = load_config(&cli)?;
            let envelope =
                MessageEncoder::new().encode(&args.to_message()?, &config.app_key, &config.app_id)?;
            println!("{}", envelope);
        }
        Commands::Decode { envelope } => {
            let chain = MessageEncoder::new().decode_chain(envelope)?;
            if chain.is_empty() {
                println!("{}", "(no action chain)".dimmed());
            }
            for node in chain.nodes() {
                let next = node
                    .next
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let detail = match &node.body {
                    ActionBody::ShowNotification(n) => format!(" title={:?} text={:?}", n.title, n.text),
                    ActionBody::AppStartup(a) => format!(" autostart={}", a.autostart),
                    _ => String::new(),
                };
                println!(
                    "{:>6} {:<18} next={}{}",
                    node.id.to_string().cyan(),
                    format!("{:?}", node.action_type()),
                    next,
                    detail
                );
            }
        }
    }

    Ok(())
}

fn print_json(body: &serde_json::Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}
