/// Version injected at compile time via ARMCORE_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("ARMCORE_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{bail, Context, Result};
use armcore::arm::client::ArmClient;
use armcore::config::Config;
use armcore::pollers::{AsyncOperationPoller, LocationPoller, Poller};
use armcore::resourceids::IdRegistry;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Resource Manager identifiers, operations and lists from the command line
#[derive(Parser, Debug)]
#[command(name = "armcore", version = VERSION, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    /// Resource Manager endpoint (overrides the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the known resource id types
    Ids,

    /// Parse a resource id as the given type
    Parse {
        id_type: String,
        id: String,
        /// Accept any casing of the literal segments
        #[arg(short, long)]
        insensitive: bool,
    },

    /// Build a resource id from field=value pairs
    Format {
        id_type: String,
        #[arg(value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Rewrite a resource id in canonical casing
    Recase {
        id: String,
        /// Resource id type; detected when omitted
        #[arg(short = 't', long)]
        id_type: Option<String>,
    },

    /// Wait for a long-running operation to finish
    Wait {
        /// Status url from an Azure-AsyncOperation or Location header
        status_url: String,
        /// How the status url reports progress
        #[arg(long, value_enum, default_value = "async-operation")]
        kind: StatusKind,
        #[arg(long, env = "ARM_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
        /// Overall timeout in seconds (overrides the config file)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Fetch every page of a list endpoint
    List {
        /// Resource path or absolute url
        path: String,
        #[arg(long)]
        api_version: String,
        #[arg(long, env = "ARM_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
        /// Keep only items whose JSON contains this text
        #[arg(long)]
        contains: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusKind {
    AsyncOperation,
    Location,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("armcore {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("armcore").join("armcore.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".armcore").join("armcore.log");
    }
    PathBuf::from("armcore.log")
}

/// `name=value` command-line field
fn parse_field(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got {arg:?}")),
    }
}

fn print<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Cancel the token on ctrl-c
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            token.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load();
    if let Some(endpoint) = &args.endpoint {
        config.http.endpoint = endpoint.clone();
    }

    let registry = IdRegistry::builtin().context("Failed to load resource id definitions")?;

    match args.command {
        Command::Ids => {
            let ids: BTreeMap<&str, String> = registry
                .iter()
                .map(|t| (t.id_type(), t.description()))
                .collect();
            print(args.output, &ids)?;
        }

        Command::Parse {
            id_type,
            id,
            insensitive,
        } => {
            let result = registry
                .parse(&id_type, &id, insensitive)
                .with_context(|| format!("{} is not a valid {} id", id, id_type))?;
            print(args.output, &result)?;
        }

        Command::Format { id_type, fields } => {
            let template = registry
                .get(&id_type)
                .with_context(|| format!("Unknown resource id type {:?}", id_type))?;
            let values: BTreeMap<String, String> = fields.into_iter().collect();

            let missing: Vec<&str> = template
                .field_names()
                .filter(|name| !values.contains_key(*name))
                .collect();
            if !missing.is_empty() {
                bail!("Missing fields for {}: {}", id_type, missing.join(", "));
            }

            println!("{}", template.format(&values));
        }

        Command::Recase { id, id_type } => {
            let recased = match id_type {
                Some(id_type) => registry
                    .recase_as(&id_type, &id)
                    .with_context(|| format!("{} is not a valid {} id", id, id_type))?,
                None => registry.recase(&id),
            };
            println!("{}", recased);
        }

        Command::Wait {
            status_url,
            kind,
            token,
            timeout,
        } => {
            if let Some(timeout) = timeout {
                config.poller.timeout_secs = Some(timeout);
            }
            let client = ArmClient::new(config.clone(), &token)?;

            let mut poller = match kind {
                StatusKind::AsyncOperation => Poller::new(
                    AsyncOperationPoller::new(client.transport(), &status_url, None),
                    config.poller,
                ),
                StatusKind::Location => Poller::new(
                    LocationPoller::new(client.transport(), &status_url),
                    config.poller,
                ),
            };

            let cancel = cancel_on_interrupt();
            let result = poller
                .poll_until_done(&cancel)
                .await
                .context("Operation did not succeed")?;
            print(args.output, &result.unwrap_or(Value::Null))?;
        }

        Command::List {
            path,
            api_version,
            token,
            contains,
        } => {
            let client = ArmClient::new(config, &token)?;
            let cancel = cancel_on_interrupt();

            let first = client
                .list::<Value>(&path, &api_version)
                .await
                .with_context(|| format!("Failed to list {}", path))?;
            let items = first
                .complete(&cancel, |item| match &contains {
                    Some(needle) => item.to_string().contains(needle.as_str()),
                    None => true,
                })
                .await
                .with_context(|| format!("Failed to list {}", path))?;

            print(args.output, &items)?;
        }
    }

    Ok(())
}
