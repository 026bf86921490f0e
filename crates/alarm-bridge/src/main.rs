use std::path::PathBuf;
use std::sync::Arc;

use alarm_bridge::{
    config::{Config, LogFormat, SecretBackend},
    resolver::ProcessEnv,
    runtime::LambdaRuntime,
    secrets::{AwsSecretStore, ExtensionSecretStore, SecretStore},
    server::Server,
    AlarmHandler, ConfigResolver,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "File Jira issues for CloudWatch alarms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve invocations from the Lambda Runtime API (default)
    Lambda,
    /// Accept events over HTTP on /invoke
    Serve {
        /// Listen address, overrides SERVER_ADDR
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Process a single event read from a JSON file and print the result
    Invoke {
        /// Path to the event document
        #[arg(short, long)]
        event: PathBuf,

        /// Request id reported in the result
        #[arg(long)]
        request_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Lambda);

    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            if matches!(command, Commands::Lambda) {
                report_init_error(&e).await;
            }
            return Err(e).context("failed to load configuration");
        }
    };
    init_tracing(&config);

    let secrets: Arc<dyn SecretStore> = match config.secrets.backend {
        SecretBackend::Sdk => Arc::new(AwsSecretStore::from_env().await),
        SecretBackend::Extension => Arc::new(ExtensionSecretStore::from_config(&config.secrets)),
    };
    info!(backend = ?config.secrets.backend, "secret_store_selected");
    let resolver = Arc::new(ConfigResolver::new(Arc::new(ProcessEnv), secrets));
    let handler = Arc::new(AlarmHandler::new(resolver, config.jira.timeout));

    match command {
        Commands::Lambda => {
            let runtime_api = config
                .lambda
                .runtime_api
                .as_deref()
                .context(
                    "AWS_LAMBDA_RUNTIME_API is not set; use `serve` or `invoke` outside Lambda",
                )?;
            LambdaRuntime::new(runtime_api).run(&handler).await?;
        }
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            info!("Starting server on {}", addr);
            Server::new(handler).start(&addr).await?;
        }
        Commands::Invoke { event, request_id } => {
            let raw = std::fs::read_to_string(&event)
                .with_context(|| format!("failed to read event file {}", event.display()))?;
            let event = serde_json::from_str(&raw)
                .with_context(|| format!("event file {} is not JSON", event.display()))?;
            let result = handler.handle(event, request_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

/// Tell the Lambda service why the function could not start. Best effort:
/// outside Lambda there is nobody to tell.
async fn report_init_error(error: &alarm_bridge::Error) {
    let Ok(runtime_api) = std::env::var("AWS_LAMBDA_RUNTIME_API") else {
        return;
    };
    if let Err(e) = LambdaRuntime::new(&runtime_api).init_error(error).await {
        eprintln!("failed to report init error to the Runtime API: {}", e);
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.filter()));

    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
