//! Command-line front end for the admin API client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};

use admin_client::config::watcher::ConfigWatcher;
use admin_client::config::{load_config, ClientConfig};
use admin_client::lifecycle::shutdown::trigger_on_ctrl_c;
use admin_client::observability::{logging, metrics};
use admin_client::{ApiClient, Payload, Priority, RequestOptions, Settlement, Shutdown};

#[derive(Parser)]
#[command(name = "admin-client")]
#[command(about = "Send admin API requests through the ordered, retrying client", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "admin-client.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit one request and print its settlement
    Submit {
        /// Backend operation name
        action: String,
        /// JSON object merged into the request body
        #[arg(short, long, default_value = "{}")]
        payload: String,
        #[arg(long, value_enum, default_value_t = PriorityArg::Normal)]
        priority: PriorityArg,
        /// Skip the queue and send immediately
        #[arg(long)]
        no_queue: bool,
        /// Path joined onto the configured endpoint
        #[arg(long)]
        target: Option<String>,
    },
    /// Submit every line of a JSON-lines file and print each settlement
    Batch {
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    High,
    Normal,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::High => Priority::High,
            PriorityArg::Normal => Priority::Normal,
        }
    }
}

/// One line of a batch file.
#[derive(Deserialize)]
struct BatchLine {
    action: String,
    #[serde(default)]
    payload: Payload,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    target: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability);
    tracing::info!(config = %cli.config.display(), "admin-client starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = ApiClient::builder(config.clone()).build()?;

    let shutdown = Arc::new(Shutdown::new());
    client.attach_shutdown(&shutdown);
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { trigger_on_ctrl_c(&shutdown).await });
    }

    match cli.command {
        Commands::Submit {
            action,
            payload,
            priority,
            no_queue,
            target,
        } => {
            let payload: Payload = serde_json::from_str(&payload)?;
            let mut options = RequestOptions {
                priority: priority.into(),
                target_resource: target,
                ..RequestOptions::default()
            };
            if no_queue {
                options = options.bypass_queue();
            }

            let settlement = client.enqueue(action.as_str(), payload, options)?.settled().await;
            print_settlement(&action, &settlement)?;
            if let Err(e) = settlement.result {
                return Err(e.into());
            }
        }
        Commands::Batch { file } => {
            let _watcher = spawn_config_reload(&cli.config, &config, &client);
            run_batch(&client, &file).await?;
        }
    }

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_batch(client: &ApiClient, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(file).await?;

    let mut tickets = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: BatchLine = serde_json::from_str(line)
            .map_err(|e| format!("{}:{}: {}", file.display(), number + 1, e))?;
        let options = RequestOptions {
            priority: entry.priority,
            target_resource: entry.target,
            ..RequestOptions::default()
        };
        let ticket = client.enqueue(entry.action.as_str(), entry.payload, options)?;
        tickets.push((entry.action, ticket));
    }

    tracing::info!(requests = tickets.len(), "Batch submitted");

    let settled = join_all(tickets.into_iter().map(|(action, ticket)| async move {
        (action, ticket.settled().await)
    }))
    .await;

    let failed = settled.iter().filter(|(_, s)| !s.is_success()).count();
    for (action, settlement) in &settled {
        print_settlement(action, settlement)?;
    }
    tracing::info!(total = settled.len(), failed, "Batch settled");
    Ok(())
}

/// Watch the config file and apply rotated credential tokens.
fn spawn_config_reload(
    path: &Path,
    current: &ClientConfig,
    client: &ApiClient,
) -> Option<notify::RecommendedWatcher> {
    let (watcher, mut updates) = ConfigWatcher::new(path, current);
    let guard = match watcher.run() {
        Ok(guard) => guard,
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload unavailable");
            return None;
        }
    };

    let client = client.clone();
    tokio::spawn(async move {
        while let Some(new_config) = updates.recv().await {
            apply_reload(&client, new_config);
        }
    });
    Some(guard)
}

fn apply_reload(client: &ApiClient, config: ClientConfig) {
    client.credentials().set_configured(config.credentials.token);
    tracing::info!("Credential token applied");
}

fn print_settlement(action: &str, settlement: &Settlement) -> Result<(), serde_json::Error> {
    let mut out = json!({
        "request_id": settlement.request_id,
        "action": action,
        "outcome": settlement.outcome(),
        "attempts": settlement.attempts.len(),
    });
    match &settlement.result {
        Ok(data) => out["data"] = data.clone(),
        Err(e) => out["error"] = Value::String(e.to_string()),
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
