use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use mcp_servicenow::api::{GeminiClient, ServiceNowClient};
use mcp_servicenow::config::Config;
use mcp_servicenow::dispatch::Dispatcher;
use mcp_servicenow::mcp::ServiceNowServer;

#[derive(Parser)]
#[command(name = "mcp-servicenow", version, about = "MCP server for ServiceNow over stdio")]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, env = "MCP_SERVICENOW_ENV_FILE")]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    for name in config.missing_optional() {
        tracing::warn!("{name} is not set; smart tools are disabled");
    }

    let platform = ServiceNowClient::from_config(&config)?;
    let generator = config
        .gemini
        .as_ref()
        .map(|settings| GeminiClient::from_settings(settings, config.transport_options()))
        .transpose()?;

    let dispatcher = Dispatcher::new(platform, generator);
    let server = ServiceNowServer::new(Arc::new(dispatcher));

    tracing::info!(instance = %config.instance_url, "starting MCP server on stdio");
    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
