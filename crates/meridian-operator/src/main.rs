//! Meridian Operator - reconciles Azure network declarations

use std::sync::Arc;

use clap::Parser;
use kube::Client;
use meridian_azure::{AzureClientConfig, DEFAULT_ARM_ENDPOINT, DEFAULT_AUTHORITY_HOST};
use meridian_common::crd::all_crds;
use meridian_common::telemetry::{init_telemetry, LogFormat, TelemetryConfig};
use meridian_managed::KubeCredentialSource;
use meridian_network_controller::NetworkConnector;
use tokio_util::sync::CancellationToken;

mod controllers;

/// Meridian - manages Azure virtual networks, subnets and private endpoints
#[derive(Parser, Debug)]
#[command(name = "meridian-operator", version, about, long_about = None)]
struct Cli {
    /// Print all CRD manifests as YAML and exit
    #[arg(long)]
    crd: bool,

    /// Log output format (json or text)
    #[arg(long, env = "MERIDIAN_LOG_FORMAT", default_value = "json")]
    log_format: LogFormat,

    /// Azure Resource Manager endpoint
    #[arg(long, env = "MERIDIAN_ARM_ENDPOINT", default_value = DEFAULT_ARM_ENDPOINT)]
    arm_endpoint: String,

    /// Microsoft Entra authority host
    #[arg(long, env = "MERIDIAN_AUTHORITY_HOST", default_value = DEFAULT_AUTHORITY_HOST)]
    authority_host: String,
}

impl Cli {
    fn azure_config(&self) -> AzureClientConfig {
        AzureClientConfig {
            arm_endpoint: self.arm_endpoint.trim_end_matches('/').to_string(),
            authority_host: self.authority_host.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Before telemetry so log lines never interleave with the manifests
    if cli.crd {
        println!("{}", crd_manifests()?);
        return Ok(());
    }

    init_telemetry(TelemetryConfig {
        service_name: "meridian-operator".to_string(),
        format: cli.log_format,
    })?;

    run_controllers(cli.azure_config()).await
}

/// All CRDs as one multi-document YAML stream
fn crd_manifests() -> anyhow::Result<String> {
    let docs = all_crds()
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
    Ok(docs.join("---\n"))
}

async fn run_controllers(azure: AzureClientConfig) -> anyhow::Result<()> {
    tracing::info!(arm_endpoint = %azure.arm_endpoint, "Meridian operator starting...");

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received, cancelling in-flight Azure calls");
                shutdown.cancel();
            }
        });
    }

    let credentials = Arc::new(KubeCredentialSource::new(client.clone()));
    let connector = Arc::new(NetworkConnector::new(credentials, azure));

    tracing::info!("Starting controllers:");
    let controllers = controllers::build_network_controllers(client, connector, shutdown);
    futures::future::join_all(controllers).await;

    tracing::info!("Meridian operator stopped");
    Ok(())
}
