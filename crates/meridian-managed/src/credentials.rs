//! Credential lookup: ProviderConfig -> Secret -> credentials JSON

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use meridian_common::credentials::AzureCredentials;
use meridian_common::crd::{ManagedResource, ProviderConfig, SecretKeySelector};
use meridian_common::{Error, Result};
use tracing::debug;

/// Looks up the Azure credentials a declaration selects
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Credentials for the declaration's provider config
    async fn credentials(&self, mg: &ManagedResource) -> Result<AzureCredentials>;
}

/// Reads ProviderConfigs and their Secrets from the cluster
pub struct KubeCredentialSource {
    client: Client,
}

impl KubeCredentialSource {
    /// Create a source reading through the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CredentialSource for KubeCredentialSource {
    async fn credentials(&self, mg: &ManagedResource) -> Result<AzureCredentials> {
        let pc_name = mg.resource_spec().provider_config_name();
        let pc = Api::<ProviderConfig>::all(self.client.clone())
            .get_opt(pc_name)
            .await?
            .ok_or_else(|| Error::auth(format!("provider config {pc_name} not found")))?;

        let selector = &pc.spec.credentials_secret_ref;
        let secret = Api::<Secret>::namespaced(self.client.clone(), &selector.namespace)
            .get_opt(&selector.name)
            .await?
            .ok_or_else(|| {
                Error::auth(format!(
                    "credentials secret {}/{} not found",
                    selector.namespace, selector.name
                ))
            })?;

        debug!(provider_config = pc_name, secret = %selector.name, "loaded credentials secret");
        credentials_from_secret(&secret, selector)
    }
}

/// Parse the credentials stored under the selector's key
pub fn credentials_from_secret(
    secret: &Secret,
    selector: &SecretKeySelector,
) -> Result<AzureCredentials> {
    let data = secret
        .data
        .as_ref()
        .and_then(|d| d.get(&selector.key))
        .ok_or_else(|| {
            Error::auth(format!(
                "credentials secret {}/{} has no key {}",
                selector.namespace, selector.name, selector.key
            ))
        })?;
    AzureCredentials::from_json(&data.0)
}
