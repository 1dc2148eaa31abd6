//! Connector producing per-kind network clients bound to a subscription

use std::sync::Arc;

use async_trait::async_trait;
use meridian_azure::{ArmClient, AzureClientConfig};
use meridian_common::crd::{ManagedKind, ManagedResource};
use meridian_common::{Error, Result};
use meridian_managed::{CredentialSource, ExternalClient, ExternalConnector};
use tracing::debug;

use crate::private_endpoint::PrivateEndpointExternal;
use crate::subnet::SubnetExternal;
use crate::virtual_network::VirtualNetworkExternal;

/// Builds a fresh ARM client per call from the declaration's ProviderConfig
pub struct NetworkConnector {
    credentials: Arc<dyn CredentialSource>,
    config: AzureClientConfig,
}

impl NetworkConnector {
    /// Create a connector resolving credentials through `credentials`
    pub fn new(credentials: Arc<dyn CredentialSource>, config: AzureClientConfig) -> Self {
        Self {
            credentials,
            config,
        }
    }
}

#[async_trait]
impl ExternalConnector for NetworkConnector {
    async fn connect(&self, mg: &ManagedResource) -> Result<Box<dyn ExternalClient>> {
        let kind = mg.kind();
        let bind: fn(ArmClient) -> Box<dyn ExternalClient> = match kind {
            ManagedKind::PrivateEndpoint => |c| Box::new(PrivateEndpointExternal::new(c)),
            ManagedKind::VirtualNetwork => |c| Box::new(VirtualNetworkExternal::new(c)),
            ManagedKind::Subnet => |c| Box::new(SubnetExternal::new(c)),
            ManagedKind::ResourceGroup => {
                return Err(Error::validation(
                    "ResourceGroup declarations are reference targets and are not reconciled",
                ))
            }
        };

        let creds = self.credentials.credentials(mg).await?;
        let client = ArmClient::new(&creds, &self.config)
            .map_err(|e| Error::auth(format!("cannot build ARM client: {e}")))?;
        debug!(
            %kind,
            resource = %mg.name(),
            subscription = %client.subscription_id(),
            "connected to Azure"
        );
        Ok(bind(client))
    }
}
