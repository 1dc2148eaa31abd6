//! Resource Manager REST client bound to one subscription

use async_trait::async_trait;
use meridian_common::credentials::AzureCredentials;
use serde::de::DeserializeOwned;
use serde::Serialize;
use reqwest::Url;
use tracing::debug;

use crate::auth::Authorizer;
use crate::client::{PrivateEndpointsApi, SubnetsApi, VirtualNetworksApi};
use crate::config::AzureClientConfig;
use crate::error::AzureError;
use crate::network::{PrivateEndpoint, Subnet, VirtualNetwork};

/// Microsoft.Network API version the wire types follow
pub const NETWORK_API_VERSION: &str = "2019-06-01";

/// Client for the Microsoft.Network provider in one subscription.
///
/// Create/update and delete return as soon as Azure accepts the request;
/// the long-running operation is left to finish on its own and is picked
/// up by the next observe.
pub struct ArmClient {
    http: reqwest::Client,
    base_url: String,
    subscription_id: String,
    authorizer: Authorizer,
}

impl ArmClient {
    /// Build a client for the subscription in `creds`
    pub fn new(creds: &AzureCredentials, config: &AzureClientConfig) -> Result<Self, AzureError> {
        let config = config.for_credentials(creds);
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AzureError::Transport(e.to_string()))?;

        let authorizer = Authorizer::new(
            http.clone(),
            &config.authority_host,
            &creds.tenant_id,
            &creds.client_id,
            &creds.client_secret,
            &config.arm_endpoint,
        );

        Ok(Self {
            http,
            base_url: config.arm_endpoint,
            subscription_id: creds.subscription_id.clone(),
            authorizer,
        })
    }

    /// Subscription the client is bound to
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    fn url(&self, resource_group: &str, path: &[&str]) -> Result<Url, AzureError> {
        resource_url(&self.base_url, &self.subscription_id, resource_group, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, AzureError> {
        debug!(%url, "GET");
        let token = self.authorizer.bearer().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let response = check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AzureError::Decode(e.to_string()))
    }

    async fn put_json<T: Serialize + Sync>(&self, url: Url, body: &T) -> Result<(), AzureError> {
        debug!(%url, "PUT");
        let token = self.authorizer.bearer().await?;
        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    async fn delete_at(&self, url: Url) -> Result<(), AzureError> {
        debug!(%url, "DELETE");
        let token = self.authorizer.bearer().await?;
        let response = self.http.delete(url).bearer_auth(token).send().await?;
        check(response).await.map(|_| ())
    }
}

/// Each name is pushed as one escaped path segment, so a `/`, `?` or `#`
/// in a declared name cannot address a different resource.
fn resource_url(
    base: &str,
    subscription: &str,
    resource_group: &str,
    path: &[&str],
) -> Result<Url, AzureError> {
    let mut url = Url::parse(base)
        .map_err(|e| AzureError::Transport(format!("invalid ARM endpoint {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| AzureError::Transport(format!("invalid ARM endpoint {base}")))?
        .pop_if_empty()
        .extend([
            "subscriptions",
            subscription,
            "resourceGroups",
            resource_group,
            "providers",
            "Microsoft.Network",
        ])
        .extend(path);
    url.query_pairs_mut()
        .clear()
        .append_pair("api-version", NETWORK_API_VERSION);
    Ok(url)
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, AzureError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AzureError::from_response(status.as_u16(), &body))
}

#[async_trait]
impl PrivateEndpointsApi for ArmClient {
    async fn get(&self, resource_group: &str, name: &str) -> Result<PrivateEndpoint, AzureError> {
        let url = self.url(resource_group, &["privateEndpoints", name])?;
        self.get_json(url).await
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: &PrivateEndpoint,
    ) -> Result<(), AzureError> {
        let url = self.url(resource_group, &["privateEndpoints", name])?;
        self.put_json(url, parameters).await
    }

    async fn delete(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        let url = self.url(resource_group, &["privateEndpoints", name])?;
        self.delete_at(url).await
    }
}

#[async_trait]
impl VirtualNetworksApi for ArmClient {
    async fn get(&self, resource_group: &str, name: &str) -> Result<VirtualNetwork, AzureError> {
        let url = self.url(resource_group, &["virtualNetworks", name])?;
        self.get_json(url).await
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: &VirtualNetwork,
    ) -> Result<(), AzureError> {
        let url = self.url(resource_group, &["virtualNetworks", name])?;
        self.put_json(url, parameters).await
    }

    async fn delete(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        let url = self.url(resource_group, &["virtualNetworks", name])?;
        self.delete_at(url).await
    }
}

#[async_trait]
impl SubnetsApi for ArmClient {
    async fn get(
        &self,
        resource_group: &str,
        virtual_network: &str,
        name: &str,
    ) -> Result<Subnet, AzureError> {
        let url = self.url(
            resource_group,
            &["virtualNetworks", virtual_network, "subnets", name],
        )?;
        self.get_json(url).await
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        virtual_network: &str,
        name: &str,
        parameters: &Subnet,
    ) -> Result<(), AzureError> {
        let url = self.url(
            resource_group,
            &["virtualNetworks", virtual_network, "subnets", name],
        )?;
        self.put_json(url, parameters).await
    }

    async fn delete(
        &self,
        resource_group: &str,
        virtual_network: &str,
        name: &str,
    ) -> Result<(), AzureError> {
        let url = self.url(
            resource_group,
            &["virtualNetworks", virtual_network, "subnets", name],
        )?;
        self.delete_at(url).await
    }
}
