//! Provider API surface used by the network external clients
//!
//! One trait per resource collection with the fixed Get / CreateOrUpdate /
//! Delete method set. Not-found is reported through
//! [`AzureError::is_not_found`], never as a sentinel value.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::AzureError;
use crate::network::{PrivateEndpoint, Subnet, VirtualNetwork};

/// `Microsoft.Network/privateEndpoints` operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PrivateEndpointsApi: Send + Sync {
    /// Read a private endpoint
    async fn get(&self, resource_group: &str, name: &str) -> Result<PrivateEndpoint, AzureError>;

    /// Create or replace a private endpoint; returns once Azure accepts it
    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: &PrivateEndpoint,
    ) -> Result<(), AzureError>;

    /// Delete a private endpoint; returns once Azure accepts it
    async fn delete(&self, resource_group: &str, name: &str) -> Result<(), AzureError>;
}

/// `Microsoft.Network/virtualNetworks` operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VirtualNetworksApi: Send + Sync {
    /// Read a virtual network
    async fn get(&self, resource_group: &str, name: &str) -> Result<VirtualNetwork, AzureError>;

    /// Create or replace a virtual network
    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: &VirtualNetwork,
    ) -> Result<(), AzureError>;

    /// Delete a virtual network
    async fn delete(&self, resource_group: &str, name: &str) -> Result<(), AzureError>;
}

/// `Microsoft.Network/virtualNetworks/subnets` operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubnetsApi: Send + Sync {
    /// Read a subnet
    async fn get(
        &self,
        resource_group: &str,
        virtual_network: &str,
        name: &str,
    ) -> Result<Subnet, AzureError>;

    /// Create or replace a subnet
    async fn create_or_update(
        &self,
        resource_group: &str,
        virtual_network: &str,
        name: &str,
        parameters: &Subnet,
    ) -> Result<(), AzureError>;

    /// Delete a subnet
    async fn delete(
        &self,
        resource_group: &str,
        virtual_network: &str,
        name: &str,
    ) -> Result<(), AzureError>;
}
