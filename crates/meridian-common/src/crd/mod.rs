//! Custom Resource Definitions for Meridian
//!
//! This module contains all CRD definitions used by the Meridian operator.

mod managed;
mod private_endpoint;
mod provider_config;
mod resource_group;
mod subnet;
mod types;
mod virtual_network;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

pub use managed::{ManagedKind, ManagedResource};
pub use private_endpoint::{
    PrivateEndpoint, PrivateEndpointSpec, PrivateEndpointStatus, PrivateLinkServiceConnection,
};
pub use provider_config::{ProviderConfig, ProviderConfigSpec, SecretKeySelector};
pub use resource_group::{ResourceGroup, ResourceGroupSpec, ResourceGroupStatus};
pub use subnet::{ServiceEndpoint, Subnet, SubnetProperties, SubnetSpec, SubnetStatus};
pub use types::{
    get_condition, reasons, set_condition, Condition, ConditionStatus, DeletionPolicy,
    ProviderConfigReference, Reference, ResourceSpec, SecretReference, Selector,
    DEFAULT_PROVIDER_CONFIG, TYPE_READY, TYPE_SYNCED,
};
pub use virtual_network::{
    AddressSpace, VirtualNetwork, VirtualNetworkProperties, VirtualNetworkSpec,
    VirtualNetworkStatus,
};

/// Every CRD this operator serves
pub fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        ProviderConfig::crd(),
        ResourceGroup::crd(),
        VirtualNetwork::crd(),
        Subnet::crd(),
        PrivateEndpoint::crd(),
    ]
}
