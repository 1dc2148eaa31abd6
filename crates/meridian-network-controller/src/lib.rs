//! Azure network external clients
//!
//! One [`ExternalClient`](meridian_managed::ExternalClient) per managed
//! network kind, generic over the provider API trait so tests can mock the
//! ARM boundary, plus the [`NetworkConnector`] that binds them to a
//! subscription.

#![deny(missing_docs)]

mod connector;
mod private_endpoint;
mod subnet;
mod virtual_network;

use meridian_azure::AzureError;
use meridian_common::crd::ManagedKind;
use meridian_common::{Error, Operation};

pub use connector::NetworkConnector;
pub use private_endpoint::PrivateEndpointExternal;
pub use subnet::SubnetExternal;
pub use virtual_network::VirtualNetworkExternal;

/// Wrap a provider failure. Rejected credentials are connector failures
/// no matter which call first needed a token.
fn provider_error(operation: Operation, kind: ManagedKind, e: AzureError) -> Error {
    if e.is_auth_failure() {
        Error::auth(format!("Azure rejected the credentials: {e}"))
    } else {
        Error::provider_call(operation, kind, e)
    }
}
