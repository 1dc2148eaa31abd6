//! Azure Resource Manager boundary for Meridian
//!
//! Wire types for Microsoft.Network, the per-collection API traits the
//! external clients depend on, and the reqwest-backed [`ArmClient`]
//! implementing them.

#![deny(missing_docs)]

mod arm;
mod auth;
pub mod client;
mod config;
mod error;
pub mod network;

pub use arm::{ArmClient, NETWORK_API_VERSION};
pub use auth::Authorizer;
pub use client::{PrivateEndpointsApi, SubnetsApi, VirtualNetworksApi};
pub use config::{
    AzureClientConfig, DEFAULT_ARM_ENDPOINT, DEFAULT_AUTHORITY_HOST, DEFAULT_REQUEST_TIMEOUT,
};
pub use error::AzureError;
