//! Pure translation between Meridian declarations and Azure network objects
//!
//! For each kind:
//! - a mapper building the create/update request from the spec
//! - a drift check comparing that request with what Azure reports
//! - a projector reading observed fields back into the status
//!
//! Nothing here performs I/O.

mod compare;
pub mod private_endpoint;
pub mod subnet;
pub mod virtual_network;

pub use private_endpoint::{
    new_private_endpoint_parameters, private_endpoint_needs_update, project_private_endpoint,
    PrivateEndpointObservation,
};
pub use subnet::{new_subnet_parameters, project_subnet, subnet_needs_update, SubnetObservation};
pub use virtual_network::{
    new_virtual_network_parameters, project_virtual_network, virtual_network_needs_update,
    VirtualNetworkObservation,
};
