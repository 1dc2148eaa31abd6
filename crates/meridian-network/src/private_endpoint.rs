//! PrivateEndpoint mapping, drift detection and status projection

use meridian_azure::network as azure;
use meridian_common::crd::{PrivateEndpointSpec, PrivateEndpointStatus, PrivateLinkServiceConnection};

use crate::compare::{id_equal, non_empty, strings_equal, tags_equal};

/// Build the create/update request for a private endpoint.
///
/// The subnet is sent as an ID-only reference. Connection lists keep their
/// declared order, and an empty list stays distinct from an absent one.
pub fn new_private_endpoint_parameters(spec: &PrivateEndpointSpec) -> azure::PrivateEndpoint {
    azure::PrivateEndpoint {
        location: non_empty(&spec.location),
        tags: spec.tags.clone(),
        properties: Some(azure::PrivateEndpointProperties {
            subnet: Some(azure::Subnet {
                id: non_empty(&spec.virtual_network_subnet_id),
                ..Default::default()
            }),
            private_link_service_connections: spec
                .private_link_service_connections
                .as_deref()
                .map(new_connections),
            manual_private_link_service_connections: spec
                .manual_private_link_service_connections
                .as_deref()
                .map(new_connections),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn new_connections(connections: &[PrivateLinkServiceConnection]) -> Vec<azure::PrivateLinkServiceConnection> {
    connections
        .iter()
        .map(|c| azure::PrivateLinkServiceConnection {
            name: non_empty(&c.name),
            properties: Some(azure::PrivateLinkServiceConnectionProperties {
                private_link_service_id: non_empty(&c.private_connection_resource_id),
                group_ids: c.subresource_ids.clone(),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect()
}

/// Whether the observed endpoint has drifted from the desired request.
///
/// Compares the subnet ID, manual connections, auto-approved connections
/// and tags, stopping at the first difference. Location and everything
/// Azure computes (IDs, etag, provisioning state, network interfaces) are
/// never compared.
pub fn private_endpoint_needs_update(
    desired: &azure::PrivateEndpoint,
    observed: &azure::PrivateEndpoint,
) -> bool {
    let empty = azure::PrivateEndpointProperties::default();
    let want = desired.properties.as_ref().unwrap_or(&empty);
    let got = observed.properties.as_ref().unwrap_or(&empty);

    if !id_equal(
        want.subnet.as_ref().and_then(|s| s.id.as_deref()),
        got.subnet.as_ref().and_then(|s| s.id.as_deref()),
    ) {
        return true;
    }

    if !connections_equal(
        want.manual_private_link_service_connections.as_deref(),
        got.manual_private_link_service_connections.as_deref(),
    ) {
        return true;
    }

    if !connections_equal(
        want.private_link_service_connections.as_deref(),
        got.private_link_service_connections.as_deref(),
    ) {
        return true;
    }

    !tags_equal(desired.tags.as_ref(), observed.tags.as_ref())
}

/// An undeclared list is not managed; a declared one must match in order
fn connections_equal(
    desired: Option<&[azure::PrivateLinkServiceConnection]>,
    observed: Option<&[azure::PrivateLinkServiceConnection]>,
) -> bool {
    match (desired, observed) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(want), Some(got)) => {
            want.len() == got.len() && want.iter().zip(got).all(|(w, g)| connection_matches(w, g))
        }
    }
}

/// Connections match by name and target service.
///
/// The observed target is `properties.privateLinkServiceId`, or the
/// connection's own `id` when Azure returns it without properties. Group
/// IDs are only compared when Azure reports properties.
fn connection_matches(
    desired: &azure::PrivateLinkServiceConnection,
    observed: &azure::PrivateLinkServiceConnection,
) -> bool {
    if desired.name != observed.name {
        return false;
    }

    let want = desired.properties.as_ref();
    let want_target = want.and_then(|p| p.private_link_service_id.as_deref());
    let got_target = observed
        .properties
        .as_ref()
        .and_then(|p| p.private_link_service_id.as_deref())
        .or(observed.id.as_deref());
    if want_target != got_target {
        return false;
    }

    match &observed.properties {
        Some(got) => strings_equal(
            want.and_then(|p| p.group_ids.as_deref()),
            got.group_ids.as_deref(),
        ),
        None => true,
    }
}

/// Status fields read back from an observed private endpoint
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrivateEndpointObservation {
    /// Provisioning state
    pub state: Option<String>,
    /// Resource ID
    pub id: Option<String>,
    /// Etag
    pub etag: Option<String>,
    /// Resource type
    pub type_: Option<String>,
    /// Network interface IDs, empty when Azure reports none
    pub network_interface_ids: Vec<String>,
}

/// Read the status fields out of an observed private endpoint
pub fn project_private_endpoint(observed: &azure::PrivateEndpoint) -> PrivateEndpointObservation {
    let props = observed.properties.as_ref();
    PrivateEndpointObservation {
        state: props.and_then(|p| p.provisioning_state.clone()),
        id: observed.id.clone(),
        etag: observed.etag.clone(),
        type_: observed.type_.clone(),
        network_interface_ids: props
            .and_then(|p| p.network_interfaces.as_ref())
            .map(|nics| nics.iter().filter_map(|n| n.id.clone()).collect())
            .unwrap_or_default(),
    }
}

impl PrivateEndpointObservation {
    /// Overwrite the projected status fields
    pub fn apply_to(self, status: &mut PrivateEndpointStatus) {
        status.state = self.state;
        status.id = self.id;
        status.etag = self.etag;
        status.type_ = self.type_;
        status.network_interface_ids = self.network_interface_ids;
    }
}
