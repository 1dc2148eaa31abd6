//! VirtualNetwork mapping, drift detection and status projection

use meridian_azure::network as azure;
use meridian_common::crd::{VirtualNetworkSpec, VirtualNetworkStatus};

use crate::compare::{non_empty, strings_equal, tags_equal};

/// Build the create/update request for a virtual network
pub fn new_virtual_network_parameters(spec: &VirtualNetworkSpec) -> azure::VirtualNetwork {
    azure::VirtualNetwork {
        location: non_empty(&spec.location),
        tags: spec.tags.clone(),
        properties: Some(azure::VirtualNetworkProperties {
            address_space: Some(azure::AddressSpace {
                address_prefixes: Some(spec.properties.address_space.address_prefixes.clone()),
            }),
            enable_ddos_protection: Some(spec.properties.enable_ddos_protection),
            enable_vm_protection: Some(spec.properties.enable_vm_protection),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Whether the observed network has drifted from the desired request.
///
/// Compares address prefixes (in order), both protection flags and tags.
/// A flag Azure leaves out counts as `false`.
pub fn virtual_network_needs_update(
    desired: &azure::VirtualNetwork,
    observed: &azure::VirtualNetwork,
) -> bool {
    let empty = azure::VirtualNetworkProperties::default();
    let want = desired.properties.as_ref().unwrap_or(&empty);
    let got = observed.properties.as_ref().unwrap_or(&empty);

    if !strings_equal(address_prefixes(want), address_prefixes(got)) {
        return true;
    }

    if want.enable_ddos_protection.unwrap_or(false) != got.enable_ddos_protection.unwrap_or(false) {
        return true;
    }

    if want.enable_vm_protection.unwrap_or(false) != got.enable_vm_protection.unwrap_or(false) {
        return true;
    }

    !tags_equal(desired.tags.as_ref(), observed.tags.as_ref())
}

fn address_prefixes(props: &azure::VirtualNetworkProperties) -> Option<&[String]> {
    props
        .address_space
        .as_ref()
        .and_then(|a| a.address_prefixes.as_deref())
}

/// Status fields read back from an observed virtual network
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VirtualNetworkObservation {
    /// Provisioning state
    pub state: Option<String>,
    /// Resource ID
    pub id: Option<String>,
    /// Etag
    pub etag: Option<String>,
    /// Azure-assigned GUID
    pub resource_guid: Option<String>,
    /// Resource type
    pub type_: Option<String>,
}

/// Read the status fields out of an observed virtual network
pub fn project_virtual_network(observed: &azure::VirtualNetwork) -> VirtualNetworkObservation {
    let props = observed.properties.as_ref();
    VirtualNetworkObservation {
        state: props.and_then(|p| p.provisioning_state.clone()),
        id: observed.id.clone(),
        etag: observed.etag.clone(),
        resource_guid: props.and_then(|p| p.resource_guid.clone()),
        type_: observed.type_.clone(),
    }
}

impl VirtualNetworkObservation {
    /// Overwrite the projected status fields
    pub fn apply_to(self, status: &mut VirtualNetworkStatus) {
        status.state = self.state;
        status.id = self.id;
        status.etag = self.etag;
        status.resource_guid = self.resource_guid;
        status.type_ = self.type_;
    }
}
