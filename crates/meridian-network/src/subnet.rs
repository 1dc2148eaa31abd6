//! Subnet mapping, drift detection and status projection

use meridian_azure::network as azure;
use meridian_common::crd::{SubnetSpec, SubnetStatus};

use crate::compare::non_empty;

/// Build the create/update request for a subnet
pub fn new_subnet_parameters(spec: &SubnetSpec) -> azure::Subnet {
    azure::Subnet {
        properties: Some(azure::SubnetProperties {
            address_prefix: non_empty(&spec.properties.address_prefix),
            service_endpoints: Some(
                spec.properties
                    .service_endpoints
                    .iter()
                    .map(|e| azure::ServiceEndpoint {
                        service: non_empty(&e.service),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Whether the observed subnet has drifted from the desired request.
///
/// Compares the address prefix and the ordered list of endpoint service
/// names. Azure fills in `locations` and `provisioningState` on each
/// endpoint; those are ignored.
pub fn subnet_needs_update(desired: &azure::Subnet, observed: &azure::Subnet) -> bool {
    let empty = azure::SubnetProperties::default();
    let want = desired.properties.as_ref().unwrap_or(&empty);
    let got = observed.properties.as_ref().unwrap_or(&empty);

    if want.address_prefix != got.address_prefix {
        return true;
    }

    service_names(want) != service_names(got)
}

fn service_names(props: &azure::SubnetProperties) -> Vec<Option<&str>> {
    props
        .service_endpoints
        .iter()
        .flatten()
        .map(|e| e.service.as_deref())
        .collect()
}

/// Status fields read back from an observed subnet
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubnetObservation {
    /// Provisioning state
    pub state: Option<String>,
    /// Etag
    pub etag: Option<String>,
    /// Resource ID
    pub id: Option<String>,
    /// Purpose set by a delegating service
    pub purpose: Option<String>,
}

/// Read the status fields out of an observed subnet
pub fn project_subnet(observed: &azure::Subnet) -> SubnetObservation {
    let props = observed.properties.as_ref();
    SubnetObservation {
        state: props.and_then(|p| p.provisioning_state.clone()),
        etag: observed.etag.clone(),
        id: observed.id.clone(),
        purpose: props.and_then(|p| p.purpose.clone()),
    }
}

impl SubnetObservation {
    /// Overwrite the projected status fields
    pub fn apply_to(self, status: &mut SubnetStatus) {
        status.state = self.state;
        status.etag = self.etag;
        status.id = self.id;
        status.purpose = self.purpose;
    }
}
