//! Subnet CRD

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{set_condition, Condition, Reference, ResourceSpec, Selector};

/// Desired state of a subnet inside an Azure virtual network
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "network.meridian.dev",
    version = "v1beta1",
    kind = "Subnet",
    status = "SubnetStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Synced","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    /// Provider config, connection secret and deletion policy
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Resource group of the parent virtual network
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group_name: String,

    /// ResourceGroup declaration supplying `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<Reference>,

    /// Selects a ResourceGroup declaration supplying `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_selector: Option<Selector>,

    /// Name of the parent virtual network
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub virtual_network_name: String,

    /// VirtualNetwork declaration supplying `virtualNetworkName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_name_ref: Option<Reference>,

    /// Selects a VirtualNetwork declaration supplying `virtualNetworkName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_name_selector: Option<Selector>,

    /// Subnet properties
    pub properties: SubnetProperties,
}

/// Properties of a subnet
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    /// Address prefix in CIDR notation
    pub address_prefix: String,

    /// Service endpoints enabled on the subnet, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_endpoints: Vec<ServiceEndpoint>,
}

/// A service endpoint enabled on a subnet
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ServiceEndpoint {
    /// Service type, e.g. `Microsoft.Storage`
    pub service: String,
}

/// Observed state of an Azure subnet
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetStatus {
    /// Ready and Synced conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Provisioning state reported by Azure
    #[serde(default)]
    pub state: Option<String>,

    /// Azure etag
    #[serde(default)]
    pub etag: Option<String>,

    /// Azure resource ID, referenced by private endpoints
    #[serde(default)]
    pub id: Option<String>,

    /// Read-only purpose set by services that own the subnet
    #[serde(default)]
    pub purpose: Option<String>,
}

impl Subnet {
    /// Status, created empty on first use
    pub fn status_mut(&mut self) -> &mut SubnetStatus {
        self.status.get_or_insert_with(Default::default)
    }

    /// Set a condition on the status
    pub fn set_condition(&mut self, condition: Condition) {
        set_condition(&mut self.status_mut().conditions, condition);
    }

    /// Azure resource ID once the subnet has been observed, empty before
    pub fn observed_id(&self) -> &str {
        self.status
            .as_ref()
            .and_then(|s| s.id.as_deref())
            .unwrap_or_default()
    }
}
