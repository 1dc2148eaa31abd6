//! VirtualNetwork CRD

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{set_condition, Condition, Reference, ResourceSpec, Selector};

/// Desired state of an Azure virtual network
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "network.meridian.dev",
    version = "v1beta1",
    kind = "VirtualNetwork",
    status = "VirtualNetworkStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Synced","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkSpec {
    /// Provider config, connection secret and deletion policy
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Resource group the network lives in
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group_name: String,

    /// ResourceGroup declaration supplying `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<Reference>,

    /// Selects a ResourceGroup declaration supplying `resourceGroupName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_selector: Option<Selector>,

    /// Azure location
    pub location: String,

    /// Network properties
    pub properties: VirtualNetworkProperties,

    /// Resource tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// Properties of a virtual network
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    /// Address blocks reserved for the network
    pub address_space: AddressSpace,

    /// Enable DDoS protection for all protected resources in the network
    #[serde(default)]
    pub enable_ddos_protection: bool,

    /// Enable VM protection for all subnets in the network
    #[serde(default)]
    pub enable_vm_protection: bool,
}

/// CIDR blocks of a virtual network
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    /// Address prefixes in CIDR notation
    pub address_prefixes: Vec<String>,
}

/// Observed state of an Azure virtual network
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkStatus {
    /// Ready and Synced conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Provisioning state reported by Azure
    #[serde(default)]
    pub state: Option<String>,

    /// Azure resource ID
    #[serde(default)]
    pub id: Option<String>,

    /// Azure etag
    #[serde(default)]
    pub etag: Option<String>,

    /// Azure-assigned GUID of the network
    #[serde(default)]
    pub resource_guid: Option<String>,

    /// Azure resource type
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
}

impl VirtualNetwork {
    /// Status, created empty on first use
    pub fn status_mut(&mut self) -> &mut VirtualNetworkStatus {
        self.status.get_or_insert_with(Default::default)
    }

    /// Set a condition on the status
    pub fn set_condition(&mut self, condition: Condition) {
        set_condition(&mut self.status_mut().conditions, condition);
    }
}
