//! PrivateEndpoint CRD
//!
//! A PrivateEndpoint attaches a private IP inside a subnet to one or more
//! private link services.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{set_condition, Condition, Reference, ResourceSpec, Selector};

/// Desired state of an Azure private endpoint.
///
/// Example:
/// ```yaml
/// apiVersion: network.meridian.dev/v1beta1
/// kind: PrivateEndpoint
/// metadata:
///   name: db-endpoint
/// spec:
///   location: westeurope
///   resourceGroupNameRef:
///     name: core-rg
///   virtualNetworkSubnetIdSelector:
///     matchLabels:
///       tier: data
///   privateLinkServiceConnections:
///     - name: db
///       privateConnectionResourceID: /subscriptions/.../privateLinkServices/db
///       subresourceIDs: []
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "network.meridian.dev",
    version = "v1beta1",
    kind = "PrivateEndpoint",
    status = "PrivateEndpointStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Synced","type":"string","jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PrivateEndpointSpec {
    /// Provider config, connection secret and deletion policy
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Resource group the endpoint lives in
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

    /// ID of the subnet the endpoint's private IP is allocated from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub virtual_network_subnet_id: String,

    /// Subnet declaration supplying `virtualNetworkSubnetId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_subnet_id_ref: Option<Reference>,

    /// Selects a Subnet declaration supplying `virtualNetworkSubnetId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_subnet_id_selector: Option<Selector>,

    /// Auto-approved connections to private link services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_link_service_connections: Option<Vec<PrivateLinkServiceConnection>>,

    /// Connections that require manual approval by the service owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_private_link_service_connections: Option<Vec<PrivateLinkServiceConnection>>,

    /// Resource tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// A connection between the endpoint and a private link service
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PrivateLinkServiceConnection {
    /// Connection name, unique within the endpoint
    pub name: String,

    /// Resource ID of the private link service
    #[serde(rename = "privateConnectionResourceID")]
    pub private_connection_resource_id: String,

    /// Sub-resources (group IDs) the connection targets
    #[serde(
        default,
        rename = "subresourceIDs",
        skip_serializing_if = "Option::is_none"
    )]
    pub subresource_ids: Option<Vec<String>>,
}

/// Observed state of an Azure private endpoint
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateEndpointStatus {
    /// Ready and Synced conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Provisioning state reported by Azure
    #[serde(default)]
    pub state: Option<String>,

    /// Human-readable detail about the state
    #[serde(default)]
    pub message: Option<String>,

    /// IDs of the network interfaces Azure created for the endpoint
    #[serde(default, rename = "networkInterfaces")]
    pub network_interface_ids: Vec<String>,

    /// Private IP address of the endpoint
    #[serde(default)]
    pub ip: Option<String>,

    /// Azure resource ID
    #[serde(default)]
    pub id: Option<String>,

    /// Azure etag
    #[serde(default)]
    pub etag: Option<String>,

    /// Azure resource type
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
}

impl PrivateEndpoint {
    /// Status, created empty on first use
    pub fn status_mut(&mut self) -> &mut PrivateEndpointStatus {
        self.status.get_or_insert_with(Default::default)
    }

    /// Set a condition on the status
    pub fn set_condition(&mut self, condition: Condition) {
        set_condition(&mut self.status_mut().conditions, condition);
    }
}
