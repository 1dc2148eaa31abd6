//! Microsoft.Network wire types (API version 2019-06-01)
//!
//! Every field is optional: requests leave out what the declaration does
//! not set and responses carry whatever Azure chose to return.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `Microsoft.Network/privateEndpoints`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateEndpoint {
    /// Resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resource type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// Etag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    /// Properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PrivateEndpointProperties>,
}

/// Properties of a private endpoint
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateEndpointProperties {
    /// Subnet the endpoint is placed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Subnet>,
    /// Network interfaces created for the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_interfaces: Option<Vec<NetworkInterface>>,
    /// Provisioning state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    /// Auto-approved connections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_link_service_connections: Option<Vec<PrivateLinkServiceConnection>>,
    /// Manually approved connections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_private_link_service_connections: Option<Vec<PrivateLinkServiceConnection>>,
}

/// Reference to a network interface
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct NetworkInterface {
    /// Resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Connection between a private endpoint and a private link service
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateLinkServiceConnection {
    /// Resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Connection name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Etag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PrivateLinkServiceConnectionProperties>,
}

/// Properties of a private link service connection
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateLinkServiceConnectionProperties {
    /// Resource ID of the private link service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_link_service_id: Option<String>,
    /// Sub-resources the connection targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<String>>,
    /// Message sent to the service owner with the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_message: Option<String>,
    /// Provisioning state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    /// Approval state reported by the service owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_link_service_connection_state: Option<PrivateLinkServiceConnectionState>,
}

/// Approval state of a private link service connection
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateLinkServiceConnectionState {
    /// Approved, Rejected, Pending or Removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Reason for the state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Required consumer actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions_required: Option<String>,
}

/// `Microsoft.Network/virtualNetworks`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetwork {
    /// Resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resource type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// Etag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    /// Properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<VirtualNetworkProperties>,
}

/// Properties of a virtual network
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    /// Address blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_space: Option<AddressSpace>,
    /// DDoS protection flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ddos_protection: Option<bool>,
    /// VM protection flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_vm_protection: Option<bool>,
    /// Provisioning state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    /// Azure-assigned GUID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,
}

/// Address blocks of a virtual network
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    /// CIDR prefixes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefixes: Option<Vec<String>>,
}

/// `Microsoft.Network/virtualNetworks/subnets`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    /// Resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resource type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// Etag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SubnetProperties>,
}

/// Properties of a subnet
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    /// CIDR prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    /// Service endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_endpoints: Option<Vec<ServiceEndpoint>>,
    /// Provisioning state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    /// Purpose set by a delegating service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// Service endpoint on a subnet
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    /// Service type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Regions the endpoint covers, filled in by Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    /// Provisioning state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_endpoint_response_decodes() {
        let body = r#"{
            "name": "db-endpoint",
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/privateEndpoints/db-endpoint",
            "etag": "W/\"1\"",
            "type": "Microsoft.Network/privateEndpoints",
            "location": "westeurope",
            "properties": {
                "provisioningState": "Succeeded",
                "subnet": {"id": "/subscriptions/s/subnets/data"},
                "networkInterfaces": [{"id": "/subscriptions/s/networkInterfaces/nic-1"}],
                "privateLinkServiceConnections": [{
                    "name": "db",
                    "id": "/subscriptions/s/privateEndpoints/db-endpoint/privateLinkServiceConnections/db",
                    "properties": {
                        "privateLinkServiceId": "pls-id",
                        "groupIds": ["sqlServer"],
                        "privateLinkServiceConnectionState": {"status": "Approved"}
                    }
                }],
                "manualPrivateLinkServiceConnections": []
            }
        }"#;
        let pe: PrivateEndpoint = serde_json::from_str(body).expect("decode");
        let props = pe.properties.expect("properties");
        assert_eq!(props.provisioning_state.as_deref(), Some("Succeeded"));
        let conn = &props.private_link_service_connections.expect("connections")[0];
        let conn_props = conn.properties.as_ref().expect("connection properties");
        assert_eq!(conn_props.private_link_service_id.as_deref(), Some("pls-id"));
        assert_eq!(conn_props.group_ids, Some(vec!["sqlServer".to_string()]));
        assert_eq!(props.manual_private_link_service_connections, Some(vec![]));
    }

    #[test]
    fn request_omits_unset_fields() {
        let vnet = VirtualNetwork {
            location: Some("westeurope".to_string()),
            properties: Some(VirtualNetworkProperties {
                enable_ddos_protection: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let value = serde_json::to_value(&vnet).expect("encode");
        assert_eq!(
            value,
            serde_json::json!({
                "location": "westeurope",
                "properties": {"enableDdosProtection": false}
            })
        );
    }
}
