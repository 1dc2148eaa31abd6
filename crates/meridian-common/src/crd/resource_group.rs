//! ResourceGroup CRD
//!
//! Declares an Azure resource group so other declarations can reference it
//! by name or label. Its external name is the Azure resource group name.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{set_condition, Condition, ResourceSpec};

/// Declared Azure resource group
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "azure.meridian.dev",
    version = "v1beta1",
    kind = "ResourceGroup",
    status = "ResourceGroupStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Location","type":"string","jsonPath":".spec.location"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupSpec {
    /// Provider config, connection secret and deletion policy
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Azure location
    pub location: String,

    /// Resource tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// Observed state of a resource group
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupStatus {
    /// Ready and Synced conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ResourceGroup {
    /// Status, created empty on first use
    pub fn status_mut(&mut self) -> &mut ResourceGroupStatus {
        self.status.get_or_insert_with(Default::default)
    }

    /// Set a condition on the status
    pub fn set_condition(&mut self, condition: Condition) {
        set_condition(&mut self.status_mut().conditions, condition);
    }
}
