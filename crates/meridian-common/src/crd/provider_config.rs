//! ProviderConfig CRD for registering Azure credentials
//!
//! A ProviderConfig names the Secret holding a service principal's
//! credentials. Managed resources pick one through `providerConfigRef`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProviderConfig points at the credentials used to reach Azure.
///
/// Example:
/// ```yaml
/// apiVersion: azure.meridian.dev/v1beta1
/// kind: ProviderConfig
/// metadata:
///   name: default
/// spec:
///   credentialsSecretRef:
///     namespace: meridian-system
///     name: azure-creds
///     key: credentials
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "azure.meridian.dev",
    version = "v1beta1",
    kind = "ProviderConfig",
    printcolumn = r#"{"name":"Secret","type":"string","jsonPath":".spec.credentialsSecretRef.name"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// Secret key holding the credentials JSON
    pub credentials_secret_ref: SecretKeySelector,
}

/// A key inside a namespaced Secret
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SecretKeySelector {
    /// Secret namespace
    pub namespace: String,
    /// Secret name
    pub name: String,
    /// Key within the Secret's data
    pub key: String,
}
