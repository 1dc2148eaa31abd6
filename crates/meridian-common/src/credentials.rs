//! Azure service principal credentials
//!
//! Parsed from the JSON blob stored in the Secret a ProviderConfig points at
//! (the format written by `az ad sp create-for-rbac --sdk-auth`).

use serde::Deserialize;

use crate::{Error, Result};

/// Service principal credentials scoped to one subscription
#[derive(Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureCredentials {
    /// Application (client) ID
    #[serde(default)]
    pub client_id: String,
    /// Client secret
    #[serde(default)]
    pub client_secret: String,
    /// Directory (tenant) ID
    #[serde(default)]
    pub tenant_id: String,
    /// Subscription the client is bound to
    #[serde(default)]
    pub subscription_id: String,
    /// Token authority override, e.g. for sovereign clouds
    #[serde(default)]
    pub active_directory_endpoint_url: Option<String>,
    /// Resource Manager endpoint override
    #[serde(default)]
    pub resource_manager_endpoint_url: Option<String>,
}

impl std::fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

impl AzureCredentials {
    /// Parse and validate credentials from raw Secret bytes
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let creds: Self = serde_json::from_slice(data)
            .map_err(|e| Error::auth(format!("cannot parse credentials: {e}")))?;
        creds.validate()?;
        Ok(creds)
    }

    /// Every required field must be non-empty
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("clientId", &self.client_id),
            ("clientSecret", &self.client_secret),
            ("tenantId", &self.tenant_id),
            ("subscriptionId", &self.subscription_id),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::auth(format!(
                "credentials missing {}",
                missing.join(", ")
            )))
        }
    }
}
