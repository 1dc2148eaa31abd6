//! Endpoint configuration for Azure clients

use std::time::Duration;

use meridian_common::credentials::AzureCredentials;

/// Public-cloud Resource Manager endpoint
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// Public-cloud Microsoft Entra authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Per-request timeout applied to ARM and token calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where clients send requests
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AzureClientConfig {
    /// Resource Manager base URL
    pub arm_endpoint: String,
    /// Token authority base URL
    pub authority_host: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for AzureClientConfig {
    fn default() -> Self {
        Self {
            arm_endpoint: DEFAULT_ARM_ENDPOINT.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl AzureClientConfig {
    /// Apply endpoint overrides carried in the credentials blob
    pub fn for_credentials(&self, creds: &AzureCredentials) -> Self {
        let pick = |over: &Option<String>, default: &str| {
            over.as_deref()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(default)
                .trim_end_matches('/')
                .to_string()
        };
        Self {
            arm_endpoint: pick(&creds.resource_manager_endpoint_url, &self.arm_endpoint),
            authority_host: pick(&creds.active_directory_endpoint_url, &self.authority_host),
            request_timeout: self.request_timeout,
        }
    }
}
