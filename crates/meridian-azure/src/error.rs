//! Errors returned by the Azure Resource Manager client

use serde::Deserialize;
use thiserror::Error;

/// ARM error codes that mean the addressed resource does not exist
const NOT_FOUND_CODES: &[&str] = &["ResourceNotFound", "NotFound", "ResourceGroupNotFound"];

/// Failure talking to Azure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AzureError {
    /// ARM answered with an error body
    #[error("{code}: {message} (HTTP {status})")]
    Api {
        /// HTTP status code
        status: u16,
        /// ARM error code, e.g. `ResourceNotFound`
        code: String,
        /// ARM error message
        message: String,
    },

    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(String),

    /// Acquiring a bearer token failed
    #[error("token request failed: {0}")]
    Token(String),

    /// The response body could not be decoded
    #[error("cannot decode response: {0}")]
    Decode(String),
}

impl AzureError {
    /// Create an API error
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether the addressed resource does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { status, code, .. } => {
                *status == 404 || NOT_FOUND_CODES.contains(&code.as_str())
            }
            _ => false,
        }
    }

    /// Whether the credentials were rejected, either by the token endpoint
    /// or by ARM itself
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Token(_) => true,
            Self::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// Build an API error from an ARM error response body
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            error: Body,
        }
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            code: String,
            #[serde(default)]
            message: String,
        }

        match serde_json::from_str::<Envelope>(body) {
            Ok(e) => Self::api(status, e.error.code, e.error.message),
            Err(_) => Self::api(status, format!("HTTP{status}"), body.trim()),
        }
    }
}

impl From<reqwest::Error> for AzureError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
