//! Error types for the Meridian operator
//!
//! Errors are structured with fields to aid debugging in production.
//! Provider failures keep the originating error as their source so the
//! full chain is available to logs and conditions.

use thiserror::Error;

use crate::crd::ManagedKind;

/// Boxed error returned by an external provider call
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lifecycle operation performed against the external provider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Read the external resource
    Get,
    /// Create the external resource
    Create,
    /// Update the external resource in place
    Update,
    /// Delete the external resource
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Main error type for Meridian operations
#[derive(Debug, Error)]
pub enum Error {
    /// An external client was handed a managed resource of another kind
    #[error("managed resource is not a {expected} (got {actual})")]
    WrongResourceKind {
        /// Kind the client manages
        expected: ManagedKind,
        /// Kind of the resource it received
        actual: ManagedKind,
    },

    /// The external resource vanished between observe and update
    #[error("{kind} {name} not found")]
    NotFound {
        /// Kind of the missing resource
        kind: ManagedKind,
        /// External name of the missing resource
        name: String,
    },

    /// A by-name reference points at a resource that does not exist
    #[error("cannot resolve {field}: referenced {kind} {name} not found")]
    ReferenceNotFound {
        /// Spec field being resolved
        field: String,
        /// Kind of the referenced resource
        kind: ManagedKind,
        /// Name of the referenced resource
        name: String,
    },

    /// A selector matched no candidate resources
    #[error("cannot resolve {field}: no {kind} matches selector")]
    NoMatch {
        /// Spec field being resolved
        field: String,
        /// Kind of the candidate resources
        kind: ManagedKind,
    },

    /// A selector matched more than one candidate resource
    #[error("cannot resolve {field}: {count} {kind} resources match selector")]
    AmbiguousMatch {
        /// Spec field being resolved
        field: String,
        /// Kind of the candidate resources
        kind: ManagedKind,
        /// Number of matches
        count: usize,
    },

    /// The referenced resource exists but has not produced the value yet
    #[error("cannot resolve {field}: referenced {kind} {name} is not ready")]
    NotReady {
        /// Spec field being resolved
        field: String,
        /// Kind of the referenced resource
        kind: ManagedKind,
        /// Name of the referenced resource
        name: String,
    },

    /// Credentials were missing, incomplete or rejected
    #[error("cannot connect to Azure: {message}")]
    Auth {
        /// Description of what failed
        message: String,
    },

    /// The provider rejected or failed a lifecycle call
    #[error("cannot {operation} {kind}: {source}")]
    ProviderCall {
        /// Operation that failed
        operation: Operation,
        /// Kind of the managed resource
        kind: ManagedKind,
        /// The underlying provider error
        #[source]
        source: BoxError,
    },

    /// The reconcile pass was cancelled while a provider call was in flight
    #[error("{operation} {kind} cancelled")]
    Cancelled {
        /// Operation that was interrupted
        operation: Operation,
        /// Kind of the managed resource
        kind: ManagedKind,
    },

    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Validation error for CRD specs or credentials
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.location")
        field: Option<String>,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a kind mismatch error
    pub fn wrong_kind(expected: ManagedKind, actual: ManagedKind) -> Self {
        Self::WrongResourceKind { expected, actual }
    }

    /// Create a not-found error for an external resource
    pub fn not_found(kind: ManagedKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth {
            message: msg.into(),
        }
    }

    /// Wrap a provider failure with the operation and kind it belongs to
    pub fn provider_call(
        operation: Operation,
        kind: ManagedKind,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ProviderCall {
            operation,
            kind,
            source: source.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: Operation, kind: ManagedKind) -> Self {
        Self::Cancelled { operation, kind }
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with a field path
    pub fn validation_for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Kind mismatches, validation and serialization errors need a code or
    /// config fix. Reference errors clear up once the referenced resource
    /// appears or becomes ready, so they are retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => {
                // Don't retry on 4xx errors (validation, not found, etc.)
                // except conflicts and throttling
                !matches!(
                    source,
                    kube::Error::Api(ae)
                        if (400..500).contains(&ae.code) && ae.code != 409 && ae.code != 429
                )
            }
            Error::WrongResourceKind { .. } => false,
            Error::Validation { .. } => false,
            Error::Serialization { .. } => false,
            Error::NotFound { .. }
            | Error::ReferenceNotFound { .. }
            | Error::NoMatch { .. }
            | Error::AmbiguousMatch { .. }
            | Error::NotReady { .. }
            | Error::Auth { .. }
            | Error::ProviderCall { .. }
            | Error::Cancelled { .. } => true,
        }
    }

    /// Whether this error came out of reference resolution
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Error::ReferenceNotFound { .. }
                | Error::NoMatch { .. }
                | Error::AmbiguousMatch { .. }
                | Error::NotReady { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}
