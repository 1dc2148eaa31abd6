//! Common types for Meridian: CRDs, conditions, errors and utilities

#![deny(missing_docs)]

pub mod credentials;
pub mod crd;
pub mod error;
pub mod events;
pub mod telemetry;

pub use error::{Error, Operation};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Annotation carrying the provider-side name of a managed resource
pub const EXTERNAL_NAME_ANNOTATION: &str = "meridian.dev/external-name";

/// Finalizer held on managed resources until the external resource is gone
pub const MANAGED_FINALIZER: &str = "finalizer.managedresource.meridian.dev";

/// Field manager used for server-side patches
pub const FIELD_MANAGER: &str = "meridian-operator";
