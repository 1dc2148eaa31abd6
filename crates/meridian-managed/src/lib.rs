//! Managed resource lifecycle for Meridian
//!
//! Kind-agnostic pieces shared by every managed controller:
//! - the [`ExternalClient`] / [`ExternalConnector`] contract
//! - reference resolution against other declarations
//! - credential lookup and connection secret publishing
//! - the reconcile driver and its error policy

#![deny(missing_docs)]

pub mod credentials;
pub mod external;
pub mod publisher;
pub mod reconciler;
pub mod reference;
pub mod store;

pub use credentials::{CredentialSource, KubeCredentialSource};
pub use external::{
    cancellable, ConnectionDetails, ExternalClient, ExternalConnector, ExternalCreation,
    ExternalObservation, ExternalUpdate,
};
pub use publisher::{ConnectionPublisher, KubeConnectionPublisher};
pub use reconciler::{error_policy, reconcile, reconcile_managed, ManagedContext};
pub use reference::{resolve_references, KubeDirectory, ResourceDirectory, Resolver};
pub use store::{KubeManagedStore, ManagedStore};
