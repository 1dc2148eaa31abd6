//! The external-resource lifecycle contract
//!
//! An [`ExternalConnector`] turns a declaration into a bound
//! [`ExternalClient`]; the client observes, creates, updates and deletes
//! the provider-side object behind it. Each operation checks that it was
//! handed the kind it manages before doing anything else.

use std::collections::BTreeMap;
use std::future::Future;

use async_trait::async_trait;
use meridian_common::crd::{ManagedKind, ManagedResource};
use meridian_common::{Error, Operation, Result};
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

/// Secret values to publish for consumers of the external resource
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// Result of an observe call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExternalObservation {
    /// Whether the external resource exists
    pub resource_exists: bool,
    /// Details to publish
    pub connection_details: ConnectionDetails,
}

impl ExternalObservation {
    /// The external resource does not exist
    pub fn absent() -> Self {
        Self::default()
    }

    /// The external resource exists and has no details to publish
    pub fn present() -> Self {
        Self {
            resource_exists: true,
            connection_details: ConnectionDetails::new(),
        }
    }
}

/// Result of a create call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExternalCreation {
    /// Details to publish
    pub connection_details: ConnectionDetails,
}

/// Result of an update call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExternalUpdate {
    /// Details to publish
    pub connection_details: ConnectionDetails,
}

/// Lifecycle operations against one provider-side object
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExternalClient: Send + Sync {
    /// Read the external object and project its state onto the status.
    ///
    /// A missing object is `Ok` with `resource_exists == false`.
    async fn observe(
        &self,
        cancel: &CancellationToken,
        mg: &mut ManagedResource,
    ) -> Result<ExternalObservation>;

    /// Create the external object. Only called after observe reported it
    /// absent.
    async fn create(
        &self,
        cancel: &CancellationToken,
        mg: &mut ManagedResource,
    ) -> Result<ExternalCreation>;

    /// Converge the external object on the declaration, writing only if it
    /// drifted.
    async fn update(
        &self,
        cancel: &CancellationToken,
        mg: &mut ManagedResource,
    ) -> Result<ExternalUpdate>;

    /// Delete the external object; an already missing object is success
    async fn delete(&self, cancel: &CancellationToken, mg: &mut ManagedResource) -> Result<()>;
}

/// Produces a client bound to the credentials a declaration selects
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExternalConnector: Send + Sync {
    /// Build a fresh client for this declaration
    async fn connect(&self, mg: &ManagedResource) -> Result<Box<dyn ExternalClient>>;
}

/// Race a provider call against the pass's cancellation token
pub async fn cancellable<F>(
    cancel: &CancellationToken,
    operation: Operation,
    kind: ManagedKind,
    call: F,
) -> Result<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::cancelled(operation, kind)),
        out = call => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completed_call_passes_through() {
        let cancel = CancellationToken::new();
        let out = cancellable(&cancel, Operation::Get, ManagedKind::Subnet, async { 7 })
            .await
            .expect("not cancelled");
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn cancelled_token_interrupts_pending_call() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = cancellable(
            &cancel,
            Operation::Create,
            ManagedKind::PrivateEndpoint,
            std::future::pending::<()>(),
        )
        .await;

        match result {
            Err(Error::Cancelled { operation, kind }) => {
                assert_eq!(operation, Operation::Create);
                assert_eq!(kind, ManagedKind::PrivateEndpoint);
            }
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelling_parent_cancels_child_pass() {
        let parent = CancellationToken::new();
        let pass = parent.child_token();
        parent.cancel();

        let result = cancellable(
            &pass,
            Operation::Delete,
            ManagedKind::Subnet,
            std::future::pending::<()>(),
        )
        .await;
        assert!(matches!(result, Err(Error::Cancelled { .. })));
    }

    #[test]
    fn observation_constructors() {
        assert!(!ExternalObservation::absent().resource_exists);
        assert!(ExternalObservation::present().resource_exists);
        assert!(ExternalObservation::present().connection_details.is_empty());
    }
}
