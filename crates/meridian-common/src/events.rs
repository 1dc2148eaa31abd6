//! Events recorded on managed declarations
//!
//! Each lifecycle failure and each accepted create or delete call shows up
//! under `kubectl describe` for the declaration. Recording never fails a
//! reconcile pass; a rejected event is logged and dropped.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

/// Records lifecycle events against a declaration
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Record `reason`/`action` on the declaration behind `declaration`,
    /// with an optional note such as the wrapped provider error
    async fn publish(
        &self,
        declaration: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// Publisher writing `events.k8s.io` events through the API server
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// `controller_name` becomes the reporting component, e.g.
    /// `managed/subnets.network.meridian.dev`. The pod name, when the
    /// downward API provides one, identifies the replica.
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        declaration: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, declaration).await {
            warn!(
                declaration = declaration.name.as_deref().unwrap_or_default(),
                reason,
                error = %e,
                "dropping event"
            );
        }
    }
}

/// Publisher that records nothing
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(
        &self,
        _declaration: &ObjectReference,
        _type_: EventType,
        _reason: &str,
        _action: &str,
        _note: Option<String>,
    ) {
    }
}

/// Event reasons, one per lifecycle step that can fail plus the two
/// accepted provider writes
pub mod reasons {
    /// Reference resolution failed
    pub const CANNOT_RESOLVE_REFERENCES: &str = "CannotResolveReferences";
    /// Credentials could not be obtained or a client could not be built
    pub const CANNOT_CONNECT: &str = "CannotConnect";
    /// Reading the external resource failed
    pub const CANNOT_OBSERVE: &str = "CannotObserve";
    /// Creating the external resource failed
    pub const CANNOT_CREATE: &str = "CannotCreate";
    /// Updating the external resource failed
    pub const CANNOT_UPDATE: &str = "CannotUpdate";
    /// Deleting the external resource failed
    pub const CANNOT_DELETE: &str = "CannotDelete";
    /// A create call was accepted by the provider
    pub const CREATED_EXTERNAL_RESOURCE: &str = "CreatedExternalResource";
    /// A delete call was accepted by the provider
    pub const DELETED_EXTERNAL_RESOURCE: &str = "DeletedExternalResource";
}

/// Event actions, the lifecycle step that was running
pub mod actions {
    /// Resolving cross-resource references
    pub const RESOLVE: &str = "ResolveReferences";
    /// Building a provider client
    pub const CONNECT: &str = "Connect";
    /// Reading the external resource
    pub const OBSERVE: &str = "Observe";
    /// Creating the external resource
    pub const CREATE: &str = "Create";
    /// Updating the external resource
    pub const UPDATE: &str = "Update";
    /// Deleting the external resource
    pub const DELETE: &str = "Delete";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reasons_pair_with_actions() {
        let pairs = [
            (reasons::CANNOT_RESOLVE_REFERENCES, actions::RESOLVE),
            (reasons::CANNOT_CONNECT, actions::CONNECT),
            (reasons::CANNOT_OBSERVE, actions::OBSERVE),
            (reasons::CANNOT_CREATE, actions::CREATE),
            (reasons::CANNOT_UPDATE, actions::UPDATE),
            (reasons::CANNOT_DELETE, actions::DELETE),
        ];
        for (reason, action) in pairs {
            assert_eq!(reason, format!("Cannot{action}"));
        }
    }

    #[tokio::test]
    async fn noop_publisher_accepts_warnings() {
        let declaration = ObjectReference {
            kind: Some("PrivateEndpoint".to_string()),
            name: Some("coolPrivateEndpoint".to_string()),
            ..Default::default()
        };
        NoopEventPublisher
            .publish(
                &declaration,
                EventType::Warning,
                reasons::CANNOT_CREATE,
                actions::CREATE,
                Some("cannot create PrivateEndpoint: boom".to_string()),
            )
            .await;
    }
}
