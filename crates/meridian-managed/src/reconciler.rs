//! Managed resource reconciliation driver
//!
//! Drives one declaration through resolve, connect, observe and then
//! create or update (or delete when deletion was requested), persisting
//! conditions and publishing events along the way.

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Client, Resource, ResourceExt};
use meridian_common::crd::{Condition, DeletionPolicy, ManagedResource};
use meridian_common::events::{actions, reasons, EventPublisher, KubeEventPublisher};
use meridian_common::{Error, Result, MANAGED_FINALIZER};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::external::{ExternalClient, ExternalConnector};
use crate::publisher::{ConnectionPublisher, KubeConnectionPublisher};
use crate::reference::{resolve_references, KubeDirectory, ResourceDirectory};
use crate::store::{KubeManagedStore, ManagedStore};

/// Requeue after issuing a create or delete, to observe the outcome
pub const SHORT_WAIT: Duration = Duration::from_secs(30);

/// Requeue for a declaration that is in sync
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Requeue after a retryable error
pub const RETRY_INTERVAL: Duration = Duration::from_secs(15);

/// Requeue after an error that will not clear without a spec change
pub const PERMANENT_ERROR_INTERVAL: Duration = Duration::from_secs(300);

/// Shared state for managed controllers
pub struct ManagedContext {
    /// Writes status, spec, finalizers and annotations
    pub store: Arc<dyn ManagedStore>,
    /// Reads referenced declarations
    pub directory: Arc<dyn ResourceDirectory>,
    /// Produces external clients
    pub connector: Arc<dyn ExternalConnector>,
    /// Publishes connection details
    pub publisher: Arc<dyn ConnectionPublisher>,
    /// Publishes Kubernetes events
    pub events: Arc<dyn EventPublisher>,
    /// Cancelled on shutdown; each pass runs on a child token
    pub shutdown: CancellationToken,
}

impl ManagedContext {
    /// Wire the Kubernetes-backed collaborators around a connector
    pub fn new(
        client: Client,
        connector: Arc<dyn ExternalConnector>,
        controller_name: &str,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store: Arc::new(KubeManagedStore::new(client.clone())),
            directory: Arc::new(KubeDirectory::new(client.clone())),
            connector,
            publisher: Arc::new(KubeConnectionPublisher::new(client.clone())),
            events: Arc::new(KubeEventPublisher::new(client, controller_name)),
            shutdown,
        }
    }
}

// =============================================================================
// Reconcile
// =============================================================================

/// Controller entry point for any managed kind
#[instrument(skip(obj, ctx), fields(kind = %K::kind(&()), resource = %obj.name_any()))]
pub async fn reconcile<K>(obj: Arc<K>, ctx: Arc<ManagedContext>) -> Result<Action>
where
    K: Resource<DynamicType = ()> + Clone + Into<ManagedResource> + Send + Sync + 'static,
{
    reconcile_managed(obj.as_ref().clone().into(), &ctx).await
}

/// Run one reconcile pass over a declaration
pub async fn reconcile_managed(mut mg: ManagedResource, ctx: &ManagedContext) -> Result<Action> {
    let cancel = ctx.shutdown.child_token();

    if mg.is_being_deleted() {
        return reconcile_delete(mg, ctx, &cancel).await;
    }

    if !mg.has_finalizer(MANAGED_FINALIZER) {
        ctx.store.add_finalizer(&mg, MANAGED_FINALIZER).await?;
    }

    if mg.external_name_annotation().is_none() {
        let external_name = mg.external_name();
        ctx.store.set_external_name(&mg, &external_name).await?;
        mg.set_external_name(external_name);
    }

    match resolve_references(&mut mg, ctx.directory.as_ref()).await {
        Ok(true) => ctx.store.patch_spec(&mg).await?,
        Ok(false) => {}
        Err(e) => return fail(ctx, mg, reasons::CANNOT_RESOLVE_REFERENCES, actions::RESOLVE, e).await,
    }

    let external = match ctx.connector.connect(&mg).await {
        Ok(c) => c,
        Err(e) => return fail(ctx, mg, reasons::CANNOT_CONNECT, actions::CONNECT, e).await,
    };

    let observation = match external.observe(&cancel, &mut mg).await {
        Ok(o) => o,
        Err(e) => return fail(ctx, mg, reasons::CANNOT_OBSERVE, actions::OBSERVE, e).await,
    };

    if !observation.resource_exists {
        return create(external.as_ref(), mg, ctx, &cancel).await;
    }

    if let Err(e) = ctx.publisher.publish(&mg, &observation.connection_details).await {
        return fail(ctx, mg, reasons::CANNOT_OBSERVE, actions::OBSERVE, e).await;
    }

    let update = match external.update(&cancel, &mut mg).await {
        Ok(u) => u,
        Err(e) => return fail(ctx, mg, reasons::CANNOT_UPDATE, actions::UPDATE, e).await,
    };
    if let Err(e) = ctx.publisher.publish(&mg, &update.connection_details).await {
        return fail(ctx, mg, reasons::CANNOT_UPDATE, actions::UPDATE, e).await;
    }

    mg.set_condition(Condition::reconcile_success());
    ctx.store.patch_status(&mg).await?;
    debug!(kind = %mg.kind(), resource = %mg.name(), "external resource is up to date");
    Ok(Action::requeue(POLL_INTERVAL))
}

async fn create(
    external: &dyn ExternalClient,
    mut mg: ManagedResource,
    ctx: &ManagedContext,
    cancel: &CancellationToken,
) -> Result<Action> {
    let creation = match external.create(cancel, &mut mg).await {
        Ok(c) => c,
        Err(e) => return fail(ctx, mg, reasons::CANNOT_CREATE, actions::CREATE, e).await,
    };
    if let Err(e) = ctx.publisher.publish(&mg, &creation.connection_details).await {
        return fail(ctx, mg, reasons::CANNOT_CREATE, actions::CREATE, e).await;
    }

    info!(kind = %mg.kind(), resource = %mg.name(), external_name = %mg.external_name(), "created external resource");
    ctx.events
        .publish(
            &mg.object_ref(),
            EventType::Normal,
            reasons::CREATED_EXTERNAL_RESOURCE,
            actions::CREATE,
            Some(format!("Created {} {}", mg.kind(), mg.external_name())),
        )
        .await;

    mg.set_condition(Condition::reconcile_success());
    ctx.store.patch_status(&mg).await?;
    Ok(Action::requeue(SHORT_WAIT))
}

async fn reconcile_delete(
    mut mg: ManagedResource,
    ctx: &ManagedContext,
    cancel: &CancellationToken,
) -> Result<Action> {
    if !mg.has_finalizer(MANAGED_FINALIZER) {
        return Ok(Action::await_change());
    }

    if mg.resource_spec().deletion_policy == DeletionPolicy::Orphan {
        info!(kind = %mg.kind(), resource = %mg.name(), "orphaning external resource");
        ctx.store.remove_finalizer(&mg, MANAGED_FINALIZER).await?;
        return Ok(Action::await_change());
    }

    let external = match ctx.connector.connect(&mg).await {
        Ok(c) => c,
        Err(e) => return fail(ctx, mg, reasons::CANNOT_CONNECT, actions::CONNECT, e).await,
    };

    let observation = match external.observe(cancel, &mut mg).await {
        Ok(o) => o,
        Err(e) => return fail(ctx, mg, reasons::CANNOT_OBSERVE, actions::OBSERVE, e).await,
    };

    if observation.resource_exists {
        if let Err(e) = external.delete(cancel, &mut mg).await {
            return fail(ctx, mg, reasons::CANNOT_DELETE, actions::DELETE, e).await;
        }
        info!(kind = %mg.kind(), resource = %mg.name(), "deleting external resource");
        ctx.events
            .publish(
                &mg.object_ref(),
                EventType::Normal,
                reasons::DELETED_EXTERNAL_RESOURCE,
                actions::DELETE,
                Some(format!("Deleting {} {}", mg.kind(), mg.external_name())),
            )
            .await;
        mg.set_condition(Condition::reconcile_success());
        ctx.store.patch_status(&mg).await?;
        return Ok(Action::requeue(SHORT_WAIT));
    }

    ctx.store.remove_finalizer(&mg, MANAGED_FINALIZER).await?;
    info!(kind = %mg.kind(), resource = %mg.name(), "external resource gone, finalizer removed");
    Ok(Action::await_change())
}

/// Record a failed step: warning event, `Synced=False` condition, error out
async fn fail(
    ctx: &ManagedContext,
    mut mg: ManagedResource,
    reason: &str,
    action: &str,
    error: Error,
) -> Result<Action> {
    let message = error.to_string();
    warn!(kind = %mg.kind(), resource = %mg.name(), reason, error = %message, "reconcile step failed");
    ctx.events
        .publish(
            &mg.object_ref(),
            EventType::Warning,
            reason,
            action,
            Some(message.clone()),
        )
        .await;

    mg.set_condition(Condition::reconcile_error(message));
    if let Err(e) = ctx.store.patch_status(&mg).await {
        warn!(kind = %mg.kind(), resource = %mg.name(), error = %e, "cannot persist ReconcileError condition");
    }
    Err(error)
}

/// Error policy for managed controllers
pub fn error_policy<K: ResourceExt>(obj: Arc<K>, error: &Error, _ctx: Arc<ManagedContext>) -> Action {
    if error.is_retryable() {
        warn!(?error, resource = %obj.name_any(), "reconcile failed, retrying");
        Action::requeue(RETRY_INTERVAL)
    } else {
        error!(?error, resource = %obj.name_any(), "reconcile failed permanently until the spec changes");
        Action::requeue(PERMANENT_ERROR_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{
        ConnectionDetails, ExternalCreation, ExternalObservation, ExternalUpdate,
        MockExternalClient, MockExternalConnector,
    };
    use crate::publisher::MockConnectionPublisher;
    use crate::reference::MockResourceDirectory;
    use crate::store::MockManagedStore;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use meridian_common::crd::{
        reasons as condition_reasons, ConditionStatus, PrivateEndpoint, PrivateEndpointSpec,
        TYPE_SYNCED,
    };
    use meridian_common::events::NoopEventPublisher;
    use meridian_common::{Operation, EXTERNAL_NAME_ANNOTATION};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn sample_endpoint() -> ManagedResource {
        let spec: PrivateEndpointSpec = serde_json::from_str(
            r#"{
                "location": "westeurope",
                "resourceGroupName": "coolRG",
                "virtualNetworkSubnetId": "/subscriptions/s/subnets/coolSubnet"
            }"#,
        )
        .expect("parse");
        let mut pe = PrivateEndpoint::new("coolPrivateEndpoint", spec);
        pe.metadata.finalizers = Some(vec![MANAGED_FINALIZER.to_string()]);
        pe.metadata.annotations = Some(BTreeMap::from([(
            EXTERNAL_NAME_ANNOTATION.to_string(),
            "coolPrivateEndpoint".to_string(),
        )]));
        pe.into()
    }

    fn deleting(mut mg: ManagedResource) -> ManagedResource {
        mg.metadata_mut().deletion_timestamp = Some(Time(chrono::Utc::now()));
        mg
    }

    fn orphaned(mut mg: ManagedResource) -> ManagedResource {
        if let ManagedResource::PrivateEndpoint(pe) = &mut mg {
            pe.spec.resource_spec.deletion_policy = DeletionPolicy::Orphan;
        }
        mg
    }

    fn synced(mg: &ManagedResource) -> Option<(ConditionStatus, String)> {
        mg.conditions()
            .iter()
            .find(|c| c.type_ == TYPE_SYNCED)
            .map(|c| (c.status.clone(), c.reason.clone()))
    }

    fn connector_with(client: MockExternalClient) -> MockExternalConnector {
        let mut connector = MockExternalConnector::new();
        connector
            .expect_connect()
            .times(1)
            .return_once(move |_| Ok(Box::new(client) as Box<dyn ExternalClient>));
        connector
    }

    fn quiet_publisher() -> MockConnectionPublisher {
        let mut publisher = MockConnectionPublisher::new();
        publisher.expect_publish().returning(|_, _| Ok(()));
        publisher
    }

    fn context(
        store: MockManagedStore,
        connector: MockExternalConnector,
        publisher: MockConnectionPublisher,
    ) -> ManagedContext {
        ManagedContext {
            store: Arc::new(store),
            directory: Arc::new(MockResourceDirectory::new()),
            connector: Arc::new(connector),
            publisher: Arc::new(publisher),
            events: Arc::new(NoopEventPublisher),
            shutdown: CancellationToken::new(),
        }
    }

    // =========================================================================
    // Observe / Create / Update
    // =========================================================================

    #[tokio::test]
    async fn absent_resource_is_created_and_synced() {
        let mut client = MockExternalClient::new();
        client
            .expect_observe()
            .times(1)
            .returning(|_, _| Ok(ExternalObservation::absent()));
        client.expect_create().times(1).returning(|_, mg| {
            mg.set_condition(Condition::creating());
            Ok(ExternalCreation::default())
        });
        client.expect_update().never();

        let mut store = MockManagedStore::new();
        store
            .expect_patch_status()
            .withf(|mg| {
                synced(mg).is_some_and(|(status, reason)| {
                    status == ConditionStatus::True
                        && reason == condition_reasons::RECONCILE_SUCCESS
                })
            })
            .times(1)
            .returning(|_| Ok(()));

        let ctx = context(store, connector_with(client), quiet_publisher());
        let action = reconcile_managed(sample_endpoint(), &ctx)
            .await
            .expect("reconcile succeeds");

        assert_eq!(action, Action::requeue(SHORT_WAIT));
    }

    #[tokio::test]
    async fn existing_resource_is_updated_and_polled() {
        let mut client = MockExternalClient::new();
        client
            .expect_observe()
            .times(1)
            .returning(|_, _| Ok(ExternalObservation::present()));
        client.expect_create().never();
        client
            .expect_update()
            .times(1)
            .returning(|_, _| Ok(ExternalUpdate::default()));

        let mut store = MockManagedStore::new();
        store.expect_patch_status().times(1).returning(|_| Ok(()));

        let ctx = context(store, connector_with(client), quiet_publisher());
        let action = reconcile_managed(sample_endpoint(), &ctx)
            .await
            .expect("reconcile succeeds");

        assert_eq!(action, Action::requeue(POLL_INTERVAL));
    }

    #[tokio::test]
    async fn observed_and_updated_details_are_published() {
        let mut client = MockExternalClient::new();
        client.expect_observe().returning(|_, _| {
            Ok(ExternalObservation {
                resource_exists: true,
                connection_details: ConnectionDetails::from([("a".to_string(), b"1".to_vec())]),
            })
        });
        client.expect_update().returning(|_, _| {
            Ok(ExternalUpdate {
                connection_details: ConnectionDetails::from([("b".to_string(), b"2".to_vec())]),
            })
        });

        let mut publisher = MockConnectionPublisher::new();
        publisher
            .expect_publish()
            .withf(|_, details| details.contains_key("a"))
            .times(1)
            .returning(|_, _| Ok(()));
        publisher
            .expect_publish()
            .withf(|_, details| details.contains_key("b"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut store = MockManagedStore::new();
        store.expect_patch_status().returning(|_| Ok(()));

        let ctx = context(store, connector_with(client), publisher);
        reconcile_managed(sample_endpoint(), &ctx)
            .await
            .expect("reconcile succeeds");
    }

    #[tokio::test]
    async fn create_failure_persists_reconcile_error() {
        let mut client = MockExternalClient::new();
        client
            .expect_observe()
            .returning(|_, _| Ok(ExternalObservation::absent()));
        client.expect_create().returning(|_, mg| {
            mg.set_condition(Condition::creating());
            Err(Error::provider_call(
                Operation::Create,
                mg.kind(),
                std::io::Error::other("boom"),
            ))
        });

        let mut store = MockManagedStore::new();
        store
            .expect_patch_status()
            .withf(|mg| {
                let creating = mg
                    .conditions()
                    .iter()
                    .any(|c| c.reason == condition_reasons::CREATING);
                let failed = synced(mg).is_some_and(|(status, reason)| {
                    status == ConditionStatus::False
                        && reason == condition_reasons::RECONCILE_ERROR
                });
                creating && failed
            })
            .times(1)
            .returning(|_| Ok(()));

        let ctx = context(store, connector_with(client), quiet_publisher());
        let err = reconcile_managed(sample_endpoint(), &ctx)
            .await
            .expect_err("create fails");

        assert_eq!(err.to_string(), "cannot create PrivateEndpoint: boom");
    }

    #[tokio::test]
    async fn observe_failure_skips_create_and_update() {
        let mut client = MockExternalClient::new();
        client.expect_observe().returning(|_, mg| {
            Err(Error::provider_call(
                Operation::Get,
                mg.kind(),
                std::io::Error::other("throttled"),
            ))
        });
        client.expect_create().never();
        client.expect_update().never();

        let mut store = MockManagedStore::new();
        store.expect_patch_status().times(1).returning(|_| Ok(()));

        let ctx = context(store, connector_with(client), quiet_publisher());
        let err = reconcile_managed(sample_endpoint(), &ctx)
            .await
            .expect_err("observe fails");
        assert!(matches!(
            err,
            Error::ProviderCall {
                operation: Operation::Get,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        let mut connector = MockExternalConnector::new();
        connector
            .expect_connect()
            .returning(|_| Err(Error::auth("credentials missing clientSecret")));

        let mut store = MockManagedStore::new();
        store
            .expect_patch_status()
            .withf(|mg| synced(mg).is_some_and(|(s, _)| s == ConditionStatus::False))
            .times(1)
            .returning(|_| Ok(()));

        let ctx = context(store, connector, MockConnectionPublisher::new());
        let err = reconcile_managed(sample_endpoint(), &ctx)
            .await
            .expect_err("connect fails");
        assert!(matches!(err, Error::Auth { .. }));
    }

    // =========================================================================
    // First pass bookkeeping
    // =========================================================================

    #[tokio::test]
    async fn first_pass_adds_finalizer_and_external_name() {
        let mut mg = sample_endpoint();
        mg.metadata_mut().finalizers = None;
        mg.metadata_mut().annotations = None;

        let mut client = MockExternalClient::new();
        client
            .expect_observe()
            .returning(|_, _| Ok(ExternalObservation::present()));
        client
            .expect_update()
            .returning(|_, _| Ok(ExternalUpdate::default()));

        let mut store = MockManagedStore::new();
        store
            .expect_add_finalizer()
            .withf(|_, f| f == MANAGED_FINALIZER)
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set_external_name()
            .withf(|_, name| name == "coolPrivateEndpoint")
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_patch_status()
            .withf(|mg| mg.external_name_annotation() == Some("coolPrivateEndpoint"))
            .times(1)
            .returning(|_| Ok(()));

        let ctx = context(store, connector_with(client), quiet_publisher());
        reconcile_managed(mg, &ctx).await.expect("reconcile succeeds");
    }

    #[tokio::test]
    async fn resolution_failure_stops_before_connect() {
        let mut mg = sample_endpoint();
        if let ManagedResource::PrivateEndpoint(pe) = &mut mg {
            pe.spec.resource_group_name = String::new();
            pe.spec.resource_group_name_ref = Some(meridian_common::crd::Reference::new("gone"));
        }

        let mut directory = MockResourceDirectory::new();
        directory.expect_get().returning(|_, _| Ok(None));

        let mut connector = MockExternalConnector::new();
        connector.expect_connect().never();

        let mut store = MockManagedStore::new();
        store.expect_patch_spec().never();
        store
            .expect_patch_status()
            .withf(|mg| {
                mg.conditions()
                    .iter()
                    .any(|c| c.message.contains("cannot resolve spec.resourceGroupName"))
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut ctx = context(store, connector, MockConnectionPublisher::new());
        ctx.directory = Arc::new(directory);

        let err = reconcile_managed(mg, &ctx).await.expect_err("unresolved");
        assert!(err.is_reference_error());
    }

    #[tokio::test]
    async fn resolved_spec_is_persisted_before_connect() {
        let mut mg = sample_endpoint();
        if let ManagedResource::PrivateEndpoint(pe) = &mut mg {
            pe.spec.resource_group_name = String::new();
            pe.spec.resource_group_name_ref = Some(meridian_common::crd::Reference::new("core"));
        }

        let mut directory = MockResourceDirectory::new();
        directory.expect_get().returning(|_, name| {
            let spec = serde_json::from_str(r#"{"location": "westeurope"}"#).expect("parse");
            Ok(Some(
                meridian_common::crd::ResourceGroup::new(name, spec).into(),
            ))
        });

        let spec_persisted = Arc::new(AtomicBool::new(false));
        let mut store = MockManagedStore::new();
        {
            let flag = spec_persisted.clone();
            store
                .expect_patch_spec()
                .times(1)
                .returning(move |_| {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                });
        }
        store.expect_patch_status().returning(|_| Ok(()));

        let mut client = MockExternalClient::new();
        {
            let flag = spec_persisted.clone();
            client.expect_observe().returning(move |_, _| {
                assert!(flag.load(Ordering::SeqCst), "spec persisted before observe");
                Ok(ExternalObservation::present())
            });
        }
        client
            .expect_update()
            .returning(|_, _| Ok(ExternalUpdate::default()));

        let mut ctx = context(store, connector_with(client), quiet_publisher());
        ctx.directory = Arc::new(directory);

        reconcile_managed(mg, &ctx).await.expect("reconcile succeeds");
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    #[tokio::test]
    async fn orphan_policy_releases_without_touching_azure() {
        let mut connector = MockExternalConnector::new();
        connector.expect_connect().never();

        let mut store = MockManagedStore::new();
        store
            .expect_remove_finalizer()
            .times(1)
            .returning(|_, _| Ok(()));

        let ctx = context(store, connector, MockConnectionPublisher::new());
        let action = reconcile_managed(deleting(orphaned(sample_endpoint())), &ctx)
            .await
            .expect("orphaned");
        assert_eq!(action, Action::await_change());
    }

    #[tokio::test]
    async fn existing_resource_is_deleted_and_requeued() {
        let mut client = MockExternalClient::new();
        client
            .expect_observe()
            .returning(|_, _| Ok(ExternalObservation::present()));
        client.expect_delete().times(1).returning(|_, mg| {
            mg.set_condition(Condition::deleting());
            Ok(())
        });

        let mut store = MockManagedStore::new();
        store.expect_remove_finalizer().never();
        store
            .expect_patch_status()
            .withf(|mg| {
                mg.conditions()
                    .iter()
                    .any(|c| c.reason == condition_reasons::DELETING)
            })
            .times(1)
            .returning(|_| Ok(()));

        let ctx = context(store, connector_with(client), MockConnectionPublisher::new());
        let action = reconcile_managed(deleting(sample_endpoint()), &ctx)
            .await
            .expect("delete issued");
        assert_eq!(action, Action::requeue(SHORT_WAIT));
    }

    #[tokio::test]
    async fn gone_resource_releases_finalizer() {
        let mut client = MockExternalClient::new();
        client
            .expect_observe()
            .returning(|_, _| Ok(ExternalObservation::absent()));
        client.expect_delete().never();

        let mut store = MockManagedStore::new();
        store
            .expect_remove_finalizer()
            .withf(|_, f| f == MANAGED_FINALIZER)
            .times(1)
            .returning(|_, _| Ok(()));

        let ctx = context(store, connector_with(client), MockConnectionPublisher::new());
        let action = reconcile_managed(deleting(sample_endpoint()), &ctx)
            .await
            .expect("finalized");
        assert_eq!(action, Action::await_change());
    }

    #[tokio::test]
    async fn delete_failure_keeps_finalizer() {
        let mut client = MockExternalClient::new();
        client
            .expect_observe()
            .returning(|_, _| Ok(ExternalObservation::present()));
        client.expect_delete().returning(|_, mg| {
            Err(Error::provider_call(
                Operation::Delete,
                mg.kind(),
                std::io::Error::other("locked"),
            ))
        });

        let mut store = MockManagedStore::new();
        store.expect_remove_finalizer().never();
        store.expect_patch_status().times(1).returning(|_| Ok(()));

        let ctx = context(store, connector_with(client), MockConnectionPublisher::new());
        let err = reconcile_managed(deleting(sample_endpoint()), &ctx)
            .await
            .expect_err("delete fails");
        assert_eq!(err.to_string(), "cannot delete PrivateEndpoint: locked");
    }

    // =========================================================================
    // Error policy
    // =========================================================================

    #[test]
    fn error_policy_backs_off_permanent_errors() {
        let ctx = Arc::new(context(
            MockManagedStore::new(),
            MockExternalConnector::new(),
            MockConnectionPublisher::new(),
        ));
        let ManagedResource::PrivateEndpoint(pe) = sample_endpoint() else {
            unreachable!("fixture is a PrivateEndpoint");
        };
        let obj = Arc::new(pe);

        let retryable = Error::auth("expired");
        assert_eq!(
            error_policy(obj.clone(), &retryable, ctx.clone()),
            Action::requeue(RETRY_INTERVAL)
        );

        let permanent = Error::validation("bad location");
        assert_eq!(
            error_policy(obj, &permanent, ctx),
            Action::requeue(PERMANENT_ERROR_INTERVAL)
        );
    }
}
