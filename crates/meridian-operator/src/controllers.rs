//! Controller runner - builds one controller future per managed kind

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, Resource};
use meridian_common::crd::{ManagedResource, PrivateEndpoint, Subnet, VirtualNetwork};
use meridian_managed::{error_policy, reconcile, ExternalConnector, ManagedContext};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
const WATCH_TIMEOUT_SECS: u32 = 25;

/// Boxed controller future
pub type ControllerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Build controllers for every reconciled network kind
pub fn build_network_controllers(
    client: Client,
    connector: Arc<dyn ExternalConnector>,
    shutdown: CancellationToken,
) -> Vec<ControllerFuture> {
    vec![
        managed_controller::<VirtualNetwork>(client.clone(), connector.clone(), shutdown.clone()),
        managed_controller::<Subnet>(client.clone(), connector.clone(), shutdown.clone()),
        managed_controller::<PrivateEndpoint>(client, connector, shutdown),
    ]
}

fn managed_controller<K>(
    client: Client,
    connector: Arc<dyn ExternalConnector>,
    shutdown: CancellationToken,
) -> ControllerFuture
where
    K: Resource<DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Into<ManagedResource>
        + Send
        + Sync
        + 'static,
{
    let name = controller_name::<K>();
    let ctx = Arc::new(ManagedContext::new(
        client.clone(),
        connector,
        &name,
        shutdown,
    ));
    let api: Api<K> = Api::all(client);

    tracing::info!(controller = %name, "- {} controller", K::kind(&()));

    Box::pin(
        Controller::new(api, WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS))
            .shutdown_on_signal()
            .run(reconcile::<K>, error_policy::<K>, ctx)
            .for_each(log_reconcile_result(K::kind(&()).to_string())),
    )
}

/// Reporting component recorded on events, e.g.
/// `managed/privateendpoints.network.meridian.dev`
fn controller_name<K: Resource<DynamicType = ()>>() -> String {
    format!("managed/{}.{}", K::plural(&()), K::group(&()))
}

fn log_reconcile_result<T: Debug, E: Debug>(
    kind: String,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", kind),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", kind),
        }
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_names_follow_crd_names() {
        assert_eq!(
            controller_name::<PrivateEndpoint>(),
            "managed/privateendpoints.network.meridian.dev"
        );
        assert_eq!(
            controller_name::<Subnet>(),
            "managed/subnets.network.meridian.dev"
        );
    }
}
