//! Writes back to managed declarations: status, resolved spec, finalizer
//! and external-name annotation

use async_trait::async_trait;
use kube::api::{ApiResource, DynamicObject, Patch, PatchParams};
use kube::{Api, Client};
use meridian_common::crd::{
    ManagedKind, ManagedResource, PrivateEndpoint, ResourceGroup, Subnet, VirtualNetwork,
};
use meridian_common::{Result, EXTERNAL_NAME_ANNOTATION, FIELD_MANAGER};
#[cfg(test)]
use mockall::automock;
use serde_json::json;
use tracing::debug;

/// Persistence for a declaration being reconciled
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ManagedStore: Send + Sync {
    /// Persist the declaration's status
    async fn patch_status(&self, mg: &ManagedResource) -> Result<()>;

    /// Persist the declaration's spec after reference resolution
    async fn patch_spec(&self, mg: &ManagedResource) -> Result<()>;

    /// Add a finalizer
    async fn add_finalizer(&self, mg: &ManagedResource, finalizer: &str) -> Result<()>;

    /// Remove a finalizer; a declaration already gone is success
    async fn remove_finalizer(&self, mg: &ManagedResource, finalizer: &str) -> Result<()>;

    /// Record the provider-side name in the external-name annotation
    async fn set_external_name(&self, mg: &ManagedResource, external_name: &str) -> Result<()>;
}

/// Store backed by the Kubernetes API
pub struct KubeManagedStore {
    client: Client,
}

impl KubeManagedStore {
    /// Create a store writing through the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, kind: ManagedKind) -> Api<DynamicObject> {
        let ar = api_resource(kind);
        Api::all_with(self.client.clone(), &ar)
    }
}

/// Merge patch carrying the whole status. Cleared fields serialize as
/// `null` so the server drops values Azure no longer reports.
fn status_patch(mg: &ManagedResource) -> Result<serde_json::Value> {
    Ok(json!({ "status": mg.status_json()? }))
}

fn api_resource(kind: ManagedKind) -> ApiResource {
    match kind {
        ManagedKind::ResourceGroup => ApiResource::erase::<ResourceGroup>(&()),
        ManagedKind::VirtualNetwork => ApiResource::erase::<VirtualNetwork>(&()),
        ManagedKind::Subnet => ApiResource::erase::<Subnet>(&()),
        ManagedKind::PrivateEndpoint => ApiResource::erase::<PrivateEndpoint>(&()),
    }
}

#[async_trait]
impl ManagedStore for KubeManagedStore {
    async fn patch_status(&self, mg: &ManagedResource) -> Result<()> {
        let patch = status_patch(mg)?;
        self.api(mg.kind())
            .patch_status(
                &mg.name(),
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?;
        Ok(())
    }

    async fn patch_spec(&self, mg: &ManagedResource) -> Result<()> {
        let patch = json!({ "spec": mg.spec_json()? });
        self.api(mg.kind())
            .patch(
                &mg.name(),
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?;
        debug!(kind = %mg.kind(), name = %mg.name(), "persisted resolved references");
        Ok(())
    }

    async fn add_finalizer(&self, mg: &ManagedResource, finalizer: &str) -> Result<()> {
        let api = self.api(mg.kind());
        let name = mg.name();
        let current = api.get(&name).await?;
        let mut finalizers = current.metadata.finalizers.unwrap_or_default();
        if finalizers.iter().any(|f| f == finalizer) {
            return Ok(());
        }
        finalizers.push(finalizer.to_string());

        let patch = json!({ "metadata": { "finalizers": finalizers } });
        api.patch(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        debug!(kind = %mg.kind(), %name, "added finalizer");
        Ok(())
    }

    async fn remove_finalizer(&self, mg: &ManagedResource, finalizer: &str) -> Result<()> {
        let api = self.api(mg.kind());
        let name = mg.name();
        let Some(current) = api.get_opt(&name).await? else {
            return Ok(());
        };
        let finalizers: Vec<String> = current
            .metadata
            .finalizers
            .unwrap_or_default()
            .into_iter()
            .filter(|f| f != finalizer)
            .collect();

        let patch = json!({ "metadata": { "finalizers": finalizers } });
        match api
            .patch(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => {}
            Err(kube::Error::Api(ae)) if ae.code == 404 => {}
            Err(e) => return Err(e.into()),
        }
        debug!(kind = %mg.kind(), %name, "removed finalizer");
        Ok(())
    }

    async fn set_external_name(&self, mg: &ManagedResource, external_name: &str) -> Result<()> {
        let mut annotations = serde_json::Map::new();
        annotations.insert(EXTERNAL_NAME_ANNOTATION.to_string(), json!(external_name));
        let patch = json!({ "metadata": { "annotations": annotations } });
        self.api(mg.kind())
            .patch(
                &mg.name(),
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?;
        Ok(())
    }
}
