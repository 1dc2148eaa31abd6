//! Connection secret publishing

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::ByteString;
use kube::api::{ObjectMeta, Patch, PatchParams};
use kube::{Api, Client};
use meridian_common::crd::{ManagedResource, SecretReference};
use meridian_common::{Result, FIELD_MANAGER};
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::external::ConnectionDetails;

/// Writes connection details where consumers can read them
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConnectionPublisher: Send + Sync {
    /// Publish the details for a declaration. A no-op when the declaration
    /// names no target or there is nothing to publish.
    async fn publish(&self, mg: &ManagedResource, details: &ConnectionDetails) -> Result<()>;
}

/// Publishes into the Secret named by `writeConnectionSecretToRef`
pub struct KubeConnectionPublisher {
    client: Client,
}

impl KubeConnectionPublisher {
    /// Create a publisher writing through the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConnectionPublisher for KubeConnectionPublisher {
    async fn publish(&self, mg: &ManagedResource, details: &ConnectionDetails) -> Result<()> {
        let Some(target) = mg.resource_spec().write_connection_secret_to_ref.as_ref() else {
            return Ok(());
        };
        if details.is_empty() {
            return Ok(());
        }

        let secret = connection_secret(mg, target, details);
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &target.namespace);
        api.patch(
            &target.name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&secret),
        )
        .await?;

        debug!(
            secret = %target.name,
            namespace = %target.namespace,
            keys = details.len(),
            "published connection details"
        );
        Ok(())
    }
}

/// Build the connection Secret, owned by the declaration
pub fn connection_secret(
    mg: &ManagedResource,
    target: &SecretReference,
    details: &ConnectionDetails,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(target.name.clone()),
            namespace: Some(target.namespace.clone()),
            owner_references: owner_reference(mg).map(|o| vec![o]),
            ..Default::default()
        },
        data: Some(
            details
                .iter()
                .map(|(k, v)| (k.clone(), ByteString(v.clone())))
                .collect(),
        ),
        type_: Some("connection.meridian.dev/v1alpha1".to_string()),
        ..Default::default()
    }
}

fn owner_reference(mg: &ManagedResource) -> Option<OwnerReference> {
    let r = mg.object_ref();
    Some(OwnerReference {
        api_version: r.api_version?,
        kind: r.kind?,
        name: r.name?,
        uid: r.uid?,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}
