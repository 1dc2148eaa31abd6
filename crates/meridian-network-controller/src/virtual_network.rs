//! VirtualNetwork external client

use async_trait::async_trait;
use meridian_azure::VirtualNetworksApi;
use meridian_common::crd::{Condition, ManagedKind, ManagedResource};
use meridian_common::{Error, Operation, Result};
use meridian_managed::{
    cancellable, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate,
};
use meridian_network::{
    new_virtual_network_parameters, project_virtual_network, virtual_network_needs_update,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::provider_error;

const KIND: ManagedKind = ManagedKind::VirtualNetwork;

/// Reconciles VirtualNetwork declarations against `Microsoft.Network/virtualNetworks`
pub struct VirtualNetworkExternal<C> {
    client: C,
}

impl<C: VirtualNetworksApi> VirtualNetworkExternal<C> {
    /// Bind to a provider client
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: VirtualNetworksApi + 'static> ExternalClient for VirtualNetworkExternal<C> {
    async fn observe(
        &self,
        cancel: &CancellationToken,
        mg: &mut ManagedResource,
    ) -> Result<ExternalObservation> {
        let name = mg.external_name();
        let vnet = mg.as_virtual_network_mut()?;

        let got = cancellable(
            cancel,
            Operation::Get,
            KIND,
            self.client.get(&vnet.spec.resource_group_name, &name),
        )
        .await?;
        let observed = match got {
            Ok(o) => o,
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(provider_error(Operation::Get, KIND, e)),
        };

        project_virtual_network(&observed).apply_to(vnet.status_mut());
        vnet.set_condition(Condition::available());
        Ok(ExternalObservation::present())
    }

    async fn create(
        &self,
        cancel: &CancellationToken,
        mg: &mut ManagedResource,
    ) -> Result<ExternalCreation> {
        let name = mg.external_name();
        let vnet = mg.as_virtual_network_mut()?;
        vnet.set_condition(Condition::creating());

        let params = new_virtual_network_parameters(&vnet.spec);
        cancellable(
            cancel,
            Operation::Create,
            KIND,
            self.client
                .create_or_update(&vnet.spec.resource_group_name, &name, &params),
        )
        .await?
        .map_err(|e| provider_error(Operation::Create, KIND, e))?;

        Ok(ExternalCreation::default())
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        mg: &mut ManagedResource,
    ) -> Result<ExternalUpdate> {
        let name = mg.external_name();
        let vnet = mg.as_virtual_network_mut()?;
        let resource_group = vnet.spec.resource_group_name.as_str();

        let got = cancellable(
            cancel,
            Operation::Get,
            KIND,
            self.client.get(resource_group, &name),
        )
        .await?;
        let observed = match got {
            Ok(o) => o,
            Err(e) if e.is_not_found() => return Err(Error::not_found(KIND, name)),
            Err(e) => return Err(provider_error(Operation::Get, KIND, e)),
        };

        let desired = new_virtual_network_parameters(&vnet.spec);
        if !virtual_network_needs_update(&desired, &observed) {
            return Ok(ExternalUpdate::default());
        }

        debug!(resource = %name, %resource_group, "virtual network drifted, updating");
        cancellable(
            cancel,
            Operation::Update,
            KIND,
            self.client.create_or_update(resource_group, &name, &desired),
        )
        .await?
        .map_err(|e| provider_error(Operation::Update, KIND, e))?;

        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cancel: &CancellationToken, mg: &mut ManagedResource) -> Result<()> {
        let name = mg.external_name();
        let vnet = mg.as_virtual_network_mut()?;
        vnet.set_condition(Condition::deleting());

        let deleted = cancellable(
            cancel,
            Operation::Delete,
            KIND,
            self.client.delete(&vnet.spec.resource_group_name, &name),
        )
        .await?;
        match deleted {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(provider_error(Operation::Delete, KIND, e)),
        }
    }
}
