//! Subnet external client

use async_trait::async_trait;
use meridian_azure::SubnetsApi;
use meridian_common::crd::{Condition, ManagedKind, ManagedResource};
use meridian_common::{Error, Operation, Result};
use meridian_managed::{
    cancellable, ExternalClient, ExternalCreation, ExternalObservation, ExternalUpdate,
};
use meridian_network::{new_subnet_parameters, project_subnet, subnet_needs_update};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::provider_error;

const KIND: ManagedKind = ManagedKind::Subnet;

/// Reconciles Subnet declarations against `Microsoft.Network/virtualNetworks/subnets`
pub struct SubnetExternal<C> {
    client: C,
}

impl<C: SubnetsApi> SubnetExternal<C> {
    /// Bind to a provider client
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: SubnetsApi + 'static> ExternalClient for SubnetExternal<C> {
    async fn observe(
        &self,
        cancel: &CancellationToken,
        mg: &mut ManagedResource,
    ) -> Result<ExternalObservation> {
        let name = mg.external_name();
        let subnet = mg.as_subnet_mut()?;

        let got = cancellable(
            cancel,
            Operation::Get,
            KIND,
            self.client.get(
                &subnet.spec.resource_group_name,
                &subnet.spec.virtual_network_name,
                &name,
            ),
        )
        .await?;
        let observed = match got {
            Ok(o) => o,
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(provider_error(Operation::Get, KIND, e)),
        };

        project_subnet(&observed).apply_to(subnet.status_mut());
        subnet.set_condition(Condition::available());
        Ok(ExternalObservation::present())
    }

    async fn create(
        &self,
        cancel: &CancellationToken,
        mg: &mut ManagedResource,
    ) -> Result<ExternalCreation> {
        let name = mg.external_name();
        let subnet = mg.as_subnet_mut()?;
        subnet.set_condition(Condition::creating());

        let params = new_subnet_parameters(&subnet.spec);
        cancellable(
            cancel,
            Operation::Create,
            KIND,
            self.client.create_or_update(
                &subnet.spec.resource_group_name,
                &subnet.spec.virtual_network_name,
                &name,
                &params,
            ),
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
        let subnet = mg.as_subnet_mut()?;
        let resource_group = subnet.spec.resource_group_name.as_str();
        let vnet = subnet.spec.virtual_network_name.as_str();

        let got = cancellable(
            cancel,
            Operation::Get,
            KIND,
            self.client.get(resource_group, vnet, &name),
        )
        .await?;
        let observed = match got {
            Ok(o) => o,
            Err(e) if e.is_not_found() => return Err(Error::not_found(KIND, name)),
            Err(e) => return Err(provider_error(Operation::Get, KIND, e)),
        };

        let desired = new_subnet_parameters(&subnet.spec);
        if !subnet_needs_update(&desired, &observed) {
            return Ok(ExternalUpdate::default());
        }

        debug!(resource = %name, %resource_group, virtual_network = %vnet, "subnet drifted, updating");
        cancellable(
            cancel,
            Operation::Update,
            KIND,
            self.client
                .create_or_update(resource_group, vnet, &name, &desired),
        )
        .await?
        .map_err(|e| provider_error(Operation::Update, KIND, e))?;

        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cancel: &CancellationToken, mg: &mut ManagedResource) -> Result<()> {
        let name = mg.external_name();
        let subnet = mg.as_subnet_mut()?;
        subnet.set_condition(Condition::deleting());

        let deleted = cancellable(
            cancel,
            Operation::Delete,
            KIND,
            self.client.delete(
                &subnet.spec.resource_group_name,
                &subnet.spec.virtual_network_name,
                &name,
            ),
        )
        .await?;
        match deleted {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(provider_error(Operation::Delete, KIND, e)),
        }
    }
}
