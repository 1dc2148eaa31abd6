//! ManagedResource: the declaration kinds a reconcile pass can be handed
//!
//! External clients receive a `ManagedResource` and check its kind before
//! touching it, so one client can never mutate another kind's status.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ObjectReference;
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};

use super::private_endpoint::PrivateEndpoint;
use super::resource_group::ResourceGroup;
use super::subnet::Subnet;
use super::types::{Condition, ResourceSpec};
use super::virtual_network::VirtualNetwork;
use crate::{Error, Result, EXTERNAL_NAME_ANNOTATION};

/// Kind of a managed declaration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManagedKind {
    /// Azure resource group
    ResourceGroup,
    /// Azure virtual network
    VirtualNetwork,
    /// Subnet of a virtual network
    Subnet,
    /// Azure private endpoint
    PrivateEndpoint,
}

impl std::fmt::Display for ManagedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResourceGroup => write!(f, "ResourceGroup"),
            Self::VirtualNetwork => write!(f, "VirtualNetwork"),
            Self::Subnet => write!(f, "Subnet"),
            Self::PrivateEndpoint => write!(f, "PrivateEndpoint"),
        }
    }
}

/// One declaration of any supported kind
#[derive(Clone, Debug, PartialEq)]
pub enum ManagedResource {
    /// A ResourceGroup declaration
    ResourceGroup(ResourceGroup),
    /// A VirtualNetwork declaration
    VirtualNetwork(VirtualNetwork),
    /// A Subnet declaration
    Subnet(Subnet),
    /// A PrivateEndpoint declaration
    PrivateEndpoint(PrivateEndpoint),
}

macro_rules! for_each_kind {
    ($self:expr, $r:ident => $body:expr) => {
        match $self {
            ManagedResource::ResourceGroup($r) => $body,
            ManagedResource::VirtualNetwork($r) => $body,
            ManagedResource::Subnet($r) => $body,
            ManagedResource::PrivateEndpoint($r) => $body,
        }
    };
}

macro_rules! managed_conversions {
    ($($kind:ident => $as_mut:ident),* $(,)?) => {
        $(
            impl From<$kind> for ManagedResource {
                fn from(r: $kind) -> Self {
                    ManagedResource::$kind(r)
                }
            }

            impl TryFrom<ManagedResource> for $kind {
                type Error = Error;

                fn try_from(mg: ManagedResource) -> Result<Self> {
                    match mg {
                        ManagedResource::$kind(r) => Ok(r),
                        other => Err(Error::wrong_kind(ManagedKind::$kind, other.kind())),
                    }
                }
            }

            impl ManagedResource {
                #[doc = concat!("Borrow as a ", stringify!($kind), ", failing with `WrongResourceKind` otherwise")]
                pub fn $as_mut(&mut self) -> Result<&mut $kind> {
                    match self {
                        ManagedResource::$kind(r) => Ok(r),
                        other => Err(Error::wrong_kind(ManagedKind::$kind, other.kind())),
                    }
                }
            }
        )*
    };
}

managed_conversions!(
    ResourceGroup => as_resource_group_mut,
    VirtualNetwork => as_virtual_network_mut,
    Subnet => as_subnet_mut,
    PrivateEndpoint => as_private_endpoint_mut,
);

impl ManagedResource {
    /// Kind of the wrapped declaration
    pub fn kind(&self) -> ManagedKind {
        match self {
            Self::ResourceGroup(_) => ManagedKind::ResourceGroup,
            Self::VirtualNetwork(_) => ManagedKind::VirtualNetwork,
            Self::Subnet(_) => ManagedKind::Subnet,
            Self::PrivateEndpoint(_) => ManagedKind::PrivateEndpoint,
        }
    }

    /// Object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        for_each_kind!(self, r => r.meta())
    }

    /// Mutable object metadata
    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        for_each_kind!(self, r => r.meta_mut())
    }

    /// Declaration name
    pub fn name(&self) -> String {
        for_each_kind!(self, r => r.name_any())
    }

    /// Declaration labels
    pub fn labels(&self) -> &BTreeMap<String, String> {
        for_each_kind!(self, r => r.labels())
    }

    /// External-name annotation, if set
    pub fn external_name_annotation(&self) -> Option<&str> {
        self.metadata()
            .annotations
            .as_ref()
            .and_then(|a| a.get(EXTERNAL_NAME_ANNOTATION))
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }

    /// Provider-side name: the external-name annotation or `metadata.name`
    pub fn external_name(&self) -> String {
        self.external_name_annotation()
            .map(str::to_string)
            .unwrap_or_else(|| self.name())
    }

    /// Set the external-name annotation
    pub fn set_external_name(&mut self, name: impl Into<String>) {
        self.metadata_mut()
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(EXTERNAL_NAME_ANNOTATION.to_string(), name.into());
    }

    /// Provider config, connection secret and deletion policy
    pub fn resource_spec(&self) -> &ResourceSpec {
        for_each_kind!(self, r => &r.spec.resource_spec)
    }

    /// Status conditions, empty when no status has been written yet
    pub fn conditions(&self) -> &[Condition] {
        for_each_kind!(self, r => r
            .status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default())
    }

    /// Set a condition, creating the status if needed
    pub fn set_condition(&mut self, condition: Condition) {
        for_each_kind!(self, r => r.set_condition(condition))
    }

    /// Whether deletion has been requested
    pub fn is_being_deleted(&self) -> bool {
        self.metadata().deletion_timestamp.is_some()
    }

    /// Whether the finalizer is present
    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        for_each_kind!(self, r => r.finalizers().iter().any(|f| f == finalizer))
    }

    /// Object reference for events
    pub fn object_ref(&self) -> ObjectReference {
        for_each_kind!(self, r => r.object_ref(&()))
    }

    /// Spec as JSON, used for spec patches after reference resolution
    pub fn spec_json(&self) -> Result<serde_json::Value> {
        Ok(for_each_kind!(self, r => serde_json::to_value(&r.spec))?)
    }

    /// Status as JSON, `null` when no status has been written
    pub fn status_json(&self) -> Result<serde_json::Value> {
        Ok(for_each_kind!(self, r => serde_json::to_value(&r.status))?)
    }
}
