//! Cross-resource reference resolution
//!
//! A spec field can be given directly, through a by-name reference to
//! another declaration, or through a label selector matching exactly one
//! declaration. Resolution reads the referenced declaration and extracts
//! the value (its external name, or for subnets the observed Azure ID).
//!
//! All fields of a declaration are resolved against a copy of its spec and
//! written back only if every field succeeds.

use async_trait::async_trait;
use kube::api::ListParams;
use kube::{Api, Client};
use meridian_common::crd::{
    ManagedKind, ManagedResource, PrivateEndpoint, PrivateEndpointSpec, Reference, ResourceGroup,
    Selector, Subnet, SubnetSpec, VirtualNetwork, VirtualNetworkSpec,
};
use meridian_common::{Error, Result};
#[cfg(test)]
use mockall::automock;
use tracing::debug;

/// Read access to the declarations a reference can point at
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    /// Fetch a declaration by name, `None` if it does not exist
    async fn get(&self, kind: ManagedKind, name: &str) -> Result<Option<ManagedResource>>;

    /// List declarations of a kind carrying every selector label
    async fn list(&self, kind: ManagedKind, selector: &Selector) -> Result<Vec<ManagedResource>>;
}

/// Directory backed by the Kubernetes API
pub struct KubeDirectory {
    client: Client,
}

impl KubeDirectory {
    /// Create a directory reading through the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceDirectory for KubeDirectory {
    async fn get(&self, kind: ManagedKind, name: &str) -> Result<Option<ManagedResource>> {
        let client = self.client.clone();
        let found = match kind {
            ManagedKind::ResourceGroup => Api::<ResourceGroup>::all(client)
                .get_opt(name)
                .await?
                .map(Into::into),
            ManagedKind::VirtualNetwork => Api::<VirtualNetwork>::all(client)
                .get_opt(name)
                .await?
                .map(Into::into),
            ManagedKind::Subnet => Api::<Subnet>::all(client)
                .get_opt(name)
                .await?
                .map(Into::into),
            ManagedKind::PrivateEndpoint => Api::<PrivateEndpoint>::all(client)
                .get_opt(name)
                .await?
                .map(Into::into),
        };
        Ok(found)
    }

    async fn list(&self, kind: ManagedKind, selector: &Selector) -> Result<Vec<ManagedResource>> {
        let client = self.client.clone();
        let lp = ListParams::default().labels(&selector.to_label_selector());
        let items = match kind {
            ManagedKind::ResourceGroup => {
                into_managed(Api::<ResourceGroup>::all(client).list(&lp).await?.items)
            }
            ManagedKind::VirtualNetwork => {
                into_managed(Api::<VirtualNetwork>::all(client).list(&lp).await?.items)
            }
            ManagedKind::Subnet => into_managed(Api::<Subnet>::all(client).list(&lp).await?.items),
            ManagedKind::PrivateEndpoint => {
                into_managed(Api::<PrivateEndpoint>::all(client).list(&lp).await?.items)
            }
        };
        Ok(items)
    }
}

fn into_managed<K: Into<ManagedResource>>(items: Vec<K>) -> Vec<ManagedResource> {
    items.into_iter().map(Into::into).collect()
}

/// Reads the value a reference resolves to out of the referenced declaration.
///
/// An empty string means the value is not available yet.
pub type Extractor = fn(&ManagedResource) -> String;

/// Value extractors for the supported reference targets
pub mod extract {
    use meridian_common::crd::ManagedResource;

    /// The provider-side name of the referenced declaration
    pub fn external_name(mg: &ManagedResource) -> String {
        mg.external_name()
    }

    /// The Azure resource ID a subnet reports once observed
    pub fn subnet_id(mg: &ManagedResource) -> String {
        match mg {
            ManagedResource::Subnet(s) => s.observed_id().to_string(),
            _ => String::new(),
        }
    }
}

/// One field to resolve
pub struct ResolutionRequest<'a> {
    /// Spec path of the field, used in errors
    pub field: &'static str,
    /// Value currently in the spec
    pub current_value: &'a str,
    /// By-name reference, if any
    pub reference: Option<&'a Reference>,
    /// Label selector, if any
    pub selector: Option<&'a Selector>,
    /// Kind being referenced
    pub to: ManagedKind,
    /// How to read the value from the target
    pub extract: Extractor,
}

/// Outcome of resolving one field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionResponse {
    /// Value to write into the field
    pub resolved_value: String,
    /// Reference to write back, set to the selector's match when one was used
    pub resolved_reference: Option<Reference>,
}

/// Resolves fields against a [`ResourceDirectory`]
pub struct Resolver<'a> {
    directory: &'a dyn ResourceDirectory,
}

impl<'a> Resolver<'a> {
    /// Create a resolver reading from the directory
    pub fn new(directory: &'a dyn ResourceDirectory) -> Self {
        Self { directory }
    }

    /// Resolve one field.
    ///
    /// A non-empty current value wins and nothing is read. Otherwise a
    /// reference is followed, or failing that the selector is listed and
    /// must match exactly one declaration. With none of the three the field
    /// resolves to the empty string.
    pub async fn resolve(&self, req: ResolutionRequest<'_>) -> Result<ResolutionResponse> {
        if !req.current_value.is_empty() {
            return Ok(ResolutionResponse {
                resolved_value: req.current_value.to_string(),
                resolved_reference: req.reference.cloned(),
            });
        }

        if let Some(reference) = req.reference {
            let target = self
                .directory
                .get(req.to, &reference.name)
                .await?
                .ok_or_else(|| Error::ReferenceNotFound {
                    field: req.field.to_string(),
                    kind: req.to,
                    name: reference.name.clone(),
                })?;
            return extracted(&req, &target, reference.clone());
        }

        if let Some(selector) = req.selector {
            let mut matches = self.directory.list(req.to, selector).await?;
            // The API server already filtered; re-check so the count is exact.
            matches.retain(|m| selector.matches(m.labels()));
            let target = match matches.len() {
                0 => {
                    return Err(Error::NoMatch {
                        field: req.field.to_string(),
                        kind: req.to,
                    })
                }
                1 => matches.remove(0),
                count => {
                    return Err(Error::AmbiguousMatch {
                        field: req.field.to_string(),
                        kind: req.to,
                        count,
                    })
                }
            };
            let reference = Reference::new(target.name());
            return extracted(&req, &target, reference);
        }

        Ok(ResolutionResponse {
            resolved_value: String::new(),
            resolved_reference: None,
        })
    }
}

fn extracted(
    req: &ResolutionRequest<'_>,
    target: &ManagedResource,
    reference: Reference,
) -> Result<ResolutionResponse> {
    let value = (req.extract)(target);
    if value.is_empty() {
        return Err(Error::NotReady {
            field: req.field.to_string(),
            kind: req.to,
            name: reference.name,
        });
    }
    debug!(field = req.field, kind = %req.to, target = %reference.name, "resolved reference");
    Ok(ResolutionResponse {
        resolved_value: value,
        resolved_reference: Some(reference),
    })
}

/// Resolve every reference field of a declaration.
///
/// Returns whether the spec changed. On error the declaration is left
/// untouched.
pub async fn resolve_references(
    mg: &mut ManagedResource,
    directory: &dyn ResourceDirectory,
) -> Result<bool> {
    let resolver = Resolver::new(directory);
    match mg {
        ManagedResource::ResourceGroup(_) => Ok(false),
        ManagedResource::VirtualNetwork(vnet) => {
            resolve_virtual_network(&mut vnet.spec, &resolver).await
        }
        ManagedResource::Subnet(subnet) => resolve_subnet(&mut subnet.spec, &resolver).await,
        ManagedResource::PrivateEndpoint(pe) => {
            resolve_private_endpoint(&mut pe.spec, &resolver).await
        }
    }
}

fn resource_group_request<'a>(
    value: &'a str,
    reference: Option<&'a Reference>,
    selector: Option<&'a Selector>,
) -> ResolutionRequest<'a> {
    ResolutionRequest {
        field: "spec.resourceGroupName",
        current_value: value,
        reference,
        selector,
        to: ManagedKind::ResourceGroup,
        extract: extract::external_name,
    }
}

async fn resolve_virtual_network(
    spec: &mut VirtualNetworkSpec,
    resolver: &Resolver<'_>,
) -> Result<bool> {
    let rg = resolver
        .resolve(resource_group_request(
            &spec.resource_group_name,
            spec.resource_group_name_ref.as_ref(),
            spec.resource_group_name_selector.as_ref(),
        ))
        .await?;

    let mut resolved = spec.clone();
    resolved.resource_group_name = rg.resolved_value;
    resolved.resource_group_name_ref = rg.resolved_reference;
    Ok(replace_if_changed(spec, resolved))
}

async fn resolve_subnet(spec: &mut SubnetSpec, resolver: &Resolver<'_>) -> Result<bool> {
    let rg = resolver
        .resolve(resource_group_request(
            &spec.resource_group_name,
            spec.resource_group_name_ref.as_ref(),
            spec.resource_group_name_selector.as_ref(),
        ))
        .await?;
    let vnet = resolver
        .resolve(ResolutionRequest {
            field: "spec.virtualNetworkName",
            current_value: &spec.virtual_network_name,
            reference: spec.virtual_network_name_ref.as_ref(),
            selector: spec.virtual_network_name_selector.as_ref(),
            to: ManagedKind::VirtualNetwork,
            extract: extract::external_name,
        })
        .await?;

    let mut resolved = spec.clone();
    resolved.resource_group_name = rg.resolved_value;
    resolved.resource_group_name_ref = rg.resolved_reference;
    resolved.virtual_network_name = vnet.resolved_value;
    resolved.virtual_network_name_ref = vnet.resolved_reference;
    Ok(replace_if_changed(spec, resolved))
}

async fn resolve_private_endpoint(
    spec: &mut PrivateEndpointSpec,
    resolver: &Resolver<'_>,
) -> Result<bool> {
    let rg = resolver
        .resolve(resource_group_request(
            &spec.resource_group_name,
            spec.resource_group_name_ref.as_ref(),
            spec.resource_group_name_selector.as_ref(),
        ))
        .await?;
    let subnet = resolver
        .resolve(ResolutionRequest {
            field: "spec.virtualNetworkSubnetId",
            current_value: &spec.virtual_network_subnet_id,
            reference: spec.virtual_network_subnet_id_ref.as_ref(),
            selector: spec.virtual_network_subnet_id_selector.as_ref(),
            to: ManagedKind::Subnet,
            extract: extract::subnet_id,
        })
        .await?;

    let mut resolved = spec.clone();
    resolved.resource_group_name = rg.resolved_value;
    resolved.resource_group_name_ref = rg.resolved_reference;
    resolved.virtual_network_subnet_id = subnet.resolved_value;
    resolved.virtual_network_subnet_id_ref = subnet.resolved_reference;
    Ok(replace_if_changed(spec, resolved))
}

fn replace_if_changed<T: PartialEq>(current: &mut T, resolved: T) -> bool {
    if *current == resolved {
        return false;
    }
    *current = resolved;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_common::crd::{ResourceGroupSpec, SubnetStatus};
    use std::collections::BTreeMap;

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn resource_group(name: &str, labels: &[(&str, &str)]) -> ManagedResource {
        let mut rg = ResourceGroup::new(
            name,
            ResourceGroupSpec {
                resource_spec: Default::default(),
                location: "westeurope".to_string(),
                tags: None,
            },
        );
        rg.metadata.labels = Some(
            labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        );
        rg.into()
    }

    fn subnet(name: &str, observed_id: Option<&str>) -> ManagedResource {
        let spec: SubnetSpec =
            serde_json::from_str(r#"{"properties": {"addressPrefix": "10.0.1.0/24"}}"#)
                .expect("parse");
        let mut s = Subnet::new(name, spec);
        s.status = observed_id.map(|id| SubnetStatus {
            id: Some(id.to_string()),
            ..Default::default()
        });
        s.into()
    }

    fn endpoint(spec_json: &str) -> ManagedResource {
        let spec: PrivateEndpointSpec = serde_json::from_str(spec_json).expect("parse");
        PrivateEndpoint::new("coolPrivateEndpoint", spec).into()
    }

    fn endpoint_spec(mg: &ManagedResource) -> &PrivateEndpointSpec {
        match mg {
            ManagedResource::PrivateEndpoint(pe) => &pe.spec,
            other => panic!("expected PrivateEndpoint, got {:?}", other.kind()),
        }
    }

    fn rg_request<'a>(
        reference: Option<&'a Reference>,
        selector: Option<&'a Selector>,
    ) -> ResolutionRequest<'a> {
        resource_group_request("", reference, selector)
    }

    // =========================================================================
    // Resolver
    // =========================================================================

    #[tokio::test]
    async fn current_value_wins_without_lookup() {
        // No expectations: any directory call panics.
        let directory = MockResourceDirectory::new();
        let reference = Reference::new("other");

        let resp = Resolver::new(&directory)
            .resolve(resource_group_request("coolRG", Some(&reference), None))
            .await
            .expect("resolves");

        assert_eq!(resp.resolved_value, "coolRG");
        assert_eq!(resp.resolved_reference, Some(reference));
    }

    #[tokio::test]
    async fn nothing_to_resolve_yields_empty() {
        let directory = MockResourceDirectory::new();
        let resp = Resolver::new(&directory)
            .resolve(rg_request(None, None))
            .await
            .expect("resolves");
        assert_eq!(resp.resolved_value, "");
        assert_eq!(resp.resolved_reference, None);
    }

    #[tokio::test]
    async fn reference_resolves_to_external_name() {
        let mut directory = MockResourceDirectory::new();
        directory
            .expect_get()
            .withf(|kind, name| *kind == ManagedKind::ResourceGroup && name == "core")
            .times(1)
            .returning(|_, _| {
                let mut rg = resource_group("core", &[]);
                rg.set_external_name("coolRG");
                Ok(Some(rg))
            });

        let reference = Reference::new("core");
        let resp = Resolver::new(&directory)
            .resolve(rg_request(Some(&reference), None))
            .await
            .expect("resolves");

        assert_eq!(resp.resolved_value, "coolRG");
        assert_eq!(resp.resolved_reference, Some(Reference::new("core")));
    }

    #[tokio::test]
    async fn missing_reference_target_fails() {
        let mut directory = MockResourceDirectory::new();
        directory.expect_get().returning(|_, _| Ok(None));

        let reference = Reference::new("gone");
        let err = Resolver::new(&directory)
            .resolve(rg_request(Some(&reference), None))
            .await
            .expect_err("should fail");

        match err {
            Error::ReferenceNotFound { field, kind, name } => {
                assert_eq!(field, "spec.resourceGroupName");
                assert_eq!(kind, ManagedKind::ResourceGroup);
                assert_eq!(name, "gone");
            }
            other => panic!("expected ReferenceNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn selector_with_single_match_records_reference() {
        let mut directory = MockResourceDirectory::new();
        directory
            .expect_list()
            .times(1)
            .returning(|_, _| Ok(vec![resource_group("core", &[("tier", "network")])]));

        let selector = Selector {
            match_labels: BTreeMap::from([("tier".to_string(), "network".to_string())]),
        };
        let resp = Resolver::new(&directory)
            .resolve(rg_request(None, Some(&selector)))
            .await
            .expect("resolves");

        assert_eq!(resp.resolved_value, "core");
        assert_eq!(resp.resolved_reference, Some(Reference::new("core")));
    }

    #[tokio::test]
    async fn selector_without_match_fails() {
        let mut directory = MockResourceDirectory::new();
        directory
            .expect_list()
            .returning(|_, _| Ok(vec![resource_group("core", &[("tier", "data")])]));

        let selector = Selector {
            match_labels: BTreeMap::from([("tier".to_string(), "network".to_string())]),
        };
        let err = Resolver::new(&directory)
            .resolve(rg_request(None, Some(&selector)))
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::NoMatch { .. }));
    }

    #[tokio::test]
    async fn selector_with_several_matches_fails() {
        let mut directory = MockResourceDirectory::new();
        directory.expect_list().returning(|_, _| {
            Ok(vec![
                resource_group("a", &[("tier", "network")]),
                resource_group("b", &[("tier", "network")]),
            ])
        });

        let selector = Selector {
            match_labels: BTreeMap::from([("tier".to_string(), "network".to_string())]),
        };
        let err = Resolver::new(&directory)
            .resolve(rg_request(None, Some(&selector)))
            .await
            .expect_err("should fail");
        match err {
            Error::AmbiguousMatch { count, .. } => assert_eq!(count, 2),
            other => panic!("expected AmbiguousMatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unobserved_subnet_is_not_ready() {
        let mut directory = MockResourceDirectory::new();
        directory
            .expect_get()
            .returning(|_, name| Ok(Some(subnet(name, None))));

        let reference = Reference::new("coolSubnet");
        let err = Resolver::new(&directory)
            .resolve(ResolutionRequest {
                field: "spec.virtualNetworkSubnetId",
                current_value: "",
                reference: Some(&reference),
                selector: None,
                to: ManagedKind::Subnet,
                extract: extract::subnet_id,
            })
            .await
            .expect_err("should fail");

        match err {
            Error::NotReady { name, kind, .. } => {
                assert_eq!(name, "coolSubnet");
                assert_eq!(kind, ManagedKind::Subnet);
            }
            other => panic!("expected NotReady, got {other:?}"),
        }
    }

    // =========================================================================
    // Per-kind resolution
    // =========================================================================

    #[tokio::test]
    async fn endpoint_references_are_written_back() {
        let mut directory = MockResourceDirectory::new();
        directory
            .expect_get()
            .withf(|kind, _| *kind == ManagedKind::ResourceGroup)
            .returning(|_, name| Ok(Some(resource_group(name, &[]))));
        directory
            .expect_get()
            .withf(|kind, _| *kind == ManagedKind::Subnet)
            .returning(|_, name| Ok(Some(subnet(name, Some("/subscriptions/s/subnets/coolSubnet")))));

        let mut mg = endpoint(
            r#"{
                "location": "westeurope",
                "resourceGroupNameRef": {"name": "coolRG"},
                "virtualNetworkSubnetIdRef": {"name": "coolSubnet"}
            }"#,
        );

        let changed = resolve_references(&mut mg, &directory)
            .await
            .expect("resolves");

        assert!(changed);
        let spec = endpoint_spec(&mg);
        assert_eq!(spec.resource_group_name, "coolRG");
        assert_eq!(spec.virtual_network_subnet_id, "/subscriptions/s/subnets/coolSubnet");
    }

    #[tokio::test]
    async fn resolved_endpoint_reports_no_change() {
        let directory = MockResourceDirectory::new();
        let mut mg = endpoint(
            r#"{
                "location": "westeurope",
                "resourceGroupName": "coolRG",
                "virtualNetworkSubnetId": "/subscriptions/s/subnets/coolSubnet"
            }"#,
        );

        let changed = resolve_references(&mut mg, &directory)
            .await
            .expect("resolves");
        assert!(!changed);
    }

    #[tokio::test]
    async fn partial_failure_leaves_spec_untouched() {
        let mut directory = MockResourceDirectory::new();
        directory
            .expect_get()
            .withf(|kind, _| *kind == ManagedKind::ResourceGroup)
            .returning(|_, name| Ok(Some(resource_group(name, &[]))));
        directory
            .expect_get()
            .withf(|kind, _| *kind == ManagedKind::Subnet)
            .returning(|_, _| Ok(None));

        let mut mg = endpoint(
            r#"{
                "location": "westeurope",
                "resourceGroupNameRef": {"name": "coolRG"},
                "virtualNetworkSubnetIdRef": {"name": "coolSubnet"}
            }"#,
        );
        let before = mg.clone();

        let err = resolve_references(&mut mg, &directory)
            .await
            .expect_err("subnet missing");

        assert!(matches!(err, Error::ReferenceNotFound { .. }));
        assert_eq!(mg, before);
    }

    #[tokio::test]
    async fn resource_groups_have_nothing_to_resolve() {
        let directory = MockResourceDirectory::new();
        let mut mg = resource_group("core", &[]);
        assert!(!resolve_references(&mut mg, &directory).await.expect("ok"));
    }
}
