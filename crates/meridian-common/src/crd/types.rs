//! Shared types used across Meridian CRDs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type reporting whether the external resource is usable
pub const TYPE_READY: &str = "Ready";

/// Condition type reporting whether the last reconcile pass succeeded
pub const TYPE_SYNCED: &str = "Synced";

/// Machine-readable condition reasons
pub mod reasons {
    /// The external resource exists and was observed
    pub const AVAILABLE: &str = "Available";
    /// A create call is about to be or has been issued
    pub const CREATING: &str = "Creating";
    /// A delete call is about to be or has been issued
    pub const DELETING: &str = "Deleting";
    /// The last reconcile pass completed without error
    pub const RECONCILE_SUCCESS: &str = "ReconcileSuccess";
    /// The last reconcile pass failed
    pub const RECONCILE_ERROR: &str = "ReconcileError";
}

/// Condition status following Kubernetes conventions
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition for status reporting
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Condition {
    /// Type of condition (Ready or Synced)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    pub reason: String,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Last time the condition transitioned
    #[serde(rename = "lastTransitionTime")]
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a new condition with the current timestamp
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }

    /// Ready=True: the external resource was observed
    pub fn available() -> Self {
        Self::new(TYPE_READY, ConditionStatus::True, reasons::AVAILABLE, "")
    }

    /// Ready=False: the external resource is being created
    pub fn creating() -> Self {
        Self::new(TYPE_READY, ConditionStatus::False, reasons::CREATING, "")
    }

    /// Ready=False: the external resource is being deleted
    pub fn deleting() -> Self {
        Self::new(TYPE_READY, ConditionStatus::False, reasons::DELETING, "")
    }

    /// Synced=True: the last pass succeeded
    pub fn reconcile_success() -> Self {
        Self::new(
            TYPE_SYNCED,
            ConditionStatus::True,
            reasons::RECONCILE_SUCCESS,
            "",
        )
    }

    /// Synced=False carrying the error message of the failed pass
    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self::new(
            TYPE_SYNCED,
            ConditionStatus::False,
            reasons::RECONCILE_ERROR,
            message,
        )
    }

    /// Same type, status, reason and message, ignoring the timestamp
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Insert or replace the condition of the same type.
///
/// An equivalent existing condition is kept so its transition time does not
/// move on every pass.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) if existing.equivalent(&condition) => {}
        Some(existing) => *existing = condition,
        None => conditions.push(condition),
    }
}

/// Find a condition by type
pub fn get_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Pointer to another declared resource by name
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Reference {
    /// Name of the referenced resource
    pub name: String,
}

impl Reference {
    /// Create a reference to the named resource
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Label criteria selecting exactly one declared resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    /// Labels the candidate must carry
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl Selector {
    /// Whether the given labels satisfy every selector entry
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|l| l == v))
    }

    /// Render as a Kubernetes label selector string (`k1=v1,k2=v2`)
    pub fn to_label_selector(&self) -> String {
        self.match_labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Reference to a ProviderConfig by name
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ProviderConfigReference {
    /// Name of the ProviderConfig
    pub name: String,
}

impl Default for ProviderConfigReference {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER_CONFIG.to_string(),
        }
    }
}

/// ProviderConfig used when a declaration names none
pub const DEFAULT_PROVIDER_CONFIG: &str = "default";

/// Namespaced Secret reference
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SecretReference {
    /// Secret name
    pub name: String,
    /// Secret namespace
    pub namespace: String,
}

/// What happens to the external resource when the declaration is deleted
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Delete the external resource
    #[default]
    Delete,
    /// Leave the external resource in place
    Orphan,
}

/// Fields shared by every managed resource spec
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// ProviderConfig holding the credentials to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config_ref: Option<ProviderConfigReference>,

    /// Secret to write connection details to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,

    /// Fate of the external resource on deletion
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

impl ResourceSpec {
    /// Name of the ProviderConfig, falling back to `default`
    pub fn provider_config_name(&self) -> &str {
        self.provider_config_ref
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or(DEFAULT_PROVIDER_CONFIG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod conditions {
        use super::*;

        #[test]
        fn new_sets_fields_and_timestamp() {
            let before = Utc::now();
            let condition = Condition::new(
                "Ready",
                ConditionStatus::True,
                "Available",
                "observed",
            );
            let after = Utc::now();

            assert_eq!(condition.type_, "Ready");
            assert_eq!(condition.status, ConditionStatus::True);
            assert_eq!(condition.reason, "Available");
            assert_eq!(condition.message, "observed");
            assert!(condition.last_transition_time >= before);
            assert!(condition.last_transition_time <= after);
        }

        #[test]
        fn lifecycle_conditions_share_ready_type() {
            for c in [
                Condition::available(),
                Condition::creating(),
                Condition::deleting(),
            ] {
                assert_eq!(c.type_, TYPE_READY);
            }
            assert_eq!(Condition::available().status, ConditionStatus::True);
            assert_eq!(Condition::creating().status, ConditionStatus::False);
            assert_eq!(Condition::deleting().reason, reasons::DELETING);
        }

        #[test]
        fn set_condition_replaces_same_type() {
            let mut conditions = vec![Condition::creating()];
            set_condition(&mut conditions, Condition::available());

            assert_eq!(conditions.len(), 1);
            assert_eq!(conditions[0].reason, reasons::AVAILABLE);
        }

        #[test]
        fn set_condition_keeps_transition_time_when_unchanged() {
            let mut first = Condition::reconcile_success();
            first.last_transition_time = DateTime::<Utc>::UNIX_EPOCH;
            let mut conditions = vec![first];

            set_condition(&mut conditions, Condition::reconcile_success());

            assert_eq!(
                conditions[0].last_transition_time,
                DateTime::<Utc>::UNIX_EPOCH
            );
        }

        #[test]
        fn set_condition_appends_new_type() {
            let mut conditions = vec![Condition::available()];
            set_condition(&mut conditions, Condition::reconcile_error("boom"));

            assert_eq!(conditions.len(), 2);
            let synced = get_condition(&conditions, TYPE_SYNCED).expect("synced");
            assert_eq!(synced.status, ConditionStatus::False);
            assert_eq!(synced.message, "boom");
        }
    }

    mod selectors {
        use super::*;

        fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        #[test]
        fn matches_requires_every_label() {
            let selector = Selector {
                match_labels: labels(&[("env", "prod"), ("team", "net")]),
            };

            assert!(selector.matches(&labels(&[
                ("env", "prod"),
                ("team", "net"),
                ("extra", "x")
            ])));
            assert!(!selector.matches(&labels(&[("env", "prod")])));
            assert!(!selector.matches(&labels(&[("env", "dev"), ("team", "net")])));
        }

        #[test]
        fn empty_selector_matches_everything() {
            assert!(Selector::default().matches(&BTreeMap::new()));
        }

        #[test]
        fn label_selector_string_is_sorted() {
            let selector = Selector {
                match_labels: labels(&[("b", "2"), ("a", "1")]),
            };
            assert_eq!(selector.to_label_selector(), "a=1,b=2");
        }
    }

    #[test]
    fn resource_spec_defaults() {
        let spec: ResourceSpec = serde_json::from_str("{}").expect("parse");
        assert_eq!(spec.deletion_policy, DeletionPolicy::Delete);
        assert_eq!(spec.provider_config_name(), "default");

        let spec: ResourceSpec = serde_json::from_str(
            r#"{"providerConfigRef":{"name":"prod"},"deletionPolicy":"Orphan"}"#,
        )
        .expect("parse");
        assert_eq!(spec.deletion_policy, DeletionPolicy::Orphan);
        assert_eq!(spec.provider_config_name(), "prod");
    }
}
