//! Field helpers shared by the per-kind mappers and diffs

use std::collections::BTreeMap;

/// Empty strings are sent as absent
pub(crate) fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Tags compare as maps; absent and empty both mean "no tags"
pub(crate) fn tags_equal(
    desired: Option<&BTreeMap<String, String>>,
    observed: Option<&BTreeMap<String, String>>,
) -> bool {
    let empty = BTreeMap::new();
    desired.unwrap_or(&empty) == observed.unwrap_or(&empty)
}

/// Reference-like sub-objects match on their identifier alone
pub(crate) fn id_equal(desired: Option<&str>, observed: Option<&str>) -> bool {
    desired == observed
}

/// String lists where Azure may omit an empty list
pub(crate) fn strings_equal(desired: Option<&[String]>, observed: Option<&[String]>) -> bool {
    desired.unwrap_or_default() == observed.unwrap_or_default()
}
