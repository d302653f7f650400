//! resreg core types
//!
//! Resources are free-form JSON objects addressed by a four-part key
//! `(resource_group, namespace, kind, name)`. Everything here is plain data;
//! networking lives in `resreg_api`, list and editor state in the store/edit crates.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod columns;
pub mod config;

pub use config::ClientConfig;

/// Identity fields every resource must carry, in addressing order.
pub const IDENTITY_FIELDS: [&str; 4] = ["resource_group", "namespace", "kind", "name"];

/// A registry resource: arbitrary JSON object with at least the identity fields.
///
/// Deserializes from any JSON object so that incomplete rows coming back from
/// a list call are still displayable; use [`Resource::key`] to check identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Map<String, Value>);

impl Resource {
    pub fn from_map(map: Map<String, Value>) -> Self { Self(map) }

    pub fn get(&self, field: &str) -> Option<&Value> { self.0.get(field) }

    pub fn get_str(&self, field: &str) -> Option<&str> { self.0.get(field).and_then(|v| v.as_str()) }

    pub fn as_map(&self) -> &Map<String, Value> { &self.0 }

    pub fn resource_group(&self) -> Option<&str> { self.get_str("resource_group") }
    pub fn namespace(&self) -> Option<&str> { self.get_str("namespace") }
    pub fn kind(&self) -> Option<&str> { self.get_str("kind") }
    pub fn name(&self) -> Option<&str> { self.get_str("name") }
    pub fn created_at(&self) -> Option<&str> { self.get_str("created_at") }

    /// Shard id as displayed; backends send it either as a string or a number.
    pub fn shard_id(&self) -> Option<String> {
        match self.0.get("shard_id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Identity tuple, if all four fields are present as strings.
    pub fn key(&self) -> Option<ResourceKey> {
        Some(ResourceKey {
            resource_group: self.resource_group()?.to_string(),
            namespace: self.namespace()?.to_string(),
            kind: self.kind()?.to_string(),
            name: self.name()?.to_string(),
        })
    }

    /// First identity field that is absent or not a string.
    pub fn missing_identity_field(&self) -> Option<&'static str> {
        IDENTITY_FIELDS.into_iter().find(|f| self.get_str(f).is_none())
    }
}

impl From<Map<String, Value>> for Resource {
    fn from(map: Map<String, Value>) -> Self { Self(map) }
}

impl TryFrom<Value> for Resource {
    type Error = Value;

    /// Only JSON objects are resources; anything else is handed back.
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Four-part resource address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub resource_group: String,
    pub namespace: String,
    pub kind: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(
        resource_group: impl Into<String>,
        namespace: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            resource_group: resource_group.into(),
            namespace: namespace.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.resource_group, self.namespace, self.kind, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resource key: {0} (expect group/namespace/kind/name)")]
pub struct ParseKeyError(String);

impl FromStr for ResourceKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [g, ns, k, n] if !g.is_empty() && !ns.is_empty() && !k.is_empty() && !n.is_empty() => {
                Ok(Self::new(*g, *ns, *k, *n))
            }
            _ => Err(ParseKeyError(s.to_string())),
        }
    }
}

/// Recognized filter fields, in the order they are sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    ResourceGroup,
    Kind,
    ShardId,
    Namespace,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [Self::ResourceGroup, Self::Kind, Self::ShardId, Self::Namespace];

    /// Query parameter name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "resource_group",
            Self::Kind => "kind",
            Self::ShardId => "shard_id",
            Self::Namespace => "namespace",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter field: {0}")]
pub struct UnknownFilterField(String);

impl FromStr for FilterField {
    type Err = UnknownFilterField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFilterField(s.to_string()))
    }
}

/// Filter values; empty strings mean "not filtered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub resource_group: String,
    pub kind: String,
    pub shard_id: String,
    pub namespace: String,
}

impl FilterCriteria {
    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::ResourceGroup => &self.resource_group,
            FilterField::Kind => &self.kind,
            FilterField::ShardId => &self.shard_id,
            FilterField::Namespace => &self.namespace,
        }
    }

    pub fn get_mut(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::ResourceGroup => &mut self.resource_group,
            FilterField::Kind => &mut self.kind,
            FilterField::ShardId => &mut self.shard_id,
            FilterField::Namespace => &mut self.namespace,
        }
    }

    pub fn is_empty(&self) -> bool { FilterField::ALL.iter().all(|f| self.get(*f).is_empty()) }

    /// Non-empty fields as `(param, value)` pairs, in wire order.
    pub fn query_params(&self) -> Vec<(&'static str, &str)> {
        FilterField::ALL
            .iter()
            .map(|f| (f.as_str(), self.get(*f)))
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }
}

/// Pagination parameters appended to a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

pub mod prelude {
    pub use super::{ClientConfig, FilterCriteria, FilterField, PageRequest, Resource, ResourceKey};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn res(v: Value) -> Resource { Resource::try_from(v).expect("object") }

    #[test]
    fn key_requires_all_identity_strings() {
        let r = res(json!({"resource_group": "g", "namespace": "n", "kind": "k", "name": "x"}));
        assert_eq!(r.key(), Some(ResourceKey::new("g", "n", "k", "x")));

        let r = res(json!({"resource_group": "g", "namespace": "n", "kind": "k", "name": 5}));
        assert_eq!(r.key(), None);
        assert_eq!(r.missing_identity_field(), Some("name"));

        let r = res(json!({"namespace": "n"}));
        assert_eq!(r.missing_identity_field(), Some("resource_group"));
    }

    #[test]
    fn non_objects_are_not_resources() {
        assert!(Resource::try_from(json!([1, 2])).is_err());
        assert!(Resource::try_from(json!("x")).is_err());
    }

    #[test]
    fn shard_id_accepts_strings_and_numbers() {
        assert_eq!(res(json!({"shard_id": "s1"})).shard_id().as_deref(), Some("s1"));
        assert_eq!(res(json!({"shard_id": 7})).shard_id().as_deref(), Some("7"));
        assert_eq!(res(json!({"shard_id": null})).shard_id(), None);
    }

    #[test]
    fn resource_key_parses_and_displays() {
        let k: ResourceKey = "core/default/pod/web-0".parse().expect("ok");
        assert_eq!(k, ResourceKey::new("core", "default", "pod", "web-0"));
        assert_eq!(k.to_string(), "core/default/pod/web-0");
        assert!("a/b/c".parse::<ResourceKey>().is_err());
        assert!("a//c/d".parse::<ResourceKey>().is_err());
        assert!("a/b/c/d/e".parse::<ResourceKey>().is_err());
    }

    #[test]
    fn filter_field_round_trips_wire_names() {
        for f in FilterField::ALL {
            assert_eq!(f.as_str().parse::<FilterField>().expect("known"), f);
        }
        assert!("label".parse::<FilterField>().is_err());
    }

    #[test]
    fn field_order_is_preserved() {
        let r = res(json!({"name": "x", "kind": "k", "a": 1}));
        let keys: Vec<_> = r.as_map().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "kind", "a"]);
    }
}
