//! resreg CRUD gateway.
//!
//! This crate defines the trait the list and editor state machines talk to,
//! the HTTP implementation against the registry REST API, and a scripted mock
//! for tests. The gateway holds no state of its own and never retries.

#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use resreg_core::{FilterCriteria, PageRequest, Resource, ResourceKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod http;

pub use http::HttpGateway;

/// Gateway errors. Every non-2xx response maps to `RequestFailed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum GatewayError {
    #[error("request failed with status {status}")]
    RequestFailed { status: u16 },
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("resource is missing identity field `{0}`")]
    MissingIdentity(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool { self.status() == Some(404) }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Body of a list call, in one of the two shapes backends produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ListResponse {
    /// `{ items, total }` envelope: the backend pages.
    Paged { items: Vec<Resource>, total: u64 },
    /// Bare array (or single object): the backend returns everything.
    Flat(Vec<Resource>),
}

impl ListResponse {
    pub fn items(&self) -> &[Resource] {
        match self {
            Self::Paged { items, .. } | Self::Flat(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<Resource> {
        match self {
            Self::Paged { items, .. } | Self::Flat(items) => items,
        }
    }
}

/// Interpret a list response body.
///
/// An object with an `items` array is an envelope (`total` defaults to the
/// item count when absent); an array is flat; any other object is a single
/// resource.
pub fn parse_list_body(body: Value) -> GatewayResult<ListResponse> {
    match body {
        Value::Array(arr) => Ok(ListResponse::Flat(resources_from(arr)?)),
        Value::Object(mut map) => {
            if matches!(map.get("items"), Some(Value::Array(_))) {
                let total = map.get("total").and_then(Value::as_u64);
                let arr = match map.remove("items") {
                    Some(Value::Array(arr)) => arr,
                    _ => Vec::new(),
                };
                let items = resources_from(arr)?;
                let total = total.unwrap_or(items.len() as u64);
                Ok(ListResponse::Paged { items, total })
            } else {
                Ok(ListResponse::Flat(vec![Resource::from_map(map)]))
            }
        }
        other => Err(GatewayError::DecodeFailed(format!("unexpected list body: {}", kind_of(&other)))),
    }
}

fn resources_from(arr: Vec<Value>) -> GatewayResult<Vec<Resource>> {
    arr.into_iter()
        .enumerate()
        .map(|(i, v)| {
            Resource::try_from(v)
                .map_err(|v| GatewayError::DecodeFailed(format!("item {} is {}, expected object", i, kind_of(&v))))
        })
        .collect()
}

pub(crate) fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Query parameters for a list call: non-empty filters in field order, then paging.
pub fn list_query(filters: &FilterCriteria, page: Option<PageRequest>) -> Vec<(String, String)> {
    let mut q: Vec<(String, String)> = filters
        .query_params()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    if let Some(p) = page {
        q.push(("limit".into(), p.limit.to_string()));
        q.push(("offset".into(), p.offset.to_string()));
    }
    q
}

/// CRUD surface of the registry.
#[async_trait::async_trait]
pub trait CrudGateway: Send + Sync {
    /// List resources matching `filters`; `page` appends `limit`/`offset`.
    async fn list(&self, filters: &FilterCriteria, page: Option<PageRequest>) -> GatewayResult<ListResponse>;

    async fn get(&self, key: &ResourceKey) -> GatewayResult<Resource>;

    /// Create under the group/namespace/kind carried by the body; returns the stored form.
    async fn create(&self, resource: &Resource) -> GatewayResult<Resource>;

    /// Full replace at `key`. The body may carry a different identity; `key` wins.
    async fn update(&self, key: &ResourceKey, resource: &Resource) -> GatewayResult<Resource>;

    async fn delete(&self, key: &ResourceKey) -> GatewayResult<()>;
}

// ----------------- Mock implementation -----------------

/// A call observed by [`MockGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    List { filters: FilterCriteria, page: Option<PageRequest> },
    Get(ResourceKey),
    Create(Resource),
    Update(ResourceKey, Resource),
    Delete(ResourceKey),
}

/// Scripted reply for the next call.
#[derive(Debug, Clone)]
pub enum MockReply {
    List(ListResponse),
    Resource(Resource),
    Unit,
    Err(GatewayError),
}

/// In-memory gateway for tests: replies are consumed in FIFO order, calls are recorded.
#[derive(Default)]
pub struct MockGateway {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockGateway {
    pub fn new() -> Self { Self::default() }

    pub fn push(&self, reply: MockReply) -> &Self {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
        self
    }

    pub fn push_list(&self, resp: ListResponse) -> &Self { self.push(MockReply::List(resp)) }

    pub fn push_resource(&self, r: Resource) -> &Self { self.push(MockReply::Resource(r)) }

    pub fn push_unit(&self) -> &Self { self.push(MockReply::Unit) }

    pub fn push_status(&self, status: u16) -> &Self { self.push(MockReply::Err(GatewayError::RequestFailed { status })) }

    pub fn calls(&self) -> Vec<MockCall> { self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone() }

    pub fn pending_replies(&self) -> usize { self.replies.lock().unwrap_or_else(|e| e.into_inner()).len() }

    fn next(&self, call: MockCall) -> GatewayResult<MockReply> {
        let op = match &call {
            MockCall::List { .. } => "list",
            MockCall::Get(_) => "get",
            MockCall::Create(_) => "create",
            MockCall::Update(..) => "update",
            MockCall::Delete(_) => "delete",
        };
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
        match self.replies.lock().unwrap_or_else(|e| e.into_inner()).pop_front() {
            Some(MockReply::Err(e)) => Err(e),
            Some(r) => Ok(r),
            None => Err(GatewayError::Transport(format!("mock: no reply scripted for {}", op))),
        }
    }
}

fn mismatch(op: &str, got: &MockReply) -> GatewayError {
    GatewayError::Transport(format!("mock: scripted {:?} does not fit {}", got, op))
}

#[async_trait::async_trait]
impl CrudGateway for MockGateway {
    async fn list(&self, filters: &FilterCriteria, page: Option<PageRequest>) -> GatewayResult<ListResponse> {
        match self.next(MockCall::List { filters: filters.clone(), page })? {
            MockReply::List(l) => Ok(l),
            other => Err(mismatch("list", &other)),
        }
    }

    async fn get(&self, key: &ResourceKey) -> GatewayResult<Resource> {
        match self.next(MockCall::Get(key.clone()))? {
            MockReply::Resource(r) => Ok(r),
            other => Err(mismatch("get", &other)),
        }
    }

    async fn create(&self, resource: &Resource) -> GatewayResult<Resource> {
        if let Some(f) = create_missing_field(resource) {
            return Err(GatewayError::MissingIdentity(f.to_string()));
        }
        match self.next(MockCall::Create(resource.clone()))? {
            MockReply::Resource(r) => Ok(r),
            other => Err(mismatch("create", &other)),
        }
    }

    async fn update(&self, key: &ResourceKey, resource: &Resource) -> GatewayResult<Resource> {
        match self.next(MockCall::Update(key.clone(), resource.clone()))? {
            MockReply::Resource(r) => Ok(r),
            other => Err(mismatch("update", &other)),
        }
    }

    async fn delete(&self, key: &ResourceKey) -> GatewayResult<()> {
        match self.next(MockCall::Delete(key.clone()))? {
            MockReply::Unit => Ok(()),
            other => Err(mismatch("delete", &other)),
        }
    }
}

/// Create is addressed by group/namespace/kind; the name is assigned or validated server-side.
pub(crate) fn create_missing_field(r: &Resource) -> Option<&'static str> {
    ["resource_group", "namespace", "kind"].into_iter().find(|f| r.get_str(f).is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_is_paged() {
        let body = json!({"items": [{"name": "a"}, {"name": "b"}], "total": 12});
        match parse_list_body(body).unwrap() {
            ListResponse::Paged { items, total } => {
                assert_eq!(items.len(), 2);
                assert_eq!(total, 12);
            }
            other => panic!("expected paged, got {:?}", other),
        }
    }

    #[test]
    fn envelope_without_total_counts_items() {
        let body = json!({"items": [{"name": "a"}]});
        assert_eq!(parse_list_body(body).unwrap(), ListResponse::Paged { items: vec![Resource::try_from(json!({"name": "a"})).unwrap()], total: 1 });
    }

    #[test]
    fn array_and_single_object_are_flat() {
        assert_eq!(parse_list_body(json!([{"name": "a"}, {"name": "b"}])).unwrap().items().len(), 2);
        let single = parse_list_body(json!({"name": "only"})).unwrap();
        assert!(matches!(&single, ListResponse::Flat(v) if v.len() == 1 && v[0].name() == Some("only")));
    }

    #[test]
    fn non_object_items_fail_decode() {
        let e = parse_list_body(json!([{"name": "a"}, 3])).unwrap_err();
        assert_eq!(e, GatewayError::DecodeFailed("item 1 is a number, expected object".into()));
        assert!(matches!(parse_list_body(json!("nope")), Err(GatewayError::DecodeFailed(_))));
    }

    #[test]
    fn query_keeps_only_non_empty_filters_in_order() {
        let f = FilterCriteria { namespace: "prod".into(), kind: "pod".into(), ..Default::default() };
        let q = list_query(&f, Some(PageRequest { limit: 100, offset: 0 }));
        let q: Vec<(&str, &str)> = q.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(q, vec![("kind", "pod"), ("namespace", "prod"), ("limit", "100"), ("offset", "0")]);
        assert!(list_query(&FilterCriteria::default(), None).is_empty());
    }

    #[tokio::test]
    async fn mock_replays_in_order_and_records_calls() {
        let gw = MockGateway::new();
        gw.push_status(404).push_list(ListResponse::Flat(vec![]));
        let f = FilterCriteria::default();
        let page = Some(PageRequest { limit: 10, offset: 0 });
        assert!(gw.list(&f, page).await.unwrap_err().is_not_found());
        assert_eq!(gw.list(&f, None).await.unwrap(), ListResponse::Flat(vec![]));
        assert_eq!(gw.calls(), vec![MockCall::List { filters: f.clone(), page }, MockCall::List { filters: f, page: None }]);
        assert!(matches!(gw.get(&ResourceKey::new("g", "n", "k", "x")).await, Err(GatewayError::Transport(_))));
    }

    #[tokio::test]
    async fn mock_create_rejects_missing_identity_without_a_call() {
        let gw = MockGateway::new();
        let r = Resource::try_from(json!({"resource_group": "g", "kind": "k"})).unwrap();
        assert_eq!(gw.create(&r).await.unwrap_err(), GatewayError::MissingIdentity("namespace".into()));
        assert!(gw.calls().is_empty());
    }
}
