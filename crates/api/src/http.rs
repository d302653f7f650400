//! HTTP gateway over the registry REST API (reqwest).

use std::time::Instant;

use metrics::{counter, histogram};
use reqwest::{Client, Method, Url};
use resreg_core::{ClientConfig, FilterCriteria, PageRequest, Resource, ResourceKey};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{create_missing_field, kind_of, list_query, parse_list_body, CrudGateway, GatewayError, GatewayResult, ListResponse};

/// Gateway talking JSON to `{base}/api/v1/...`.
pub struct HttpGateway {
    base: Url,
    client: Client,
}

impl HttpGateway {
    /// Build against a base prefix such as `https://registry.example` or `http://host/prefix`.
    ///
    /// No request timeout is configured; a hung request stays pending.
    pub fn new(base_url: &str) -> GatewayResult<Self> {
        let base = Url::parse(base_url).map_err(|e| GatewayError::Transport(format!("invalid base url {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::Transport(format!("base url cannot carry paths: {}", base_url)));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Transport(format!("building http client: {}", e)))?;
        Ok(Self { base, client })
    }

    pub fn from_config(cfg: &ClientConfig) -> GatewayResult<Self> { Self::new(&cfg.base_url) }

    /// `{base}/api/v1/resources`
    pub fn list_url(&self) -> Url { self.url_with(&["api", "v1", "resources"]) }

    /// `{base}/api/v1/groups/{g}/namespaces/{ns}/kinds/{kind}/resources/` (trailing slash kept).
    pub fn collection_url(&self, group: &str, namespace: &str, kind: &str) -> Url {
        self.url_with(&["api", "v1", "groups", group, "namespaces", namespace, "kinds", kind, "resources", ""])
    }

    /// `{base}/api/v1/groups/{g}/namespaces/{ns}/kinds/{kind}/resources/{name}`
    pub fn resource_url(&self, key: &ResourceKey) -> Url {
        self.url_with(&[
            "api", "v1", "groups", &key.resource_group, "namespaces", &key.namespace, "kinds", &key.kind, "resources", &key.name,
        ])
    }

    fn url_with(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was rejected in new(), so segments are always available
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, op: &'static str, method: Method, url: Url, body: Option<&Resource>) -> GatewayResult<Vec<u8>> {
        let t0 = Instant::now();
        info!(op, method = %method, url = %url, "api: {} start", op);
        counter!("gateway_requests_total", "op" => op).increment(1);
        let mut req = self.client.request(method, url);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                counter!("gateway_errors_total", "op" => op).increment(1);
                warn!(op, error = %e, took_ms = %t0.elapsed().as_millis(), "api: {} transport error", op);
                return Err(GatewayError::Transport(e.to_string()));
            }
        };
        let status = resp.status();
        histogram!("gateway_latency_ms", "op" => op).record(t0.elapsed().as_secs_f64() * 1000.0);
        if !status.is_success() {
            counter!("gateway_errors_total", "op" => op).increment(1);
            info!(op, status = status.as_u16(), took_ms = %t0.elapsed().as_millis(), "api: {} failed", op);
            return Err(GatewayError::RequestFailed { status: status.as_u16() });
        }
        let bytes = resp.bytes().await.map_err(|e| GatewayError::Transport(e.to_string()))?;
        info!(op, status = status.as_u16(), bytes = bytes.len(), took_ms = %t0.elapsed().as_millis(), "api: {} ok", op);
        Ok(bytes.to_vec())
    }

    fn decode_resource(bytes: &[u8]) -> GatewayResult<Resource> {
        let v: Value = serde_json::from_slice(bytes).map_err(|e| GatewayError::DecodeFailed(e.to_string()))?;
        Resource::try_from(v).map_err(|v| GatewayError::DecodeFailed(format!("expected object, got {}", kind_of(&v))))
    }
}

#[async_trait::async_trait]
impl CrudGateway for HttpGateway {
    async fn list(&self, filters: &FilterCriteria, page: Option<PageRequest>) -> GatewayResult<ListResponse> {
        let mut url = self.list_url();
        let query = list_query(filters, page);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        let bytes = self.send("list", Method::GET, url, None).await?;
        let v: Value = serde_json::from_slice(&bytes).map_err(|e| GatewayError::DecodeFailed(e.to_string()))?;
        let resp = parse_list_body(v)?;
        debug!(items = resp.items().len(), paged = matches!(resp, ListResponse::Paged { .. }), "api: list decoded");
        Ok(resp)
    }

    async fn get(&self, key: &ResourceKey) -> GatewayResult<Resource> {
        let bytes = self.send("get", Method::GET, self.resource_url(key), None).await?;
        Self::decode_resource(&bytes)
    }

    async fn create(&self, resource: &Resource) -> GatewayResult<Resource> {
        if let Some(f) = create_missing_field(resource) {
            return Err(GatewayError::MissingIdentity(f.to_string()));
        }
        let url = self.collection_url(
            resource.resource_group().unwrap_or_default(),
            resource.namespace().unwrap_or_default(),
            resource.kind().unwrap_or_default(),
        );
        let bytes = self.send("create", Method::POST, url, Some(resource)).await?;
        Self::decode_resource(&bytes)
    }

    async fn update(&self, key: &ResourceKey, resource: &Resource) -> GatewayResult<Resource> {
        let bytes = self.send("update", Method::PUT, self.resource_url(key), Some(resource)).await?;
        Self::decode_resource(&bytes)
    }

    async fn delete(&self, key: &ResourceKey) -> GatewayResult<()> {
        // Some backends answer 204, others echo the deleted object; the body is ignored.
        let _ = self.send("delete", Method::DELETE, self.resource_url(key), None).await?;
        Ok(())
    }
}
