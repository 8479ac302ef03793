//! Resource store backed by a Kubernetes API server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tekton_core::{GroupVersionResource, ResourceCoordinate};
use url::Url;

use crate::error::StoreError;
use crate::traits::ResourceStore;

pub const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

#[derive(Debug, Clone)]
pub struct KubeStoreOptions {
    pub endpoint: String,
    pub token: Option<String>,
    pub insecure_skip_tls_verify: bool,
    pub request_timeout: Duration,
}

impl KubeStoreOptions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            insecure_skip_tls_verify: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KubeStore {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl KubeStore {
    pub fn new(options: KubeStoreOptions) -> Result<Self, StoreError> {
        let endpoint = Url::parse(&options.endpoint)
            .map_err(|e| StoreError::client(format!("invalid endpoint '{}': {e}", options.endpoint)))?;
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::client(format!(
                "invalid endpoint '{}': not a base URL",
                options.endpoint
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .danger_accept_invalid_certs(options.insecure_skip_tls_verify)
            .build()
            .map_err(|e| StoreError::client(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: endpoint,
            token: options.token,
        })
    }

    /// Appends path segments to the endpoint; each one is percent-encoded
    /// so `/`, `?` or `#` in a name stay inside its segment.
    fn url(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        name: Option<&str>,
    ) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| StoreError::client(format!("invalid endpoint '{}'", self.base_url)))?;
            segments.pop_if_empty();
            if gvr.group.is_empty() {
                segments.extend(["api", gvr.version.as_str()]);
            } else {
                segments.extend(["apis", gvr.group.as_str(), gvr.version.as_str()]);
            }
            segments.extend(["namespaces", namespace, gvr.resource.as_str()]);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    fn collection_url(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
    ) -> Result<Url, StoreError> {
        self.url(gvr, namespace, None)
    }

    fn object_url(&self, coordinate: &ResourceCoordinate) -> Result<Url, StoreError> {
        self.url(&coordinate.gvr, &coordinate.namespace, Some(&coordinate.name))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.http.request(method, url).header("Accept", "application/json");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(
        &self,
        req: RequestBuilder,
        coordinate: Option<&ResourceCoordinate>,
    ) -> Result<Value, StoreError> {
        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::client(format!("request failed: {e}")))?;
        handle_response(resp, coordinate).await
    }
}

async fn handle_response(
    resp: reqwest::Response,
    coordinate: Option<&ResourceCoordinate>,
) -> Result<Value, StoreError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| StoreError::client(format!("failed to read response: {e}")))?;

    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&body)?);
    }

    if status == StatusCode::NOT_FOUND
        && let Some(coordinate) = coordinate
    {
        return Err(StoreError::not_found(coordinate));
    }

    // Rejections carry a `Status` object whose `message` is the useful part.
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StoreError::client(format!(
            "not authorized (HTTP {}): {message}",
            status.as_u16()
        )));
    }
    Err(StoreError::request(status.as_u16(), message))
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get(&self, coordinate: &ResourceCoordinate) -> Result<Value, StoreError> {
        let url = self.object_url(coordinate)?;
        self.send(self.request(Method::GET, url), Some(coordinate))
            .await
    }

    async fn create(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        body: &Value,
    ) -> Result<Value, StoreError> {
        let url = self.collection_url(gvr, namespace)?;
        self.send(self.request(Method::POST, url).json(body), None)
            .await
    }

    async fn patch(
        &self,
        coordinate: &ResourceCoordinate,
        patch: &[u8],
    ) -> Result<Value, StoreError> {
        let url = self.object_url(coordinate)?;
        let req = self
            .request(Method::PATCH, url)
            .header("Content-Type", JSON_PATCH_CONTENT_TYPE)
            .body(patch.to_vec());
        self.send(req, Some(coordinate)).await
    }

    async fn delete(&self, coordinate: &ResourceCoordinate) -> Result<(), StoreError> {
        let url = self.object_url(coordinate)?;
        self.send(self.request(Method::DELETE, url), Some(coordinate))
            .await
            .map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "kubernetes"
    }
}
