//! Access to the upstream content API.
//!
//! Everything that talks to the network goes through the [`Upstream`] trait so the pipeline can
//! be driven by an in-memory implementation in tests. [`HttpUpstream`] is the production
//! implementation on top of `reqwest`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::CatalogueConfig;
use crate::error::UpstreamError;
use crate::model::parse_records;

/// HTTP verbs used for upstream writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteMethod {
    Post,
    Put,
}

/// Status and body of an upstream write, whatever the status.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetches a JSON document from `path` below the API root.
    async fn get_json(&self, path: &str) -> Result<Value, UpstreamError>;

    /// Fetches raw bytes from an absolute URL, without API credentials.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, UpstreamError>;

    /// Sends `body` to `path` below the API root.
    ///
    /// Non-2xx replies are returned as values so callers can relay them.
    async fn send_json(
        &self,
        method: WriteMethod,
        path: &str,
        body: &Value,
    ) -> Result<UpstreamReply, UpstreamError>;
}

/// Fetches a collection and parses its records, degrading to an empty list on failure.
pub async fn fetch_collection<T>(upstream: &dyn Upstream, path: &str) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    match upstream.get_json(path).await {
        Ok(payload) => {
            let records = parse_records(&payload);
            debug!("loaded {} records from {path}", records.len());
            records
        }
        Err(err) => {
            warn!("treating {path} as empty: {err}");
            Vec::new()
        }
    }
}

/// [`Upstream`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpUpstream {
    client: reqwest::Client,
    config: CatalogueConfig,
}

impl HttpUpstream {
    pub fn new(config: CatalogueConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|err| UpstreamError::Transport {
                url: config.api_base_url.clone(),
                message: err.to_string(),
            })?;
        Ok(Self { client, config })
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        for (name, value) in self.config.auth_headers() {
            request = request.header(name, value);
        }
        request
    }
}

fn transport(url: &str, err: reqwest::Error) -> UpstreamError {
    UpstreamError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get_json(&self, path: &str) -> Result<Value, UpstreamError> {
        let url = self.config.endpoint(path);
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|err| transport(&url, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url,
                status: status.as_u16(),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| UpstreamError::Decode {
                url,
                message: err.to_string(),
            })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, UpstreamError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport(url, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(|err| transport(url, err))?;
        Ok(bytes.to_vec())
    }

    async fn send_json(
        &self,
        method: WriteMethod,
        path: &str,
        body: &Value,
    ) -> Result<UpstreamReply, UpstreamError> {
        let url = self.config.endpoint(path);
        let method = match method {
            WriteMethod::Post => Method::POST,
            WriteMethod::Put => Method::PUT,
        };
        let response = self
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|err| transport(&url, err))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|err| transport(&url, err))?;
        Ok(UpstreamReply {
            status,
            body: reply_body(&text),
        })
    }
}

/// In-memory [`Upstream`] serving canned documents and assets.
///
/// Used by tests and for rendering against fixture data. Paths are matched without their
/// leading slash; unknown paths and URLs answer 404. Writes are recorded and answered with the
/// reply registered for their method and path, or `200 {}` when none was registered.
#[derive(Debug, Default)]
pub struct MemoryUpstream {
    documents: HashMap<String, Value>,
    assets: HashMap<String, Vec<u8>>,
    replies: HashMap<(WriteMethod, String), UpstreamReply>,
    writes: Mutex<Vec<(WriteMethod, String, Value)>>,
}

impl MemoryUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `document` for `path`.
    pub fn with_json(mut self, path: &str, document: Value) -> Self {
        self.documents
            .insert(path.trim_start_matches('/').to_string(), document);
        self
    }

    /// Serves `bytes` for the absolute `url`.
    pub fn with_asset(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.assets.insert(url.to_string(), bytes);
        self
    }

    /// Answers writes to `path` with `reply`.
    pub fn with_reply(mut self, method: WriteMethod, path: &str, reply: UpstreamReply) -> Self {
        self.replies
            .insert((method, path.trim_start_matches('/').to_string()), reply);
        self
    }

    /// Writes received so far, in order.
    pub fn writes(&self) -> Vec<(WriteMethod, String, Value)> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Upstream for MemoryUpstream {
    async fn get_json(&self, path: &str) -> Result<Value, UpstreamError> {
        let path = path.trim_start_matches('/');
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| UpstreamError::Status {
                url: path.to_string(),
                status: 404,
            })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, UpstreamError> {
        self.assets.get(url).cloned().ok_or_else(|| UpstreamError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    async fn send_json(
        &self,
        method: WriteMethod,
        path: &str,
        body: &Value,
    ) -> Result<UpstreamReply, UpstreamError> {
        let path = path.trim_start_matches('/').to_string();
        let reply = self
            .replies
            .get(&(method, path.clone()))
            .cloned()
            .unwrap_or(UpstreamReply {
                status: 200,
                body: json!({}),
            });
        match self.writes.lock() {
            Ok(mut writes) => writes.push((method, path, body.clone())),
            Err(poisoned) => poisoned.into_inner().push((method, path, body.clone())),
        }
        Ok(reply)
    }
}

/// Parses a reply body as JSON, wrapping anything else as `{ "message": <text> }`.
fn reply_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "message": text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_bodies_fall_back_to_a_message() {
        assert_eq!(reply_body(r#"{"ok":true}"#), json!({ "ok": true }));
        assert_eq!(reply_body("Bad Gateway"), json!({ "message": "Bad Gateway" }));
        assert_eq!(reply_body("  "), Value::Null);
    }

    #[test]
    fn reply_success_is_2xx() {
        let reply = |status| UpstreamReply {
            status,
            body: Value::Null,
        };
        assert!(reply(201).is_success());
        assert!(!reply(302).is_success());
        assert!(!reply(422).is_success());
    }

    #[tokio::test]
    async fn memory_upstream_serves_fixtures_and_records_writes() {
        let upstream = MemoryUpstream::new()
            .with_json("/product", json!({ "data": [{ "slug": "a" }] }))
            .with_asset("https://cdn.example.com/a.jpg", vec![1, 2, 3])
            .with_reply(
                WriteMethod::Post,
                "contacts",
                UpstreamReply {
                    status: 409,
                    body: json!({ "message": "duplicate" }),
                },
            );

        let records: Vec<crate::model::ProductRecord> = fetch_collection(&upstream, "product").await;
        assert_eq!(records.len(), 1);
        let missing: Vec<crate::model::SeoRecord> = fetch_collection(&upstream, "seo").await;
        assert!(missing.is_empty());

        assert_eq!(
            upstream.get_bytes("https://cdn.example.com/a.jpg").await.unwrap(),
            vec![1, 2, 3]
        );
        assert!(upstream.get_bytes("https://cdn.example.com/b.jpg").await.is_err());

        let reply = upstream
            .send_json(WriteMethod::Post, "contacts", &json!({ "email": "x" }))
            .await
            .unwrap();
        assert_eq!(reply.status, 409);
        let reply = upstream
            .send_json(WriteMethod::Put, "contacts/1", &json!({}))
            .await
            .unwrap();
        assert!(reply.is_success());
        assert_eq!(upstream.writes().len(), 2);
        assert_eq!(upstream.writes()[1].1, "contacts/1");
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(HttpUpstream::new(CatalogueConfig::default()).is_ok());
    }
}
