//! REST data API connection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forcelink_types::{Connection, ConnectionError, FindQuery, Result};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value, json};
use tracing::{debug, info};
use url::Url;

use crate::error::{extract_error, http_error};
use crate::soql::{build_find_soql, check_identifier};

/// An authenticated session against one org instance.
///
/// Cheap to clone; clones share the HTTP client and credentials.
#[derive(Clone)]
pub struct RestConnection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    http: reqwest::Client,
    instance_url: String,
    access_token: String,
    api_version: String,
    timeout: Duration,
}

impl fmt::Debug for RestConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestConnection")
            .field("instance_url", &self.inner.instance_url)
            .field("api_version", &self.inner.api_version)
            .finish_non_exhaustive()
    }
}

impl RestConnection {
    pub fn new(
        http: reqwest::Client,
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                http,
                instance_url: instance_url.into().trim_end_matches('/').to_string(),
                access_token: access_token.into(),
                api_version: api_version.into(),
                timeout,
            }),
        }
    }

    /// Session id / access token the connection authenticates with.
    pub fn access_token(&self) -> &str {
        &self.inner.access_token
    }

    pub fn api_version(&self) -> &str {
        &self.inner.api_version
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    fn instance(&self) -> Result<Url> {
        Url::parse(&self.inner.instance_url).map_err(|e| {
            ConnectionError::InvalidRequest(format!(
                "invalid instance url '{}': {}",
                self.inner.instance_url, e
            ))
        })
    }

    /// `<instance>/services/data/v<version>/<segments...>`, each segment escaped.
    fn data_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.instance()?;
        let version = format!("v{}", self.inner.api_version);
        url.path_segments_mut()
            .map_err(|_| ConnectionError::InvalidRequest("instance url cannot be a base".into()))?
            .pop_if_empty()
            .extend(["services", "data", version.as_str()])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        debug!(%method, %url, "REST request");
        let mut request = self
            .inner
            .http
            .request(method, url)
            .bearer_auth(&self.inner.access_token)
            .timeout(self.inner.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(http_error)?;
        if !response.status().is_success() {
            return Err(extract_error(response).await);
        }
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response.text().await.map_err(http_error)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn create_one(&self, entity: &str, record: &Value) -> Result<Value> {
        let url = self.data_url(&["sobjects", entity])?;
        self.send(Method::POST, url, Some(&strip(record, &[]))).await
    }

    async fn update_one(&self, entity: &str, record: &Value) -> Result<Value> {
        let id = record_id(record)
            .ok_or_else(|| ConnectionError::InvalidRequest("Id is required for update".into()))?;
        let url = self.data_url(&["sobjects", entity, &id])?;
        self.send(Method::PATCH, url, Some(&strip(record, &["Id", "id"])))
            .await?;
        Ok(json!({ "id": id, "success": true, "errors": [] }))
    }

    async fn upsert_one(
        &self,
        entity: &str,
        record: &Value,
        external_id_name: &str,
    ) -> Result<Value> {
        let external_id = match record.get(external_id_name) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(ConnectionError::InvalidRequest(format!(
                    "{} is required for upsert",
                    external_id_name
                )));
            }
        };
        let url = self.data_url(&["sobjects", entity, external_id_name, &external_id])?;
        let result = self
            .send(Method::PATCH, url, Some(&strip(record, &[external_id_name])))
            .await?;
        if result.is_null() {
            Ok(json!({ "success": true, "errors": [] }))
        } else {
            Ok(result)
        }
    }

    async fn destroy_one(&self, entity: &str, id: &str) -> Result<Value> {
        let url = self.data_url(&["sobjects", entity, id])?;
        self.send(Method::DELETE, url, None).await?;
        Ok(json!({ "id": id, "success": true, "errors": [] }))
    }

    /// sObject collection request body.
    fn collection(entity: &str, records: &[Value]) -> Value {
        let records: Vec<Value> = records
            .iter()
            .map(|record| {
                let mut fields = match strip(record, &[]) {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                fields.insert("attributes".into(), json!({ "type": entity }));
                Value::Object(fields)
            })
            .collect();
        json!({ "allOrNone": false, "records": records })
    }
}

#[async_trait]
impl Connection for RestConnection {
    fn instance_url(&self) -> &str {
        &self.inner.instance_url
    }

    async fn logout(&self) -> Result<()> {
        let mut url = self.instance()?;
        url.set_path("/services/oauth2/revoke");

        let response = self
            .inner
            .http
            .post(url)
            .form(&[("token", self.inner.access_token.as_str())])
            .timeout(self.inner.timeout)
            .send()
            .await
            .map_err(http_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Api {
                status,
                code: "REVOKE_FAILED".to_string(),
                message: body,
            });
        }

        info!(instance_url = %self.inner.instance_url, "Session revoked");
        Ok(())
    }

    async fn query(&self, soql: &str) -> Result<Value> {
        let mut url = self.data_url(&["query"])?;
        url.query_pairs_mut().append_pair("q", soql);
        self.send(Method::GET, url, None).await
    }

    async fn find(&self, query: &FindQuery) -> Result<Value> {
        let soql = build_find_soql(query)?;
        self.query(&soql).await
    }

    async fn describe(&self, object: &str) -> Result<Value> {
        check_identifier(object)?;
        let url = self.data_url(&["sobjects", object, "describe"])?;
        self.send(Method::GET, url, None).await
    }

    async fn describe_global(&self) -> Result<Value> {
        let url = self.data_url(&["sobjects"])?;
        self.send(Method::GET, url, None).await
    }

    async fn create(&self, entity: &str, details: &Value) -> Result<Value> {
        check_identifier(entity)?;
        match details {
            Value::Array(records) => {
                let url = self.data_url(&["composite", "sobjects"])?;
                let body = Self::collection(entity, records);
                self.send(Method::POST, url, Some(&body)).await
            }
            Value::Object(_) => self.create_one(entity, details).await,
            _ => Err(record_shape_error("create")),
        }
    }

    async fn update(&self, entity: &str, details: &Value) -> Result<Value> {
        check_identifier(entity)?;
        match details {
            Value::Array(records) => {
                let mut normalized = Vec::with_capacity(records.len());
                for record in records {
                    let id = record_id(record).ok_or_else(|| {
                        ConnectionError::InvalidRequest("Id is required for update".into())
                    })?;
                    let mut fields = match strip(record, &["Id", "id"]) {
                        Value::Object(map) => map,
                        _ => Map::new(),
                    };
                    fields.insert("Id".into(), Value::String(id));
                    normalized.push(Value::Object(fields));
                }
                let url = self.data_url(&["composite", "sobjects"])?;
                let body = Self::collection(entity, &normalized);
                self.send(Method::PATCH, url, Some(&body)).await
            }
            Value::Object(_) => self.update_one(entity, details).await,
            _ => Err(record_shape_error("update")),
        }
    }

    async fn upsert(
        &self,
        entity: &str,
        details: &Value,
        external_id_name: &str,
    ) -> Result<Value> {
        check_identifier(entity)?;
        check_identifier(external_id_name)?;
        match details {
            Value::Array(records) => {
                let mut results = Vec::with_capacity(records.len());
                for record in records {
                    results.push(self.upsert_one(entity, record, external_id_name).await?);
                }
                Ok(Value::Array(results))
            }
            Value::Object(_) => self.upsert_one(entity, details, external_id_name).await,
            _ => Err(record_shape_error("upsert")),
        }
    }

    async fn destroy(&self, entity: &str, ids: &Value) -> Result<Value> {
        check_identifier(entity)?;
        match ids {
            Value::String(id) => self.destroy_one(entity, id).await,
            Value::Object(_) => {
                let id = record_id(ids).ok_or_else(|| {
                    ConnectionError::InvalidRequest("Id is required for delete".into())
                })?;
                self.destroy_one(entity, &id).await
            }
            Value::Array(items) => {
                let ids = items
                    .iter()
                    .map(|item| match item {
                        Value::String(id) => Some(id.clone()),
                        other => record_id(other),
                    })
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        ConnectionError::InvalidRequest("Id is required for delete".into())
                    })?;
                let mut url = self.data_url(&["composite", "sobjects"])?;
                url.query_pairs_mut()
                    .append_pair("ids", &ids.join(","))
                    .append_pair("allOrNone", "false");
                self.send(Method::DELETE, url, None).await
            }
            _ => Err(record_shape_error("delete")),
        }
    }
}

fn record_id(record: &Value) -> Option<String> {
    record
        .get("Id")
        .or_else(|| record.get("id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from)
}

/// Copy of a record without `attributes` and the given keys.
fn strip(record: &Value, keys: &[&str]) -> Value {
    match record {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| k.as_str() != "attributes" && !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn record_shape_error(operation: &str) -> ConnectionError {
    ConnectionError::InvalidRequest(format!(
        "{} expects a record object or an array of records",
        operation
    ))
}
