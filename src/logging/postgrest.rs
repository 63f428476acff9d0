//! PostgREST (Supabase) durable store.
//!
//! Rows go to `POST {url}/rest/v1/{table}` and come back from
//! `GET {url}/rest/v1/{table}?select=*&limit=N`, authenticated with the
//! project key in both the `apikey` and bearer headers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::store::DurableStore;
use crate::{GatewayError, Result};

/// Environment variable holding the project URL.
pub const URL_ENV_VAR: &str = "SUPABASE_URL";

/// Environment variable holding the project key.
pub const KEY_ENV_VAR: &str = "SUPABASE_KEY";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`DurableStore`] backed by a PostgREST endpoint.
#[derive(Clone)]
pub struct PostgrestStore {
    http: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn transport_error(err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(DEFAULT_TIMEOUT)
        } else if err.is_connect() || err.is_request() {
            GatewayError::Connection(err.to_string())
        } else {
            GatewayError::Storage(err.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status.as_u16() {
            401 | 403 => Err(GatewayError::AuthenticationFailed),
            code => {
                let body = response.text().await.unwrap_or_default();
                Err(GatewayError::Api {
                    status: code,
                    message: if body.is_empty() {
                        format!("PostgREST error: {status}")
                    } else {
                        body
                    },
                })
            }
        }
    }
}

#[async_trait]
impl DurableStore for PostgrestStore {
    fn name(&self) -> &str {
        "postgrest"
    }

    async fn insert(&self, table: &str, row: Value) -> Result<()> {
        debug!(table, "inserting row");
        let response = self
            .http
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn select(&self, table: &str, limit: usize) -> Result<Vec<Value>> {
        let limit = limit.to_string();
        let response = self
            .http
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[("select", "*"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(Self::transport_error)?;
        let response = Self::check_status(response).await?;
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| GatewayError::Storage(format!("malformed select response: {e}")))
    }
}
