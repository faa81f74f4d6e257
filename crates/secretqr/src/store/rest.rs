//! Hosted message store speaking the PostgREST dialect.
//!
//! Tables live under `{base}/rest/v1/{table}`. Every request carries the API
//! key both as `apikey` and as a bearer token. Filters use the `eq.` operator
//! and lookups are capped with `limit=1`; an empty result array means "no
//! such row".

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::MessageStore;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::message::{Message, MessageId};

const MESSAGES_TABLE: &str = "messages";
const CONFIG_TABLE: &str = "config";

/// Postgres error code for a value that does not parse as the column type,
/// e.g. `abc` against a uuid or bigint key.
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Client for a PostgREST-compatible hosted store.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base: Url,
    api_key: String,
}

/// Row shape returned for the `messages` table.
#[derive(Debug, Deserialize)]
struct MessageRow {
    id: RawId,
    content: String,
    #[serde(default)]
    created_at: Option<String>,
}

/// Row shape returned for the `config` table.
#[derive(Debug, Deserialize)]
struct ConfigRow {
    value: String,
}

/// Error body PostgREST sends with 4xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Hosted tables may key messages by text/uuid or by bigint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl MessageRow {
    fn into_message(self) -> Result<Message> {
        let raw_id = match self.id {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        };
        let id = MessageId::parse(&raw_id)
            .ok_or_else(|| Error::invalid_response("message row has an empty id"))?;

        let created_at = self.created_at.as_deref().and_then(|raw| {
            let parsed = DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc));
            if parsed.is_none() {
                debug!(raw, "Ignoring unparseable created_at");
            }
            parsed
        });

        Ok(Message {
            id,
            content: self.content,
            created_at,
        })
    }
}

impl RestStore {
    /// Build a client for the store at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| Error::ConfigValidation {
            message: format!("invalid store URL '{base_url}': {e}"),
        })?;
        // Url::join replaces the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base,
            api_key: api_key.into(),
        })
    }

    /// Build a client from the `[store]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if `rest_url` or `api_key` is missing, or if the client
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config
            .store
            .rest_url
            .as_deref()
            .ok_or_else(|| Error::ConfigValidation {
                message: "rest backend requires store.rest_url".to_string(),
            })?;
        let api_key = config
            .store
            .api_key
            .clone()
            .ok_or_else(|| Error::ConfigValidation {
                message: "rest backend requires store.api_key".to_string(),
            })?;
        Self::new(url, api_key, config.store_timeout())
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.base
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| Error::internal(format!("cannot build URL for table {table}: {e}")))
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .request(method, self.table_url(table)?)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key))
    }

    fn insert_message_request(&self, content: &str) -> Result<RequestBuilder> {
        Ok(self
            .request(Method::POST, MESSAGES_TABLE)?
            .header("Prefer", "return=representation")
            .json(&serde_json::json!([{ "content": content }])))
    }

    fn select_message_request(&self, id: &MessageId) -> Result<RequestBuilder> {
        Ok(self.request(Method::GET, MESSAGES_TABLE)?.query(&[
            ("select", "id,content,created_at".to_string()),
            ("id", format!("eq.{id}")),
            ("limit", "1".to_string()),
        ]))
    }

    fn select_config_request(&self, key: &str) -> Result<RequestBuilder> {
        Ok(self.request(Method::GET, CONFIG_TABLE)?.query(&[
            ("select", "value".to_string()),
            ("key", format!("eq.{key}")),
            ("limit", "1".to_string()),
        ]))
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<Vec<T>> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_client_error() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return Err(Error::StoreRejected {
                status: status.as_u16(),
                code: body.code,
                message: body.message.unwrap_or_else(|| status.to_string()),
            });
        }
        let rows = response.error_for_status()?.json::<Vec<T>>().await?;
        Ok(rows)
    }
}

#[async_trait]
impl MessageStore for RestStore {
    fn backend_name(&self) -> &'static str {
        "rest"
    }

    async fn insert_message(&self, content: &str) -> Result<Message> {
        let rows: Vec<MessageRow> = Self::fetch_rows(self.insert_message_request(content)?).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_response("insert returned no rows"))?;
        let message = row.into_message()?;
        debug!(id = %message.id, "Inserted message");
        Ok(message)
    }

    async fn find_message(&self, id: &MessageId) -> Result<Option<Message>> {
        match Self::fetch_rows::<MessageRow>(self.select_message_request(id)?).await {
            Ok(rows) => rows.into_iter().next().map(MessageRow::into_message).transpose(),
            // An id that cannot even be a key was never issued.
            Err(Error::StoreRejected {
                code: Some(code), ..
            }) if code == INVALID_TEXT_REPRESENTATION => {
                debug!(id = %id, "Store rejected id format; treating as not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn find_config(&self, key: &str) -> Result<Option<String>> {
        let rows: Vec<ConfigRow> = Self::fetch_rows(self.select_config_request(key)?).await?;
        if rows.len() > 1 {
            warn!(key, "Config lookup returned more than one row; using the first");
        }
        Ok(rows.into_iter().next().map(|row| row.value))
    }
}
