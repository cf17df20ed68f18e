use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;

use super::{Command, KvStore};
use crate::config::Config;

/// Client for a Redis-compatible store exposed over the Upstash REST API
///
/// Single commands are posted to the base URL, batches to `/pipeline` and
/// transactions to `/multi-exec`. Every request carries the bearer token.
#[derive(Clone)]
pub struct RestStore {
    http: Client,
    base_url: String,
    token: String,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("Failed to build HTTP client for the KV REST API")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Self::new(&config.kv_rest_api_url, &config.kv_rest_api_token)?;
        tracing::info!("Using KV REST API at: {}", store.base_url);
        Ok(store)
    }

    async fn post(&self, path: &str, body: JsonValue) -> Result<JsonValue> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach KV REST API at {}", url))?;

        let status = response.status();
        let payload: JsonValue = response
            .json()
            .await
            .with_context(|| format!("KV REST API returned a non-JSON body (status {})", status))?;

        if let Some(error) = payload.get("error").and_then(JsonValue::as_str) {
            bail!("KV store error: {}", error);
        }
        if !status.is_success() {
            bail!("KV REST API returned status {}", status);
        }

        Ok(payload)
    }

    async fn batch(&self, path: &str, commands: Vec<Command>) -> Result<Vec<JsonValue>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let count = commands.len();
        let body: Vec<Vec<String>> = commands.iter().map(Command::to_args).collect();
        let payload = self.post(path, serde_json::to_value(body)?).await?;

        let entries = match payload {
            JsonValue::Array(entries) => entries,
            other => bail!("Unexpected batch reply: {}", other),
        };
        if entries.len() != count {
            bail!("Batch reply has {} entries for {} commands", entries.len(), count);
        }

        let results = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                unwrap_result(entry).with_context(|| format!("Command {} of batch failed", i))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Executed batch of {} commands via {}", count, path);
        Ok(results)
    }
}

/// Extract the `result` of a `{"result": ...}` / `{"error": ...}` envelope
fn unwrap_result(mut entry: JsonValue) -> Result<JsonValue> {
    if let Some(error) = entry.get("error").and_then(JsonValue::as_str) {
        bail!("KV store error: {}", error);
    }
    match entry.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => bail!("Reply is missing a result: {}", entry),
    }
}

#[async_trait]
impl KvStore for RestStore {
    async fn execute(&self, command: Command) -> Result<JsonValue> {
        let args = command.to_args();
        let payload = self.post("", serde_json::to_value(&args)?).await?;
        unwrap_result(payload).with_context(|| format!("{} failed", args[0]))
    }

    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<JsonValue>> {
        self.batch("/pipeline", commands).await
    }

    async fn transaction(&self, commands: Vec<Command>) -> Result<Vec<JsonValue>> {
        self.batch("/multi-exec", commands).await
    }
}
