//! Key-value store access.
//!
//! Commands are modelled after the Redis commands the service needs and
//! replies use the JSON shape of the Upstash REST API, so that the REST client
//! and the in-memory store are interchangeable behind [`KvStore`].

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod rest;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;
pub use rest::RestStore;

/// A flat field -> value mapping as stored in a hash
pub type Record = Map<String, JsonValue>;

/// Store commands used by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Exists(String),
    HGetAll(String),
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    SAdd {
        key: String,
        members: Vec<String>,
    },
    SMembers(String),
}

impl Command {
    /// Build an HSET that writes every field of `record`
    pub fn hset(key: impl Into<String>, record: &Record) -> Self {
        Command::HSet {
            key: key.into(),
            fields: record
                .iter()
                .map(|(field, value)| (field.clone(), encode_field(value)))
                .collect(),
        }
    }

    pub fn sadd(key: impl Into<String>, member: impl Into<String>) -> Self {
        Command::SAdd {
            key: key.into(),
            members: vec![member.into()],
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Command::HSet { .. } | Command::SAdd { .. })
    }

    /// Wire form: command name followed by its arguments
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Command::Ping => vec!["PING".to_string()],
            Command::Exists(key) => vec!["EXISTS".to_string(), key.clone()],
            Command::HGetAll(key) => vec!["HGETALL".to_string(), key.clone()],
            Command::HSet { key, fields } => {
                let mut args = vec!["HSET".to_string(), key.clone()];
                for (field, value) in fields {
                    args.push(field.clone());
                    args.push(value.clone());
                }
                args
            }
            Command::SAdd { key, members } => {
                let mut args = vec!["SADD".to_string(), key.clone()];
                args.extend(members.iter().cloned());
                args
            }
            Command::SMembers(key) => vec!["SMEMBERS".to_string(), key.clone()],
        }
    }
}

/// A remote (or fake) key-value store.
///
/// `pipeline` and `transaction` both send every command in one round trip;
/// `transaction` additionally asks the store to apply them as a unit. A
/// failure of any single command fails the whole call.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn execute(&self, command: Command) -> Result<JsonValue>;

    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<JsonValue>>;

    async fn transaction(&self, commands: Vec<Command>) -> Result<Vec<JsonValue>>;
}

/// Encode a JSON value as a hash field value.
///
/// Strings are kept verbatim, everything else is stored as compact JSON text.
pub fn encode_field(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decode an HGETALL reply. An empty reply means the key does not exist.
pub fn decode_hash(reply: JsonValue) -> Result<Option<Record>> {
    let items = match reply {
        JsonValue::Null => return Ok(None),
        JsonValue::Array(items) => items,
        other => bail!("Unexpected HGETALL reply: {}", other),
    };

    if items.is_empty() {
        return Ok(None);
    }
    if items.len() % 2 != 0 {
        bail!("HGETALL reply has an odd number of elements");
    }

    let mut record = Record::new();
    let mut iter = items.into_iter();
    while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
        let field = reply_string(field)?;
        let value = reply_string(value)?;
        record.insert(field, JsonValue::String(value));
    }
    Ok(Some(record))
}

/// Decode an SMEMBERS reply
pub fn decode_members(reply: JsonValue) -> Result<Vec<String>> {
    match reply {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::Array(items) => items.into_iter().map(reply_string).collect(),
        other => bail!("Unexpected SMEMBERS reply: {}", other),
    }
}

/// Decode an integer reply (EXISTS, SADD, HSET)
pub fn decode_integer(reply: &JsonValue) -> Result<i64> {
    reply
        .as_i64()
        .ok_or_else(|| anyhow!("Expected an integer reply, got {}", reply))
}

fn reply_string(value: JsonValue) -> Result<String> {
    match value {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => bail!("Expected a string element, got {}", other),
    }
}
