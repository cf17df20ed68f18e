use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{Command, KvStore};

#[derive(Debug, Clone)]
enum Entry {
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
}

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// In-process store with the same reply shapes as the REST API.
///
/// Keeps counters of round trips and applied write commands so callers can
/// assert how much traffic an operation would generate, and can be switched
/// into a failing mode to simulate an unreachable store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, Entry>>>,
    round_trips: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls that would have hit the network
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Number of write commands applied
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn begin(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("KV store unavailable");
        }
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn apply(&self, data: &mut HashMap<String, Entry>, command: Command) -> Result<JsonValue> {
        if command.is_write() {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }

        match command {
            Command::Ping => Ok(json!("PONG")),
            Command::Exists(key) => Ok(json!(i64::from(data.contains_key(&key)))),
            Command::HGetAll(key) => match data.get(&key) {
                None => Ok(json!([])),
                Some(Entry::Hash(fields)) => Ok(JsonValue::Array(
                    fields
                        .iter()
                        .flat_map(|(f, v)| [json!(f), json!(v)])
                        .collect(),
                )),
                Some(Entry::Set(_)) => bail!(WRONGTYPE),
            },
            Command::HSet { key, fields } => {
                if fields.is_empty() {
                    bail!("ERR wrong number of arguments for 'hset' command");
                }
                let entry = data
                    .entry(key)
                    .or_insert_with(|| Entry::Hash(BTreeMap::new()));
                let Entry::Hash(hash) = entry else {
                    bail!(WRONGTYPE);
                };
                let added = fields
                    .into_iter()
                    .filter(|(field, value)| hash.insert(field.clone(), value.clone()).is_none())
                    .count();
                Ok(json!(added))
            }
            Command::SAdd { key, members } => {
                let entry = data
                    .entry(key)
                    .or_insert_with(|| Entry::Set(BTreeSet::new()));
                let Entry::Set(set) = entry else {
                    bail!(WRONGTYPE);
                };
                let added = members.into_iter().filter(|m| set.insert(m.clone())).count();
                Ok(json!(added))
            }
            Command::SMembers(key) => match data.get(&key) {
                None => Ok(json!([])),
                Some(Entry::Set(members)) => Ok(json!(members.iter().collect::<Vec<_>>())),
                Some(Entry::Hash(_)) => bail!(WRONGTYPE),
            },
        }
    }

    async fn run_batch(&self, commands: Vec<Command>) -> Result<Vec<JsonValue>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        self.begin()?;

        let mut data = self.data.lock().await;
        commands
            .into_iter()
            .map(|command| self.apply(&mut data, command))
            .collect()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn execute(&self, command: Command) -> Result<JsonValue> {
        self.begin()?;
        let mut data = self.data.lock().await;
        self.apply(&mut data, command)
    }

    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<JsonValue>> {
        self.run_batch(commands).await
    }

    async fn transaction(&self, commands: Vec<Command>) -> Result<Vec<JsonValue>> {
        self.run_batch(commands).await
    }
}
