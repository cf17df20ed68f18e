//! Records stored as hashes, enumerated through index sets.
//!
//! Every record lives under its own key and is a member of one or more index
//! sets. Listing a collection resolves its index set and fetches all member
//! hashes in one batched request.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::kv::{decode_hash, decode_integer, decode_members, Command, KvStore, Record};

/// A record to create together with the index sets it belongs to
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub key: String,
    pub record: Record,
    pub indexes: Vec<String>,
}

/// Shareable repository over any [`KvStore`]
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn KvStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Write one record and its index memberships in a single batch
    pub async fn add(&self, entry: NewRecord) -> Result<()> {
        self.add_all(vec![entry]).await
    }

    /// Write many records and their index memberships in a single batch
    ///
    /// The batch is sent as a store transaction. Nothing is sent when
    /// `entries` is empty.
    pub async fn add_all(&self, entries: Vec<NewRecord>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let count = entries.len();
        let mut commands = Vec::new();
        for entry in entries {
            commands.push(Command::hset(entry.key.clone(), &entry.record));
            for index in entry.indexes {
                commands.push(Command::sadd(index, entry.key.clone()));
            }
        }

        self.store
            .transaction(commands)
            .await
            .context("Failed to write records")?;

        tracing::debug!("Wrote {} record(s)", count);
        Ok(())
    }

    /// Return every record currently listed in `index`.
    ///
    /// Uses at most two round trips: one for the member keys and, when there
    /// are any, one pipelined HGETALL for all of them. Members whose record
    /// no longer exists are skipped.
    pub async fn list_all(&self, index: &str) -> Result<Vec<Record>> {
        self.resolve_index(index)
            .await
            .with_context(|| format!("Failed to retrieve data from index {}", index))
    }

    async fn resolve_index(&self, index: &str) -> Result<Vec<Record>> {
        let reply = self.store.execute(Command::SMembers(index.to_string())).await?;
        let keys: Vec<String> = decode_members(reply)?
            .into_iter()
            .filter(|key| !key.is_empty())
            .collect();

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let commands = keys.iter().cloned().map(Command::HGetAll).collect();
        let replies = self.store.pipeline(commands).await?;

        let mut records = Vec::with_capacity(replies.len());
        for (key, reply) in keys.iter().zip(replies) {
            match decode_hash(reply)? {
                Some(record) => records.push(record),
                None => tracing::warn!("Index {} references missing record {}", index, key),
            }
        }

        tracing::debug!("Resolved {} record(s) from index {}", records.len(), index);
        Ok(records)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let reply = self
            .store
            .execute(Command::Exists(key.to_string()))
            .await
            .with_context(|| format!("Failed to check existence of {}", key))?;
        Ok(decode_integer(&reply)? > 0)
    }

    pub async fn get(&self, key: &str) -> Result<Option<Record>> {
        let reply = self
            .store
            .execute(Command::HGetAll(key.to_string()))
            .await
            .with_context(|| format!("Failed to read {}", key))?;
        decode_hash(reply)
    }

    /// Merge `changes` into an existing record and return the stored result
    ///
    /// Returns `Ok(None)` when `key` does not exist. Fields not mentioned in
    /// `changes` are left untouched.
    pub async fn update(&self, key: &str, changes: &Record) -> Result<Option<Record>> {
        if !self.exists(key).await? {
            return Ok(None);
        }

        let mut commands = Vec::with_capacity(2);
        if !changes.is_empty() {
            commands.push(Command::hset(key, changes));
        }
        commands.push(Command::HGetAll(key.to_string()));

        let replies = self
            .store
            .pipeline(commands)
            .await
            .with_context(|| format!("Failed to update {}", key))?;

        match replies.into_iter().last() {
            Some(reply) => decode_hash(reply),
            None => Ok(None),
        }
    }

    /// Round trip to the store
    pub async fn ping(&self) -> Result<()> {
        self.store
            .execute(Command::Ping)
            .await
            .context("Failed to ping KV store")?;
        Ok(())
    }
}
