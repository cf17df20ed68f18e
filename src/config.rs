use std::env;
use anyhow::{Context, Result};

/// Key names used to lay records and their index sets out in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    pub career_index: String,
    pub subject_index: String,
}

impl Default for Keyspace {
    fn default() -> Self {
        Self {
            career_index: "idx:carreras".to_string(),
            subject_index: "idx:asignaturas".to_string(),
        }
    }
}

impl Keyspace {
    pub fn career_key(&self, codigo: &str) -> String {
        format!("carrera:{}", codigo)
    }

    pub fn subject_key(&self, id: &str) -> String {
        format!("asignatura:{}", id)
    }

    /// Set holding the subject keys that belong to one career
    pub fn career_subjects_index(&self, codigo: &str) -> String {
        format!("idx:carrera:{}:asignaturas", codigo)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub kv_rest_api_url: String,
    pub kv_rest_api_token: String,
    pub service_port: u16,
    pub service_host: String,
    pub keyspace: Keyspace,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kv_rest_api_url = lookup("KV_REST_API_URL")
            .filter(|v| !v.is_empty())
            .context("KV_REST_API_URL environment variable is required")?;

        let kv_rest_api_token = lookup("KV_REST_API_TOKEN")
            .filter(|v| !v.is_empty())
            .context("KV_REST_API_TOKEN environment variable is required")?;

        let service_port = lookup("SERVICE_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = lookup("SERVICE_HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string());

        let defaults = Keyspace::default();
        let keyspace = Keyspace {
            career_index: lookup("CAREER_INDEX_KEY").unwrap_or(defaults.career_index),
            subject_index: lookup("SUBJECT_INDEX_KEY").unwrap_or(defaults.subject_index),
        };

        Ok(Config {
            kv_rest_api_url: kv_rest_api_url.trim_end_matches('/').to_string(),
            kv_rest_api_token,
            service_port,
            service_host,
            keyspace,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  KV REST API: {}", self.kv_rest_api_url);
        tracing::info!("  KV token: <redacted, {} chars>", self.kv_rest_api_token.len());
        tracing::info!("  Career index: {}", self.keyspace.career_index);
        tracing::info!("  Subject index: {}", self.keyspace.subject_index);
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}
