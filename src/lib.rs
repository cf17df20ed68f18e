//! HTTP catalogue of careers and subjects stored in a Redis-compatible
//! key-value store reached over its REST API.

pub mod api_doc;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod kv;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;
