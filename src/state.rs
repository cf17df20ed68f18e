use crate::config::Config;
use crate::repository::Repository;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repository: Repository,
    pub config: Arc<Config>,
}
