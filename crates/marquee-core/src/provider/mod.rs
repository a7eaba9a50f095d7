pub mod cache;
pub mod tmdb;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::Error as CrateError;
use crate::identity::records::{MovieRecord, ShowRecord};
use crate::identity::Identity;
use crate::parser::ParsedInfo;

pub use cache::ResponseCache;
pub use tmdb::TmdbProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no result")]
    NoResult,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("missing API key for {0}")]
    MissingApiKey(String),
}

/// A metadata source able to turn a request into a canonical record.
///
/// `search_tv` returns the show with every season and episode loaded so
/// children can be resolved against it without further searches.
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    fn search_movie(&self, request: &Request) -> Result<MovieRecord, ProviderError>;
    fn search_tv(&self, request: &Request) -> Result<ShowRecord, ProviderError>;
    fn movie_details(&self, id: u64, language: &str) -> Result<MovieRecord, ProviderError>;
    fn show_details(&self, id: u64, language: &str) -> Result<ShowRecord, ProviderError>;
}

/// One lookup, built per entry and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Request {
    pub query: String,
    pub year: Option<i32>,
    pub language: String,
    pub info: ParsedInfo,
    pub is_dir: bool,
    pub parent: Option<Identity>,
}

impl Request {
    pub fn new(info: ParsedInfo, is_dir: bool, language: impl Into<String>) -> Self {
        Self {
            query: info.title.clone(),
            year: info.year,
            language: language.into(),
            info,
            is_dir,
            parent: None,
        }
    }

    pub fn with_parent(&self, parent: Identity) -> Self {
        Self {
            parent: Some(parent),
            ..self.clone()
        }
    }

    /// The same lookup without an inherited identity.
    pub fn detached(&self) -> Self {
        Self {
            parent: None,
            ..self.clone()
        }
    }
}

/// Opens the response cache at the configured path.
pub fn open_cache(config: &AppConfig) -> Result<ResponseCache, CrateError> {
    let cache = ResponseCache::open(
        &config.cache_path,
        Duration::from_secs(config.cache_ttl_secs),
    )?;
    Ok(cache)
}

/// Providers in lookup order, backed by the configured cache with expired
/// responses purged.
pub fn configured_providers(config: &AppConfig) -> Result<Vec<Arc<dyn Provider>>, CrateError> {
    let api_key = config
        .tmdb_api_key
        .clone()
        .ok_or_else(|| ProviderError::MissingApiKey("tmdb".to_string()))?;
    let tmdb = TmdbProvider::new(api_key)?;

    let cache = open_cache(config)?;
    match cache.purge_expired() {
        Ok(0) => {}
        Ok(purged) => debug!("Purged {} expired responses", purged),
        Err(e) => warn!("Could not purge expired responses: {}", e),
    }

    let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(tmdb.with_cache(cache))];
    Ok(providers)
}
