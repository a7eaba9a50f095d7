use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;
use crate::plan::RenameMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub root_paths: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Output root. Each scanned root defaults to its own parent directory.
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub rename_mode: RenameMode,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default)]
    pub tmdb_api_key: Option<String>,
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
    /// Seconds a cached provider response stays fresh. `0` disables caching.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Tracing filter used when neither the command line nor `TRACING_LEVEL`
    /// sets one.
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_cache_path() -> String {
    "marquee_cache.db".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    86_400
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_paths: Vec::new(),
            ignore_patterns: Vec::new(),
            output: None,
            rename_mode: RenameMode::default(),
            default_language: default_language(),
            tmdb_api_key: None,
            cache_path: default_cache_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            log_level: None,
        }
    }
}

/// Reads `Config.toml` (optional) and `MARQUEE_*` environment variables.
/// List values in the environment are comma separated.
pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("MARQUEE")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("root_paths")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}

/// Remove directories that are subdirectories of other directories in the list.
/// Order of first appearance is kept.
pub fn non_overlapping_directories(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for dir in dirs {
        if result.iter().any(|kept| dir.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !kept.starts_with(&dir));
        result.push(dir);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_non_overlapping_no_overlap() {
        let result = non_overlapping_directories(paths(&["/media/movies", "/media/tv", "/srv"]));
        assert_eq!(result, paths(&["/media/movies", "/media/tv", "/srv"]));
    }

    #[test]
    fn test_non_overlapping_with_subdirectory() {
        let result =
            non_overlapping_directories(paths(&["/media", "/media/tv", "/srv/downloads"]));
        assert_eq!(result, paths(&["/media", "/srv/downloads"]));
    }

    #[test]
    fn test_non_overlapping_parent_after_child() {
        let result =
            non_overlapping_directories(paths(&["/media/tv", "/media/movies", "/media"]));
        assert_eq!(result, paths(&["/media"]), "parent should replace both children");
    }

    #[test]
    fn test_non_overlapping_sibling_prefix_is_not_nested() {
        let result = non_overlapping_directories(paths(&["/media/tv", "/media/tv2"]));
        assert_eq!(result.len(), 2, "/media/tv2 is not inside /media/tv");
    }

    #[test]
    fn test_non_overlapping_duplicates() {
        let result = non_overlapping_directories(paths(&["/media", "/media"]));
        assert_eq!(result, paths(&["/media"]));
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_language, "en");
        assert_eq!(config.rename_mode, RenameMode::Symlink);
        assert_eq!(config.cache_ttl_secs, 86_400);
        assert!(config.output.is_none());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AppConfig = Config::builder()
            .set_override("root_paths", vec!["/media"])
            .and_then(|b| b.set_override("rename_mode", "copy"))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("config should deserialize");
        assert_eq!(config.root_paths, vec!["/media".to_string()]);
        assert_eq!(config.rename_mode, RenameMode::Copy);
        assert_eq!(config.default_language, "en");
        assert!(config.ignore_patterns.is_empty());
    }

    #[test]
    fn test_invalid_environment_value_is_a_config_error() {
        std::env::set_var("MARQUEE_CACHE_TTL_SECS", "soon");
        let result = load_configuration();
        std::env::remove_var("MARQUEE_CACHE_TTL_SECS");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
