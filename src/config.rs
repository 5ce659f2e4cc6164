//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the database path
pub const DB_PATH_ENV: &str = "TMDB_CATALOG_DB";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub database_path: String,
    #[serde(default = "default_shows_table")]
    pub shows_table: String,
    #[serde(default = "default_movies_table")]
    pub movies_table: String,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_cards_per_row")]
    pub cards_per_row: usize,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
}

fn default_shows_table() -> String { "tmdb_shows_clean".to_string() }
fn default_movies_table() -> String { "tmdb_movies_clean".to_string() }
fn default_query_timeout() -> u64 { 15 }
fn default_cards_per_row() -> usize { 5 }
fn default_font_size() -> u32 { 14 }
fn default_true() -> bool { true }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: String::new(),
            shows_table: default_shows_table(),
            movies_table: default_movies_table(),
            query_timeout_secs: default_query_timeout(),
            cards_per_row: default_cards_per_row(),
            dark_mode: true,
            font_size: default_font_size(),
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("tmdb_catalog");
        if let Err(e) = fs::create_dir_all(&path) {
            log::warn!("Could not create config directory {}: {}", path.display(), e);
        }
        path.push("config.json");
        path
    }

    pub fn load() -> Self {
        let mut config = Self::read_from(&Self::config_path());
        if let Ok(db) = std::env::var(DB_PATH_ENV) {
            if !db.trim().is_empty() {
                config.database_path = db;
            }
        }
        config
    }

    /// Read a config file, falling back to defaults when it is missing or malformed
    pub fn read_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        self.write_to(&Self::config_path());
    }

    pub fn write_to(&self, path: &std::path::Path) {
        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(path, content) {
                    log::warn!("Could not save config {}: {}", path.display(), e);
                }
            }
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs.max(1))
    }

    pub fn cards_per_row(&self) -> usize {
        self.cards_per_row.clamp(1, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::read_from(&dir.path().join("config.json"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.shows_table, "tmdb_shows_clean");
        assert_eq!(config.cards_per_row(), 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"database_path": "/data/tmdb.db", "cards_per_row": 40}"#).unwrap();

        let config = AppConfig::read_from(&path);
        assert_eq!(config.database_path, "/data/tmdb.db");
        assert_eq!(config.movies_table, "tmdb_movies_clean");
        assert_eq!(config.query_timeout(), Duration::from_secs(15));
        assert_eq!(config.cards_per_row(), 10);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::read_from(&path), AppConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = AppConfig {
            database_path: "catalog.sqlite".to_string(),
            dark_mode: false,
            query_timeout_secs: 0,
            ..AppConfig::default()
        };
        config.write_to(&path);

        let loaded = AppConfig::read_from(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.query_timeout(), Duration::from_secs(1));
    }
}
