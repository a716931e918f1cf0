// Configuration module for media-catalog
// Handles XDG-compliant directory paths and TOML configuration file

use serde::Deserialize;
use std::path::PathBuf;

use crate::catalog::{ImportOptions, RankingSettings};

const APP_NAME: &str = "media-catalog";
const CONFIG_FILENAME: &str = "config.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Server configuration
    pub server: ServerConfig,

    /// Directory paths (overrides XDG defaults)
    pub paths: PathsConfig,

    /// Catalog storage and import behaviour
    pub catalog: CatalogConfig,

    /// Related-title ranking
    pub recommendations: RecommendationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port (default: 5000)
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Override data directory (partition JSON files)
    pub data_dir: Option<PathBuf>,

    /// Override config directory
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Never write partition files; mutations live in memory only
    pub read_only: bool,

    /// Skip imported records whose normalized title is already cataloged
    /// under a different id (default: true)
    pub dedupe_on_import: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            dedupe_on_import: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Share of significant title words that makes two titles "similar" (default: 0.6)
    pub similarity_threshold: f64,

    /// Maximum size of the category/type fallback list (default: 100)
    pub max_related: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        let defaults = RankingSettings::default();
        Self {
            similarity_threshold: defaults.similarity_threshold,
            max_related: defaults.max_related,
        }
    }
}

/// Application paths following XDG Base Directory Specification on Unix
/// On other platforms, falls back to the current directory or platform-specific locations
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for configuration files (config.toml)
    /// XDG: $XDG_CONFIG_HOME/media-catalog or ~/.config/media-catalog
    pub config_dir: PathBuf,

    /// Directory for the partition files
    /// XDG: $XDG_DATA_HOME/media-catalog or ~/.local/share/media-catalog
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Priority order:
    /// 1. Environment variables (MEDIA_CATALOG_CONFIG_DIR, MEDIA_CATALOG_DATA_DIR)
    /// 2. Config file overrides
    /// 3. XDG / platform directories
    /// 4. Current directory fallback
    pub fn new(config_overrides: &PathsConfig) -> Self {
        Self {
            config_dir: Self::resolve_dir(
                "MEDIA_CATALOG_CONFIG_DIR",
                &config_overrides.config_dir,
                dirs::config_dir(),
            ),
            data_dir: Self::resolve_dir(
                "MEDIA_CATALOG_DATA_DIR",
                &config_overrides.data_dir,
                dirs::data_dir(),
            ),
        }
    }

    /// Everything in the current directory (portable mode)
    pub fn current_dir() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            config_dir: cwd.clone(),
            data_dir: cwd.join("data"),
        }
    }

    fn resolve_dir(
        env_var: &str,
        config_override: &Option<PathBuf>,
        platform_dir: Option<PathBuf>,
    ) -> PathBuf {
        if let Ok(path) = std::env::var(env_var) {
            return PathBuf::from(path);
        }

        if let Some(ref path) = config_override {
            return path.clone();
        }

        if let Some(dir) = platform_dir {
            return dir.join(APP_NAME);
        }

        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    pub fn config_file_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILENAME)
    }

    pub fn log_paths(&self) {
        tracing::info!("Configuration directory: {}", self.config_dir.display());
        tracing::info!("Data directory: {}", self.data_dir.display());
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new(&PathsConfig::default())
    }
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: AppPaths,
    pub port: u16,
    pub bind_address: String,
    pub read_only: bool,
    pub dedupe_on_import: bool,
    pub ranking: RankingSettings,
}

impl AppConfig {
    /// Load configuration from TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML config file
    /// 3. Default values
    pub fn load() -> Self {
        let portable_mode = env_flag("MEDIA_CATALOG_PORTABLE").unwrap_or(false);

        if portable_mode {
            tracing::info!("Running in portable mode (using current directory)");
            return Self::portable();
        }

        let config_dir = Self::find_config_dir();
        let config_file = Self::load_config_file(&config_dir);
        Self::build(config_file)
    }

    fn portable() -> Self {
        let config_dir = AppPaths::current_dir().config_dir;
        let mut config = Self::build(Self::load_config_file(&config_dir));
        config.paths = AppPaths::current_dir();
        config
    }

    fn find_config_dir() -> PathBuf {
        if let Ok(path) = std::env::var("MEDIA_CATALOG_CONFIG_DIR") {
            return PathBuf::from(path);
        }

        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }

        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_dir: &std::path::Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Build configuration from config file with environment overrides
    fn build(config_file: ConfigFile) -> Self {
        let paths = AppPaths::new(&config_file.paths);

        // Port: env > config > default
        let port = Self::env_port().unwrap_or(config_file.server.port);

        // Bind address: env > config > default
        let bind_address =
            Self::env_bind_address().unwrap_or_else(|| config_file.server.bind_address.clone());

        // Read-only: env > config
        let read_only = env_flag("MEDIA_CATALOG_READ_ONLY").unwrap_or(config_file.catalog.read_only);

        let threshold = config_file.recommendations.similarity_threshold;
        let similarity_threshold = if (0.0..=1.0).contains(&threshold) {
            threshold
        } else {
            tracing::warn!(
                "similarity_threshold {} is outside 0..=1, using {}",
                threshold,
                RankingSettings::default().similarity_threshold
            );
            RankingSettings::default().similarity_threshold
        };

        Self {
            paths,
            port,
            bind_address,
            read_only,
            dedupe_on_import: config_file.catalog.dedupe_on_import,
            ranking: RankingSettings {
                similarity_threshold,
                max_related: config_file.recommendations.max_related,
            },
        }
    }

    fn env_port() -> Option<u16> {
        std::env::var("MEDIA_CATALOG_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
    }

    fn env_bind_address() -> Option<String> {
        std::env::var("MEDIA_CATALOG_BIND_ADDRESS").ok()
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            dedupe_against_catalog: self.dedupe_on_import,
        }
    }

    /// Log configuration status
    pub fn log_config(&self) {
        self.paths.log_paths();
        tracing::info!("Server listening on {}:{}", self.bind_address, self.port);

        if self.read_only {
            tracing::info!("Catalog storage: READ-ONLY (changes are kept in memory)");
        } else {
            tracing::debug!("Catalog storage: read-write");
        }

        tracing::debug!(
            "Recommendations: similarity threshold {}, up to {} related",
            self.ranking.similarity_threshold,
            self.ranking.max_related
        );
        if !self.dedupe_on_import {
            tracing::info!("Import deduplication against the catalog: disabled");
        }
    }
}

/// `Some(true)` for "true"/"1", `Some(false)` for any other value, `None` when unset
fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_dir_paths() {
        let paths = AppPaths::current_dir();
        assert!(paths.config_dir.is_absolute() || paths.config_dir == PathBuf::from("."));
        assert!(paths.data_dir.ends_with("data"));
        assert!(paths.config_file_path().ends_with(CONFIG_FILENAME));
    }

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert!(!config.catalog.read_only);
        assert!(config.catalog.dedupe_on_import);
        assert_eq!(config.recommendations.similarity_threshold, 0.6);
        assert_eq!(config.recommendations.max_related, 100);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[server]
port = 9000
bind_address = "127.0.0.1"

[paths]
data_dir = "/custom/data"

[catalog]
read_only = true
dedupe_on_import = false

[recommendations]
similarity_threshold = 0.75
max_related = 24
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.paths.data_dir, Some(PathBuf::from("/custom/data")));
        assert!(config.catalog.read_only);
        assert!(!config.catalog.dedupe_on_import);
        assert_eq!(config.recommendations.similarity_threshold, 0.75);
        assert_eq!(config.recommendations.max_related, 24);
    }

    #[test]
    fn test_partial_config_toml() {
        let toml_str = r#"
[recommendations]
max_related = 10
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 5000); // default
        assert_eq!(config.recommendations.max_related, 10); // from file
        assert_eq!(config.recommendations.similarity_threshold, 0.6); // default
    }

    #[test]
    fn test_build_rejects_out_of_range_threshold() {
        let mut file = ConfigFile::default();
        file.recommendations.similarity_threshold = 1.5;
        file.recommendations.max_related = 7;

        let config = AppConfig::build(file);
        assert_eq!(config.ranking.similarity_threshold, 0.6);
        assert_eq!(config.ranking.max_related, 7);
        assert!(config.import_options().dedupe_against_catalog);
    }
}
