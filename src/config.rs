use crate::{HistoryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the history scraper
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Dataset and session locations
    pub storage: StorageConfig,

    /// Page interaction settings
    pub scrape: ScrapeConfig,

    /// Subtitle interception settings
    pub interception: InterceptionConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON dataset path
    pub output_path: PathBuf,

    /// Directory holding the captured browser session
    pub session_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Number of scrolls used to load older history
    pub max_scrolls: u32,

    /// Wait after each scroll for new entries to render (milliseconds)
    pub scroll_settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptionConfig {
    /// URL fragment identifying subtitle responses
    pub endpoint_marker: String,

    /// Buffered responses between page and interceptor
    pub channel_capacity: usize,

    /// How long to wait for pending interceptions once the page is read (milliseconds)
    pub grace_period_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level for this crate
    pub log_level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("data/output/history_dataset.json"),
            session_dir: PathBuf::from("data/session/playwright_profile"),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_scrolls: 5,
            scroll_settle_ms: 2000,
        }
    }
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            endpoint_marker: crate::subtitles::interceptor::SUBTITLE_ENDPOINT_MARKER.to_string(),
            channel_capacity: 256,
            grace_period_ms: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl ScrapeConfig {
    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}

impl InterceptionConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Config {
    /// Load configuration from the first config file found, then apply environment
    /// overrides. Falls back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        let mut config_paths = vec![
            PathBuf::from("yt-history.toml"),
            PathBuf::from("config/yt-history.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            config_paths.push(dir.join("yt-history").join("config.toml"));
        }

        let mut config = Self::default();
        for path in &config_paths {
            if path.exists() {
                config = Self::from_file(path)?;
                tracing::info!("📄 Loaded configuration from: {}", path.display());
                break;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from an explicit file, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        toml::from_str(&config_str)
            .map_err(|e| HistoryError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Override settings from environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(output) = std::env::var("YT_HISTORY_OUTPUT") {
            self.storage.output_path = PathBuf::from(output);
        }

        if let Ok(session_dir) = std::env::var("YT_HISTORY_SESSION_DIR") {
            self.storage.session_dir = PathBuf::from(session_dir);
        }

        if let Ok(scrolls) = std::env::var("YT_HISTORY_MAX_SCROLLS") {
            match scrolls.parse() {
                Ok(scrolls) => self.scrape.max_scrolls = scrolls,
                Err(_) => tracing::warn!("Ignoring invalid YT_HISTORY_MAX_SCROLLS: {}", scrolls),
            }
        }

        if let Ok(log_level) = std::env::var("YT_HISTORY_LOG_LEVEL") {
            self.logging.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| HistoryError::Config(e.to_string()))?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.output_path.file_name().is_none() {
            return Err(HistoryError::Config(format!(
                "output_path must name a file: {}",
                self.storage.output_path.display()
            )));
        }

        if self.interception.endpoint_marker.is_empty() {
            return Err(HistoryError::Config("endpoint_marker must not be empty".to_string()));
        }

        if self.interception.channel_capacity == 0 {
            return Err(HistoryError::Config("channel_capacity must be greater than 0".to_string()));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "YouTube History Scraper Configuration:\n\
            - Dataset: {}\n\
            - Session Directory: {}\n\
            - Scrolls: {} ({}ms settle)\n\
            - Subtitle Endpoint: {}\n\
            - Interception Grace Period: {}ms",
            self.storage.output_path.display(),
            self.storage.session_dir.display(),
            self.scrape.max_scrolls,
            self.scrape.scroll_settle_ms,
            self.interception.endpoint_marker,
            self.interception.grace_period_ms
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage.output_path = path.into();
        self
    }

    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.storage.session_dir = dir.into();
        self
    }

    pub fn with_max_scrolls(mut self, max_scrolls: u32) -> Self {
        self.config.scrape.max_scrolls = max_scrolls;
        self
    }

    pub fn with_scroll_settle_ms(mut self, millis: u64) -> Self {
        self.config.scrape.scroll_settle_ms = millis;
        self
    }

    pub fn with_grace_period_ms(mut self, millis: u64) -> Self {
        self.config.interception.grace_period_ms = millis;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
