use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for crate::FriendNetError {
    fn from(err: ConfigError) -> Self {
        crate::FriendNetError::Config(err.to_string())
    }
}

/// Main configuration for FriendNet
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FriendNetConfig {
    /// Browser automation and login flow
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Remote GraphQL endpoint contract
    #[serde(default)]
    pub api: ApiConfig,

    /// Profile page scraping
    #[serde(default)]
    pub dom: DomConfig,

    /// Scan strategy
    #[serde(default)]
    pub scan: ScanConfig,

    /// Layout, communities and rendering
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// WebDriver server (chromedriver, geckodriver, selenium)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Page hosting the login form
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Page opened after login; the security token is read from its source
    #[serde(default = "default_friends_list_url")]
    pub friends_list_url: String,

    #[serde(default = "default_consent_button_selector")]
    pub consent_button_selector: String,

    #[serde(default = "default_email_selector")]
    pub email_selector: String,

    #[serde(default = "default_password_selector")]
    pub password_selector: String,

    #[serde(default = "default_submit_selector")]
    pub submit_selector: String,

    /// How long to wait for the cookie consent dialog before moving on
    #[serde(default = "default_consent_timeout_ms")]
    pub consent_timeout_ms: u64,

    #[serde(default = "default_login_field_timeout_ms")]
    pub login_field_timeout_ms: u64,

    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,

    /// Fixed pause after submitting credentials
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: true,
            login_url: default_login_url(),
            friends_list_url: default_friends_list_url(),
            consent_button_selector: default_consent_button_selector(),
            email_selector: default_email_selector(),
            password_selector: default_password_selector(),
            submit_selector: default_submit_selector(),
            consent_timeout_ms: default_consent_timeout_ms(),
            login_field_timeout_ms: default_login_field_timeout_ms(),
            submit_timeout_ms: default_submit_timeout_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl BrowserConfig {
    pub fn consent_timeout(&self) -> Duration {
        Duration::from_millis(self.consent_timeout_ms)
    }

    pub fn login_field_timeout(&self) -> Duration {
        Duration::from_millis(self.login_field_timeout_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// One remote operation: the friendly name sent alongside the document id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub friendly_name: String,
    pub doc_id: String,
}

impl Operation {
    pub fn new(friendly_name: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self {
            friendly_name: friendly_name.into(),
            doc_id: doc_id.into(),
        }
    }
}

/// First-page and continuation operations of one paginated resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPair {
    pub first_page: Operation,
    pub next_pages: Operation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_graphql_url")]
    pub endpoint: String,

    /// Per-request transport timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_friend_list_operations")]
    pub friend_list: OperationPair,

    #[serde(default = "default_mutual_friends_operations")]
    pub mutual_friends: OperationPair,

    /// Page size requested by friend-list continuations
    #[serde(default = "default_friend_list_page_size")]
    pub friend_list_page_size: u32,

    /// Page size requested by mutual-friend continuations
    #[serde(default = "default_mutual_friends_page_size")]
    pub mutual_friends_page_size: u32,

    #[serde(default = "default_first_page_scale")]
    pub first_page_scale: f64,

    #[serde(default = "default_next_page_scale")]
    pub next_page_scale: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_graphql_url(),
            request_timeout_secs: default_request_timeout_secs(),
            friend_list: default_friend_list_operations(),
            mutual_friends: default_mutual_friends_operations(),
            friend_list_page_size: default_friend_list_page_size(),
            mutual_friends_page_size: default_mutual_friends_page_size(),
            first_page_scale: default_first_page_scale(),
            next_page_scale: default_next_page_scale(),
        }
    }
}

/// CSS selectors describing the third-party connections page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomSelectors {
    /// Present while more cards are being lazy-loaded
    #[serde(default = "default_loading_indicator_selector")]
    pub loading_indicator: String,

    #[serde(default = "default_connections_panel_selector")]
    pub connections_panel: String,

    /// Anchor element of one connection card, relative to the panel
    #[serde(default = "default_connection_card_selector")]
    pub connection_card: String,
}

impl Default for DomSelectors {
    fn default() -> Self {
        Self {
            loading_indicator: default_loading_indicator_selector(),
            connections_panel: default_connections_panel_selector(),
            connection_card: default_connection_card_selector(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomConfig {
    #[serde(default)]
    pub selectors: DomSelectors,

    /// Pause before the first loading check
    #[serde(default = "default_initial_wait_ms")]
    pub initial_wait_ms: u64,

    /// Pause between scroll signals
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on scroll signals per profile
    #[serde(default = "default_max_scroll_attempts")]
    pub max_scroll_attempts: u32,

    /// Wall-clock budget per profile
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
}

impl Default for DomConfig {
    fn default() -> Self {
        Self {
            selectors: DomSelectors::default(),
            initial_wait_ms: default_initial_wait_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_scroll_attempts: default_max_scroll_attempts(),
            load_timeout_ms: default_load_timeout_ms(),
        }
    }
}

impl DomConfig {
    pub fn initial_wait(&self) -> Duration {
        Duration::from_millis(self.initial_wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

/// Where mutual friends are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutualFriendSourceKind {
    /// Structured paginated endpoint
    Api,
    /// Profile page scraping
    #[default]
    Dom,
}

impl FromStr for MutualFriendSourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "dom" => Ok(Self::Dom),
            other => Err(ConfigError::ValidationError(format!(
                "unknown mutual friend source '{other}' (expected 'api' or 'dom')"
            ))),
        }
    }
}

impl fmt::Display for MutualFriendSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Dom => write!(f, "dom"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub mutual_friend_source: MutualFriendSourceKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Seed for layout and community detection
    #[serde(default)]
    pub seed: u64,

    #[serde(default = "default_layout_iterations")]
    pub layout_iterations: usize,

    #[serde(default = "default_community_iterations")]
    pub community_iterations: usize,

    /// Share of highest-scoring nodes that keep their label when rendering
    #[serde(default = "default_label_proportion")]
    pub label_proportion: f64,

    #[serde(default = "default_true")]
    pub biggest_component_only: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            layout_iterations: default_layout_iterations(),
            community_iterations: default_community_iterations(),
            label_proportion: default_label_proportion(),
            biggest_component_only: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}
fn default_login_url() -> String {
    "https://www.facebook.com/".to_string()
}
fn default_friends_list_url() -> String {
    "https://www.facebook.com/friends/list".to_string()
}
fn default_consent_button_selector() -> String {
    "button[data-testid='cookie-policy-dialog-accept-button']".to_string()
}
fn default_email_selector() -> String {
    "input[name='email']".to_string()
}
fn default_password_selector() -> String {
    "input[name='pass']".to_string()
}
fn default_submit_selector() -> String {
    "button[type='submit']".to_string()
}
fn default_consent_timeout_ms() -> u64 {
    10_000
}
fn default_login_field_timeout_ms() -> u64 {
    10_000
}
fn default_submit_timeout_ms() -> u64 {
    2_000
}
fn default_settle_ms() -> u64 {
    3_000
}

fn default_graphql_url() -> String {
    "https://www.facebook.com/api/graphql/".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_friend_list_operations() -> OperationPair {
    OperationPair {
        first_page: Operation::new("FriendingCometFriendsListQuery", "4577965845578736"),
        next_pages: Operation::new("FriendingCometFriendsListPaginationQuery", "4577965845578736"),
    }
}
fn default_mutual_friends_operations() -> OperationPair {
    OperationPair {
        first_page: Operation::new("CometProfileListDialogQuery", "5488968171176172"),
        next_pages: Operation::new("CometProfileListDialogListRefetchQuery", "4236371019740591"),
    }
}
fn default_friend_list_page_size() -> u32 {
    30
}
fn default_mutual_friends_page_size() -> u32 {
    10
}
fn default_first_page_scale() -> f64 {
    1.0
}
fn default_next_page_scale() -> f64 {
    1.5
}

fn default_loading_indicator_selector() -> String {
    "div[data-visualcompletion='loading-state']".to_string()
}
fn default_connections_panel_selector() -> String {
    "div[role='main']".to_string()
}
fn default_connection_card_selector() -> String {
    "a[role='link'][tabindex='-1']".to_string()
}
fn default_initial_wait_ms() -> u64 {
    1_500
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_max_scroll_attempts() -> u32 {
    400
}
fn default_load_timeout_ms() -> u64 {
    300_000
}

fn default_layout_iterations() -> usize {
    50
}
fn default_community_iterations() -> usize {
    20
}
fn default_label_proportion() -> f64 {
    0.1
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Loads [`FriendNetConfig`] from disk and the environment.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: FriendNetConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.friendnet.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load an explicit config file, still honouring environment overrides.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        Self::load_dotenv();

        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    /// Wrap an in-memory configuration; no file or environment is consulted.
    pub fn from_config(config: FriendNetConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn finish(config: FriendNetConfig, config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config)?;
        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!("Config file: {}", path.display()),
            None => info!("Config file: none (using defaults)"),
        }
        info!("Mutual friend source: {}", config.scan.mutual_friend_source);
        info!("WebDriver: {}", config.browser.webdriver_url);

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &FriendNetConfig {
        &self.config
    }

    pub fn into_config(self) -> FriendNetConfig {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".friendnet.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .friendnet.env: {}", e);
                }
            }
        }
    }

    /// Search order:
    /// 1. ./.friendnet.toml
    /// 2. ~/.friendnet/config.toml
    /// 3. defaults
    fn load_config_file() -> Result<(FriendNetConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".friendnet.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".friendnet").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((FriendNetConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<FriendNetConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: FriendNetConfig) -> Result<FriendNetConfig, ConfigError> {
        if let Ok(url) = std::env::var("FRIENDNET_WEBDRIVER_URL") {
            config.browser.webdriver_url = url;
        }
        if let Ok(headless) = std::env::var("FRIENDNET_HEADLESS") {
            config.browser.headless = headless.to_lowercase() == "true" || headless == "1";
        }
        if let Ok(source) = std::env::var("FRIENDNET_MUTUAL_SOURCE") {
            config.scan.mutual_friend_source = source.parse()?;
        }
        if let Ok(seed) = std::env::var("FRIENDNET_LAYOUT_SEED") {
            config.analysis.seed = seed.parse().map_err(|_| {
                ConfigError::ValidationError(format!("FRIENDNET_LAYOUT_SEED is not a number: {seed}"))
            })?;
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("FRIENDNET_LOG_FORMAT") {
            config.logging.format = format;
        }
        Ok(config)
    }

    pub fn validate_config(config: &FriendNetConfig) -> Result<(), ConfigError> {
        let api = &config.api;
        if api.friend_list_page_size == 0 || api.mutual_friends_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "page sizes must be greater than zero".to_string(),
            ));
        }
        if api.next_page_scale <= api.first_page_scale {
            return Err(ConfigError::ValidationError(format!(
                "continuation scale {} must exceed first page scale {}",
                api.next_page_scale, api.first_page_scale
            )));
        }

        let names = [
            &api.friend_list.first_page.friendly_name,
            &api.friend_list.next_pages.friendly_name,
            &api.mutual_friends.first_page.friendly_name,
            &api.mutual_friends.next_pages.friendly_name,
        ];
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() || names[i + 1..].contains(name) {
                return Err(ConfigError::ValidationError(format!(
                    "operation names must be non-empty and distinct, got '{name}' twice or empty"
                )));
            }
        }

        let selectors = &config.dom.selectors;
        if selectors.loading_indicator.is_empty()
            || selectors.connections_panel.is_empty()
            || selectors.connection_card.is_empty()
        {
            return Err(ConfigError::ValidationError(
                "DOM selectors must not be empty".to_string(),
            ));
        }
        if config.dom.max_scroll_attempts == 0 || config.dom.load_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "DOM loading wait needs a non-zero attempt and time budget".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&config.analysis.label_proportion) {
            return Err(ConfigError::ValidationError(format!(
                "label_proportion must be within [0, 1], got {}",
                config.analysis.label_proportion
            )));
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "unknown log format '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigManager::validate_config(&FriendNetConfig::default()).is_ok());
    }

    #[test]
    fn test_duplicate_operation_names_rejected() {
        let mut config = FriendNetConfig::default();
        config.api.mutual_friends.next_pages.friendly_name =
            config.api.mutual_friends.first_page.friendly_name.clone();
        assert!(matches!(
            ConfigManager::validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_scale_must_grow() {
        let mut config = FriendNetConfig::default();
        config.api.next_page_scale = 1.0;
        assert!(ConfigManager::validate_config(&config).is_err());
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("API".parse::<MutualFriendSourceKind>().unwrap(), MutualFriendSourceKind::Api);
        assert_eq!(" dom ".parse::<MutualFriendSourceKind>().unwrap(), MutualFriendSourceKind::Dom);
        assert!("graph".parse::<MutualFriendSourceKind>().is_err());
    }
}
