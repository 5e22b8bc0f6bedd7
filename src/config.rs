use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_TEMPLATE_DIR: &str = "templates";
const DEFAULT_PDF_COMMAND: &str = "weasyprint";
const DEFAULT_DISPLAY_OFFSET: u32 = 99;
const DEFAULT_CURRENCY_MAJOR: &str = "Kwacha";
const DEFAULT_CURRENCY_MINOR: &str = "Ngwee";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins; permissive when unset
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1, max = 500))]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Root directory of the document templates
    #[serde(default = "default_template_dir")]
    pub template_dir: String,

    /// External HTML-to-PDF converter; reads HTML on stdin, writes PDF to stdout
    #[serde(default = "default_pdf_command")]
    #[validate(length(min = 1))]
    pub pdf_command: String,

    /// Arguments passed to `pdf_command`
    #[serde(default = "default_pdf_args")]
    pub pdf_args: Vec<String>,

    /// Added to the stored sequence suffix whenever a number is shown to a user
    #[serde(default = "default_display_offset")]
    pub display_offset: u32,

    #[serde(default = "default_currency_major")]
    #[validate(length(min = 1))]
    pub currency_major: String,

    #[serde(default = "default_currency_minor")]
    #[validate(length(min = 1))]
    pub currency_minor: String,

    /// Attempts made to create a document when its number allocation collides
    #[serde(default = "default_numbering_max_attempts")]
    #[validate(range(min = 1, max = 20))]
    pub numbering_max_attempts: u32,

    #[serde(default = "default_expense_page_size")]
    #[validate(range(min = 1, max = 500))]
    pub expense_page_size: u64,

    #[serde(default = "default_expense_feed_limit")]
    #[validate(range(min = 1, max = 10000))]
    pub expense_feed_limit: u64,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the essentials
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            template_dir: default_template_dir(),
            pdf_command: default_pdf_command(),
            pdf_args: default_pdf_args(),
            display_offset: default_display_offset(),
            currency_major: default_currency_major(),
            currency_minor: default_currency_minor(),
            numbering_max_attempts: default_numbering_max_attempts(),
            expense_page_size: default_expense_page_size(),
            expense_feed_limit: default_expense_feed_limit(),
        }
    }

    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Checks that cannot be expressed as field attributes
    pub fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("must not exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        let level = self.log_level.to_ascii_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            let mut err = ValidationError::new("log_level");
            err.message = Some("must be one of trace, debug, info, warn, error".into());
            errors.add("log_level", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_template_dir() -> String {
    DEFAULT_TEMPLATE_DIR.to_string()
}

fn default_pdf_command() -> String {
    DEFAULT_PDF_COMMAND.to_string()
}

fn default_pdf_args() -> Vec<String> {
    vec!["-".to_string(), "-".to_string()]
}

fn default_display_offset() -> u32 {
    DEFAULT_DISPLAY_OFFSET
}

fn default_currency_major() -> String {
    DEFAULT_CURRENCY_MAJOR.to_string()
}

fn default_currency_minor() -> String {
    DEFAULT_CURRENCY_MINOR.to_string()
}

fn default_numbering_max_attempts() -> u32 {
    10
}

fn default_expense_page_size() -> u64 {
    25
}

fn default_expense_feed_limit() -> u64 {
    1000
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("bizdesk_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://bizdesk.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .list_separator(" ")
                .with_list_parse_key("pdf_args")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration constraint validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
