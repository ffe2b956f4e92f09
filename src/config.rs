use crate::core::{DbError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_SLOW_QUERY_MS: u64 = 100;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub database: EngineConfig,
    pub logging: Option<LoggingConfig>,
}

/// Connection parameters handed to the engine's connector.
///
/// Which fields matter depends on the driver. The SQLite connector only looks
/// at `database` (a file path or `:memory:`), `autocommit` and `options`.
#[derive(Clone, Deserialize)]
pub struct EngineConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default = "default_collation")]
    pub collation: String,
    #[serde(default = "default_true")]
    pub use_unicode: bool,
    #[serde(default)]
    pub autocommit: bool,
    #[serde(default = "default_slow_query_ms")]
    pub slow_query_ms: u64,
    /// Extra driver options, applied in key order
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_charset() -> String {
    "utf8".to_string()
}

fn default_collation() -> String {
    "utf8_general_ci".to_string()
}

fn default_true() -> bool {
    true
}

fn default_slow_query_ms() -> u64 {
    DEFAULT_SLOW_QUERY_MS
}

impl EngineConfig {
    pub fn new(user: impl Into<String>, password: impl Into<String>, database: impl Into<String>) -> Self {
        EngineConfig {
            user: user.into(),
            password: password.into(),
            database: database.into(),
            host: default_host(),
            port: default_port(),
            charset: default_charset(),
            collation: default_collation(),
            use_unicode: true,
            autocommit: false,
            slow_query_ms: DEFAULT_SLOW_QUERY_MS,
            options: BTreeMap::new(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    pub fn slow_query_ms(mut self, millis: u64) -> Self {
        self.slow_query_ms = millis;
        self
    }

    /// Adds a driver-specific option, overriding any previous value for `key`.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Checks that enough parameters are set to attempt a connection.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(DbError::Configuration("database must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(DbError::Configuration("port must not be 0".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("charset", &self.charset)
            .field("collation", &self.collation)
            .field("use_unicode", &self.use_unicode)
            .field("autocommit", &self.autocommit)
            .field("slow_query_ms", &self.slow_query_ms)
            .field("options", &self.options)
            .finish()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    #[serde(default = "default_level")]
    pub level: String,
    /// Append log lines to this file instead of stderr
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            file: None,
        }
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = transwarp::config::load_config("transwarp.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Location of the per-user configuration file, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("transwarp").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[database]
user = "root"
password = "secret"
database = "awesome"
port = 3307
slow_query_ms = 250

[database.options]
journal_mode = "WAL"
foreign_keys = "ON"

[logging]
level = "debug"
file = "./DB.log"
"#;

    #[test]
    fn test_load_config_from_str() {
        let config: Config = toml::from_str(SAMPLE_CONFIG).expect("Failed to parse sample config");
        let db = &config.database;
        assert_eq!(db.user, "root");
        assert_eq!(db.database, "awesome");
        assert_eq!(db.host, DEFAULT_HOST);
        assert_eq!(db.port, 3307);
        assert_eq!(db.charset, "utf8");
        assert!(!db.autocommit);
        assert_eq!(db.slow_query_ms, 250);
        let keys: Vec<&str> = db.options.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["foreign_keys", "journal_mode"]);

        let logging = config.logging.expect("logging section");
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.file, Some(PathBuf::from("./DB.log")));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, SAMPLE_CONFIG).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.database.password, "secret");

        let missing = load_config(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(DbError::Io(_))));
    }

    #[test]
    fn test_builder_defaults_and_validation() {
        let config = EngineConfig::new("root", "pw", "app.db").port(3310).option("busy_timeout", "500");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3310);
        assert_eq!(config.options.get("busy_timeout").map(String::as_str), Some("500"));
        assert!(config.validate().is_ok());

        assert!(matches!(EngineConfig::new("root", "pw", " ").validate(), Err(DbError::Configuration(_))));
        assert!(matches!(EngineConfig::new("root", "pw", "db").port(0).validate(), Err(DbError::Configuration(_))));
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("transwarp/config.toml"));
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = EngineConfig::new("root", "hunter2", "app.db");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
