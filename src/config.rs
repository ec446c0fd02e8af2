use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub port: u16,
    pub database: DatabaseConfig,
    pub secrets: SecretConfig,
    pub smtp: SmtpConfig,
    pub log_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;
    pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;

    /// Pool settings with the default limits for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        DatabaseConfig {
            url: url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            idle_timeout: Duration::from_millis(Self::DEFAULT_IDLE_TIMEOUT_MS),
            acquire_timeout: Duration::from_millis(Self::DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }

    /// SQLite URL for a database file, created on first connect.
    pub fn sqlite_file(path: &str) -> Self {
        Self::new(format!("sqlite:{}?mode=rwc", path))
    }
}

#[derive(Clone)]
pub struct SecretConfig {
    pub jwt: String,
    pub encryption: String,
}

impl fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretConfig")
            .field("jwt", &"<redacted>")
            .field("encryption", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let environment = match optional(&env_map, "APP_ENV").unwrap_or("development") {
            "development" | "dev" => Environment::Development,
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            other => {
                return Err(ConfigError::InvalidValue(
                    "APP_ENV".to_string(),
                    format!("must be development, production, or test, got {}", other),
                ))
            }
        };

        let port = required(&env_map, "PORT")?
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let mut database = if let Some(url) = optional(&env_map, "DATABASE_URL") {
            DatabaseConfig::new(url)
        } else if let Some(path) = optional(&env_map, "DATABASE_PATH") {
            DatabaseConfig::sqlite_file(path)
        } else {
            return Err(ConfigError::MissingEnv(
                "DATABASE_URL or DATABASE_PATH".to_string(),
            ));
        };

        database.max_connections = parse_or(
            &env_map,
            "DB_MAX_CONNECTIONS",
            DatabaseConfig::DEFAULT_MAX_CONNECTIONS,
        )?;
        if database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        database.idle_timeout = Duration::from_millis(parse_or(
            &env_map,
            "DB_IDLE_TIMEOUT_MS",
            DatabaseConfig::DEFAULT_IDLE_TIMEOUT_MS,
        )?);
        database.acquire_timeout = Duration::from_millis(parse_or(
            &env_map,
            "DB_CONNECT_TIMEOUT_MS",
            DatabaseConfig::DEFAULT_CONNECT_TIMEOUT_MS,
        )?);

        let secrets = SecretConfig {
            jwt: required(&env_map, "JWT_SECRET")?.to_string(),
            encryption: required(&env_map, "ENCRYPTION_SECRET")?.to_string(),
        };

        let smtp = SmtpConfig {
            host: optional(&env_map, "SMTP_HOST").map(str::to_string),
            port: optional(&env_map, "SMTP_PORT")
                .map(|s| {
                    s.parse::<u16>().map_err(|_| {
                        ConfigError::InvalidValue(
                            "SMTP_PORT".to_string(),
                            "must be a valid u16".to_string(),
                        )
                    })
                })
                .transpose()?,
            user: optional(&env_map, "SMTP_USER").map(str::to_string),
            password: optional(&env_map, "SMTP_PASSWORD").map(str::to_string),
        };

        let log_dir = optional(&env_map, "LOG_DIR").unwrap_or("logs").to_string();

        Ok(Config {
            environment,
            port,
            database,
            secrets,
            smtp,
            log_dir,
        })
    }
}

// Empty values are treated as unset.
fn optional<'a>(env_map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
}

fn required<'a>(env_map: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ConfigError> {
    optional(env_map, key).ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match optional(env_map, key) {
        Some(raw) => raw.parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("not a valid number: {}", raw))
        }),
        None => Ok(default),
    }
}
