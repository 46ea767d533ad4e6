use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for cache TTL and sweep interval: 30 days.
const MAX_CACHE_SECS: u64 = 30 * 24 * 3600;
const MAX_RETENTION_DAYS: i64 = 3650;

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
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    Log,
    SendGrid,
    Smtp,
}

impl MailProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            MailProvider::Log => "log",
            MailProvider::SendGrid => "sendgrid",
            MailProvider::Smtp => "smtp",
        }
    }
}

impl FromStr for MailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "console" => Ok(MailProvider::Log),
            "sendgrid" => Ok(MailProvider::SendGrid),
            "smtp" => Ok(MailProvider::Smtp),
            other => Err(format!("unknown mail provider '{other}'")),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str, reason: String },
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, reason } => write!(f, "Invalid {key}: {reason}"),
            ConfigError::Missing(key) => write!(f, "Missing required setting {key}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub env: Environment,
    /// `*` or a list of exact origins.
    pub cors_origins: Vec<String>,
    pub app_url: String,
    pub session_key: Option<String>,
}

impl ServerConfig {
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.cors_origins.iter().any(|o| o == "*" || o == origin)
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub provider: MailProvider,
    pub sendgrid_api_key: Option<String>,
    pub from: String,
    pub from_name: String,
    pub test_to: Option<String>,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub cache: CacheConfig,
    pub notification_retention_days: i64,
    pub mail: MailConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port: u16 = parse_or(&get, "PORT", 3000)?;
        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            env: parse_or(&get, "NODE_ENV", Environment::Development)?,
            cors_origins: get("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string())
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            app_url: get("APP_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            session_key: get("SESSION_KEY"),
        };

        let cache = CacheConfig {
            ttl: Duration::from_secs(parse_in_range(&get, "CACHE_TTL_SECS", 300, 0, MAX_CACHE_SECS)?),
            sweep_interval: Duration::from_secs(parse_in_range(
                &get,
                "CACHE_SWEEP_SECS",
                60,
                1,
                MAX_CACHE_SECS,
            )?),
        };

        let mail = MailConfig {
            provider: parse_or(&get, "MAIL_PROVIDER", MailProvider::Log)?,
            sendgrid_api_key: get("SENDGRID_API_KEY"),
            from: get("MAIL_FROM").unwrap_or_else(|| "noreply@propdesk.local".to_string()),
            from_name: get("MAIL_FROM_NAME").unwrap_or_else(|| "Propdesk".to_string()),
            test_to: get("MAIL_TEST_TO"),
            smtp: SmtpConfig {
                host: get("SMTP_HOST"),
                port: parse_or(&get, "SMTP_PORT", 587)?,
                secure: parse_bool(&get, "SMTP_SECURE")?,
                user: get("SMTP_USER"),
                pass: get("SMTP_PASS"),
            },
        };

        match mail.provider {
            MailProvider::SendGrid if mail.sendgrid_api_key.is_none() => {
                return Err(ConfigError::Missing("SENDGRID_API_KEY"));
            }
            MailProvider::Smtp if mail.smtp.host.is_none() => {
                return Err(ConfigError::Missing("SMTP_HOST"));
            }
            _ => {}
        }

        Ok(AppConfig {
            server,
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://data/propdesk.db".to_string()),
            cache,
            notification_retention_days: parse_in_range(
                &get,
                "NOTIFICATION_RETENTION_DAYS",
                90,
                1,
                MAX_RETENTION_DAYS,
            )?,
            mail,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Like `parse_or`, but the value must also lie within `min..=max`.
fn parse_in_range<T, G>(get: &G, key: &'static str, default: T, min: T, max: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + fmt::Display,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, key, default)?;
    if value < min || value > max {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be between {min} and {max}, got {value}"),
        });
    }
    Ok(value)
}

fn parse_bool<G>(get: &G, key: &'static str) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v == "true" || v == "1" || v == "yes" => Ok(true),
        Some(v) if v == "false" || v == "0" || v == "no" => Ok(false),
        Some(v) => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got '{v}'"),
        }),
    }
}
