//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every recognized option is a field of
//! [`SapConfig`] with an explicit default. Unset variables take the
//! default; set-but-unparseable variables are rejected at startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Configuration error raised by [`SapConfig::from_env`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Environment variable name.
        key: &'static str,
        /// The rejected raw value.
        value: String,
    },
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string.
    pub url: String,
    /// Maximum number of database connections in the pool.
    pub max_connections: u32,
    /// Minimum idle connections in the pool.
    pub min_connections: u32,
    /// Timeout in seconds for acquiring a database connection.
    pub connect_timeout_secs: u64,
}

/// Payment provider settings.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Secret API key. Checkout fails with a 500 when unset.
    pub secret_key: Option<String>,
    /// Webhook signing secret. Every webhook is rejected when unset.
    pub webhook_secret: Option<String>,
    /// API base URL.
    pub api_base: String,
    /// Maximum accepted age of a webhook signature timestamp.
    pub webhook_tolerance_secs: u64,
}

/// Completion API settings.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Bearer API key.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// `max_tokens` sent with every completion request.
    pub max_tokens: u32,
    /// Model used when the request does not name one.
    pub default_model: String,
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`SapConfig::from_env`].
#[derive(Debug, Clone)]
pub struct SapConfig {
    /// Socket address to bind the HTTP server to (default `0.0.0.0:3001`).
    pub listen_addr: SocketAddr,

    /// Database settings; `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,

    /// When `true`, in-memory totals only advance after the tracking row
    /// and snapshot row were both durably written.
    pub strict_persistence: bool,

    /// Payment provider settings.
    pub payment: PaymentConfig,

    /// Completion API settings.
    pub completion: CompletionConfig,

    /// Public URL of this deployment, used for checkout redirect URLs.
    pub domain: String,

    /// Timeout for outbound HTTP calls, in seconds.
    pub http_timeout_secs: u64,

    /// Timeout for handling one inbound request, in seconds.
    pub request_timeout_secs: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl Default for SapConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3001),
            database: None,
            strict_persistence: false,
            payment: PaymentConfig {
                secret_key: None,
                webhook_secret: None,
                api_base: "https://api.stripe.com".to_string(),
                webhook_tolerance_secs: 300,
            },
            completion: CompletionConfig {
                api_key: None,
                api_base: "https://openrouter.ai/api/v1".to_string(),
                max_tokens: 1000,
                default_model: "openai/gpt-3.5-turbo".to_string(),
            },
            domain: "http://localhost:3001".to_string(),
            http_timeout_secs: 30,
            request_timeout_secs: 60,
            event_bus_capacity: 1024,
            log_json: false,
        }
    }
}

impl SapConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to a value
    /// that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env = Env { lookup: &lookup };

        let port: u16 = env.parse("PORT", defaults.listen_addr.port())?;
        let host: IpAddr = env.parse("LISTEN_HOST", defaults.listen_addr.ip())?;

        let database = match env.string("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: env.parse("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: env.parse("DATABASE_MIN_CONNECTIONS", 1)?,
                connect_timeout_secs: env.parse("DATABASE_CONNECT_TIMEOUT_SECS", 5)?,
            }),
            None => None,
        };

        Ok(Self {
            listen_addr: SocketAddr::new(host, port),
            database,
            strict_persistence: env.bool("SAP_STRICT_PERSISTENCE", defaults.strict_persistence)?,
            payment: PaymentConfig {
                secret_key: env.string("SAP_STRIPE_SECRET_KEY"),
                webhook_secret: env.string("SAP_STRIPE_WEBHOOK_SECRET"),
                api_base: env
                    .string("STRIPE_API_BASE")
                    .unwrap_or(defaults.payment.api_base),
                webhook_tolerance_secs: env.parse(
                    "STRIPE_WEBHOOK_TOLERANCE_SECS",
                    defaults.payment.webhook_tolerance_secs,
                )?,
            },
            completion: CompletionConfig {
                api_key: env.string("SAP_OPENROUTER_API_KEY"),
                api_base: env
                    .string("COMPLETION_API_BASE")
                    .unwrap_or(defaults.completion.api_base),
                max_tokens: env.parse("COMPLETION_MAX_TOKENS", defaults.completion.max_tokens)?,
                default_model: env
                    .string("COMPLETION_DEFAULT_MODEL")
                    .unwrap_or(defaults.completion.default_model),
            },
            domain: env
                .string("DOMAIN")
                .map(|d| d.trim_end_matches('/').to_string())
                .unwrap_or(defaults.domain),
            http_timeout_secs: env.parse("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            request_timeout_secs: env.parse(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            event_bus_capacity: env.parse("EVENT_BUS_CAPACITY", defaults.event_bus_capacity)?,
            log_json: env.bool("SAP_LOG_JSON", defaults.log_json)?,
        })
    }
}

struct Env<'a, F> {
    lookup: &'a F,
}

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty value of `key`.
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse<T: std::str::FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.string(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value: raw }),
            None => Ok(default),
        }
    }

    /// Accepts `true`/`1`/`yes` and `false`/`0`/`no`, case-insensitive.
    fn bool(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.string(key) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(ConfigError::Invalid { key, value: raw }),
            },
            None => Ok(default),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<SapConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SapConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let Ok(config) = load(&[]) else {
            panic!("empty environment must load");
        };
        assert_eq!(config.listen_addr.port(), 3001);
        assert!(config.database.is_none());
        assert!(!config.strict_persistence);
        assert_eq!(config.payment.webhook_tolerance_secs, 300);
        assert_eq!(config.completion.max_tokens, 1000);
        assert_eq!(config.completion.default_model, "openai/gpt-3.5-turbo");
    }

    #[test]
    fn reads_port_and_database() {
        let Ok(config) = load(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://sap@localhost/sap"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ]) else {
            panic!("valid environment must load");
        };
        assert_eq!(config.listen_addr.port(), 8080);
        let Some(db) = config.database else {
            panic!("database config expected");
        };
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.min_connections, 1);
    }

    #[test]
    fn rejects_invalid_port() {
        let result = load(&[("PORT", "not-a-port")]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        tokio_test::assert_err!(load(&[("REQUEST_TIMEOUT_SECS", "-1")]));
        tokio_test::assert_ok!(load(&[("REQUEST_TIMEOUT_SECS", "5")]));
    }

    #[test]
    fn parses_booleans() {
        let Ok(config) = load(&[("SAP_STRICT_PERSISTENCE", "TRUE"), ("SAP_LOG_JSON", "1")]) else {
            panic!("valid environment must load");
        };
        assert!(config.strict_persistence);
        assert!(config.log_json);
        assert!(load(&[("SAP_STRICT_PERSISTENCE", "maybe")]).is_err());
    }

    #[test]
    fn empty_values_count_as_unset() {
        let Ok(config) = load(&[("DATABASE_URL", ""), ("SAP_STRIPE_SECRET_KEY", "  ")]) else {
            panic!("valid environment must load");
        };
        assert!(config.database.is_none());
        assert!(config.payment.secret_key.is_none());
    }

    #[test]
    fn domain_trailing_slash_is_trimmed() {
        let Ok(config) = load(&[("DOMAIN", "https://sap.example.com/")]) else {
            panic!("valid environment must load");
        };
        assert_eq!(config.domain, "https://sap.example.com");
    }
}
