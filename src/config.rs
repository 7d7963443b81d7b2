//! Environment-sourced configuration, per the external interface contract:
//! `FLASHLIGHT_ENVIRONMENT` is always required; the rest are required
//! outside `development`.

use std::env;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
    Development,
}

impl Environment {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            other => Err(ConfigError::InvalidValue {
                var: "FLASHLIGHT_ENVIRONMENT",
                reason: format!("unrecognized environment {other:?}, expected one of production/staging/development"),
            }),
        }
    }

    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Clone)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidValue { var: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(var) => write!(f, "missing required environment variable {var}"),
            ConfigError::InvalidValue { var, reason } => write!(f, "invalid value for {var}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub hypixel_api_key: Option<String>,
    pub cloudsql_unix_socket: Option<String>,
    pub db_username: Option<String>,
    pub db_password: Option<String>,
    pub sentry_dsn: Option<String>,
    pub port: u16,
    pub cors_allowed_suffixes: Vec<String>,
}

const DEFAULT_PORT: u16 = 8080;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_getter(|var| env::var(var).ok())
    }

    /// Testable indirection over `std::env::var` so requiredness rules can be
    /// exercised without mutating process-global environment state.
    fn from_getter(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = Environment::parse(
            &get("FLASHLIGHT_ENVIRONMENT").ok_or(ConfigError::MissingVar("FLASHLIGHT_ENVIRONMENT"))?,
        )?;
        let required_outside_dev = !environment.is_development();

        let hypixel_api_key = required_var(&get, "HYPIXEL_API_KEY", required_outside_dev)?;
        let cloudsql_unix_socket = required_var(&get, "CLOUDSQL_UNIX_SOCKET", required_outside_dev)?;
        let db_username = required_var(&get, "DB_USERNAME", required_outside_dev)?;
        let db_password = required_var(&get, "DB_PASSWORD", required_outside_dev)?;
        let sentry_dsn = required_var(&get, "SENTRY_DSN", required_outside_dev)?;

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                reason: format!("{raw:?} is not a valid port number"),
            })?,
            None => DEFAULT_PORT,
        };

        let cors_allowed_suffixes = get("FLASHLIGHT_CORS_ALLOWED_SUFFIXES")
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        Ok(Config {
            environment,
            hypixel_api_key,
            cloudsql_unix_socket,
            db_username,
            db_password,
            sentry_dsn,
            port,
            cors_allowed_suffixes,
        })
    }
}

fn required_var(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    required: bool,
) -> Result<Option<String>, ConfigError> {
    match get(var) {
        Some(value) => Ok(Some(value)),
        None if required => Err(ConfigError::MissingVar(var)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn getter(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn development_only_requires_the_environment_var() {
        let config = Config::from_getter(getter(&[("FLASHLIGHT_ENVIRONMENT", "development")])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.hypixel_api_key.is_none());
    }

    #[test]
    fn production_requires_the_full_set() {
        let result = Config::from_getter(getter(&[("FLASHLIGHT_ENVIRONMENT", "production")]));
        assert!(matches!(result, Err(ConfigError::MissingVar("HYPIXEL_API_KEY"))));
    }

    #[test]
    fn production_succeeds_with_everything_present() {
        let config = Config::from_getter(getter(&[
            ("FLASHLIGHT_ENVIRONMENT", "production"),
            ("HYPIXEL_API_KEY", "key"),
            ("CLOUDSQL_UNIX_SOCKET", "/cloudsql/proj:region:instance"),
            ("DB_USERNAME", "user"),
            ("DB_PASSWORD", "pass"),
            ("SENTRY_DSN", "https://example.invalid/1"),
            ("PORT", "9090"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.hypixel_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn rejects_unrecognized_environment_value() {
        let result = Config::from_getter(getter(&[("FLASHLIGHT_ENVIRONMENT", "prod")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { var: "FLASHLIGHT_ENVIRONMENT", .. })));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let result = Config::from_getter(getter(&[
            ("FLASHLIGHT_ENVIRONMENT", "development"),
            ("PORT", "not-a-number"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { var: "PORT", .. })));
    }
}
