// Application configuration
// Loaded once at startup from the environment (after .env) and passed down explicitly

use std::collections::HashMap;

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

/// Process-wide configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token_secret: String,
    /// Postgres connection string; `None` selects the in-memory store
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Include the error trace in error responses
    pub expose_error_stack: bool,
    /// Seeds an `admin` user at startup when set
    pub default_admin_password: Option<String>,
    pub password: PasswordConfig,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token_secret = get("TOKEN_SECRET").ok_or(ConfigError::Missing("TOKEN_SECRET"))?;

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 5000,
        };

        let development = get("APP_ENV")
            .map(|env| env.eq_ignore_ascii_case("development"))
            .unwrap_or(false);
        let expose_error_stack = match get("EXPOSE_ERROR_STACK") {
            Some(raw) => parse_bool("EXPOSE_ERROR_STACK", raw)?,
            None => development,
        };

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_u32(&get, "ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_u32(&get, "ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: parse_u32(&get, "ARGON2_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            token_secret,
            database_url: get("DATABASE_URL"),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:8080".to_string()),
            expose_error_stack,
            default_admin_password: get("DEFAULT_ADMIN_PASSWORD"),
            password,
        })
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(name: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value: raw }),
    }
}

fn parse_u32(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u32,
) -> Result<u32, ConfigError> {
    match get(name) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
