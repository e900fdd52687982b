/// Configuration management for the API server
///
/// Everything comes from environment variables, with a `.env` file
/// honored in development. `from_env` validates up front so a bad
/// deployment fails at startup, not at first use.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: any)
/// - `JWT_SECRET`: Secret key for JWT signing (required)
/// - `JWT_EXPIRY_MINUTES`: Access token lifetime (default: 30)
/// - `SMTP_FROM`: Sender address for outbound mail (default: noreply@syncboard.dev)
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use syncboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Top-level configuration, one section per concern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub api: ApiConfig,

    /// Database settings
    pub database: DatabaseConfig,

    /// Token signing settings
    pub jwt: JwtConfig,

    /// Outbound email settings
    pub smtp: SmtpConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins
    ///
    /// An empty list means any origin is allowed (development mode).
    pub cors_origins: Vec<String>,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Pool size cap
    pub max_connections: u32,
}

/// Token signing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret, at least 32 characters
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Access token lifetime in minutes
    pub expiry_minutes: i64,
}

impl JwtConfig {
    /// Returns the configured access token lifetime
    pub fn access_token_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.expiry_minutes)
    }
}

/// Outbound email settings
///
/// The shipped mailer is log-only, so host and credentials are not read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Sender address announced on outbound mail
    pub from: String,
}

/// Reads a required environment variable
fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("{} environment variable is required", key))
}

/// Reads an environment variable, falling back to a default
fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Splits a comma-separated origin list, dropping empty entries
fn parse_cors_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads and validates configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a numeric
    /// variable does not parse, or `JWT_SECRET` is too short.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api = ApiConfig {
            host: env_or("API_HOST", "0.0.0.0"),
            port: env_or("API_PORT", "8000").parse::<u16>()?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| parse_cors_origins(&raw))
                .unwrap_or_default(),
        };

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", "10").parse::<u32>()?,
        };

        let secret = required("JWT_SECRET")?;
        if secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expiry_minutes = env_or("JWT_EXPIRY_MINUTES", "30").parse::<i64>()?;
        if expiry_minutes <= 0 {
            anyhow::bail!("JWT_EXPIRY_MINUTES must be positive");
        }

        Ok(Self {
            api,
            database,
            jwt: JwtConfig {
                secret,
                expiry_minutes,
            },
            smtp: SmtpConfig {
                from: env_or("SMTP_FROM", "noreply@syncboard.dev"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 9100,
                cors_origins: Vec::new(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/syncboard_test".to_string(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: "unit-test-secret-0123456789abcdef!!".to_string(),
                expiry_minutes: 45,
            },
            smtp: SmtpConfig {
                from: "noreply@syncboard.dev".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address_joins_host_and_port() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:9100");
    }

    #[test]
    fn test_access_token_duration_uses_expiry_minutes() {
        let config = test_config();
        assert_eq!(
            config.jwt.access_token_duration(),
            chrono::Duration::minutes(45)
        );
    }

    #[test]
    fn test_parse_cors_origins_trims_and_drops_blanks() {
        assert_eq!(
            parse_cors_origins("http://localhost:3000, https://app.example.com"),
            vec![
                "http://localhost:3000".to_string(),
                "https://app.example.com".to_string()
            ]
        );
        assert!(parse_cors_origins("").is_empty());
        assert!(parse_cors_origins(" , ").is_empty());
    }
}
