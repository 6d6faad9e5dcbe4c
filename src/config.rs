use std::env;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub email: EmailConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the CRM dashboard, used for lead links in internal emails.
    pub crm_url: String,
    /// Origins allowed by CORS. Browser calls from any other origin are
    /// rejected by the preflight; server-to-server callers without an
    /// `Origin` header are unaffected.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key. When absent every email send fails and is recorded in
    /// the integration log; the service still starts.
    pub api_key: Option<String>,
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for public endpoints
    /// (/webhooks/leads and the dispatch endpoint).
    pub webhook_per_second: u32,
    /// Burst size for public endpoints
    pub webhook_burst: u32,
}

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://crm.horizonestates.in",
    "https://www.crm.horizonestates.in",
    "http://localhost:5173",
    "http://localhost:3000",
];

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                crm_url: env::var("CRM_URL")
                    .unwrap_or_else(|_| "https://crm.horizonestates.in".to_string()),
                allowed_origins: match env::var("ALLOWED_ORIGINS") {
                    Ok(v) => v
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                    Err(_) => DEFAULT_ALLOWED_ORIGINS
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .map_err(|_| ConfigError::MissingEnv("DATABASE_URL".to_string()))?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            email: EmailConfig {
                api_key: env::var("RESEND_API_KEY").ok(),
                api_url: env::var("RESEND_API_URL")
                    .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            },
            rate_limit: RateLimitConfig {
                webhook_per_second: env::var("RATE_LIMIT_WEBHOOKS_PER_SECOND")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                webhook_burst: env::var("RATE_LIMIT_WEBHOOKS_BURST")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()
                    .unwrap_or(50),
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                crm_url: "https://crm.horizonestates.in".to_string(),
                allowed_origins: DEFAULT_ALLOWED_ORIGINS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/horizon_crm".to_string(),
                max_connections: 5,
            },
            email: EmailConfig {
                api_key: None,
                api_url: "https://api.resend.com/emails".to_string(),
            },
            rate_limit: RateLimitConfig {
                webhook_per_second: 10,
                webhook_burst: 50,
            },
        }
    }
}
