use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub hospital: HospitalConfig,
    pub storage: StorageConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// Default tax rate as a percentage, applied when an invoice has tax
    /// enabled and no explicit rate
    pub default_tax_percent: u32,
}

/// Hospital identity rendered into the document branding header
#[derive(Debug, Clone, Deserialize)]
pub struct HospitalConfig {
    pub name: String,
    pub address: String,
    pub contact: String,
    pub currency_symbol: String,
}

/// Object storage collaborator that resolves stored document keys to
/// time-limited signed URLs
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub base_url: String,
    pub signed_url_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                default_tax_percent: env::var("DEFAULT_TAX_PERCENT")
                    .unwrap_or_else(|_| "18".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid DEFAULT_TAX_PERCENT".to_string())
                    })?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            hospital: HospitalConfig {
                name: env::var("HOSPITAL_NAME")
                    .unwrap_or_else(|_| "General Hospital".to_string()),
                address: env::var("HOSPITAL_ADDRESS").unwrap_or_default(),
                contact: env::var("HOSPITAL_CONTACT").unwrap_or_default(),
                currency_symbol: env::var("CURRENCY_SYMBOL")
                    .unwrap_or_else(|_| "Rs.".to_string()),
            },
            storage: StorageConfig {
                base_url: env::var("STORAGE_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:9000".to_string()),
                signed_url_ttl_secs: env::var("STORAGE_SIGNED_URL_TTL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration(
                            "Invalid STORAGE_SIGNED_URL_TTL_SECS".to_string(),
                        )
                    })?,
            },
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .map_err(|_| AppError::Configuration("Invalid SMTP_PORT".to_string()))?,
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_address: env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "billing@hospital.local".to_string()),
            },
        };

        Ok(config)
    }

    /// Validate configuration consistency at startup
    pub fn validate(&self) -> Result<()> {
        if self.hospital.name.trim().is_empty() {
            return Err(AppError::Configuration(
                "HOSPITAL_NAME cannot be empty".to_string(),
            ));
        }

        if self.app.default_tax_percent > 100 {
            return Err(AppError::Configuration(
                "DEFAULT_TAX_PERCENT cannot exceed 100".to_string(),
            ));
        }

        Ok(())
    }
}
