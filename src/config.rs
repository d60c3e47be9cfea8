use std::env;

use anyhow::{Context, Result};

const DEFAULT_BCV_URL: &str = "https://www.bcv.org.ve/";
const DEFAULT_MAIL_API_URL: &str = "https://devapimail.bigmovil.com/sendMail";

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub bcv_url: String,
    pub admin_email: String,
    pub public_base_url: String,
    pub mail: MailConfig,
}

/// Credentials for the external mail API. Everything except the URL and
/// sender address is optional at startup; `MailApiNotifier` rejects sends
/// with a descriptive error when a required value is missing, so the
/// service still boots (and ingests) without mail configuration.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub bearer_token: Option<String>,
    pub auth_token: Option<String>,
    pub password_encrypted: Option<String>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub server_user: Option<String>,
    pub server_password: Option<String>,
    pub from_address: String,
    pub copy_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let admin_email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| {
            log::warn!("ADMIN_EMAIL is not set; falling back to admin@example.com");
            "admin@example.com".to_string()
        });

        let server_port = match env::var("EMAIL_SERVER_PORT") {
            Ok(raw) => Some(
                raw.parse::<u16>()
                    .context("EMAIL_SERVER_PORT must be a valid port number")?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url,
            bcv_url: env::var("BCV_URL").unwrap_or_else(|_| DEFAULT_BCV_URL.to_string()),
            admin_email,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            mail: MailConfig {
                api_url: env::var("EMAIL_API_URL")
                    .unwrap_or_else(|_| DEFAULT_MAIL_API_URL.to_string()),
                bearer_token: env::var("EMAIL_API_TOKEN").ok(),
                auth_token: env::var("EMAIL_API_AUTH_TOKEN").ok(),
                password_encrypted: env::var("EMAIL_API_PASSWD_ENCRYPTED").ok(),
                server_host: env::var("EMAIL_SERVER_HOST").ok(),
                server_port,
                server_user: env::var("EMAIL_SERVER_USER").ok(),
                server_password: env::var("EMAIL_SERVER_PASSWORD").ok(),
                from_address: env::var("EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| "erp@massivamovil.com".to_string()),
                copy_email: env::var("COPY_EMAIL").ok(),
            },
        })
    }
}
