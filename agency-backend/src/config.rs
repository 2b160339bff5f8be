use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub api_rps: u32,
    pub uploads_dir: String,
    pub imap: Option<ImapSettings>,
    pub poll_interval_secs: u64,
    pub extraction: ExtractionSettings,
}

/// Connection details for the inbound CV mailbox.
#[derive(Debug, Clone)]
pub struct ImapSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub tls: bool,
    pub mailbox: String,
    pub fetch_limit: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub pdftotext_path: String,
    pub tesseract_path: String,
    pub ocr_languages: String,
    pub timeout: Duration,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            pdftotext_path: "pdftotext".to_string(),
            tesseract_path: "tesseract".to_string(),
            ocr_languages: "heb+eng".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            api_rps: get_env_parse_or("API_RPS", 50)?,
            uploads_dir: get_env_or("UPLOADS_DIR", "./uploads"),
            imap: ImapSettings::from_env()?,
            poll_interval_secs: get_env_parse_or("EMAIL_POLL_INTERVAL_SECS", 300)?,
            extraction: ExtractionSettings {
                pdftotext_path: get_env_or("PDFTOTEXT_PATH", "pdftotext"),
                tesseract_path: get_env_or("TESSERACT_PATH", "tesseract"),
                ocr_languages: get_env_or("OCR_LANGUAGES", "heb+eng"),
                timeout: Duration::from_secs(get_env_parse_or("EXTRACTION_TIMEOUT_SECS", 120)?),
            },
        })
    }
}

impl ImapSettings {
    /// Returns `None` when the mailbox credentials are not configured, which
    /// leaves email ingestion switched off.
    fn from_env() -> Result<Option<Self>> {
        let (Ok(host), Ok(user), Ok(password)) = (
            env::var("IMAP_HOST"),
            env::var("IMAP_USER"),
            env::var("IMAP_PASSWORD"),
        ) else {
            return Ok(None);
        };
        if host.trim().is_empty() || user.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            host,
            port: get_env_parse_or("IMAP_PORT", 993)?,
            user,
            password,
            tls: get_env_parse_or("IMAP_TLS", true)?,
            mailbox: get_env_or("IMAP_MAILBOX", "INBOX"),
            fetch_limit: get_env_parse_or("EMAIL_FETCH_LIMIT", 10)?,
            timeout: Duration::from_secs(get_env_parse_or("IMAP_TIMEOUT_SECS", 30)?),
        }))
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
