use config::{Environment, File};
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    /// From address used for every outbound email.
    pub from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelephonyConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// The provider phone number used as From for SMS and calls.
    pub phone_number: String,
    /// TwiML application SID for the outgoing browser-client scope.
    pub twiml_app_sid: String,
    /// URL the provider fetches call-routing instructions from.
    pub voice_handler_url: String,
    /// Browser client identity that inbound calls are routed to.
    pub client_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub http: HttpConfig,
    pub imap: ImapConfig,
    pub smtp: SmtpConfig,
    pub telephony: TelephonyConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Optional API key required on /api/v1 routes. Webhooks stay open.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Settings {
    pub fn new(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut config_builder = config::Config::builder()
            // HTTP defaults
            .set_default("http.host", "127.0.0.1")?
            .set_default("http.port", 8080)?
            // IMAP defaults
            .set_default("imap.host", "imap.gmail.com")?
            .set_default("imap.port", 993)?
            .set_default("imap.user", "")?
            .set_default("imap.pass", "")?
            // SMTP defaults
            .set_default("smtp.host", "smtp.gmail.com")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.user", "")?
            .set_default("smtp.pass", "")?
            .set_default("smtp.from", "")?
            // Telephony defaults
            .set_default("telephony.account_sid", "")?
            .set_default("telephony.auth_token", "")?
            .set_default("telephony.phone_number", "")?
            .set_default("telephony.twiml_app_sid", "")?
            .set_default("telephony.voice_handler_url", "")?
            .set_default("telephony.client_name", "browser-client")?
            // Store defaults
            .set_default("store.database_url", "sqlite://switchboard.db")?
            // Log defaults
            .set_default("log.level", "info")?;

        if let Some(path) = config_path {
            config_builder = config_builder.add_source(File::with_name(path));
        }

        // e.g. `SWITCHBOARD_IMAP__HOST=...` overrides `imap.host`
        config_builder = config_builder.add_source(
            Environment::with_prefix("SWITCHBOARD")
                .separator("__")
                .ignore_empty(true),
        );

        // Direct environment variables, matching the names the external
        // providers are conventionally configured with.
        let env_vars = [
            ("EMAIL_USER", "imap.user"),
            ("EMAIL_PASS", "imap.pass"),
            ("SMTP_USER", "smtp.user"),
            ("SMTP_PASS", "smtp.pass"),
            ("SMTP_FROM", "smtp.from"),
            ("TWILIO_ACCOUNT_SID", "telephony.account_sid"),
            ("TWILIO_AUTH_TOKEN", "telephony.auth_token"),
            ("TWILIO_PHONE_NUMBER", "telephony.phone_number"),
            ("TWILIO_TWIML_APP_SID", "telephony.twiml_app_sid"),
            ("TWILIO_VOICE_URL", "telephony.voice_handler_url"),
            ("DATABASE_URL", "store.database_url"),
            ("HTTP_HOST", "http.host"),
            ("HTTP_PORT", "http.port"),
            ("IMAP_HOST", "imap.host"),
            ("IMAP_PORT", "imap.port"),
            ("SMTP_HOST", "smtp.host"),
            ("SMTP_PORT", "smtp.port"),
        ];

        for (env_var, config_key) in &env_vars {
            if let Ok(value) = env::var(env_var) {
                if env_var.ends_with("_PORT") {
                    if let Ok(port) = value.parse::<u16>() {
                        config_builder = config_builder.set_override(*config_key, port)?;
                    } else {
                        warn!("Invalid port value in {}: {}", env_var, value);
                    }
                } else {
                    config_builder = config_builder.set_override(*config_key, value)?;
                }
            }
        }

        config_builder.build()?.try_deserialize()
    }

    /// When the mail user doubles as the sender address, fill `smtp.from`;
    /// when SMTP credentials are absent, reuse the IMAP account.
    pub fn normalized(mut self) -> Self {
        if self.smtp.user.is_empty() {
            self.smtp.user = self.imap.user.clone();
            self.smtp.pass = self.imap.pass.clone();
        }
        if self.smtp.from.is_empty() {
            self.smtp.from = self.smtp.user.clone();
        }
        self
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load or parse configuration: {0}")]
    LoadError(#[from] config::ConfigError),
}
