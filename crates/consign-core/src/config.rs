//! Configuration module
//!
//! Settings for the HTTP server, the intake pipeline and the outbound mail
//! transport. Loaded once at process start and shared read-only afterwards.

use std::env;
use std::path::PathBuf;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_UPLOAD_SIZE_MB: usize = 25;
const MINIMUM_PRICE: f64 = 10_000.0;
const UPLOAD_DIR: &str = "secure_uploads";
const UPLOAD_DIR_MODE: u32 = 0o755;
const SUCCESS_REDIRECT: &str = "confirmation.html";
const FORM_REDIRECT: &str = "index.html";
const TRACKING_PREFIX: &str = "OPC";
const SMTP_PORT: u16 = 587;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub max_upload_bytes: usize,
    /// Where multipart file parts are spooled before being moved into place.
    pub temp_dir: PathBuf,
}

/// Business settings for the intake pipeline
#[derive(Clone, Debug)]
pub struct IntakeSettings {
    /// Brokerage inbox that receives every notification
    pub recipient: String,
    /// From address of outgoing notifications
    pub sender: String,
    pub upload_dir: PathBuf,
    pub upload_dir_mode: u32,
    pub minimum_price: f64,
    pub success_redirect: String,
    pub form_redirect: String,
    pub tracking_prefix: String,
    pub mailer_tag: String,
}

impl IntakeSettings {
    /// Settings with every optional value at its default.
    pub fn new(recipient: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            sender: sender.into(),
            upload_dir: PathBuf::from(UPLOAD_DIR),
            upload_dir_mode: UPLOAD_DIR_MODE,
            minimum_price: MINIMUM_PRICE,
            success_redirect: SUCCESS_REDIRECT.to_string(),
            form_redirect: FORM_REDIRECT.to_string(),
            tracking_prefix: TRACKING_PREFIX.to_string(),
            mailer_tag: default_mailer_tag(),
        }
    }
}

/// How notifications leave the process
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyTransport {
    Smtp,
    Sendmail,
    /// Write the message to the log only (development)
    Log,
}

impl NotifyTransport {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "smtp" => Some(NotifyTransport::Smtp),
            "sendmail" => Some(NotifyTransport::Sendmail),
            "log" => Some(NotifyTransport::Log),
            _ => None,
        }
    }
}

/// Outbound mail transport settings
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub transport: NotifyTransport,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: NotifyTransport::Log,
            smtp_host: None,
            smtp_port: SMTP_PORT,
            smtp_user: None,
            smtp_password: None,
            smtp_tls: true,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub intake: IntakeSettings,
    pub mail: MailConfig,
}

impl Config {
    /// Development configuration around the given intake settings.
    pub fn new(intake: IntakeSettings) -> Self {
        Self {
            base: BaseConfig {
                server_port: SERVER_PORT,
                environment: "development".to_string(),
                max_upload_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
                temp_dir: env::temp_dir(),
            },
            intake,
            mail: MailConfig::default(),
        }
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.base.max_upload_bytes
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            max_upload_bytes: max_upload_size_mb * 1024 * 1024,
            temp_dir: env::var("UPLOAD_TEMP_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
        };

        let intake = IntakeSettings {
            recipient: env::var("INTAKE_RECIPIENT")
                .map_err(|_| anyhow::anyhow!("INTAKE_RECIPIENT must be set"))?,
            sender: env::var("INTAKE_SENDER")
                .map_err(|_| anyhow::anyhow!("INTAKE_SENDER must be set"))?,
            upload_dir: env::var("UPLOAD_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(UPLOAD_DIR)),
            upload_dir_mode: env::var("UPLOAD_DIR_MODE")
                .ok()
                .and_then(|s| u32::from_str_radix(s.trim(), 8).ok())
                .unwrap_or(UPLOAD_DIR_MODE),
            minimum_price: env::var("MINIMUM_PRICE")
                .unwrap_or_else(|_| MINIMUM_PRICE.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MINIMUM_PRICE must be a number"))?,
            success_redirect: env::var("SUCCESS_REDIRECT")
                .unwrap_or_else(|_| SUCCESS_REDIRECT.to_string()),
            form_redirect: env::var("FORM_REDIRECT").unwrap_or_else(|_| FORM_REDIRECT.to_string()),
            tracking_prefix: env::var("TRACKING_PREFIX")
                .unwrap_or_else(|_| TRACKING_PREFIX.to_string()),
            mailer_tag: env::var("MAILER_TAG").unwrap_or_else(|_| default_mailer_tag()),
        };

        let smtp_host = env::var("SMTP_HOST").ok().filter(|s| !s.is_empty());
        let transport = match env::var("NOTIFY_TRANSPORT").ok().filter(|s| !s.is_empty()) {
            Some(raw) => NotifyTransport::parse(&raw).ok_or_else(|| {
                anyhow::anyhow!("NOTIFY_TRANSPORT must be one of smtp, sendmail, log")
            })?,
            None if smtp_host.is_some() => NotifyTransport::Smtp,
            None => NotifyTransport::Log,
        };

        let mail = MailConfig {
            transport,
            smtp_host,
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&p| p > 0)
                .unwrap_or(SMTP_PORT),
            smtp_user: env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
            smtp_password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            smtp_tls: env::var("SMTP_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
        };

        let config = Config { base, intake, mail };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.intake
            .recipient
            .parse::<lettre::Address>()
            .map_err(|e| anyhow::anyhow!("INTAKE_RECIPIENT is not a valid address: {}", e))?;
        self.intake
            .sender
            .parse::<lettre::Address>()
            .map_err(|e| anyhow::anyhow!("INTAKE_SENDER is not a valid address: {}", e))?;

        if !self.intake.minimum_price.is_finite() || self.intake.minimum_price < 0.0 {
            return Err(anyhow::anyhow!(
                "MINIMUM_PRICE must be a non-negative number"
            ));
        }

        if self.intake.tracking_prefix.is_empty() {
            return Err(anyhow::anyhow!("TRACKING_PREFIX must not be empty"));
        }

        if self.mail.transport == NotifyTransport::Smtp && self.mail.smtp_host.is_none() {
            return Err(anyhow::anyhow!(
                "NOTIFY_TRANSPORT=smtp requires SMTP_HOST to be set"
            ));
        }

        if self.is_production() && self.mail.transport == NotifyTransport::Log {
            return Err(anyhow::anyhow!(
                "NOTIFY_TRANSPORT=log is not allowed in production"
            ));
        }

        Ok(())
    }
}

fn default_mailer_tag() -> String {
    format!("consign-intake/{}", env!("CARGO_PKG_VERSION"))
}
