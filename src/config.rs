use std::net::IpAddr;
use std::path::PathBuf;

use chrono::{FixedOffset, NaiveTime, Offset, Utc};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub encryption_key: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub cors_origins: Vec<String>,
    pub max_upload_size: usize,
    pub upload_dir: PathBuf,
    pub workday_start: NaiveTime,
    pub utc_offset_hours: i32,
    pub annual_leave_days: i32,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        let encryption_key = env_required("HRMS_ENCRYPTION_KEY")?;

        let host: IpAddr = env_or("HRMS_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid HRMS_HOST: {e}"))?;

        let port: u16 = env_or("HRMS_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid HRMS_PORT: {e}"))?;

        let base_url = env_or("HRMS_BASE_URL", &format!("http://{host}:{port}"));

        let cors_origins: Vec<String> = env_or("HRMS_CORS_ORIGINS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size: usize = env_or("HRMS_MAX_UPLOAD_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid HRMS_MAX_UPLOAD_SIZE: {e}"))?;

        let upload_dir = PathBuf::from(env_or("HRMS_UPLOAD_DIR", "uploads"));

        let workday_start =
            NaiveTime::parse_from_str(&env_or("HRMS_WORKDAY_START", "08:00"), "%H:%M")
                .map_err(|e| format!("Invalid HRMS_WORKDAY_START (expected HH:MM): {e}"))?;

        let utc_offset_hours: i32 = env_or("HRMS_UTC_OFFSET_HOURS", "7")
            .parse()
            .map_err(|e| format!("Invalid HRMS_UTC_OFFSET_HOURS: {e}"))?;
        if !(-12..=14).contains(&utc_offset_hours) {
            return Err(format!(
                "Invalid HRMS_UTC_OFFSET_HOURS: {utc_offset_hours} is outside -12..=14"
            ));
        }

        let annual_leave_days: i32 = env_or("HRMS_ANNUAL_LEAVE_DAYS", "12")
            .parse()
            .map_err(|e| format!("Invalid HRMS_ANNUAL_LEAVE_DAYS: {e}"))?;

        let log_level = env_or("HRMS_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("HRMS_SMTP_HOST").ok(),
            std::env::var("HRMS_SMTP_PORT").ok(),
            std::env::var("HRMS_SMTP_USER").ok(),
            std::env::var("HRMS_SMTP_PASS").ok(),
            std::env::var("HRMS_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid HRMS_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            encryption_key,
            host,
            port,
            base_url,
            cors_origins,
            max_upload_size,
            upload_dir,
            workday_start,
            utc_offset_hours,
            annual_leave_days,
            log_level,
            smtp,
        })
    }

    /// Local time zone used for attendance dates and lateness.
    pub fn local_offset(&self) -> FixedOffset {
        // Range is validated in `from_env`; hand-built configs fall back to UTC.
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
