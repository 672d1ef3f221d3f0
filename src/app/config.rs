use chrono::FixedOffset;

use crate::app::AppError;
use crate::domain::booking_status::StatusRule;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub http_bind: String,
    pub app_url: String,
    pub session_ttl_minutes: i64,
    pub status_rule: StatusRule,
    pub display_offset: FixedOffset,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_ttl_minutes = parse_or_default(&lookup, "SESSION_TTL_MINUTES", 120_i64)?;
        if session_ttl_minutes <= 0 {
            return Err(AppError::config("SESSION_TTL_MINUTES must be positive"));
        }

        let offset_minutes = parse_or_default(&lookup, "DISPLAY_UTC_OFFSET_MINUTES", 0_i32)?;
        let display_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::config("DISPLAY_UTC_OFFSET_MINUTES must be between -1439 and 1439")
            })?;

        let status_rule = match non_empty(&lookup, "BOOKING_STATUS_RULE") {
            Some(raw) => raw.parse::<StatusRule>().map_err(AppError::config)?,
            None => StatusRule::default(),
        };

        Ok(Self {
            db_path: non_empty(&lookup, "DB_PATH")
                .unwrap_or_else(|| "/var/lib/ev-dashboard/dashboard.db".to_string()),
            http_bind: non_empty(&lookup, "HTTP_BIND")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            app_url: non_empty(&lookup, "APP_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            session_ttl_minutes,
            status_rule,
            display_offset,
            cookie_secure: parse_or_default(&lookup, "COOKIE_SECURE", false)?,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} has an invalid value `{raw}`"))),
        None => Ok(default),
    }
}
