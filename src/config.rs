use std::env;

use chrono::NaiveTime;

pub const DEFAULT_ADMIN_USER: &str = "admin";
pub const DEFAULT_ADMIN_PASS: &str = "admin123";
pub const DEFAULT_SECRET_KEY: &str = "change_this_key";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub secret_key: String,
    pub admin_user: String,
    pub admin_pass: String,
    pub admin_email: Option<String>,
    pub admin_whatsapp: Option<String>,
    pub business_name: String,
    pub brevo_api_key: Option<String>,
    pub fast2sms_api_key: Option<String>,
    pub whatsapp_instance_id: Option<String>,
    pub whatsapp_token: Option<String>,
    pub country_code: String,
    pub reminder_at: NaiveTime,
    pub notify_timeout_secs: u64,
    pub session_ttl_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parsed("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bookings.db".to_string()),
            secret_key: env::var("SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET_KEY.to_string()),
            admin_user: env::var("ADMIN_USER").unwrap_or_else(|_| DEFAULT_ADMIN_USER.to_string()),
            admin_pass: env::var("ADMIN_PASS").unwrap_or_else(|_| DEFAULT_ADMIN_PASS.to_string()),
            admin_email: optional("ADMIN_EMAIL"),
            admin_whatsapp: optional("ADMIN_WHATSAPP"),
            business_name: env::var("BUSINESS_NAME")
                .unwrap_or_else(|_| "A to Z Event Management".to_string()),
            brevo_api_key: optional("BREVO_API_KEY"),
            fast2sms_api_key: optional("FAST2SMS_API_KEY"),
            whatsapp_instance_id: optional("WHATSAPP_INSTANCE_ID"),
            whatsapp_token: optional("WHATSAPP_TOKEN"),
            country_code: env::var("COUNTRY_CODE").unwrap_or_else(|_| "91".to_string()),
            reminder_at: env::var("REMINDER_AT")
                .ok()
                .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
                .unwrap_or_else(default_reminder_time),
            notify_timeout_secs: parsed("NOTIFY_TIMEOUT_SECS", 10),
            session_ttl_hours: parsed("SESSION_TTL_HOURS", 12),
        }
    }

    /// Logs a warning for every credential still at its built-in default.
    pub fn warn_on_defaults(&self) {
        if self.admin_user == DEFAULT_ADMIN_USER && self.admin_pass == DEFAULT_ADMIN_PASS {
            tracing::warn!("ADMIN_USER/ADMIN_PASS not set, using default admin credentials");
        }
        if self.secret_key == DEFAULT_SECRET_KEY {
            tracing::warn!("SECRET_KEY not set, session cookies are signed with the default key");
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn default_reminder_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 30, 0).unwrap_or(NaiveTime::MIN)
}
