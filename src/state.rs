use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Db;
use crate::services::auth::{OtpStore, SessionStore};
use crate::services::notify::Notifier;

pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub notifier: Arc<Notifier>,
    pub sessions: SessionStore,
    pub otp: OtpStore,
}

impl AppState {
    pub fn new(db: Db, config: AppConfig, notifier: Arc<Notifier>) -> Self {
        Self {
            sessions: SessionStore::new(config.secret_key.clone(), config.session_ttl_hours),
            otp: OtpStore::new(config.secret_key.clone()),
            db,
            config,
            notifier,
        }
    }
}
