//! Admin sessions and one-time login codes.
//!
//! Sessions live in memory and are identified by a random id carried in a
//! cookie signed with HMAC-SHA1 under the configured secret key. One-time
//! codes use HOTP (RFC 4226) truncation over a fresh random counter.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

pub const SESSION_COOKIE: &str = "eventbook_session";
const OTP_TTL_MINUTES: i64 = 5;
const OTP_MAX_ATTEMPTS: u32 = 5;
const OTP_LOCKOUT_MINUTES: i64 = 15;

fn mac(key: &[u8]) -> anyhow::Result<HmacSha1> {
    match HmacSha1::new_from_slice(key) {
        Ok(m) => Ok(m),
        Err(e) => Err(anyhow::anyhow!("invalid HMAC key: {e}")),
    }
}

/// Compares two byte strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn check_credentials(user: &str, pass: &str, expected_user: &str, expected_pass: &str) -> bool {
    let user_ok = constant_time_eq(user.as_bytes(), expected_user.as_bytes());
    let pass_ok = constant_time_eq(pass.as_bytes(), expected_pass.as_bytes());
    user_ok & pass_ok
}

// ── Sessions ──

pub struct SessionStore {
    secret: String,
    ttl: Duration,
    sessions: Mutex<HashMap<Uuid, DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new(secret: String, ttl_hours: i64) -> Self {
        Self {
            secret,
            ttl: Duration::hours(ttl_hours),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn sign(&self, id: &Uuid) -> anyhow::Result<String> {
        let mut mac = mac(self.secret.as_bytes())?;
        mac.update(id.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    fn verify(&self, cookie_value: &str) -> Option<Uuid> {
        let (id, signature) = cookie_value.split_once('.')?;
        let id = Uuid::parse_str(id).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = mac(self.secret.as_bytes()).ok()?;
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id)
    }

    /// Opens a new authenticated session and returns the cookie value.
    pub fn create(&self) -> anyhow::Result<String> {
        let id = Uuid::new_v4();
        let signature = self.sign(&id)?;
        let expires_at = Utc::now() + self.ttl;
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, expires_at);
        Ok(format!("{id}.{signature}"))
    }

    pub fn is_authenticated(&self, cookie_value: &str) -> bool {
        let Some(id) = self.verify(cookie_value) else {
            return false;
        };

        let now = Utc::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.retain(|_, expires_at| *expires_at > now);
        sessions.contains_key(&id)
    }

    pub fn remove(&self, cookie_value: &str) {
        if let Some(id) = self.verify(cookie_value) {
            self.sessions
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&id);
        }
    }
}

pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

pub fn set_cookie_header(value: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.num_seconds()
    )
}

pub fn clear_cookie_header() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

// ── One-time codes ──

/// RFC 4226 HOTP value with six digits.
pub fn hotp(secret: &[u8], counter: u64) -> anyhow::Result<u32> {
    let mut mac = mac(secret)?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[19] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    Ok(binary % 1_000_000)
}

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("a login code is already outstanding")]
    AlreadyIssued,

    #[error("too many wrong login codes, try again later")]
    LockedOut,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

struct PendingCode {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Wrong guesses are counted across issued codes, so asking for a new code
/// does not buy a fresh attempt budget.
#[derive(Default)]
struct OtpState {
    pending: Option<PendingCode>,
    failures: u32,
    locked_until: Option<DateTime<Utc>>,
}

impl OtpState {
    fn is_locked(&mut self, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(until) if until > now => true,
            Some(_) => {
                self.locked_until = None;
                false
            }
            None => false,
        }
    }
}

pub struct OtpStore {
    secret: String,
    state: Mutex<OtpState>,
}

impl OtpStore {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            state: Mutex::new(OtpState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OtpState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issues a fresh code. Refused while another code is still live or
    /// while one-time login is locked out.
    pub fn issue(&self) -> Result<String, OtpError> {
        let now = Utc::now();
        let mut state = self.lock();

        if state.is_locked(now) {
            return Err(OtpError::LockedOut);
        }
        if state.pending.as_ref().is_some_and(|p| p.expires_at > now) {
            return Err(OtpError::AlreadyIssued);
        }

        let counter = Uuid::new_v4().as_u128() as u64;
        let code = format!("{:06}", hotp(self.secret.as_bytes(), counter)?);
        state.pending = Some(PendingCode {
            code: code.clone(),
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
        });
        Ok(code)
    }

    /// Drops the outstanding code, e.g. when it could not be delivered.
    /// The failure count is kept.
    pub fn revoke(&self) {
        self.lock().pending = None;
    }

    /// Accepts the outstanding code once. After too many wrong guesses the
    /// code is discarded and one-time login is locked for a while.
    pub fn verify(&self, code: &str) -> bool {
        let now = Utc::now();
        let mut state = self.lock();

        if state.is_locked(now) {
            return false;
        }

        let (expired, matches) = match &state.pending {
            Some(p) => (
                p.expires_at <= now,
                constant_time_eq(p.code.as_bytes(), code.trim().as_bytes()),
            ),
            None => return false,
        };

        if expired {
            state.pending = None;
            return false;
        }

        if matches {
            state.pending = None;
            state.failures = 0;
            return true;
        }

        state.failures += 1;
        if state.failures >= OTP_MAX_ATTEMPTS {
            state.pending = None;
            state.failures = 0;
            state.locked_until = Some(now + Duration::minutes(OTP_LOCKOUT_MINUTES));
            tracing::warn!("too many wrong login codes, one-time login locked");
        }
        false
    }
}
