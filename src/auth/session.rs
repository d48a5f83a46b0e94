//! Login sessions and request nonces
//!
//! A session is an opaque random token stored in a cookie. Cookie
//! authentication is only honoured together with a nonce: a short HMAC over
//! the current time tick, the nonce action, the user and the session token.
//! A nonce stays valid for the current and the previous tick, i.e. between
//! half a lifetime and a full lifetime.

use crate::core::UserId;
use crate::error::{Result, TickeficError};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Nonce action used by the REST API
pub const REST_NONCE_ACTION: &str = "wp_rest";

const NONCE_LENGTH: usize = 10;
const SHORT_SESSION_DAYS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-memory session table
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    remember_days: i64,
}

impl SessionStore {
    #[must_use]
    pub fn new(remember_days: i64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            remember_days,
        }
    }

    /// Start a session for `user_id`
    ///
    /// Remembered sessions last `remember_days`, others two days. Expired
    /// sessions are dropped from the table on the way.
    pub fn create(&self, user_id: UserId, remember: bool) -> Result<Session> {
        let now = Utc::now();
        let days = if remember { self.remember_days } else { SHORT_SESSION_DAYS };
        let session = Session {
            token: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            user_id,
            created_at: now,
            expires_at: now + Duration::days(days),
        };
        let mut sessions = self.sessions.lock()?;
        let before = sessions.len();
        sessions.retain(|_, existing| !existing.is_expired_at(now));
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "expired sessions dropped");
        }
        sessions.insert(session.token.clone(), session.clone());
        debug!(user = %user_id, "session created");
        Ok(session)
    }

    /// Look up a live session, dropping it if it has expired
    pub fn resolve(&self, token: &str) -> Result<Option<Session>> {
        let mut sessions = self.sessions.lock()?;
        match sessions.get(token) {
            Some(session) if session.is_expired_at(Utc::now()) => {
                sessions.remove(token);
                Ok(None)
            },
            Some(session) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    pub fn destroy(&self, token: &str) -> Result<bool> {
        Ok(self.sessions.lock()?.remove(token).is_some())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.sessions.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Outcome of a nonce check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceCheck {
    /// Generated in the current tick
    Fresh,
    /// Generated in the previous tick; a refreshed nonce should be sent back
    Aging,
    Invalid,
}

impl NonceCheck {
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// Mints and verifies request nonces
#[derive(Clone)]
pub struct NonceService {
    mac: HmacSha256,
    lifetime_secs: i64,
}

impl std::fmt::Debug for NonceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceService")
            .field("secret", &"<redacted>")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish()
    }
}

impl NonceService {
    pub fn new(secret: impl AsRef<[u8]>, lifetime_secs: u64) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_ref())
            .map_err(|e| TickeficError::custom(format!("invalid nonce secret: {e}")))?;
        Ok(Self {
            mac,
            lifetime_secs: i64::try_from(lifetime_secs.max(2)).unwrap_or(i64::MAX),
        })
    }

    fn tick_at(&self, now: DateTime<Utc>) -> i64 {
        let half = self.lifetime_secs / 2;
        (now.timestamp() + half - 1).div_euclid(half)
    }

    fn digest(&self, tick: i64, action: &str, user: UserId, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(format!("{tick}|{action}|{user}|{token}").as_bytes());
        let mut hex = hex::encode(mac.finalize().into_bytes());
        hex.truncate(NONCE_LENGTH);
        hex
    }

    /// Nonce for `action` valid from now
    #[must_use]
    pub fn create(&self, action: &str, user: UserId, token: &str) -> String {
        self.create_at(action, user, token, Utc::now())
    }

    #[must_use]
    pub fn create_at(&self, action: &str, user: UserId, token: &str, now: DateTime<Utc>) -> String {
        self.digest(self.tick_at(now), action, user, token)
    }

    #[must_use]
    pub fn verify(&self, nonce: &str, action: &str, user: UserId, token: &str) -> NonceCheck {
        self.verify_at(nonce, action, user, token, Utc::now())
    }

    #[must_use]
    pub fn verify_at(&self, nonce: &str, action: &str, user: UserId, token: &str, now: DateTime<Utc>) -> NonceCheck {
        if nonce.is_empty() {
            return NonceCheck::Invalid;
        }
        let tick = self.tick_at(now);
        if constant_time_eq(&self.digest(tick, action, user, token), nonce) {
            return NonceCheck::Fresh;
        }
        if constant_time_eq(&self.digest(tick - 1, action, user, token), nonce) {
            return NonceCheck::Aging;
        }
        NonceCheck::Invalid
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
