//! Per-request authentication
//!
//! A session cookie only authenticates a request that also presents a
//! valid nonce, in the `X-WP-Nonce` header or the `_wpnonce` query
//! parameter. Without a nonce the caller is anonymous; with a bad one the
//! request is refused.

use super::{ApiError, SharedState};
use crate::auth::{Caller, NonceCheck, Principal, REST_NONCE_ACTION, Session};
use crate::storage::UserRepository;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::debug;

pub const NONCE_HEADER: &str = "x-wp-nonce";

#[derive(Debug, Deserialize)]
struct NonceParam {
    #[serde(rename = "_wpnonce")]
    nonce: Option<String>,
}

/// Who is calling, and the nonce to hand back to them
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub caller: Caller,
    pub session: Option<Session>,
    /// Refreshed nonce for an authenticated caller
    pub nonce: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }
}

fn presented_nonce(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get(NONCE_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(value.to_string());
    }
    Query::<NonceParam>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(param)| param.nonce)
}

#[axum::async_trait]
impl FromRequestParts<SharedState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| ApiError::internal(message))?;

        let Some((session, user)) = state.session_user(&cookies)? else {
            return Ok(Self::anonymous());
        };
        let Some(nonce) = presented_nonce(parts) else {
            debug!(user = %user.id, "session cookie without nonce; treating as anonymous");
            return Ok(Self::anonymous());
        };

        let check = state
            .nonces
            .verify(&nonce, REST_NONCE_ACTION, user.id, &session.token);
        if check == NonceCheck::Invalid {
            return Err(ApiError::invalid_nonce());
        }

        let roles = state.service.store().roles()?;
        let refreshed = state.nonces.create(REST_NONCE_ACTION, user.id, &session.token);
        Ok(Self {
            caller: Caller::User(Principal::from_user(&user, &roles)),
            session: Some(session),
            nonce: Some(refreshed),
        })
    }
}
