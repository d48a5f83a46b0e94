use crate::error::TickeficError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use tracing::error;

/// A host-style REST error: `{code, message, data: {status}}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    /// Per-parameter reasons, reported under `data.params`
    pub params: Option<Map<String, Value>>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            params: None,
        }
    }

    /// A session cookie arrived with a nonce that does not verify
    pub fn invalid_nonce() -> Self {
        Self::new(StatusCode::FORBIDDEN, "rest_cookie_invalid_nonce", "Cookie check failed")
    }

    pub fn no_route() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "rest_no_route",
            "No route was found matching the URL and request method.",
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_server_error", message)
    }

    /// Map an authorization failure onto a route-specific code
    ///
    /// Not being logged in is 401, a missing right 403. Other errors keep
    /// their usual mapping.
    pub fn denied_as(err: TickeficError, code: &str) -> Self {
        match err {
            TickeficError::NotLoggedIn => Self::new(StatusCode::UNAUTHORIZED, code, err.to_string()),
            TickeficError::Forbidden { .. } => Self::new(StatusCode::FORBIDDEN, code, err.to_string()),
            other => other.into(),
        }
    }

    fn body(&self) -> Value {
        let mut data = Map::new();
        data.insert("status".to_string(), json!(self.status.as_u16()));
        if let Some(params) = &self.params {
            data.insert("params".to_string(), Value::Object(params.clone()));
        }
        json!({
            "code": self.code,
            "message": self.message,
            "data": data,
        })
    }
}

impl From<TickeficError> for ApiError {
    fn from(err: TickeficError) -> Self {
        match err {
            TickeficError::NotLoggedIn => {
                Self::new(StatusCode::UNAUTHORIZED, "rest_not_logged_in", err.to_string())
            },
            TickeficError::Forbidden { .. } => {
                Self::new(StatusCode::FORBIDDEN, "rest_forbidden", err.to_string())
            },
            TickeficError::TicketNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "rest_post_invalid_id", "Invalid post ID.")
            },
            TickeficError::UserNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "rest_user_invalid_id", "Invalid user ID.")
            },
            TickeficError::InvalidParam { ref param, ref reason } => {
                let mut params = Map::new();
                params.insert(param.clone(), json!(reason));
                Self {
                    params: Some(params),
                    ..Self::new(
                        StatusCode::BAD_REQUEST,
                        "rest_invalid_param",
                        format!("Invalid parameter(s): {param}"),
                    )
                }
            },
            TickeficError::PageOutOfRange { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "rest_post_invalid_page_number",
                err.to_string(),
            ),
            TickeficError::InvalidTerm(_) => {
                Self::new(StatusCode::BAD_REQUEST, "rest_term_invalid", "Invalid term ID.")
            },
            other => {
                error!(error = %other, "request failed");
                Self::internal(other.user_message())
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "rest_invalid_json", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "rest_invalid_param", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_reports_params() {
        let err = ApiError::from(TickeficError::invalid_param("tickefic_priority", "bad"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let body = err.body();
        assert_eq!(body["code"], "rest_invalid_param");
        assert_eq!(body["data"]["status"], 400);
        assert_eq!(body["data"]["params"]["tickefic_priority"], "bad");
    }

    #[test]
    fn test_denied_as_distinguishes_login_from_rights() {
        let anon = ApiError::denied_as(TickeficError::NotLoggedIn, "rest_cannot_edit");
        assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
        assert_eq!(anon.code, "rest_cannot_edit");

        let denied = ApiError::denied_as(TickeficError::forbidden("edit ticket 3"), "rest_cannot_edit");
        assert_eq!(denied.status, StatusCode::FORBIDDEN);

        let missing = ApiError::denied_as(TickeficError::TicketNotFound { id: 3 }, "rest_cannot_edit");
        assert_eq!(missing.code, "rest_post_invalid_id");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::from(TickeficError::LockPoisoned);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.body()["data"].get("params").is_none());
    }
}
