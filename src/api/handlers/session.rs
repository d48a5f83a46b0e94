use crate::api::schema::{LoginError, LoginRequest, LoginResponse, LoginUser, StatusUser, UserStatus};
use crate::api::{ApiError, RequestContext, RestResponse, SharedState};
use crate::auth::{REST_NONCE_ACTION, password::verify_password};
use crate::core::User;
use crate::error::Result;
use crate::storage::UserRepository;
use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use tracing::{info, warn};

/// `GET /tickefic/v1/user-status`
pub async fn user_status(ctx: RequestContext) -> RestResponse<UserStatus> {
    let status = match ctx.caller.principal() {
        Some(user) => UserStatus {
            logged_in: true,
            user: StatusUser {
                name: user.display_name.clone(),
                email: user.email.clone(),
            },
        },
        None => UserStatus::guest(),
    };
    RestResponse::ok(status).with_context(&ctx)
}

fn check_credentials(state: &SharedState, username: &str, password: &str) -> Result<Option<User>> {
    if username.trim().is_empty() || password.is_empty() {
        return Ok(None);
    }
    Ok(state
        .service
        .store()
        .find_user(username)?
        .filter(|user| verify_password(password, &user.password_hash)))
}

/// Credentials from a JSON or form-encoded body, `None` if unreadable
async fn read_credentials(request: Request) -> Option<LoginRequest> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));
    if is_form {
        Form::<LoginRequest>::from_request(request, &()).await.ok().map(|Form(r)| r)
    } else {
        Json::<LoginRequest>::from_request(request, &()).await.ok().map(|Json(r)| r)
    }
}

/// `POST /tickefic/v1/login`
///
/// Starts a remembered session and returns the nonce bound to it. Any body
/// that does not carry valid credentials gets the same 403 answer.
pub async fn login(
    State(state): State<SharedState>,
    cookies: Cookies,
    request: Request,
) -> std::result::Result<Response, ApiError> {
    let credentials = read_credentials(request).await.unwrap_or_default();
    let Some(user) = check_credentials(&state, &credentials.username, &credentials.password)? else {
        warn!(username = %credentials.username.trim(), "login failed");
        return Ok((StatusCode::FORBIDDEN, Json(LoginError::invalid_credentials())).into_response());
    };

    let session = state.sessions.create(user.id, true)?;
    let mut cookie = Cookie::new(state.settings.session.cookie_name.clone(), session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(time::Duration::days(state.settings.session.remember_days));
    cookies.add(cookie);

    let nonce = state.nonces.create(REST_NONCE_ACTION, user.id, &session.token);
    info!(user = %user.id, login = %user.login, "user logged in");
    Ok(RestResponse::ok(LoginResponse {
        success: true,
        user: LoginUser {
            id: user.id.get(),
            name: user.display_name,
        },
    })
    .with_nonce(&nonce)
    .into_response())
}
