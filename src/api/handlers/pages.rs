use crate::api::{ApiError, SharedState};
use crate::storage::PageRepository;
use crate::web::DashboardConfig;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tower_cookies::Cookies;
use tracing::debug;

/// `GET /:slug`
///
/// The page is rendered for whoever the session cookie names; no nonce is
/// needed to load it.
pub async fn show(
    State(state): State<SharedState>,
    cookies: Cookies,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let Some(page) = state.service.store().page_by_slug(&slug)? else {
        debug!(slug = %slug, "no page with this slug");
        return Ok((StatusCode::NOT_FOUND, Html("<h1>Page not found</h1>")).into_response());
    };

    let session = state.session_user(&cookies)?.map(|(session, _)| session);
    let dashboard = DashboardConfig {
        nonce: state.rest_nonce(session.as_ref()),
        api_url: state.settings.rest.base_path(),
    };
    let html = state.pages.render(&page, &dashboard)?;
    Ok(Html(html).into_response())
}
