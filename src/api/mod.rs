//! REST surface
//!
//! Serves the session routes under the plugin namespace, the ticket, reply
//! and category collections under the core namespace, and the front-end
//! pages. Host conventions are kept: `/wp-json` base, `X-WP-Nonce` for
//! cookie auth, `X-WP-Total`/`X-WP-TotalPages` on collections and
//! `{code, message, data}` error bodies.

pub mod context;
pub mod error;
pub mod handlers;
pub mod response;
pub mod schema;

pub use context::{NONCE_HEADER, RequestContext};
pub use error::ApiError;
pub use response::{RestResponse, TOTAL_HEADER, TOTAL_PAGES_HEADER};

use crate::activation;
use crate::auth::{NonceService, REST_NONCE_ACTION, Session, SessionStore};
use crate::config::Settings;
use crate::core::{User, UserId};
use crate::error::Result;
use crate::service::TicketService;
use crate::storage::ContentStore;
use crate::web::PageRenderer;
use anyhow::Context as _;
use axum::Router;
use axum::routing::get;
use handlers::{categories, pages, replies, session, tickets};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Everything a request handler can reach
#[derive(Debug)]
pub struct AppState {
    pub service: TicketService,
    pub sessions: SessionStore,
    pub nonces: NonceService,
    pub pages: PageRenderer,
    pub settings: Settings,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Register the content model on `store` and set up sessions
    pub fn new(store: Arc<ContentStore>, settings: Settings) -> Result<Self> {
        let model = activation::init(&store)?;
        Ok(Self {
            service: TicketService::new(store, Arc::new(model)),
            sessions: SessionStore::new(settings.session.remember_days),
            nonces: NonceService::new(settings.nonce_secret(), settings.session.nonce_lifetime_secs)?,
            pages: PageRenderer::new()?,
            settings,
        })
    }

    /// The live session named by the request's cookie, with its user
    pub fn session_user(&self, cookies: &Cookies) -> Result<Option<(Session, User)>> {
        let Some(cookie) = cookies.get(&self.settings.session.cookie_name) else {
            return Ok(None);
        };
        let Some(session) = self.sessions.resolve(cookie.value())? else {
            return Ok(None);
        };
        Ok(self.service.user(session.user_id)?.map(|user| (session, user)))
    }

    /// REST nonce for `session`, or the anonymous one
    #[must_use]
    pub fn rest_nonce(&self, session: Option<&Session>) -> String {
        match session {
            Some(session) => self
                .nonces
                .create(REST_NONCE_ACTION, session.user_id, &session.token),
            None => self.nonces.create(REST_NONCE_ACTION, UserId(0), ""),
        }
    }
}

pub fn build_router(state: SharedState) -> Router {
    let rest = state.settings.rest.clone();
    let ticket_route = rest.route("wp/v2/tickefic/tickets/:id");

    Router::new()
        .route(&rest.namespaced("user-status"), get(session::user_status))
        .route(&rest.namespaced("login"), axum::routing::post(session::login))
        .route(
            &rest.route("wp/v2/tickefic/tickets"),
            get(tickets::list).post(tickets::create),
        )
        .route(
            &ticket_route,
            get(tickets::get)
                .post(tickets::update)
                .put(tickets::update)
                .patch(tickets::update),
        )
        .route(
            &rest.route("wp/v2/comments"),
            get(replies::list).post(replies::create),
        )
        .route(&rest.route("wp/v2/tickefic_cat"), get(categories::list))
        .route("/:slug", get(pages::show))
        .route("/:slug/", get(pages::show))
        .fallback(handlers::no_route)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl+C
pub async fn serve(state: SharedState) -> anyhow::Result<()> {
    let addr = state.settings.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    serve_on(listener, state).await
}

/// Serve on an already bound listener
pub async fn serve_on(listener: TcpListener, state: SharedState) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(%addr, "tickefic listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ADMINISTRATOR, SUBSCRIBER};
    use crate::storage::UserRepository;
    use crate::test_utils::test_user;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        let store = Arc::new(ContentStore::in_memory());
        let state = AppState::new(Arc::clone(&store), Settings::default()).unwrap();
        activation::activate(&store).unwrap();
        store.insert_user(test_user("alice", SUBSCRIBER)).unwrap();
        store.insert_user(test_user("root", ADMINISTRATOR)).unwrap();
        Arc::new(state)
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router, username: &str) -> (String, String) {
        let req = Request::builder()
            .method("POST")
            .uri("/wp-json/tickefic/v1/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"username":"{username}","password":"password"}}"#)))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        let cookie = cookie.split(';').next().unwrap().to_string();
        let nonce = resp.headers()[NONCE_HEADER].to_str().unwrap().to_string();
        (cookie, nonce)
    }

    #[tokio::test]
    async fn test_guest_user_status() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/wp-json/tickefic/v1/user-status")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["logged_in"], false);
        assert_eq!(json["user"]["name"], "Guest");
        assert_eq!(json["user"]["email"], "");
    }

    #[tokio::test]
    async fn test_login_then_status() {
        let app = build_router(test_state());
        let (cookie, nonce) = login(&app, "alice").await;

        let req = Request::builder()
            .uri("/wp-json/tickefic/v1/user-status")
            .header(header::COOKIE, &cookie)
            .header(NONCE_HEADER, &nonce)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(NONCE_HEADER));
        let json = body_json(resp).await;
        assert_eq!(json["logged_in"], true);
        assert_eq!(json["user"]["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_cookie_without_nonce_is_anonymous() {
        let app = build_router(test_state());
        let (cookie, _) = login(&app, "alice").await;
        let req = Request::builder()
            .uri("/wp-json/tickefic/v1/user-status")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let json = body_json(app.oneshot(req).await.unwrap()).await;
        assert_eq!(json["logged_in"], false);
    }

    #[tokio::test]
    async fn test_bad_nonce_is_refused() {
        let app = build_router(test_state());
        let (cookie, _) = login(&app, "alice").await;
        let req = Request::builder()
            .uri("/wp-json/tickefic/v1/user-status?_wpnonce=0123456789")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(resp).await["code"], "rest_cookie_invalid_nonce");
    }

    #[tokio::test]
    async fn test_wrong_password_is_403() {
        let app = build_router(test_state());
        let req = Request::builder()
            .method("POST")
            .uri("/wp-json/tickefic/v1/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"alice","password":"nope"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(!resp.headers().contains_key(header::SET_COOKIE));
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Invalid credentials.");
    }

    async fn post_login(app: &Router, content_type: &str, body: &'static str) -> axum::response::Response {
        let req = Request::builder()
            .method("POST")
            .uri("/wp-json/tickefic/v1/login")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        app.clone().oneshot(req).await.unwrap()
    }

    #[tokio::test]
    async fn test_incomplete_login_body_is_403() {
        let app = build_router(test_state());
        for body in [r#"{"username":"alice"}"#, r#"{"username":["alice"]}"#, "not json"] {
            let resp = post_login(&app, "application/json", body).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "body {body}");
            assert!(!resp.headers().contains_key(header::SET_COOKIE));
            assert_eq!(body_json(resp).await["message"], "Invalid credentials.");
        }
    }

    #[tokio::test]
    async fn test_form_encoded_login() {
        let app = build_router(test_state());
        let form = "application/x-www-form-urlencoded";

        let resp = post_login(&app, form, "username=alice&password=x").await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(resp).await["message"], "Invalid credentials.");

        let resp = post_login(&app, form, "username=alice&password=password").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(header::SET_COOKIE));
        assert_eq!(body_json(resp).await["success"], true);
    }

    #[tokio::test]
    async fn test_dashboard_page_rendered() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/user-dashboard/")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"<div id="user-dashboard-root"></div>"#));
        assert!(html.contains(r#""api_url":"/wp-json/""#));
    }

    #[tokio::test]
    async fn test_unknown_page_and_route() {
        let app = build_router(test_state());
        let req = Request::builder().uri("/nowhere").body(Body::empty()).unwrap();
        assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::NOT_FOUND);

        let req = Request::builder()
            .uri("/wp-json/wp/v2/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["code"], "rest_no_route");
    }
}
