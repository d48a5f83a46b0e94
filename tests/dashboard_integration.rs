//! The dashboard client driving a live server

use chrono::Utc;
use reqwest::Url;
use std::sync::Arc;
use tickefic::activation;
use tickefic::api::{self, AppState};
use tickefic::auth::SUBSCRIBER;
use tickefic::auth::password::hash_password;
use tickefic::config::Settings;
use tickefic::core::{Priority, User, UserId};
use tickefic::dashboard::{Dashboard, DashboardApi, HttpDashboardApi, Phase, Tab, TicketForm, is_owner_reply};
use tickefic::storage::{ContentStore, UserRepository};
use tokio::net::TcpListener;

/// Start a server on a free port and return the dashboard page URL
async fn start_server() -> Url {
    let store = Arc::new(ContentStore::in_memory());
    let state = AppState::new(Arc::clone(&store), Settings::default()).unwrap();
    activation::activate(&store).unwrap();
    store
        .insert_user(User {
            id: UserId(0),
            login: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            password_hash: hash_password("password").unwrap(),
            roles: vec![SUBSCRIBER.to_string()],
            registered_at: Utc::now(),
        })
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(api::serve_on(listener, Arc::new(state)));
    Url::parse(&format!("http://{addr}/user-dashboard/")).unwrap()
}

#[tokio::test]
async fn test_page_config_points_at_rest_base() {
    let page = start_server().await;
    let api = HttpDashboardApi::from_page(page.clone()).await.unwrap();
    assert!(!api.nonce().is_empty());

    let status = api.user_status().await.unwrap();
    assert!(!status.logged_in);
    assert_eq!(status.user.name, "Guest");
}

#[tokio::test]
async fn test_full_dashboard_session() {
    let page = start_server().await;
    let api = HttpDashboardApi::from_page(page).await.unwrap();
    let guest_nonce = api.nonce();
    let dashboard = Dashboard::new(api, 10);

    dashboard.start().await;
    assert_eq!(dashboard.state().phase, Phase::Anonymous);

    assert!(!dashboard.login("alice", "wrong").await);
    assert_eq!(dashboard.state().login_error.as_deref(), Some("Invalid credentials."));

    assert!(dashboard.login("alice", "password").await);
    assert_ne!(dashboard.api().nonce(), guest_nonce);
    let state = dashboard.state();
    assert!(state.is_authenticated());
    assert!(state.tickets.is_empty());

    let form = TicketForm {
        title: "Printer broken".to_string(),
        content: "It jams.".to_string(),
        priority: Priority::High,
        category: Some(1),
    };
    assert!(dashboard.create_ticket(&form).await);
    let ticket = dashboard.state().tickets[0].clone();
    assert_eq!(ticket.title.rendered, "Printer broken");
    assert_eq!(ticket.meta.tickefic_priority, Priority::High);

    dashboard.toggle_ticket(ticket.id).await;
    assert_eq!(dashboard.state().expanded, Some(ticket.id));
    assert!(dashboard.post_reply(ticket.id, "Any news?").await);
    let state = dashboard.state();
    let thread = state.thread(ticket.id).unwrap();
    assert_eq!(thread.replies.len(), 1);
    assert!(is_owner_reply(&ticket, &thread.replies[0]));

    dashboard.select_tab(Tab::Closed).await;
    let state = dashboard.state();
    assert_eq!(state.tab, Tab::Closed);
    assert!(state.tickets.is_empty());

    dashboard.select_tab(Tab::Open).await;
    assert_eq!(dashboard.state().tickets.len(), 1);
}
