//! Drives [`DashboardState`] with a [`DashboardApi`]
//!
//! The state lock is never held across a request, so calls may overlap;
//! the generation tokens decide which answers still apply.

use super::client::DashboardApi;
use super::state::{CreateEffect, DashboardState, FetchKey, Tab};
use crate::api::schema::{CreateReplyRequest, CreateTicketRequest};
use crate::core::{PostStatus, Priority, STATUS_KEY, Status, PRIORITY_KEY};
use serde_json::{Map, Value};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// The new-ticket form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketForm {
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub category: Option<u64>,
}

impl TicketForm {
    /// Tickets from the dashboard are published and start open
    #[must_use]
    pub fn to_request(&self) -> CreateTicketRequest {
        let mut meta = Map::new();
        meta.insert(PRIORITY_KEY.to_string(), Value::from(self.priority.as_str()));
        meta.insert(STATUS_KEY.to_string(), Value::from(Status::Open.as_str()));
        CreateTicketRequest {
            title: self.title.clone(),
            content: self.content.clone(),
            status: Some(PostStatus::Publish),
            meta,
            tickefic_cat: self.category.into_iter().collect(),
        }
    }
}

#[derive(Debug)]
pub struct Dashboard<A> {
    api: A,
    state: Mutex<DashboardState>,
}

impl<A: DashboardApi> Dashboard<A> {
    pub fn new(api: A, per_page: u32) -> Self {
        Self {
            api,
            state: Mutex::new(DashboardState::new(per_page)),
        }
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut DashboardState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Copy of the current view state
    pub fn state(&self) -> DashboardState {
        self.with_state(|state| state.clone())
    }

    /// Check the session and, when logged in, load the first page
    pub async fn start(&self) {
        self.check_session().await;
        if self.with_state(|s| s.is_authenticated()) {
            self.refresh_tickets().await;
        }
    }

    pub async fn check_session(&self) {
        let token = self.with_state(|s| s.begin(FetchKey::Session));
        let result = self.api.user_status().await;
        if !self.with_state(|s| s.finish_session(token, result)) {
            debug!("discarded stale user-status response");
        }
    }

    /// Log in, then pick up the new session; returns whether it worked
    pub async fn login(&self, username: &str, password: &str) -> bool {
        self.with_state(|s| {
            s.login_pending = true;
            s.login_error = None;
        });
        let result = self.api.login(username, password).await;
        let ok = self.with_state(|s| {
            s.login_pending = false;
            match result {
                Ok(response) if response.success => true,
                Ok(_) => {
                    s.login_error = Some("Login failed.".to_string());
                    false
                },
                Err(err) => {
                    s.login_error = Some(err.to_string());
                    false
                },
            }
        });
        if ok {
            self.start().await;
        }
        ok
    }

    pub async fn refresh_tickets(&self) {
        let (token, query) = self.with_state(|s| (s.begin(FetchKey::Tickets), s.list_query()));
        let result = self.api.list_tickets(&query).await;
        if !self.with_state(|s| s.finish_tickets(token, result)) {
            debug!(page = ?query.page, "discarded stale ticket list");
        }
    }

    pub async fn select_tab(&self, tab: Tab) {
        if self.with_state(|s| s.select_tab(tab)) {
            self.refresh_tickets().await;
        }
    }

    pub async fn go_to_page(&self, page: u32) {
        if self.with_state(|s| s.set_page(page)) {
            self.refresh_tickets().await;
        }
    }

    /// Expand a ticket and load its replies, or collapse it
    pub async fn toggle_ticket(&self, ticket: u64) {
        let token = self.with_state(|s| s.toggle_ticket(ticket).then(|| s.begin(FetchKey::Replies(ticket))));
        let Some(token) = token else {
            return;
        };
        let result = self.api.list_replies(ticket).await;
        if !self.with_state(|s| s.finish_replies(token, result)) {
            debug!(ticket, "discarded stale replies");
        }
    }

    /// Submit the new-ticket form; returns whether the ticket was created
    pub async fn create_ticket(&self, form: &TicketForm) -> bool {
        self.with_state(|s| {
            s.creating = true;
            s.create_error = None;
        });
        let result = self.api.create_ticket(&form.to_request()).await;
        let effect = self.with_state(|s| {
            s.creating = false;
            match result {
                Ok(ticket) => Some(s.ticket_created(ticket)),
                Err(err) => {
                    s.create_error = Some(err.to_string());
                    None
                },
            }
        });
        match effect {
            Some(CreateEffect::Refetch) => {
                self.refresh_tickets().await;
                true
            },
            Some(CreateEffect::Prepended) => true,
            None => false,
        }
    }

    /// Post a reply to `ticket`; blank text is not sent
    pub async fn post_reply(&self, ticket: u64, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.with_state(|s| {
            s.replying = true;
            s.reply_error = None;
        });
        let request = CreateReplyRequest {
            post: ticket,
            content: text.to_string(),
        };
        let result = self.api.post_reply(&request).await;
        self.with_state(|s| {
            s.replying = false;
            match result {
                Ok(reply) => {
                    s.reply_posted(reply);
                    true
                },
                Err(err) => {
                    s.reply_error = Some(err.to_string());
                    false
                },
            }
        })
    }
}
