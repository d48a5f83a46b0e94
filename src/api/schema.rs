//! Wire types of the REST surface
//!
//! These are shared by the handlers and the dashboard client so both ends
//! agree on field names.

use crate::core::{Priority, PostStatus, Reply, Status, Term, Ticket, TICKET_POST_TYPE, User};
use crate::service::ListParams;
use crate::service::render::{render_content, render_title};
use crate::storage::SortOrder;
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dates are reported the host way: site-local, no offset, whole seconds
fn wire_date(at: DateTime<Utc>) -> NaiveDateTime {
    at.naive_utc().trunc_subsecs(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    pub rendered: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMetaJson {
    pub tickefic_priority: Priority,
    pub tickefic_status: Status,
    /// `0` when unassigned
    pub tickefic_assigned_agent: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedAuthor {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Embedded {
    #[serde(default)]
    pub author: Vec<EmbeddedAuthor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketJson {
    pub id: u64,
    pub date: NaiveDateTime,
    pub author: u64,
    pub status: PostStatus,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Rendered,
    pub content: Rendered,
    pub meta: TicketMetaJson,
    #[serde(default)]
    pub tickefic_cat: Vec<u64>,
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
}

impl TicketJson {
    /// `author` is embedded when given
    #[must_use]
    pub fn new(ticket: &Ticket, author: Option<&User>) -> Self {
        Self {
            id: ticket.id.get(),
            date: wire_date(ticket.created_at),
            author: ticket.author.get(),
            status: ticket.post_status,
            kind: TICKET_POST_TYPE.to_string(),
            title: Rendered { rendered: render_title(&ticket.title) },
            content: Rendered { rendered: render_content(&ticket.content) },
            meta: TicketMetaJson {
                tickefic_priority: ticket.meta.priority,
                tickefic_status: ticket.meta.status,
                tickefic_assigned_agent: ticket.meta.assigned_agent.map_or(0, |id| id.get()),
            },
            tickefic_cat: ticket.categories.iter().map(|id| id.get()).collect(),
            embedded: author.map(|user| Embedded {
                author: vec![EmbeddedAuthor {
                    id: user.id.get(),
                    name: user.display_name.clone(),
                }],
            }),
        }
    }

    /// Display name of the embedded author, if any
    #[must_use]
    pub fn author_name(&self) -> Option<&str> {
        self.embedded
            .as_ref()
            .and_then(|e| e.author.first())
            .map(|a| a.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyJson {
    pub id: u64,
    /// Ticket the reply belongs to
    pub post: u64,
    pub author: u64,
    pub author_name: String,
    pub date: NaiveDateTime,
    pub content: Rendered,
}

impl From<&Reply> for ReplyJson {
    fn from(reply: &Reply) -> Self {
        Self {
            id: reply.id.get(),
            post: reply.ticket_id.get(),
            author: reply.author.get(),
            author_name: reply.author_name.clone(),
            date: wire_date(reply.created_at),
            content: Rendered { rendered: render_content(&reply.content) },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermJson {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
    /// `0` for top-level terms
    pub parent: u64,
}

impl From<&Term> for TermJson {
    fn from(term: &Term) -> Self {
        Self {
            id: term.id.get(),
            name: term.name.clone(),
            slug: term.slug.clone(),
            taxonomy: term.taxonomy.clone(),
            parent: term.parent.map_or(0, |id| id.get()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tickefic_cat: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTicketRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tickefic_cat: Option<Vec<u64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReplyRequest {
    pub post: u64,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: LoginUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginErrorData {
    pub message: String,
}

/// Body of a failed login; carries no detail on which part was wrong
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginError {
    pub success: bool,
    pub message: String,
    pub data: LoginErrorData,
}

impl LoginError {
    pub fn invalid_credentials() -> Self {
        let message = crate::error::TickeficError::InvalidCredentials.to_string();
        Self {
            success: false,
            data: LoginErrorData { message: message.clone() },
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatus {
    pub logged_in: bool,
    pub user: StatusUser,
}

impl UserStatus {
    pub fn guest() -> Self {
        Self {
            logged_in: false,
            user: StatusUser {
                name: "Guest".to_string(),
                email: String::new(),
            },
        }
    }
}

/// Query string of the ticket collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tickefic_status: Option<String>,
    /// Present (with any value) to embed authors
    #[serde(rename = "_embed", default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<String>,
}

impl ListQuery {
    #[must_use]
    pub fn params(&self) -> ListParams {
        ListParams {
            page: self.page,
            per_page: self.per_page,
            order: self.order,
            tickefic_status: self.tickefic_status.clone(),
        }
    }

    #[must_use]
    pub const fn wants_embed(&self) -> bool {
        self.embed.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepliesQuery {
    pub post: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}
