use crate::api::schema::{
    CreateReplyRequest, CreateTicketRequest, ListQuery, LoginResponse, ReplyJson, TicketJson,
    UserStatus,
};
use async_trait::async_trait;
use thiserror::Error;

/// Failures seen by the dashboard; each is shown as inline text
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never got an answer
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with an error body
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The answer could not be read
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One page of tickets with the collection totals
#[derive(Debug, Clone, Default)]
pub struct TicketList {
    pub tickets: Vec<TicketJson>,
    pub total: usize,
    pub total_pages: u32,
}

/// The REST calls the dashboard makes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn user_status(&self) -> Result<UserStatus, ClientError>;

    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError>;

    async fn list_tickets(&self, query: &ListQuery) -> Result<TicketList, ClientError>;

    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<TicketJson, ClientError>;

    /// Replies of `ticket`, oldest first
    async fn list_replies(&self, ticket: u64) -> Result<Vec<ReplyJson>, ClientError>;

    async fn post_reply(&self, request: &CreateReplyRequest) -> Result<ReplyJson, ClientError>;
}
