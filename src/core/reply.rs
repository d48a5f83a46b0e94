use super::ids::{ReplyId, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A threaded message attached to a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: ReplyId,
    pub ticket_id: TicketId,
    pub author: UserId,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    /// Whether the reply was written by the ticket's author
    #[must_use]
    pub fn is_from(&self, user: UserId) -> bool {
        self.author == user
    }
}
