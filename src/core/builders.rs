use super::{PostStatus, Priority, Reply, ReplyId, Status, TermId, Ticket, TicketId, TicketMeta, UserId};
use chrono::{DateTime, Utc};

/// Builder for creating Ticket instances
#[derive(Default)]
pub struct TicketBuilder {
    id: Option<TicketId>,
    title: Option<String>,
    content: Option<String>,
    author: Option<UserId>,
    priority: Option<Priority>,
    status: Option<Status>,
    assigned_agent: Option<UserId>,
    post_status: Option<PostStatus>,
    categories: Vec<TermId>,
    created_at: Option<DateTime<Utc>>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticket ID
    #[must_use]
    pub const fn id(mut self, id: TicketId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the body
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the author
    #[must_use]
    pub const fn author(mut self, author: UserId) -> Self {
        self.author = Some(author);
        self
    }

    /// Set the priority
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the status
    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the assigned agent
    #[must_use]
    pub const fn assigned_agent(mut self, agent: UserId) -> Self {
        self.assigned_agent = Some(agent);
        self
    }

    /// Set the publication state
    #[must_use]
    pub const fn post_status(mut self, post_status: PostStatus) -> Self {
        self.post_status = Some(post_status);
        self
    }

    /// Add a single category term
    #[must_use]
    pub fn category(mut self, term: TermId) -> Self {
        self.categories.push(term);
        self
    }

    /// Set `created_at` timestamp
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Build the ticket
    pub fn build(self) -> Ticket {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        Ticket {
            id: self.id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            created_at,
            modified_at: created_at,
            post_status: self.post_status.unwrap_or_default(),
            meta: TicketMeta {
                priority: self.priority.unwrap_or_default(),
                status: self.status.unwrap_or_default(),
                assigned_agent: self.assigned_agent,
            },
            categories: self.categories,
        }
    }
}

/// Builder for creating Reply instances
#[derive(Default)]
pub struct ReplyBuilder {
    id: Option<ReplyId>,
    ticket_id: Option<TicketId>,
    author: Option<UserId>,
    author_name: Option<String>,
    content: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl ReplyBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn id(mut self, id: ReplyId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub const fn ticket(mut self, ticket_id: TicketId) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }

    #[must_use]
    pub fn author(mut self, author: UserId, name: impl Into<String>) -> Self {
        self.author = Some(author);
        self.author_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn build(self) -> Reply {
        Reply {
            id: self.id.unwrap_or_default(),
            ticket_id: self.ticket_id.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            author_name: self.author_name.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}
