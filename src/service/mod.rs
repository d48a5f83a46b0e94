//! Ticket operations
//!
//! [`TicketService`] is the one place tickets, replies and terms are read or
//! written on behalf of a caller. Each operation asks the policy first, then
//! validates its input against the registered content model.

pub mod edit;
pub mod query;
pub mod render;

pub use edit::{SaveOutcome, TicketDetails};
pub use query::{ListParams, sanitize_text_field, scope_query};

use crate::auth::{ADMINISTRATOR, AGENT, Action, Caller, ensure};
use crate::core::{
    AGENT_KEY, CATEGORY_TAXONOMY, ContentModel, PostStatus, Reply, ReplyBuilder, TICKET_POST_TYPE,
    Term, TermId, Ticket, TicketId, TicketMeta, User, UserId,
};
use crate::error::{Result, TickeficError};
use crate::storage::{
    ContentStore, ReplyRepository, SortOrder, TermRepository, TicketPage, TicketRepository,
    UserRepository,
};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Input for a new ticket
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub title: String,
    pub content: String,
    /// Defaults to `draft` like any new post
    pub post_status: Option<PostStatus>,
    pub meta: Map<String, Value>,
    pub categories: Vec<TermId>,
}

/// Partial update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub post_status: Option<PostStatus>,
    pub meta: Map<String, Value>,
    pub categories: Option<Vec<TermId>>,
}

#[derive(Debug, Clone)]
pub struct NewReply {
    pub ticket_id: TicketId,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct TicketService {
    store: Arc<ContentStore>,
    model: Arc<ContentModel>,
}

impl TicketService {
    #[must_use]
    pub const fn new(store: Arc<ContentStore>, model: Arc<ContentModel>) -> Self {
        Self { store, model }
    }

    #[must_use]
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    #[must_use]
    pub fn model(&self) -> &ContentModel {
        &self.model
    }

    /// Open a ticket authored by the caller
    pub fn create_ticket(&self, caller: &Caller, input: NewTicket) -> Result<Ticket> {
        ensure(caller, Action::CreateTicket)?;
        let author = caller.user_id().ok_or(TickeficError::NotLoggedIn)?;

        let post_status = input.post_status.unwrap_or(PostStatus::Draft);
        if post_status == PostStatus::Publish {
            ensure(caller, Action::PublishTicket)?;
        }
        if input.title.trim().is_empty() && input.content.trim().is_empty() {
            return Err(TickeficError::invalid_param(
                "content",
                "Content, title, and excerpt are empty.",
            ));
        }

        let mut meta = TicketMeta::default();
        self.apply_meta(caller, None, &mut meta, &input.meta)?;
        self.check_categories(&input.categories)?;

        let mut ticket = Ticket::new(input.title.trim(), input.content, author);
        ticket.post_status = post_status;
        ticket.meta = meta;
        ticket.categories = input.categories;

        let ticket = self.store.insert_ticket(ticket)?;
        info!(ticket = %ticket.id, author = %author, "ticket created");
        Ok(ticket)
    }

    /// One page of the tickets visible to the caller
    pub fn list_tickets(&self, caller: &Caller, params: &ListParams) -> Result<TicketPage> {
        ensure(caller, Action::ListTickets)?;
        let query = scope_query(caller, params)?;
        let page = self.store.query_tickets(&query)?;
        if query.page > 1 && query.page > page.total_pages {
            return Err(TickeficError::PageOutOfRange { page: query.page });
        }
        debug!(total = page.total, returned = page.items.len(), "listed tickets");
        Ok(page)
    }

    pub fn get_ticket(&self, caller: &Caller, id: TicketId) -> Result<Ticket> {
        let ticket = self.store.load_ticket(id)?;
        ensure(caller, Action::ReadTicket(&ticket))?;
        Ok(ticket)
    }

    /// Apply a partial update; the caller must be allowed to edit the ticket
    pub fn update_ticket(&self, caller: &Caller, id: TicketId, update: TicketUpdate) -> Result<Ticket> {
        let mut ticket = self.store.load_ticket(id)?;
        if let Err(err) = ensure(caller, Action::EditTicket(&ticket)) {
            warn!(ticket = %id, user = ?caller.user_id(), "ticket update denied");
            return Err(err);
        }
        if update.post_status == Some(PostStatus::Publish) && !ticket.is_published() {
            ensure(caller, Action::PublishTicket)?;
        }

        let mut meta = ticket.meta;
        self.apply_meta(caller, Some(&ticket), &mut meta, &update.meta)?;
        if let Some(categories) = &update.categories {
            self.check_categories(categories)?;
        }

        if let Some(title) = update.title {
            ticket.title = title.trim().to_string();
        }
        if let Some(content) = update.content {
            ticket.content = content;
        }
        if let Some(post_status) = update.post_status {
            ticket.post_status = post_status;
        }
        if let Some(categories) = update.categories {
            ticket.categories = categories;
        }
        ticket.meta = meta;
        ticket.modified_at = Utc::now();

        self.store.save_ticket(&ticket)?;
        info!(ticket = %id, "ticket updated");
        Ok(ticket)
    }

    /// Replies on a ticket the caller may read
    pub fn list_replies(&self, caller: &Caller, ticket_id: TicketId, order: SortOrder) -> Result<Vec<Reply>> {
        let ticket = self.store.load_ticket(ticket_id)?;
        ensure(caller, Action::ListReplies(&ticket))?;
        self.store.replies_for(ticket_id, order)
    }

    /// Add a reply as the caller
    pub fn post_reply(&self, caller: &Caller, input: NewReply) -> Result<Reply> {
        let principal = caller.principal().ok_or(TickeficError::NotLoggedIn)?;
        let ticket = self.store.load_ticket(input.ticket_id)?;
        ensure(caller, Action::PostReply(&ticket))?;
        if input.content.trim().is_empty() {
            return Err(TickeficError::invalid_param("content", "Invalid comment content."));
        }

        let reply = ReplyBuilder::new()
            .ticket(ticket.id)
            .author(principal.id, principal.display_name.clone())
            .content(input.content.trim())
            .build();
        let reply = self.store.insert_reply(reply)?;
        info!(ticket = %ticket.id, reply = %reply.id, "reply posted");
        Ok(reply)
    }

    /// Category terms ordered by name
    pub fn categories(&self) -> Result<Vec<Term>> {
        self.store.terms(CATEGORY_TAXONOMY)
    }

    pub fn user(&self, id: UserId) -> Result<Option<User>> {
        self.store.load_user(id)
    }

    /// Users tickets can be assigned to
    pub fn assignable_agents(&self) -> Result<Vec<User>> {
        Ok(self
            .store
            .all_users()?
            .into_iter()
            .filter(is_assignable)
            .collect())
    }

    fn apply_meta(
        &self,
        caller: &Caller,
        ticket: Option<&Ticket>,
        meta: &mut TicketMeta,
        input: &Map<String, Value>,
    ) -> Result<()> {
        if input.is_empty() {
            return Ok(());
        }
        for key in input.keys() {
            ensure(caller, Action::EditMeta { ticket, key: key.as_str() })?;
        }
        let mut next = *meta;
        next.apply_input(self.model.meta_fields(TICKET_POST_TYPE), input)?;
        if next.assigned_agent != meta.assigned_agent {
            self.check_agent(next.assigned_agent)?;
        }
        *meta = next;
        Ok(())
    }

    pub(crate) fn check_agent(&self, agent: Option<UserId>) -> Result<()> {
        let Some(id) = agent else {
            return Ok(());
        };
        match self.store.load_user(id)? {
            Some(user) if is_assignable(&user) => Ok(()),
            _ => Err(TickeficError::invalid_param(
                AGENT_KEY,
                format!("user {id} is not a support agent"),
            )),
        }
    }

    fn check_categories(&self, categories: &[TermId]) -> Result<()> {
        for id in categories {
            let known = self
                .store
                .load_term(*id)?
                .is_some_and(|t| t.taxonomy == CATEGORY_TAXONOMY);
            if !known {
                return Err(TickeficError::InvalidTerm(id.get()));
            }
        }
        Ok(())
    }
}

fn is_assignable(user: &User) -> bool {
    user.has_role(AGENT) || user.has_role(ADMINISTRATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SUBSCRIBER;
    use crate::core::{Priority, Status};
    use crate::test_utils::TestSite;
    use serde_json::json;

    fn meta(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn published(title: &str) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            content: "details".to_string(),
            post_status: Some(PostStatus::Publish),
            ..NewTicket::default()
        }
    }

    #[test]
    fn test_subscriber_creates_ticket_with_all_meta() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let agent = site.user("smith", AGENT);

        let ticket = site
            .service
            .create_ticket(
                &alice,
                NewTicket {
                    meta: meta(json!({
                        "tickefic_priority": "high",
                        "tickefic_status": "in_progress",
                        "tickefic_assigned_agent": agent.id.get(),
                    })),
                    ..published("Cannot print")
                },
            )
            .unwrap();

        assert_eq!(ticket.meta.priority, Priority::High);
        assert_eq!(ticket.meta.status, Status::InProgress);
        assert_eq!(ticket.meta.assigned_agent, Some(agent.id));
        assert_eq!(ticket.author, alice.user_id().unwrap());
        assert!(ticket.is_published());
    }

    #[test]
    fn test_defaults_applied_when_meta_absent() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let ticket = site.service.create_ticket(&alice, published("Hello")).unwrap();
        assert_eq!(ticket.meta, TicketMeta::default());
    }

    #[test]
    fn test_create_requires_login() {
        let site = TestSite::new();
        assert!(matches!(
            site.service.create_ticket(&Caller::Anonymous, published("x")),
            Err(TickeficError::NotLoggedIn)
        ));
    }

    #[test]
    fn test_create_rejects_bad_meta_and_unknown_agent() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let bob = site.user("bob", SUBSCRIBER);

        for bad in [
            json!({"tickefic_status": "done"}),
            json!({"tickefic_priority": 3}),
            json!({"tickefic_assigned_agent": bob.id.get()}),
            json!({"tickefic_assigned_agent": 999}),
        ] {
            let result = site.service.create_ticket(
                &alice,
                NewTicket { meta: meta(bad), ..published("bad") },
            );
            assert!(matches!(result, Err(TickeficError::InvalidParam { .. })));
        }
        assert_eq!(site.store.count_tickets(|_| true).unwrap(), 0);
    }

    #[test]
    fn test_create_rejects_unknown_category() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let result = site.service.create_ticket(
            &alice,
            NewTicket { categories: vec![TermId(37)], ..published("x") },
        );
        assert!(matches!(result, Err(TickeficError::InvalidTerm(37))));
    }

    #[test]
    fn test_empty_ticket_rejected() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let result = site.service.create_ticket(
            &alice,
            NewTicket { title: " ".into(), content: String::new(), ..NewTicket::default() },
        );
        assert!(matches!(result, Err(TickeficError::InvalidParam { .. })));
    }

    #[test]
    fn test_unprivileged_listing_is_scoped() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let bob = site.caller("bob", SUBSCRIBER);
        site.service.create_ticket(&alice, published("alice 1")).unwrap();
        site.service.create_ticket(&bob, published("bob 1")).unwrap();

        let page = site.service.list_tickets(&alice, &ListParams::default()).unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.iter().all(|t| t.author == alice.user_id().unwrap()));

        let anonymous = site.service.list_tickets(&Caller::Anonymous, &ListParams::default()).unwrap();
        assert!(anonymous.items.is_empty());

        let admin = site.caller("root", ADMINISTRATOR);
        assert_eq!(site.service.list_tickets(&admin, &ListParams::default()).unwrap().total, 2);
    }

    #[test]
    fn test_status_filter_returns_only_closed() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        for status in ["open", "closed", "in_progress", "closed"] {
            site.service
                .create_ticket(
                    &alice,
                    NewTicket { meta: meta(json!({"tickefic_status": status})), ..published(status) },
                )
                .unwrap();
        }
        let params = ListParams { tickefic_status: Some("closed".into()), ..ListParams::default() };
        let page = site.service.list_tickets(&alice, &params).unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|t| t.meta.status == Status::Closed));
    }

    #[test]
    fn test_page_past_end() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let empty_first_page = site.service.list_tickets(&alice, &ListParams::default()).unwrap();
        assert_eq!(empty_first_page.total_pages, 0);

        let params = ListParams { page: Some(2), ..ListParams::default() };
        assert!(matches!(
            site.service.list_tickets(&alice, &params),
            Err(TickeficError::PageOutOfRange { page: 2 })
        ));
    }

    #[test]
    fn test_subscriber_cannot_update_published_ticket() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let ticket = site.service.create_ticket(&alice, published("mine")).unwrap();
        let update = TicketUpdate { meta: meta(json!({"tickefic_status": "closed"})), ..TicketUpdate::default() };
        assert!(matches!(
            site.service.update_ticket(&alice, ticket.id, update),
            Err(TickeficError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_agent_updates_ticket() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let agent = site.caller("smith", AGENT);
        let ticket = site.service.create_ticket(&alice, published("help")).unwrap();

        let updated = site
            .service
            .update_ticket(
                &agent,
                ticket.id,
                TicketUpdate {
                    title: Some("help!".into()),
                    meta: meta(json!({
                        "tickefic_status": "closed",
                        "tickefic_assigned_agent": agent.user_id().unwrap().get(),
                    })),
                    ..TicketUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "help!");
        assert_eq!(updated.meta.status, Status::Closed);
        assert_eq!(updated.meta.priority, Priority::Normal);
        assert_eq!(site.store.load_ticket(ticket.id).unwrap().meta.status, Status::Closed);
    }

    #[test]
    fn test_replies_thread_and_permissions() {
        let site = TestSite::new();
        let alice = site.caller("alice", SUBSCRIBER);
        let bob = site.caller("bob", SUBSCRIBER);
        let agent = site.caller("smith", AGENT);
        let ticket = site.service.create_ticket(&alice, published("thread")).unwrap();

        site.service
            .post_reply(&alice, NewReply { ticket_id: ticket.id, content: "first".into() })
            .unwrap();
        let answer = site
            .service
            .post_reply(&agent, NewReply { ticket_id: ticket.id, content: "second".into() })
            .unwrap();
        assert_eq!(answer.author_name, "Smith");

        let replies = site.service.list_replies(&alice, ticket.id, SortOrder::Asc).unwrap();
        let bodies: Vec<_> = replies.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);

        assert!(site.service.list_replies(&bob, ticket.id, SortOrder::Asc).is_err());
        assert!(matches!(
            site.service.post_reply(
                &Caller::Anonymous,
                NewReply { ticket_id: ticket.id, content: "x".into() }
            ),
            Err(TickeficError::NotLoggedIn)
        ));
        assert!(site
            .service
            .post_reply(&alice, NewReply { ticket_id: ticket.id, content: "  ".into() })
            .is_err());
    }

    #[test]
    fn test_assignable_agents() {
        let site = TestSite::new();
        site.user("alice", SUBSCRIBER);
        site.user("smith", AGENT);
        site.user("root", ADMINISTRATOR);
        let logins: Vec<_> = site
            .service
            .assignable_agents()
            .unwrap()
            .into_iter()
            .map(|u| u.login)
            .collect();
        assert_eq!(logins, vec!["smith", "root"]);
    }
}
