//! Dashboard view state
//!
//! Pure state transitions, no I/O. Each fetch is started with
//! [`DashboardState::begin`], which hands out a [`FetchToken`] for its key;
//! starting another fetch for the same key makes older tokens stale, and a
//! completion carrying a stale token is dropped. A current completion always
//! clears the loading flag, whether it succeeded or not.

use super::client::{ClientError, TicketList};
use crate::api::schema::{ListQuery, ReplyJson, StatusUser, TicketJson, UserStatus};
use crate::storage::DEFAULT_PER_PAGE;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the first user-status answer
    Checking,
    /// Show the login form
    Anonymous,
    Authenticated(StatusUser),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Open,
    Closed,
}

impl Tab {
    /// `tickefic_status` value the tab filters on
    #[must_use]
    pub const fn status(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// What a fetch is for; each key has its own generation counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKey {
    Session,
    Tickets,
    Replies(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchToken {
    pub key: FetchKey,
    generation: u64,
}

/// Replies of one expanded ticket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thread {
    pub replies: Vec<ReplyJson>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Thread {
    /// Insert keeping replies in time order
    fn insert(&mut self, reply: ReplyJson) {
        let at = self
            .replies
            .partition_point(|r| (r.date, r.id) <= (reply.date, reply.id));
        self.replies.insert(at, reply);
    }
}

/// What the caller must do after a ticket was created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateEffect {
    /// Shown at the top of the current list
    Prepended,
    /// Moved to page 1 of the open tab; the list must be fetched
    Refetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    pub phase: Phase,
    pub session_loading: bool,
    pub login_pending: bool,
    pub login_error: Option<String>,

    pub tab: Tab,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub tickets: Vec<TicketJson>,
    pub tickets_loading: bool,
    pub list_error: Option<String>,

    pub creating: bool,
    pub create_error: Option<String>,

    pub expanded: Option<u64>,
    pub threads: BTreeMap<u64, Thread>,
    pub replying: bool,
    pub reply_error: Option<String>,

    generations: HashMap<FetchKey, u64>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl DashboardState {
    #[must_use]
    pub fn new(per_page: u32) -> Self {
        Self {
            phase: Phase::Checking,
            session_loading: false,
            login_pending: false,
            login_error: None,
            tab: Tab::Open,
            page: 1,
            per_page,
            total_pages: 0,
            tickets: Vec::new(),
            tickets_loading: false,
            list_error: None,
            creating: false,
            create_error: None,
            expanded: None,
            threads: BTreeMap::new(),
            replying: false,
            reply_error: None,
            generations: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.phase, Phase::Authenticated(_))
    }

    /// Start a fetch for `key`, superseding any in flight
    pub fn begin(&mut self, key: FetchKey) -> FetchToken {
        let generation = {
            let counter = self.generations.entry(key).or_insert(0);
            *counter += 1;
            *counter
        };
        match key {
            FetchKey::Session => self.session_loading = true,
            FetchKey::Tickets => {
                self.tickets_loading = true;
                self.list_error = None;
            },
            FetchKey::Replies(ticket) => {
                let thread = self.threads.entry(ticket).or_default();
                thread.loading = true;
                thread.error = None;
            },
        }
        FetchToken { key, generation }
    }

    #[must_use]
    pub fn is_current(&self, token: FetchToken) -> bool {
        self.generations.get(&token.key) == Some(&token.generation)
    }

    /// Apply a user-status answer; returns whether it was current
    pub fn finish_session(&mut self, token: FetchToken, result: Result<UserStatus, ClientError>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.session_loading = false;
        self.phase = match result {
            Ok(status) if status.logged_in => Phase::Authenticated(status.user),
            // A failed check shows the login form
            _ => Phase::Anonymous,
        };
        true
    }

    /// Query for the current tab and page
    #[must_use]
    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            page: Some(self.page),
            per_page: Some(self.per_page),
            order: None,
            tickefic_status: Some(self.tab.status().to_string()),
            embed: Some(String::new()),
        }
    }

    pub fn finish_tickets(&mut self, token: FetchToken, result: Result<TicketList, ClientError>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.tickets_loading = false;
        match result {
            Ok(list) => {
                self.tickets = list.tickets;
                self.total_pages = list.total_pages;
            },
            Err(err) => self.list_error = Some(err.to_string()),
        }
        true
    }

    pub fn finish_replies(&mut self, token: FetchToken, result: Result<Vec<ReplyJson>, ClientError>) -> bool {
        let FetchKey::Replies(ticket) = token.key else {
            return false;
        };
        if !self.is_current(token) {
            return false;
        }
        let thread = self.threads.entry(ticket).or_default();
        thread.loading = false;
        match result {
            Ok(replies) => {
                thread.replies.clear();
                for reply in replies {
                    thread.insert(reply);
                }
            },
            Err(err) => thread.error = Some(err.to_string()),
        }
        true
    }

    /// Switch tabs; returns whether the list must be fetched
    pub fn select_tab(&mut self, tab: Tab) -> bool {
        if self.tab == tab && self.page == 1 {
            return false;
        }
        self.tab = tab;
        self.page = 1;
        true
    }

    /// Go to `page`; returns whether the list must be fetched
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if self.page == page {
            return false;
        }
        self.page = page;
        true
    }

    /// Expand or collapse a ticket; returns whether its replies must be fetched
    pub fn toggle_ticket(&mut self, ticket: u64) -> bool {
        if self.expanded == Some(ticket) {
            self.expanded = None;
            return false;
        }
        self.expanded = Some(ticket);
        self.threads.insert(ticket, Thread::default());
        true
    }

    pub fn ticket_created(&mut self, ticket: TicketJson) -> CreateEffect {
        if self.tab == Tab::Open && self.page == 1 {
            self.tickets.insert(0, ticket);
            return CreateEffect::Prepended;
        }
        self.tab = Tab::Open;
        self.page = 1;
        CreateEffect::Refetch
    }

    /// Add a posted reply to its ticket's thread, other threads untouched
    pub fn reply_posted(&mut self, reply: ReplyJson) {
        self.threads.entry(reply.post).or_default().insert(reply);
    }

    #[must_use]
    pub fn thread(&self, ticket: u64) -> Option<&Thread> {
        self.threads.get(&ticket)
    }

    #[must_use]
    pub fn ticket(&self, id: u64) -> Option<&TicketJson> {
        self.tickets.iter().find(|t| t.id == id)
    }
}

/// Whether `reply` was written by the ticket's own author
#[must_use]
pub fn is_owner_reply(ticket: &TicketJson, reply: &ReplyJson) -> bool {
    reply.author == ticket.author
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::schema::{Rendered, TicketMetaJson};
    use crate::core::{PostStatus, Priority, Status};
    use chrono::NaiveDate;

    fn at(minute: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(10, minute, 0).unwrap()
    }

    fn ticket(id: u64, author: u64) -> TicketJson {
        TicketJson {
            id,
            date: at(0),
            author,
            status: PostStatus::Publish,
            kind: "tickefic_ticket".to_string(),
            title: Rendered { rendered: format!("Ticket {id}") },
            content: Rendered { rendered: String::new() },
            meta: TicketMetaJson {
                tickefic_priority: Priority::Normal,
                tickefic_status: Status::Open,
                tickefic_assigned_agent: 0,
            },
            tickefic_cat: Vec::new(),
            embedded: None,
        }
    }

    fn reply(id: u64, post: u64, author: u64, minute: u32) -> ReplyJson {
        ReplyJson {
            id,
            post,
            author,
            author_name: format!("User {author}"),
            date: at(minute),
            content: Rendered { rendered: String::new() },
        }
    }

    fn list(tickets: Vec<TicketJson>, total_pages: u32) -> TicketList {
        TicketList {
            total: tickets.len(),
            tickets,
            total_pages,
        }
    }

    #[test]
    fn test_stale_ticket_response_is_discarded() {
        let mut state = DashboardState::default();
        let first = state.begin(FetchKey::Tickets);
        let second = state.begin(FetchKey::Tickets);

        assert!(state.finish_tickets(second, Ok(list(vec![ticket(2, 1)], 1))));
        assert!(!state.tickets_loading);
        assert!(!state.finish_tickets(first, Ok(list(vec![ticket(1, 1)], 1))));
        assert_eq!(state.tickets[0].id, 2);
    }

    #[test]
    fn test_generations_are_per_key() {
        let mut state = DashboardState::default();
        let replies = state.begin(FetchKey::Replies(5));
        let _tickets = state.begin(FetchKey::Tickets);
        let _other = state.begin(FetchKey::Replies(6));
        assert!(state.is_current(replies));
    }

    #[test]
    fn test_failure_clears_loading() {
        let mut state = DashboardState::default();
        let token = state.begin(FetchKey::Tickets);
        assert!(state.tickets_loading);
        state.finish_tickets(token, Err(ClientError::Transport("offline".to_string())));
        assert!(!state.tickets_loading);
        assert!(state.list_error.as_deref().unwrap().contains("offline"));

        let token = state.begin(FetchKey::Session);
        state.finish_session(token, Err(ClientError::Transport("offline".to_string())));
        assert!(!state.session_loading);
        assert_eq!(state.phase, Phase::Anonymous);
    }

    #[test]
    fn test_switching_tab_resets_page() {
        let mut state = DashboardState::default();
        assert!(state.set_page(3));
        assert!(state.select_tab(Tab::Closed));
        assert_eq!(state.page, 1);
        assert_eq!(state.list_query().tickefic_status.as_deref(), Some("closed"));
        assert!(!state.select_tab(Tab::Closed));
    }

    #[test]
    fn test_create_on_first_open_page_prepends() {
        let mut state = DashboardState::default();
        state.tickets = vec![ticket(1, 1)];
        assert_eq!(state.ticket_created(ticket(2, 1)), CreateEffect::Prepended);
        assert_eq!(state.tickets.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_create_elsewhere_resets_to_open_page_one() {
        let mut state = DashboardState::default();
        state.set_page(2);
        assert_eq!(state.ticket_created(ticket(9, 1)), CreateEffect::Refetch);
        assert_eq!((state.tab, state.page), (Tab::Open, 1));

        let mut state = DashboardState::default();
        state.select_tab(Tab::Closed);
        assert_eq!(state.ticket_created(ticket(9, 1)), CreateEffect::Refetch);
        assert_eq!(state.tab, Tab::Open);
    }

    #[test]
    fn test_toggle_expands_and_collapses() {
        let mut state = DashboardState::default();
        assert!(state.toggle_ticket(4));
        assert_eq!(state.expanded, Some(4));
        assert!(!state.toggle_ticket(4));
        assert_eq!(state.expanded, None);
        assert!(state.toggle_ticket(4));
        assert!(state.toggle_ticket(7));
        assert_eq!(state.expanded, Some(7));
    }

    #[test]
    fn test_reply_lands_in_its_thread_in_order() {
        let mut state = DashboardState::default();
        let token = state.begin(FetchKey::Replies(1));
        state.finish_replies(token, Ok(vec![reply(10, 1, 2, 5), reply(11, 1, 3, 1)]));
        state.reply_posted(reply(12, 1, 2, 3));
        state.reply_posted(reply(13, 2, 2, 0));

        let ids: Vec<u64> = state.thread(1).unwrap().replies.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![11, 12, 10]);
        assert_eq!(state.thread(2).unwrap().replies.len(), 1);
    }

    #[test]
    fn test_owner_reply_rule() {
        let t = ticket(1, 2);
        assert!(is_owner_reply(&t, &reply(1, 1, 2, 0)));
        assert!(!is_owner_reply(&t, &reply(2, 1, 5, 0)));
    }
}
