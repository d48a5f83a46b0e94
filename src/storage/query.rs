//! Ticket query arguments
//!
//! A [`TicketQuery`] is the data-access form of a listing request: who the
//! results may be authored by, which meta equality clauses apply, and which
//! page to return. Callers build it through `service::query`, which applies
//! visibility scoping.

use crate::core::{Ticket, UserId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// Restriction on ticket authorship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorScope {
    #[default]
    Any,
    Only(UserId),
    /// Matches no ticket; used for anonymous callers
    Nobody,
}

impl AuthorScope {
    fn admits(self, author: UserId) -> bool {
        match self {
            Self::Any => true,
            Self::Only(id) => id == author,
            Self::Nobody => false,
        }
    }
}

/// Exact string match on a meta value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaClause {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketQuery {
    pub author: AuthorScope,
    pub meta: Vec<MetaClause>,
    /// User whose unpublished tickets are also visible
    pub viewer: Option<UserId>,
    /// Unpublished tickets of every author are visible
    pub viewer_sees_all: bool,
    pub order: SortOrder,
    pub page: u32,
    pub per_page: u32,
}

impl Default for TicketQuery {
    fn default() -> Self {
        Self {
            author: AuthorScope::Any,
            meta: Vec::new(),
            viewer: None,
            viewer_sees_all: false,
            order: SortOrder::Desc,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl TicketQuery {
    /// Whether `ticket` belongs in the result set, ignoring pagination
    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if !self.author.admits(ticket.author) {
            return false;
        }
        if !ticket.is_published() && !self.viewer_sees_all && self.viewer != Some(ticket.author) {
            return false;
        }
        self.meta.iter().all(|clause| {
            ticket
                .meta
                .to_rest()
                .get(&clause.key)
                .is_some_and(|value| match value {
                    serde_json::Value::String(s) => *s == clause.value,
                    other => other.to_string() == clause.value,
                })
        })
    }

    /// Zero-based offset of the first result on the requested page
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.per_page as usize
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketPage {
    pub items: Vec<Ticket>,
    pub total: usize,
    pub total_pages: u32,
}

impl TicketPage {
    /// Sort, count and slice `matching` according to `query`
    #[must_use]
    pub fn paginate(mut matching: Vec<Ticket>, query: &TicketQuery) -> Self {
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if query.order == SortOrder::Desc {
            matching.reverse();
        }
        let total = matching.len();
        let per_page = query.per_page.max(1) as usize;
        let total_pages = u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX);
        let items = matching
            .into_iter()
            .skip(query.offset())
            .take(per_page)
            .collect();
        Self {
            items,
            total,
            total_pages,
        }
    }
}
