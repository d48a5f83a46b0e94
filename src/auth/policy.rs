//! Authorization policy
//!
//! Every query and write asks [`authorize`] first, passing the request's
//! [`Caller`] and the [`Action`] it wants to perform.

use super::capabilities::{RoleRegistry, caps, meta_capability_granted};
use crate::core::{Ticket, User, UserId};
use crate::error::{Result, TickeficError};
use std::collections::BTreeSet;

/// An authenticated user as seen by one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub login: String,
    pub display_name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub capabilities: BTreeSet<String>,
}

impl Principal {
    /// Resolve `user`'s capabilities against the registered roles
    #[must_use]
    pub fn from_user(user: &User, roles: &RoleRegistry) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            capabilities: roles.capabilities_for(&user.roles),
        }
    }

    #[must_use]
    pub fn has_cap(&self, cap: &str) -> bool {
        self.capabilities.contains(cap)
    }
}

/// Who is making a request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Caller {
    #[default]
    Anonymous,
    User(Principal),
}

impl Caller {
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Anonymous => None,
            Self::User(p) => Some(p),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.principal().map(|p| p.id)
    }

    #[must_use]
    pub fn has_cap(&self, cap: &str) -> bool {
        self.principal().is_some_and(|p| p.has_cap(cap))
    }

    /// Callers who see every ticket rather than only their own
    #[must_use]
    pub fn can_view_all_tickets(&self) -> bool {
        self.has_cap(caps::MANAGE_OPTIONS) || self.has_cap(caps::EDIT_OTHERS_POSTS)
    }

    fn owns(&self, ticket: &Ticket) -> bool {
        self.user_id().is_some_and(|id| ticket.is_authored_by(id))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    ListTickets,
    ReadTicket(&'a Ticket),
    CreateTicket,
    PublishTicket,
    EditTicket(&'a Ticket),
    /// Write a meta key; `ticket` is `None` while the ticket is being created
    EditMeta {
        ticket: Option<&'a Ticket>,
        key: &'a str,
    },
    ListReplies(&'a Ticket),
    PostReply(&'a Ticket),
}

impl Action<'_> {
    /// Human-readable verb phrase used in error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ListTickets => "list tickets".to_string(),
            Self::ReadTicket(t) => format!("read ticket {}", t.id),
            Self::CreateTicket => "create tickets".to_string(),
            Self::PublishTicket => "publish tickets".to_string(),
            Self::EditTicket(t) => format!("edit ticket {}", t.id),
            Self::EditMeta { key, .. } => format!("edit the {key} custom field"),
            Self::ListReplies(t) => format!("read replies on ticket {}", t.id),
            Self::PostReply(t) => format!("reply to ticket {}", t.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    NotLoggedIn,
    MissingCapability(&'static str),
    NotOwner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    fn require(cond: bool, denial: Denial) -> Self {
        if cond { Self::Allow } else { Self::Deny(denial) }
    }
}

/// Decide whether `caller` may perform `action`
#[must_use]
pub fn authorize(caller: &Caller, action: Action<'_>) -> Decision {
    // Listing is always allowed; scoping restricts what comes back
    if matches!(action, Action::ListTickets) {
        return Decision::Allow;
    }
    if !caller.is_authenticated() {
        return Decision::Deny(Denial::NotLoggedIn);
    }

    match action {
        Action::ListTickets => Decision::Allow,
        Action::ReadTicket(ticket) | Action::ListReplies(ticket) | Action::PostReply(ticket) => {
            Decision::require(caller.owns(ticket) || caller.can_view_all_tickets(), Denial::NotOwner)
        },
        // Any logged-in caller may open a ticket
        Action::CreateTicket => Decision::Allow,
        Action::PublishTicket => Decision::require(
            caller.has_cap(caps::PUBLISH_POSTS) || caller.has_cap(caps::PUBLISH_TICKETS),
            Denial::MissingCapability(caps::PUBLISH_POSTS),
        ),
        Action::EditTicket(ticket) => edit_ticket(caller, ticket),
        Action::EditMeta { ticket, key } => {
            if meta_capability_granted(true, caps::EDIT_POST_META, key) {
                return Decision::Allow;
            }
            match ticket {
                Some(ticket) => edit_ticket(caller, ticket),
                None => Decision::require(
                    caller.has_cap(caps::EDIT_POSTS),
                    Denial::MissingCapability(caps::EDIT_POSTS),
                ),
            }
        },
    }
}

fn edit_ticket(caller: &Caller, ticket: &Ticket) -> Decision {
    if !caller.owns(ticket) && !caller.has_cap(caps::EDIT_OTHERS_POSTS) {
        return Decision::Deny(Denial::MissingCapability(caps::EDIT_OTHERS_POSTS));
    }
    if !caller.has_cap(caps::EDIT_POSTS) {
        return Decision::Deny(Denial::MissingCapability(caps::EDIT_POSTS));
    }
    if ticket.is_published() && !caller.has_cap(caps::EDIT_PUBLISHED_POSTS) {
        return Decision::Deny(Denial::MissingCapability(caps::EDIT_PUBLISHED_POSTS));
    }
    Decision::Allow
}

/// [`authorize`] as a `Result`, for use with `?`
pub fn ensure(caller: &Caller, action: Action<'_>) -> Result<()> {
    match authorize(caller, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(Denial::NotLoggedIn) => Err(TickeficError::NotLoggedIn),
        Decision::Deny(_) => Err(TickeficError::forbidden(action.describe())),
    }
}
