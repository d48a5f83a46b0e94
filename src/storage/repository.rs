use super::query::{SortOrder, TicketPage, TicketQuery};
use super::store::ContentStore;
use crate::auth::RoleRegistry;
use crate::core::{Page, Reply, Term, TermId, Ticket, TicketId, User, UserId, taxonomy::slugify};
use crate::error::{Result, TickeficError};

/// Repository trait for ticket storage operations
///
/// Tickets are never deleted; updates replace the stored record.
pub trait TicketRepository: Send + Sync {
    /// Stores a new ticket, assigning its id
    fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket>;

    /// Loads a ticket by ID
    fn load_ticket(&self, id: TicketId) -> Result<Ticket>;

    /// Replaces an existing ticket
    fn save_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Runs a listing query
    fn query_tickets(&self, query: &TicketQuery) -> Result<TicketPage>;

    /// Finds tickets matching a predicate
    fn find_tickets<F>(&self, predicate: F) -> Result<Vec<Ticket>>
    where
        F: Fn(&Ticket) -> bool;

    /// Counts tickets matching a predicate
    fn count_tickets<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&Ticket) -> bool;
}

/// Repository trait for replies
pub trait ReplyRepository: Send + Sync {
    /// Stores a reply; the ticket it references must exist
    fn insert_reply(&self, reply: Reply) -> Result<Reply>;

    /// Replies on a ticket ordered by creation time
    fn replies_for(&self, ticket: TicketId, order: SortOrder) -> Result<Vec<Reply>>;
}

/// Repository trait for user accounts and roles
pub trait UserRepository: Send + Sync {
    /// Stores a new user; login and email must be unused
    fn insert_user(&self, user: User) -> Result<User>;

    fn load_user(&self, id: UserId) -> Result<Option<User>>;

    /// Finds a user by login name or email address
    fn find_user(&self, login_or_email: &str) -> Result<Option<User>>;

    fn all_users(&self) -> Result<Vec<User>>;

    fn roles(&self) -> Result<RoleRegistry>;

    /// Mutates the role registry in place
    fn update_roles<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut RoleRegistry) -> T;
}

/// Repository trait for taxonomy terms
pub trait TermRepository: Send + Sync {
    /// Creates a term with a slug derived from its name
    fn insert_term(&self, taxonomy: &str, name: &str, parent: Option<TermId>) -> Result<Term>;

    fn load_term(&self, id: TermId) -> Result<Option<Term>>;

    fn find_term(&self, taxonomy: &str, name: &str) -> Result<Option<Term>>;

    /// All terms of a taxonomy ordered by name
    fn terms(&self, taxonomy: &str) -> Result<Vec<Term>>;
}

/// Repository trait for pages
pub trait PageRepository: Send + Sync {
    fn insert_page(&self, title: &str, slug: &str, content: &str) -> Result<Page>;

    fn page_by_title(&self, title: &str) -> Result<Option<Page>>;

    fn page_by_slug(&self, slug: &str) -> Result<Option<Page>>;
}

/// Combined repository trait
pub trait Repository:
    TicketRepository + ReplyRepository + UserRepository + TermRepository + PageRepository
{
}

/// Implementation of Repository for types that implement every part
impl<T> Repository for T where
    T: TicketRepository + ReplyRepository + UserRepository + TermRepository + PageRepository
{
}

impl TicketRepository for ContentStore {
    fn insert_ticket(&self, mut ticket: Ticket) -> Result<Ticket> {
        self.write(|s| {
            ticket.id = s.counters.next_ticket();
            s.tickets.insert(ticket.id, ticket.clone());
            Ok(ticket)
        })
    }

    fn load_ticket(&self, id: TicketId) -> Result<Ticket> {
        self.read(|s| s.tickets.get(&id).cloned())?
            .ok_or(TickeficError::TicketNotFound { id: id.get() })
    }

    fn save_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.write(|s| {
            let slot = s
                .tickets
                .get_mut(&ticket.id)
                .ok_or(TickeficError::TicketNotFound { id: ticket.id.get() })?;
            *slot = ticket.clone();
            Ok(())
        })
    }

    fn query_tickets(&self, query: &TicketQuery) -> Result<TicketPage> {
        let matching = self.find_tickets(|t| query.matches(t))?;
        Ok(TicketPage::paginate(matching, query))
    }

    fn find_tickets<F>(&self, predicate: F) -> Result<Vec<Ticket>>
    where
        F: Fn(&Ticket) -> bool,
    {
        self.read(|s| s.tickets.values().filter(|t| predicate(t)).cloned().collect())
    }

    fn count_tickets<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&Ticket) -> bool,
    {
        self.read(|s| s.tickets.values().filter(|t| predicate(t)).count())
    }
}

impl ReplyRepository for ContentStore {
    fn insert_reply(&self, mut reply: Reply) -> Result<Reply> {
        self.write(|s| {
            if !s.tickets.contains_key(&reply.ticket_id) {
                return Err(TickeficError::TicketNotFound {
                    id: reply.ticket_id.get(),
                });
            }
            reply.id = s.counters.next_reply();
            s.replies.insert(reply.id, reply.clone());
            Ok(reply)
        })
    }

    fn replies_for(&self, ticket: TicketId, order: SortOrder) -> Result<Vec<Reply>> {
        let mut replies: Vec<Reply> = self.read(|s| {
            s.replies
                .values()
                .filter(|r| r.ticket_id == ticket)
                .cloned()
                .collect()
        })?;
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if order == SortOrder::Desc {
            replies.reverse();
        }
        Ok(replies)
    }
}

impl UserRepository for ContentStore {
    fn insert_user(&self, mut user: User) -> Result<User> {
        self.write(|s| {
            let taken = s
                .users
                .values()
                .any(|u| u.matches_login(&user.login) || u.matches_login(&user.email));
            if taken {
                return Err(TickeficError::UserExists { login: user.login.clone() });
            }
            user.id = s.counters.next_user();
            s.users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    fn load_user(&self, id: UserId) -> Result<Option<User>> {
        self.read(|s| s.users.get(&id).cloned())
    }

    fn find_user(&self, login_or_email: &str) -> Result<Option<User>> {
        self.read(|s| {
            s.users
                .values()
                .find(|u| u.matches_login(login_or_email))
                .cloned()
        })
    }

    fn all_users(&self) -> Result<Vec<User>> {
        self.read(|s| s.users.values().cloned().collect())
    }

    fn roles(&self) -> Result<RoleRegistry> {
        self.read(|s| s.roles.clone())
    }

    fn update_roles<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut RoleRegistry) -> T,
    {
        self.write(|s| Ok(f(&mut s.roles)))
    }
}

impl TermRepository for ContentStore {
    fn insert_term(&self, taxonomy: &str, name: &str, parent: Option<TermId>) -> Result<Term> {
        self.write(|s| {
            if let Some(parent) = parent {
                if !s.terms.get(&parent).is_some_and(|t| t.taxonomy == taxonomy) {
                    return Err(TickeficError::InvalidTerm(parent.get()));
                }
            }
            let term = Term {
                id: s.counters.next_term(),
                taxonomy: taxonomy.to_string(),
                name: name.to_string(),
                slug: slugify(name),
                parent,
            };
            s.terms.insert(term.id, term.clone());
            Ok(term)
        })
    }

    fn load_term(&self, id: TermId) -> Result<Option<Term>> {
        self.read(|s| s.terms.get(&id).cloned())
    }

    fn find_term(&self, taxonomy: &str, name: &str) -> Result<Option<Term>> {
        self.read(|s| {
            s.terms
                .values()
                .find(|t| t.taxonomy == taxonomy && t.name == name)
                .cloned()
        })
    }

    fn terms(&self, taxonomy: &str) -> Result<Vec<Term>> {
        let mut terms: Vec<Term> = self.read(|s| {
            s.terms
                .values()
                .filter(|t| t.taxonomy == taxonomy)
                .cloned()
                .collect()
        })?;
        terms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(terms)
    }
}

impl PageRepository for ContentStore {
    fn insert_page(&self, title: &str, slug: &str, content: &str) -> Result<Page> {
        self.write(|s| {
            let page = Page {
                id: s.counters.next_page(),
                title: title.to_string(),
                slug: slug.to_string(),
                content: content.to_string(),
            };
            s.pages.insert(page.id, page.clone());
            Ok(page)
        })
    }

    fn page_by_title(&self, title: &str) -> Result<Option<Page>> {
        self.read(|s| s.pages.values().find(|p| p.title == title).cloned())
    }

    fn page_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        self.read(|s| s.pages.values().find(|p| p.slug == slug).cloned())
    }
}
