//! Storage layer
//!
//! [`ContentStore`] stands in for the host's content, user, comment and
//! taxonomy tables. Access goes through the repository traits so services
//! never touch the snapshot directly.

pub mod query;
pub mod repository;
pub mod store;

pub use query::{AuthorScope, DEFAULT_PER_PAGE, MAX_PER_PAGE, MetaClause, SortOrder, TicketPage, TicketQuery};
pub use repository::{
    PageRepository, ReplyRepository, Repository, TermRepository, TicketRepository, UserRepository,
};
pub use store::{ContentStore, Counters, Snapshot};
