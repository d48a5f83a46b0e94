//! Core domain types for tickefic
//!
//! Tickets, replies, users, category terms and the content model that
//! declares how tickets are stored and exposed.

pub mod builders;
pub mod ids;
pub mod meta;
pub mod page;
pub mod registry;
pub mod reply;
pub mod taxonomy;
pub mod ticket;
pub mod user;

pub use builders::{ReplyBuilder, TicketBuilder};
pub use ids::{PageId, ReplyId, TermId, TicketId, UserId};
pub use meta::{MetaField, MetaKind, AGENT_KEY, META_PREFIX, PRIORITY_KEY, STATUS_KEY};
pub use page::Page;
pub use registry::{
    register_ticket_model, ContentModel, PostTypeSpec, Support, TaxonomySpec, CATEGORY_TAXONOMY,
    TICKET_POST_TYPE,
};
pub use reply::Reply;
pub use taxonomy::Term;
pub use ticket::{PostStatus, Priority, Status, Ticket, TicketMeta};
pub use user::User;
