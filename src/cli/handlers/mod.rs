//! Command handlers
//!
//! Each handler opens the configured data file itself. Writes go through
//! the store's lock file, and a server running against the same file
//! reloads it on its next read.

mod activate;
mod serve;
mod tickets;
mod user;

pub use activate::handle_activate;
pub use serve::handle_serve;
pub use tickets::{EditArgs, handle_tickets_edit, handle_tickets_list};
pub use user::{NewUserArgs, handle_user_add, handle_user_list};

use crate::activation;
use crate::auth::{Caller, Principal};
use crate::config::Settings;
use crate::error::{Result, TickeficError};
use crate::service::TicketService;
use crate::storage::{ContentStore, UserRepository};
use std::sync::Arc;

/// Common context for handlers that work on the data file
pub struct HandlerContext {
    pub store: Arc<ContentStore>,
    pub service: TicketService,
}

impl HandlerContext {
    pub fn open(settings: &Settings) -> Result<Self> {
        let store = Arc::new(ContentStore::open_optional(settings.storage.data_file.clone())?);
        let model = activation::init(&store)?;
        let service = TicketService::new(Arc::clone(&store), Arc::new(model));
        Ok(Self { store, service })
    }

    /// The account named by `login`, acting with its current roles
    pub fn caller(&self, login: &str) -> Result<Caller> {
        let user = self
            .store
            .find_user(login)?
            .ok_or_else(|| TickeficError::UserNotFound { login: login.to_string() })?;
        let roles = self.store.roles()?;
        Ok(Caller::User(Principal::from_user(&user, &roles)))
    }
}
