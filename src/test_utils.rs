//! Test fixtures shared by the unit tests
//!
//! [`TestSite`] is an activated in-memory site: the three default categories
//! exist with ids 1 to 3 and the agent role is registered.

#![cfg(test)]

use crate::activation;
use crate::auth::password::hash_password;
use crate::auth::{Caller, Principal, RoleRegistry, add_agent_role, grant_subscriber_capabilities};
use crate::core::{User, UserId};
use crate::service::TicketService;
use crate::storage::{ContentStore, UserRepository};
use chrono::Utc;
use std::sync::Arc;

pub const TEST_PASSWORD: &str = "password";

/// An unsaved user whose password is [`TEST_PASSWORD`]
pub fn test_user(login: &str, role: &str) -> User {
    let mut display_name = String::new();
    let mut chars = login.chars();
    if let Some(first) = chars.next() {
        display_name.extend(first.to_uppercase());
        display_name.push_str(chars.as_str());
    }
    User {
        id: UserId(0),
        login: login.to_string(),
        email: format!("{login}@example.com"),
        display_name,
        password_hash: hash_password(TEST_PASSWORD).expect("hash test password"),
        roles: vec![role.to_string()],
        registered_at: Utc::now(),
    }
}

/// Roles as they stand after activation
pub fn activated_roles() -> RoleRegistry {
    let mut roles = RoleRegistry::with_builtin_roles();
    grant_subscriber_capabilities(&mut roles);
    add_agent_role(&mut roles);
    roles
}

/// A caller with `role` that exists only in memory
pub fn caller_with_role(id: u64, role: &str) -> Caller {
    let mut user = test_user(&format!("user{id}"), role);
    user.id = UserId(id);
    Caller::User(Principal::from_user(&user, &activated_roles()))
}

pub struct TestSite {
    pub store: Arc<ContentStore>,
    pub service: TicketService,
}

impl TestSite {
    pub fn new() -> Self {
        let store = Arc::new(ContentStore::in_memory());
        let model = activation::init(&store).expect("init");
        activation::activate(&store).expect("activate");
        let service = TicketService::new(Arc::clone(&store), Arc::new(model));
        Self { store, service }
    }

    /// Save a new user
    pub fn user(&self, login: &str, role: &str) -> User {
        self.store.insert_user(test_user(login, role)).expect("insert user")
    }

    /// Save a new user and return them as a caller
    pub fn caller(&self, login: &str, role: &str) -> Caller {
        let user = self.user(login, role);
        let roles = self.store.roles().expect("roles");
        Caller::User(Principal::from_user(&user, &roles))
    }
}
