//! Roles and capabilities
//!
//! A trimmed-down version of the host role model: each role is a named set
//! of capability strings, and a user's capabilities are the union over their
//! roles. Two adjustments are layered on top for tickets:
//!
//! - the `subscriber` role is granted enough posting rights to open tickets
//!   ([`grant_subscriber_capabilities`]);
//! - editing any `tickefic_` meta key is granted to every authenticated user
//!   ([`meta_capability_granted`]).

use crate::core::META_PREFIX;
use crate::error::{Result, TickeficError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Capability names
pub mod caps {
    pub const READ: &str = "read";
    pub const EDIT_POSTS: &str = "edit_posts";
    pub const EDIT_OTHERS_POSTS: &str = "edit_others_posts";
    pub const EDIT_PUBLISHED_POSTS: &str = "edit_published_posts";
    pub const PUBLISH_POSTS: &str = "publish_posts";
    pub const DELETE_POSTS: &str = "delete_posts";
    pub const MANAGE_OPTIONS: &str = "manage_options";
    pub const MODERATE_COMMENTS: &str = "moderate_comments";
    pub const LIST_USERS: &str = "list_users";
    pub const EDIT_TICKET: &str = "edit_tickefic_ticket";
    pub const PUBLISH_TICKETS: &str = "publish_tickefic_tickets";
    /// Meta capability checked per key on meta writes
    pub const EDIT_POST_META: &str = "edit_post_meta";
}

pub const ADMINISTRATOR: &str = "administrator";
pub const SUBSCRIBER: &str = "subscriber";
pub const AGENT: &str = "agent";

/// Capabilities granted to subscribers so they can open tickets
pub const SUBSCRIBER_TICKET_CAPS: [&str; 4] = [
    caps::EDIT_POSTS,
    caps::PUBLISH_POSTS,
    caps::EDIT_TICKET,
    caps::PUBLISH_TICKETS,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub display_name: String,
    pub capabilities: BTreeSet<String>,
}

impl Role {
    #[must_use]
    pub fn has_cap(&self, cap: &str) -> bool {
        self.capabilities.contains(cap)
    }
}

/// Registered roles, persisted alongside the content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    roles: BTreeMap<String, Role>,
}

impl RoleRegistry {
    /// Registry holding the host's default administrator and subscriber roles
    #[must_use]
    pub fn with_builtin_roles() -> Self {
        let mut registry = Self::default();
        registry.add_role(
            ADMINISTRATOR,
            "Administrator",
            &[
                caps::READ,
                caps::EDIT_POSTS,
                caps::EDIT_OTHERS_POSTS,
                caps::EDIT_PUBLISHED_POSTS,
                caps::PUBLISH_POSTS,
                caps::DELETE_POSTS,
                caps::MANAGE_OPTIONS,
                caps::MODERATE_COMMENTS,
                caps::LIST_USERS,
                caps::EDIT_TICKET,
                caps::PUBLISH_TICKETS,
            ],
        );
        registry.add_role(SUBSCRIBER, "Subscriber", &[caps::READ]);
        registry
    }

    /// Add a role; an existing role with the same name is left untouched
    pub fn add_role(&mut self, name: &str, display_name: &str, capabilities: &[&str]) -> bool {
        if self.roles.contains_key(name) {
            return false;
        }
        self.roles.insert(
            name.to_string(),
            Role {
                name: name.to_string(),
                display_name: display_name.to_string(),
                capabilities: capabilities.iter().map(|c| (*c).to_string()).collect(),
            },
        );
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Grant `cap` to `role`; returns whether it was newly added
    pub fn add_cap(&mut self, role: &str, cap: &str) -> Result<bool> {
        let role = self
            .roles
            .get_mut(role)
            .ok_or_else(|| TickeficError::UnknownRole(role.to_string()))?;
        Ok(role.capabilities.insert(cap.to_string()))
    }

    /// Union of the capabilities of `roles`; unknown roles contribute nothing
    #[must_use]
    pub fn capabilities_for(&self, roles: &[String]) -> BTreeSet<String> {
        roles
            .iter()
            .filter_map(|r| self.roles.get(r))
            .flat_map(|r| r.capabilities.iter().cloned())
            .collect()
    }
}

/// Grant [`SUBSCRIBER_TICKET_CAPS`] to the subscriber role
///
/// Returns how many capabilities were newly added. A registry without a
/// subscriber role is left unchanged.
pub fn grant_subscriber_capabilities(roles: &mut RoleRegistry) -> usize {
    if !roles.contains(SUBSCRIBER) {
        return 0;
    }
    SUBSCRIBER_TICKET_CAPS
        .iter()
        .filter(|cap| roles.add_cap(SUBSCRIBER, cap).unwrap_or(false))
        .count()
}

/// Create the agent role if it does not exist
///
/// Agents can be assigned tickets and edit tickets beyond their own, but
/// cannot delete content or manage options.
pub fn add_agent_role(roles: &mut RoleRegistry) -> bool {
    roles.add_role(
        AGENT,
        "Agent",
        &[
            caps::READ,
            caps::EDIT_POSTS,
            caps::EDIT_OTHERS_POSTS,
            caps::EDIT_PUBLISHED_POSTS,
        ],
    )
}

/// Dynamic grant for meta writes
///
/// `edit_post_meta` on a `tickefic_` key is allowed for any authenticated
/// caller, regardless of role.
#[must_use]
pub fn meta_capability_granted(authenticated: bool, cap: &str, meta_key: &str) -> bool {
    authenticated && cap == caps::EDIT_POST_META && meta_key.starts_with(META_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_subscriber_capabilities_is_idempotent() {
        let mut roles = RoleRegistry::with_builtin_roles();
        assert_eq!(grant_subscriber_capabilities(&mut roles), 4);
        assert_eq!(grant_subscriber_capabilities(&mut roles), 0);

        let subscriber = roles.get(SUBSCRIBER).unwrap();
        for cap in SUBSCRIBER_TICKET_CAPS {
            assert!(subscriber.has_cap(cap));
        }
        assert!(!subscriber.has_cap(caps::EDIT_OTHERS_POSTS));
    }

    #[test]
    fn test_grant_without_subscriber_role() {
        let mut roles = RoleRegistry::default();
        assert_eq!(grant_subscriber_capabilities(&mut roles), 0);
    }

    #[test]
    fn test_add_agent_role_once() {
        let mut roles = RoleRegistry::with_builtin_roles();
        assert!(add_agent_role(&mut roles));
        assert!(!add_agent_role(&mut roles));
        assert!(roles.get(AGENT).unwrap().has_cap(caps::EDIT_OTHERS_POSTS));
    }

    #[test]
    fn test_capabilities_union() {
        let mut roles = RoleRegistry::with_builtin_roles();
        add_agent_role(&mut roles);
        let granted = roles.capabilities_for(&[
            SUBSCRIBER.to_string(),
            AGENT.to_string(),
            "ghost".to_string(),
        ]);
        assert!(granted.contains(caps::READ));
        assert!(granted.contains(caps::EDIT_OTHERS_POSTS));
        assert!(!granted.contains(caps::MANAGE_OPTIONS));
    }

    #[test]
    fn test_add_cap_unknown_role() {
        let mut roles = RoleRegistry::default();
        assert!(roles.add_cap("editor", caps::READ).is_err());
    }

    #[test]
    fn test_meta_capability_grant() {
        assert!(meta_capability_granted(true, caps::EDIT_POST_META, "tickefic_status"));
        assert!(!meta_capability_granted(false, caps::EDIT_POST_META, "tickefic_status"));
        assert!(!meta_capability_granted(true, caps::EDIT_POST_META, "_edit_lock"));
        assert!(!meta_capability_granted(true, caps::EDIT_POSTS, "tickefic_status"));
    }
}
