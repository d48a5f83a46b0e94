//! Authentication and authorization
//!
//! Roles and capabilities, the authorization policy consulted before every
//! query or write, login sessions with their request nonces, and password
//! hashing.

pub mod capabilities;
pub mod password;
pub mod policy;
pub mod session;

pub use capabilities::{
    ADMINISTRATOR, AGENT, Role, RoleRegistry, SUBSCRIBER, add_agent_role, caps,
    grant_subscriber_capabilities,
};
pub use policy::{Action, Caller, Decision, Denial, Principal, authorize, ensure};
pub use session::{NonceCheck, NonceService, REST_NONCE_ACTION, Session, SessionStore};
