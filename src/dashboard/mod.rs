//! Headless dashboard client
//!
//! The logged-in user's view of their tickets: a session check, a login
//! form, open/closed tabs with paging, expandable reply threads, and forms
//! for new tickets and replies. [`Dashboard`] holds the view state and talks
//! to the server through [`DashboardApi`].

pub mod client;
pub mod controller;
#[cfg(feature = "client")]
pub mod http;
pub mod state;

pub use client::{ClientError, DashboardApi, TicketList};
pub use controller::{Dashboard, TicketForm};
#[cfg(feature = "client")]
pub use http::HttpDashboardApi;
pub use state::{CreateEffect, DashboardState, FetchKey, FetchToken, Phase, Tab, Thread, is_owner_reply};
