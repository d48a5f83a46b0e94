//! tickefic - a simple support ticket system
//!
//! Users open tickets, follow them through open, in-progress and closed
//! states, and exchange replies with support agents. This crate provides:
//! - A content model for tickets, replies and ticket categories
//! - Roles and capabilities, with a policy consulted before every read or write
//! - A REST API using the host's `/wp-json` conventions and cookie sessions
//! - The dashboard page and a headless dashboard client
//! - A CLI for activation, user accounts and ticket triage

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]

//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickefic::{activation, config::Settings, storage::ContentStore};
//! use tickefic::api::{AppState, build_router};
//!
//! let store = Arc::new(ContentStore::open("tickefic.yaml")?);
//! activation::activate(&store)?;
//! let state = Arc::new(AppState::new(store, Settings::default())?);
//! let app = build_router(state);
//! ```

pub mod activation;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod error;
pub mod service;
pub mod storage;
pub mod web;

#[cfg(test)]
pub mod test_utils;

pub use error::{Result, TickeficError};
