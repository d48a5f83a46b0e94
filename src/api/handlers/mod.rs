//! Route handlers, one module per resource

pub mod categories;
pub mod pages;
pub mod replies;
pub mod session;
pub mod tickets;

use super::ApiError;

/// Fallback for paths no route matches
pub async fn no_route() -> ApiError {
    ApiError::no_route()
}
