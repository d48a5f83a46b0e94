//! Listing scope
//!
//! Turns raw listing parameters into a [`TicketQuery`] for the caller.
//! Callers who cannot see every ticket are limited to their own, and
//! anonymous callers get a query that matches nothing.

use crate::auth::Caller;
use crate::core::STATUS_KEY;
use crate::error::{Result, TickeficError};
use crate::storage::{AuthorScope, MAX_PER_PAGE, MetaClause, SortOrder, TicketQuery};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static PERCENT_OCTETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[0-9a-fA-F]{2}").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Listing parameters as they arrive on the query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub order: Option<SortOrder>,
    pub tickefic_status: Option<String>,
}

/// Strip tags and percent-encoded octets, collapse whitespace and trim
#[must_use]
pub fn sanitize_text_field(raw: &str) -> String {
    let stripped = TAGS.replace_all(raw, "");
    let stripped = PERCENT_OCTETS.replace_all(&stripped, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Build the scoped query for `caller`
pub fn scope_query(caller: &Caller, params: &ListParams) -> Result<TicketQuery> {
    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(TickeficError::invalid_param("page", "must be greater than or equal to 1"));
    }
    let per_page = params.per_page.unwrap_or(crate::storage::DEFAULT_PER_PAGE);
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(TickeficError::invalid_param(
            "per_page",
            format!("must be between 1 and {MAX_PER_PAGE}"),
        ));
    }

    let author = if caller.can_view_all_tickets() {
        AuthorScope::Any
    } else {
        caller.user_id().map_or(AuthorScope::Nobody, AuthorScope::Only)
    };

    let mut meta = Vec::new();
    if let Some(status) = params.tickefic_status.as_deref().filter(|s| !s.is_empty()) {
        meta.push(MetaClause {
            key: STATUS_KEY.to_string(),
            value: sanitize_text_field(status),
        });
    }

    let query = TicketQuery {
        author,
        meta,
        viewer: caller.user_id(),
        viewer_sees_all: caller.can_view_all_tickets(),
        order: params.order.unwrap_or_default(),
        page,
        per_page,
    };
    debug!(author = ?query.author, page, per_page, "scoped ticket query");
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ADMINISTRATOR, SUBSCRIBER};
    use crate::core::UserId;
    use crate::test_utils::caller_with_role;

    #[test]
    fn test_sanitize_text_field() {
        assert_eq!(sanitize_text_field("  closed "), "closed");
        assert_eq!(sanitize_text_field("<b>closed</b>"), "closed");
        assert_eq!(sanitize_text_field("in\t\nprogress"), "in progress");
        assert_eq!(sanitize_text_field("open%20"), "open");
    }

    #[test]
    fn test_anonymous_scope_matches_nobody() {
        let query = scope_query(&Caller::Anonymous, &ListParams::default()).unwrap();
        assert_eq!(query.author, AuthorScope::Nobody);
        assert_eq!(query.viewer, None);
    }

    #[test]
    fn test_subscriber_scoped_to_own_tickets() {
        let me = caller_with_role(4, SUBSCRIBER);
        let query = scope_query(&me, &ListParams::default()).unwrap();
        assert_eq!(query.author, AuthorScope::Only(UserId(4)));
        assert!(!query.viewer_sees_all);
    }

    #[test]
    fn test_admin_sees_everything() {
        let admin = caller_with_role(1, ADMINISTRATOR);
        let query = scope_query(&admin, &ListParams::default()).unwrap();
        assert_eq!(query.author, AuthorScope::Any);
        assert!(query.viewer_sees_all);
    }

    #[test]
    fn test_status_filter_is_sanitized() {
        let params = ListParams {
            tickefic_status: Some(" <i>closed</i> ".to_string()),
            ..ListParams::default()
        };
        let query = scope_query(&Caller::Anonymous, &params).unwrap();
        assert_eq!(
            query.meta,
            vec![MetaClause { key: STATUS_KEY.to_string(), value: "closed".to_string() }]
        );
    }

    #[test]
    fn test_empty_status_adds_no_filter() {
        let params = ListParams { tickefic_status: Some(String::new()), ..ListParams::default() };
        assert!(scope_query(&Caller::Anonymous, &params).unwrap().meta.is_empty());
    }

    #[test]
    fn test_pagination_bounds() {
        let defaults = scope_query(&Caller::Anonymous, &ListParams::default()).unwrap();
        assert_eq!((defaults.page, defaults.per_page), (1, 10));
        assert_eq!(defaults.order, SortOrder::Desc);

        for (page, per_page) in [(Some(0), None), (None, Some(0)), (None, Some(101))] {
            let params = ListParams { page, per_page, ..ListParams::default() };
            assert!(matches!(
                scope_query(&Caller::Anonymous, &params),
                Err(TickeficError::InvalidParam { .. })
            ));
        }
    }
}
