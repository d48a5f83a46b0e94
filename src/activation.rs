//! Startup registration and one-time activation
//!
//! [`init`] runs on every start: it builds the content model and tops up
//! the subscriber role. [`activate`] creates the dashboard page, the agent
//! role and the default categories. Both can run any number of times.

use crate::auth::{add_agent_role, grant_subscriber_capabilities};
use crate::core::{CATEGORY_TAXONOMY, ContentModel, Page, register_ticket_model};
use crate::error::Result;
use crate::storage::{ContentStore, PageRepository, TermRepository, UserRepository};
use crate::web::DASHBOARD_SHORTCODE;
use serde::Serialize;
use tracing::info;

pub const DASHBOARD_PAGE_TITLE: &str = "User Dashboard";
pub const DASHBOARD_PAGE_SLUG: &str = "user-dashboard";
pub const DEFAULT_CATEGORIES: [&str; 3] = ["Technical Issue", "Billing / Account", "Feature Request"];

/// Register the ticket model and grant subscribers their ticket capabilities
pub fn init(store: &ContentStore) -> Result<ContentModel> {
    let mut model = ContentModel::new();
    register_ticket_model(&mut model);
    let granted = store.update_roles(grant_subscriber_capabilities)?;
    if granted > 0 {
        info!(granted, "granted ticket capabilities to subscribers");
    }
    Ok(model)
}

/// What an activation run created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub page_created: bool,
    pub page: Option<Page>,
    pub agent_role_created: bool,
    pub categories_created: Vec<String>,
}

impl ActivationReport {
    #[must_use]
    pub fn changed_anything(&self) -> bool {
        self.page_created || self.agent_role_created || !self.categories_created.is_empty()
    }
}

pub fn activate(store: &ContentStore) -> Result<ActivationReport> {
    let mut report = ActivationReport::default();

    report.page = match store.page_by_title(DASHBOARD_PAGE_TITLE)? {
        Some(page) => Some(page),
        None => {
            report.page_created = true;
            let content = format!("[{DASHBOARD_SHORTCODE}]");
            Some(store.insert_page(DASHBOARD_PAGE_TITLE, DASHBOARD_PAGE_SLUG, &content)?)
        },
    };

    report.agent_role_created = store.update_roles(add_agent_role)?;

    for name in DEFAULT_CATEGORIES {
        if store.find_term(CATEGORY_TAXONOMY, name)?.is_none() {
            store.insert_term(CATEGORY_TAXONOMY, name, None)?;
            report.categories_created.push(name.to_string());
        }
    }

    info!(
        page_created = report.page_created,
        agent_role_created = report.agent_role_created,
        categories_created = report.categories_created.len(),
        "activation complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AGENT, SUBSCRIBER, caps};
    use crate::core::TICKET_POST_TYPE;

    #[test]
    fn test_activation_is_idempotent() {
        let store = ContentStore::in_memory();
        let first = activate(&store).unwrap();
        assert!(first.page_created);
        assert!(first.agent_role_created);
        assert_eq!(first.categories_created.len(), 3);

        let page = first.page.unwrap();
        assert_eq!(page.slug, DASHBOARD_PAGE_SLUG);
        assert_eq!(page.content, "[tickefic_user_dashboard]");

        let second = activate(&store).unwrap();
        assert!(!second.changed_anything());
        assert_eq!(second.page.unwrap().id, page.id);
        assert_eq!(store.terms(CATEGORY_TAXONOMY).unwrap().len(), 3);
        assert!(store.roles().unwrap().contains(AGENT));
    }

    #[test]
    fn test_init_registers_model_and_grants_caps() {
        let store = ContentStore::in_memory();
        let model = init(&store).unwrap();
        assert!(model.post_type_exists(TICKET_POST_TYPE));
        assert_eq!(model.meta_fields(TICKET_POST_TYPE).len(), 3);

        let roles = store.roles().unwrap();
        assert!(roles.get(SUBSCRIBER).unwrap().has_cap(caps::PUBLISH_TICKETS));

        let again = init(&store).unwrap();
        assert_eq!(again.meta_fields(TICKET_POST_TYPE).len(), 3);
        assert_eq!(store.roles().unwrap(), roles);
    }
}
