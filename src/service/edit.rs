//! Edit-screen save path
//!
//! Mirrors the ticket details box of the admin editor: priority, status and
//! assigned agent are written together. A caller who may not edit the ticket
//! is not an error here; the save is skipped and logged.

use super::{TicketService, sanitize_text_field};
use crate::auth::{Action, Caller, authorize};
use crate::core::{Ticket, TicketId, UserId, meta::parse_details};
use crate::error::Result;
use crate::storage::TicketRepository;
use chrono::Utc;
use tracing::{info, warn};

/// Submitted detail fields; `None` leaves the stored value as is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketDetails {
    pub priority: Option<String>,
    pub status: Option<String>,
    /// `0` unassigns
    pub assigned_agent: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(Ticket),
    /// The caller may not edit this ticket; nothing was written
    Skipped,
}

impl TicketService {
    /// Save the detail fields of a ticket
    pub fn save_details(&self, caller: &Caller, id: TicketId, details: &TicketDetails) -> Result<SaveOutcome> {
        let mut ticket = self.store().load_ticket(id)?;
        if !authorize(caller, Action::EditTicket(&ticket)).is_allowed() {
            warn!(ticket = %id, user = ?caller.user_id(), "skipping ticket details save: not allowed to edit");
            return Ok(SaveOutcome::Skipped);
        }

        let priority = details.priority.as_deref().map(sanitize_text_field);
        let status = details.status.as_deref().map(sanitize_text_field);
        let (priority, status) = parse_details(priority.as_deref(), status.as_deref())?;

        let mut meta = ticket.meta;
        if let Some(priority) = priority {
            meta.priority = priority;
        }
        if let Some(status) = status {
            meta.status = status;
        }
        if let Some(agent) = details.assigned_agent {
            meta.assigned_agent = (agent != 0).then_some(UserId(agent));
            self.check_agent(meta.assigned_agent)?;
        }

        ticket.meta = meta;
        ticket.modified_at = Utc::now();
        self.store().save_ticket(&ticket)?;
        info!(ticket = %id, priority = %meta.priority, status = %meta.status, "ticket details saved");
        Ok(SaveOutcome::Saved(ticket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ADMINISTRATOR, AGENT, SUBSCRIBER};
    use crate::core::{Priority, Status, TicketBuilder};
    use crate::error::TickeficError;
    use crate::test_utils::TestSite;

    fn details(priority: &str, status: &str, agent: u64) -> TicketDetails {
        TicketDetails {
            priority: Some(priority.to_string()),
            status: Some(status.to_string()),
            assigned_agent: Some(agent),
        }
    }

    #[test]
    fn test_admin_saves_details() {
        let site = TestSite::new();
        let alice = site.user("alice", SUBSCRIBER);
        let agent = site.user("smith", AGENT);
        let admin = site.caller("root", ADMINISTRATOR);
        let ticket = site
            .store
            .insert_ticket(TicketBuilder::new().title("x").author(alice.id).build())
            .unwrap();

        let outcome = site
            .service
            .save_details(&admin, ticket.id, &details(" high ", "in_progress", agent.id.get()))
            .unwrap();
        let SaveOutcome::Saved(saved) = outcome else {
            panic!("expected the save to go through");
        };
        assert_eq!(saved.meta.priority, Priority::High);
        assert_eq!(saved.meta.status, Status::InProgress);
        assert_eq!(saved.meta.assigned_agent, Some(agent.id));
    }

    #[test]
    fn test_unauthorized_save_is_skipped() {
        let site = TestSite::new();
        let alice = site.user("alice", SUBSCRIBER);
        let mallory = site.caller("mallory", SUBSCRIBER);
        let ticket = site
            .store
            .insert_ticket(TicketBuilder::new().title("x").author(alice.id).build())
            .unwrap();

        let outcome = site
            .service
            .save_details(&mallory, ticket.id, &details("high", "closed", 0))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped);
        assert_eq!(site.store.load_ticket(ticket.id).unwrap().meta.status, Status::Open);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let site = TestSite::new();
        let admin = site.caller("root", ADMINISTRATOR);
        let ticket = site.store.insert_ticket(TicketBuilder::new().title("x").build()).unwrap();
        assert!(matches!(
            site.service.save_details(&admin, ticket.id, &details("urgent", "open", 0)),
            Err(TickeficError::InvalidParam { .. })
        ));
    }

    #[test]
    fn test_zero_unassigns() {
        let site = TestSite::new();
        let admin = site.caller("root", ADMINISTRATOR);
        let ticket = site
            .store
            .insert_ticket(TicketBuilder::new().title("x").assigned_agent(admin.user_id().unwrap()).build())
            .unwrap();
        let partial = TicketDetails { assigned_agent: Some(0), ..TicketDetails::default() };
        let SaveOutcome::Saved(saved) = site.service.save_details(&admin, ticket.id, &partial).unwrap() else {
            panic!("expected the save to go through");
        };
        assert_eq!(saved.meta.assigned_agent, None);
        assert_eq!(saved.meta.priority, Priority::Normal);
    }
}
