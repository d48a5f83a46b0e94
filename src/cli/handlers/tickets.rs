//! `tickefic tickets` subcommands
//!
//! The list shows what the admin ticket screen shows: every ticket with its
//! priority, status and assigned agent.

use super::HandlerContext;
use crate::cli::output::OutputFormatter;
use crate::config::Settings;
use crate::core::{Status, Ticket, TicketId, UserId};
use crate::error::Result;
use crate::service::{SaveOutcome, TicketDetails, sanitize_text_field};
use crate::storage::TicketRepository;
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;

const UNASSIGNED: &str = "Unassigned";
const UNKNOWN_AGENT: &str = "Unknown Agent";

/// Agent column text for a ticket
fn agent_label(ctx: &HandlerContext, agent: Option<UserId>, names: &mut BTreeMap<UserId, String>) -> Result<String> {
    let Some(agent) = agent else {
        return Ok(UNASSIGNED.to_string());
    };
    if let Some(name) = names.get(&agent) {
        return Ok(name.clone());
    }
    let name = ctx
        .service
        .user(agent)?
        .map_or_else(|| UNKNOWN_AGENT.to_string(), |u| u.display_name);
    names.insert(agent, name.clone());
    Ok(name)
}

pub fn handle_tickets_list(settings: &Settings, status: Option<&str>, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::open(settings)?;
    let status = status
        .map(sanitize_text_field)
        .filter(|s| !s.is_empty())
        .map(|s| Status::from_str(&s))
        .transpose()?;

    let mut tickets = ctx
        .store
        .find_tickets(|t| status.is_none_or(|s| t.meta.status == s))?;
    tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let mut names = BTreeMap::new();
    let mut rows = Vec::with_capacity(tickets.len());
    let mut entries = Vec::with_capacity(tickets.len());
    for ticket in &tickets {
        let agent = agent_label(&ctx, ticket.meta.assigned_agent, &mut names)?;
        rows.push(vec![
            ticket.id.to_string(),
            ticket.title.clone(),
            ticket.meta.priority.label().to_string(),
            ticket.meta.status.label().to_string(),
            agent.clone(),
        ]);
        entries.push(json!({
            "id": ticket.id,
            "title": ticket.title,
            "post_status": ticket.post_status,
            "priority": ticket.meta.priority,
            "status": ticket.meta.status,
            "agent": agent,
        }));
    }

    if formatter.is_json() {
        return formatter.json(&entries);
    }
    if rows.is_empty() {
        formatter.info("No tickets found");
        return Ok(());
    }
    formatter.table(&["ID", "Title", "Priority", "Status", "Agent"], &rows);
    Ok(())
}

pub struct EditArgs {
    pub id: u64,
    pub as_user: String,
    pub details: TicketDetails,
}

/// Save priority, status and agent the way the edit screen does
pub fn handle_tickets_edit(settings: &Settings, args: EditArgs, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::open(settings)?;
    let caller = ctx.caller(&args.as_user)?;

    match ctx.service.save_details(&caller, TicketId(args.id), &args.details)? {
        SaveOutcome::Saved(ticket) => report_saved(&ticket, formatter),
        SaveOutcome::Skipped => {
            if formatter.is_json() {
                return formatter.json(&json!({ "id": args.id, "saved": false }));
            }
            formatter.warning(&format!(
                "'{}' may not edit ticket {}; nothing was saved",
                args.as_user, args.id
            ));
            Ok(())
        },
    }
}

fn report_saved(ticket: &Ticket, formatter: &OutputFormatter) -> Result<()> {
    if formatter.is_json() {
        return formatter.json(&json!({
            "id": ticket.id,
            "saved": true,
            "priority": ticket.meta.priority,
            "status": ticket.meta.status,
            "assigned_agent": ticket.meta.assigned_agent.map_or(0, UserId::get),
        }));
    }
    formatter.success(&format!(
        "Saved ticket {}: {} priority, {}",
        ticket.id,
        ticket.meta.priority.label(),
        ticket.meta.status.label()
    ));
    Ok(())
}
