use super::HandlerContext;
use crate::activation::{self, ActivationReport};
use crate::cli::output::OutputFormatter;
use crate::config::Settings;
use crate::error::Result;

/// Create the dashboard page, the agent role and the default categories
pub fn handle_activate(settings: &Settings, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::open(settings)?;
    let report = activation::activate(&ctx.store)?;

    if formatter.is_json() {
        return formatter.json(&report);
    }
    print_report(&report, formatter);
    Ok(())
}

fn print_report(report: &ActivationReport, formatter: &OutputFormatter) {
    if !report.changed_anything() {
        formatter.info("Already activated; nothing to do");
        return;
    }
    if let (true, Some(page)) = (report.page_created, &report.page) {
        formatter.success(&format!("Created page '{}' at /{}/", page.title, page.slug));
    }
    if report.agent_role_created {
        formatter.success("Created the agent role");
    }
    for name in &report.categories_created {
        formatter.success(&format!("Created category '{name}'"));
    }
}
