//! tickefic - support tickets with a REST API and a user dashboard
//!
//! Parses the command line, sets up logging and dispatches to the command
//! handlers.

use clap::Parser;
use std::process;
use tickefic::cli::handlers::{
    EditArgs, NewUserArgs, handle_activate, handle_serve, handle_tickets_edit, handle_tickets_list,
    handle_user_add, handle_user_list,
};
use tickefic::cli::{Cli, Commands, OutputFormatter, TicketCommands, UserCommands};
use tickefic::config::Settings;
use tickefic::error::TickeficError;
use tickefic::service::TicketDetails;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, &formatter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Logging goes to stderr so stdout stays clean for `--json`
///
/// `RUST_LOG` wins when set. Otherwise the server logs at info and the
/// one-shot commands only report warnings.
fn init_logging(verbose: bool, serving: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(if serving { "info" } else { "warn" }))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, formatter: &OutputFormatter) -> anyhow::Result<()> {
    init_logging(cli.verbose, matches!(cli.command, Commands::Serve { .. }));
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => handle_serve(settings, host, port, formatter)?,
        Commands::Activate => handle_activate(&settings, formatter)?,
        Commands::User { command } => match command {
            UserCommands::Add {
                login,
                email,
                password,
                role,
                display_name,
            } => handle_user_add(
                &settings,
                NewUserArgs {
                    login,
                    email,
                    password,
                    role,
                    display_name,
                },
                formatter,
            )?,
            UserCommands::List => handle_user_list(&settings, formatter)?,
        },
        Commands::Tickets { command } => match command {
            TicketCommands::List { status } => handle_tickets_list(&settings, status.as_deref(), formatter)?,
            TicketCommands::Edit {
                id,
                as_user,
                priority,
                status,
                agent,
            } => handle_tickets_edit(
                &settings,
                EditArgs {
                    id,
                    as_user,
                    details: TicketDetails {
                        priority,
                        status,
                        assigned_agent: agent,
                    },
                },
                formatter,
            )?,
        },
    }
    Ok(())
}

fn handle_error(error: &anyhow::Error, formatter: &OutputFormatter) {
    let known = error.downcast_ref::<TickeficError>();
    let message = known.map_or_else(|| format!("{error:#}"), TickeficError::user_message);
    formatter.error(&message);

    let suggestions = known.map(TickeficError::suggestions).unwrap_or_default();
    if !suggestions.is_empty() {
        formatter.info("\nSuggestions:");
        for suggestion in &suggestions {
            formatter.info(&format!("  • {suggestion}"));
        }
    }

    if formatter.is_json() {
        let _ = formatter.json(&serde_json::json!({
            "status": "error",
            "error": message,
            "suggestions": suggestions,
            "recoverable": known.is_some_and(TickeficError::is_recoverable),
            "is_config_error": known.is_some_and(TickeficError::is_config_error),
        }));
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}
