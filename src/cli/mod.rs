//! Command-line interface
//!
//! `tickefic serve` runs the REST service; the other commands work on the
//! same data file directly.

pub mod handlers;
pub mod output;

pub use output::OutputFormatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tickefic", version, about = "Support tickets with a REST API and a user dashboard")]
pub struct Cli {
    /// Configuration file (defaults to ./tickefic.toml when present)
    #[arg(short, long, global = true, env = "TICKEFIC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[arg(long, global = true)]
    pub no_color: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the REST service and dashboard page
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the dashboard page, the agent role and default categories
    Activate,

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Inspect and edit tickets
    Tickets {
        #[command(subcommand)]
        command: TicketCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        login: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "TICKEFIC_PASSWORD")]
        password: String,

        /// administrator, agent or subscriber
        #[arg(long, default_value = "subscriber")]
        role: String,

        #[arg(long)]
        display_name: Option<String>,
    },

    List,
}

#[derive(Subcommand, Debug)]
pub enum TicketCommands {
    /// All tickets with their priority, status and agent
    List {
        /// Only tickets with this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Save ticket details as the given user
    Edit {
        id: u64,

        /// Login of the user making the change
        #[arg(long = "as", value_name = "LOGIN")]
        as_user: String,

        #[arg(long)]
        priority: Option<String>,

        #[arg(long)]
        status: Option<String>,

        /// Agent user id; 0 unassigns
        #[arg(long)]
        agent: Option<u64>,
    },
}
