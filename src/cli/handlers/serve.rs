//! `tickefic serve`

use crate::api::{self, AppState};
use crate::cli::output::OutputFormatter;
use crate::config::Settings;
use crate::storage::ContentStore;
use anyhow::Context as _;
use std::sync::Arc;

/// Run the REST service until Ctrl+C
///
/// `host` and `port` override the configured listen address.
pub fn handle_serve(
    mut settings: Settings,
    host: Option<String>,
    port: Option<u16>,
    formatter: &OutputFormatter,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }
    let addr = settings.bind_addr()?;
    let store = Arc::new(ContentStore::open_optional(settings.storage.data_file.clone())?);
    if store.path().is_none() {
        formatter.warning("No data file configured; content is kept in memory only");
    }
    let state = Arc::new(AppState::new(store, settings)?);

    formatter.info(&format!("Serving on http://{addr}/"));
    tokio::runtime::Runtime::new()
        .context("Failed to start the async runtime")?
        .block_on(api::serve(state))
}
