//! Interactive entity search in the terminal.
//!
//! Each input line stands for the current contents of a search box, so typing
//! `ra`, `rad`, `radio` in quick succession behaves like keystrokes. `:clear`
//! resets the box and `:quit` exits at once. On EOF the last query is still
//! searched before exiting.

use std::sync::Arc;
use std::time::Duration;

use cultural_insights::{
    search::{DebouncedSearch, SearchOptions, SearchState},
    services::QlooClient,
    telemetry, Config,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env()?;
    let client = QlooClient::new(
        config.qloo_api_key.clone(),
        config.qloo_api_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let options = SearchOptions {
        types: std::env::args().skip(1).collect(),
        ..SearchOptions::default()
    };
    let search = DebouncedSearch::with_options(Arc::new(client), options);

    let mut updates = search.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            render(&state);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut quit = false;
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        if command == ":quit" {
            quit = true;
            break;
        }
        if command == ":clear" {
            search.clear();
            continue;
        }
        search.set_query(line);
    }

    // Piped input ends right after the last query
    if !quit {
        search.settled().await;
    }
    drop(search);
    printer.await?;
    Ok(())
}

fn render(state: &SearchState) {
    if state.loading {
        println!("searching \"{}\"...", state.query.trim());
        return;
    }

    if let Some(error) = &state.error {
        println!("error: {}", error);
        return;
    }

    if state.query.is_empty() {
        println!("(cleared)");
        return;
    }

    for entity in &state.results {
        let kind = entity
            .types
            .first()
            .and_then(|t| t.rsplit(':').next())
            .unwrap_or("entity");
        println!("  {:<40} {:<10} {}", entity.name, kind, entity.entity_id);
    }
}
