use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use roveri_core::config::config_dir;
use roveri_core::{ApiClient, ChatSync, Config, FileSessionStore, SessionHandle};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod form;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

const DEFAULT_LOG_FILTER: &str = "roveri=info,roveri_core=info";

/// Log to a file under the config dir; the terminal belongs to the UI.
fn init_logging(config: &Config) -> Result<()> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("roveri.log"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_level.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_logging(&config)?;
    info!(api = %config.api_base_url, "starting roveri");

    let store = FileSessionStore::default_location()?;
    let session = SessionHandle::new(Arc::new(store));
    let (session_tx, session_rx) = mpsc::unbounded_channel();
    let client = ApiClient::from_config(&config, session)?.with_events(session_tx);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    events.forward_session_events(session_rx);

    let chat = ChatSync::new(client.clone(), config.poll_interval());
    let mut app = App::new(client, chat, events.sender());
    app.start();

    let result = run(&mut app, &mut terminal, &mut events).await;

    app.chat.stop();
    tui::restore()?;

    if let Err(err) = &result {
        error!(error = %err, "roveri exited with an error");
    }
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event).await?;
        }
    }
    Ok(())
}
