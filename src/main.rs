// Composition root: wires adapters, the dashboard service and the MVU TUI

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dedupdash::adapters::{
    browse::FsDirectoryBrowser,
    http::HttpRepositoryApi,
    persistence::FileConfigStore,
    ws::{events_endpoint, WsTransport},
};
use dedupdash::cli::CliArgs;
use dedupdash::logging;
use dedupdash::services::dashboard_service::DashboardService;
use dedupdash::tui::{TuiMessage, TuiModel, TuiUpdate, TuiView};
use dedupdash_core::app::{Command, Dashboard};
use dedupdash_core::ports::{AppConfig, ConfigStore, SystemClock};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Running application: the service task plus the terminal it drives
struct DedupDashApp {
    service_handle: JoinHandle<Result<()>>,
    tui_model: TuiModel,
    terminal: Tui,
    dashboard_rx: watch::Receiver<Dashboard>,
    command_tx: mpsc::UnboundedSender<Command>,
    tick_rate: Duration,
}

impl DedupDashApp {
    /// Build adapters, start the dashboard service and take over the terminal
    fn new(config: AppConfig) -> Result<Self> {
        let endpoint = events_endpoint(&config.server_url)?;
        info!("Server {} (events at {})", config.server_url, endpoint);

        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let transport = Box::new(WsTransport::new(endpoint, transport_tx));
        let api = Arc::new(HttpRepositoryApi::new(&config.server_url)?);
        let browser = Arc::new(FsDirectoryBrowser::new());
        let clock = Arc::new(SystemClock::new());

        let (service, dashboard_rx, command_tx) =
            DashboardService::new(transport, transport_rx, api, browser, clock);
        let service_handle = tokio::spawn(service.run());

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let tui_model = TuiModel::new().with_activity_panel(config.ui.show_activity);

        Ok(Self {
            service_handle,
            tui_model,
            terminal,
            dashboard_rx,
            command_tx,
            tick_rate: Duration::from_millis(config.ui.tick_rate_ms.max(10)),
        })
    }

    async fn run(self) -> Result<()> {
        let DedupDashApp {
            service_handle,
            mut tui_model,
            mut terminal,
            mut dashboard_rx,
            command_tx,
            tick_rate,
        } = self;

        let result = run_main_loop(
            &mut tui_model,
            &mut terminal,
            &mut dashboard_rx,
            &command_tx,
            tick_rate,
        )
        .await;

        restore_terminal(&mut terminal)?;

        // Dropping the sender lets the service tear down if Quit never went out
        drop(command_tx);
        match service_handle.await {
            Ok(Err(e)) => error!("Dashboard service failed: {:#}", e),
            Err(e) => error!("Dashboard service task failed: {:?}", e),
            Ok(Ok(())) => {}
        }

        result
    }
}

async fn run_main_loop(
    tui_model: &mut TuiModel,
    terminal: &mut Tui,
    dashboard_rx: &mut watch::Receiver<Dashboard>,
    command_tx: &mpsc::UnboundedSender<Command>,
    tick_rate: Duration,
) -> Result<()> {
    let size = terminal.size()?;
    TuiUpdate::handle_resize(tui_model, size.width, size.height)?;
    let mut needs_redraw = true;

    loop {
        if dashboard_rx.has_changed().unwrap_or(false) {
            let dashboard = dashboard_rx.borrow_and_update().clone();
            tui_model.apply_dashboard(dashboard);
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|frame| TuiView::render(tui_model, frame))?;
            needs_redraw = false;
        }

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    let message =
                        TuiUpdate::handle_key(tui_model, key_event.code, key_event.modifiers)?;
                    if let TuiMessage::Command(cmd) = message {
                        info!("Sending command to dashboard service: {:?}", cmd);
                        if let Err(e) = command_tx.send(cmd) {
                            error!("Failed to send command: {}", e);
                        }
                    }
                    needs_redraw = true;
                }
                Event::Resize(width, height) => {
                    TuiUpdate::handle_resize(tui_model, width, height)?;
                    needs_redraw = true;
                }
                _ => {}
            }
        }

        if tui_model.should_quit {
            info!("Quit requested, exiting main loop");
            break;
        }

        // Let the service task make progress between polls
        tokio::task::yield_now().await;
    }

    Ok(())
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Config file first, command-line flags on top
fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let store = match &args.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new()?,
    };
    let mut config = store.load()?;

    if let Some(server) = &args.server {
        config.server_url = server.clone();
    }
    if let Some(log_file) = &args.log_file {
        config.log_file = Some(log_file.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = load_config(&args)?;

    // The terminal belongs to the TUI, so logs only go to a file
    logging::init(config.log_file.as_deref())?;
    info!("Starting dedupdash");

    let app = DedupDashApp::new(config)?;
    if let Err(e) = app.run().await {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    info!("dedupdash shut down cleanly");
    Ok(())
}
