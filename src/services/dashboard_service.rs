use anyhow::Result;
use dedupdash_core::app::{Command, Dashboard, Effect, Outcome, Request, SyncCore};
use dedupdash_core::domain::{ProgressTransition, RECONNECT_DELAY_MS};
use dedupdash_core::ports::{Clock, DirectoryBrowser, PushTransport, RepositoryApi, TransportEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Owns the synchronization core and performs the I/O it asks for.
///
/// Transport events, UI commands, finished API calls and timers are all
/// funnelled into one loop, so the core only ever sees one input at a time.
/// After every input the new `Dashboard` is published to the UI.
pub struct DashboardService {
    core: SyncCore,

    // Ports
    transport: Box<dyn PushTransport>,
    api: Arc<dyn RepositoryApi>,
    browser: Arc<dyn DirectoryBrowser>,
    clock: Arc<dyn Clock>,

    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    dashboard_tx: watch::Sender<Dashboard>,

    // In-flight API calls
    tasks: JoinSet<Outcome>,
}

impl DashboardService {
    pub fn new(
        transport: Box<dyn PushTransport>,
        transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
        api: Arc<dyn RepositoryApi>,
        browser: Arc<dyn DirectoryBrowser>,
        clock: Arc<dyn Clock>,
    ) -> (Self, watch::Receiver<Dashboard>, mpsc::UnboundedSender<Command>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (dashboard_tx, dashboard_rx) = watch::channel(Dashboard::default());

        let service = Self {
            core: SyncCore::new(),
            transport,
            api,
            browser,
            clock,
            transport_rx,
            command_rx,
            dashboard_tx,
            tasks: JoinSet::new(),
        };

        (service, dashboard_rx, command_tx)
    }

    /// Run until `Quit` arrives or the UI drops its command sender
    pub async fn run(mut self) -> Result<()> {
        info!("Starting dashboard service");
        let effects = self.core.start();
        self.execute(effects);
        self.publish();

        loop {
            let wait = self.time_to_next_deadline();

            tokio::select! {
                Some(event) = self.transport_rx.recv() => {
                    self.on_transport_event(event);
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(Command::Quit) => {
                            info!("Quit command received");
                            let effects = self.core.handle_command(Command::Quit);
                            self.execute(effects);
                            break;
                        }
                        Some(cmd) => {
                            debug!("Handling command: {:?}", cmd);
                            let effects = self.core.handle_command(cmd);
                            self.execute(effects);
                        }
                        None => {
                            info!("Command channel closed, stopping");
                            let effects = self.core.teardown();
                            self.execute(effects);
                            break;
                        }
                    }
                }

                joined = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    match joined {
                        Some(Ok(outcome)) => self.on_outcome(outcome),
                        Some(Err(e)) => error!("API task panicked: {}", e),
                        None => {}
                    }
                }

                _ = sleep_for(wait) => {
                    let effects = self.core.tick(self.clock.now_ms());
                    self.execute(effects);
                }
            }

            self.publish();
        }

        self.publish();
        // Calls still in flight finish on their own; their outcomes are not applied
        self.tasks.detach_all();
        info!("Dashboard service stopped");
        Ok(())
    }

    fn time_to_next_deadline(&self) -> Option<Duration> {
        self.core.next_deadline().map(|deadline| {
            let remaining = deadline - self.clock.now_ms();
            Duration::from_millis(remaining.max(0) as u64)
        })
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        let now = self.clock.now_ms();
        match event {
            TransportEvent::Opened { id } => {
                if !self.core.accepts(id) {
                    debug!("Ignoring open from stale connection {}", id);
                    return;
                }
                info!("Push channel {} connected", id);
                let effects = self.core.on_open(id);
                self.execute(effects);
            }
            TransportEvent::Frame { id, text } => {
                if !self.core.accepts(id) {
                    debug!("Ignoring frame from stale connection {}", id);
                    return;
                }
                match self.core.handle_frame(&text, now) {
                    Ok(dispatched) => {
                        debug!(kind = %dispatched.kind, repo = ?dispatched.repo, "Event received");
                        match dispatched.transition {
                            Some(ProgressTransition::Started) => {
                                info!("Progress started for {:?}", dispatched.repo);
                            }
                            Some(ProgressTransition::Replaced) => {
                                info!("Progress switched to {:?}", dispatched.repo);
                            }
                            Some(ProgressTransition::MergedWithoutRepo) => {
                                warn!("Progress update without repo merged into active snapshot");
                            }
                            Some(ProgressTransition::Merged) | None => {}
                        }
                        self.execute(dispatched.effects);
                    }
                    Err(e) => warn!("Dropping frame: {}", e),
                }
            }
            TransportEvent::Closed { id, reason } => {
                if !self.core.accepts(id) {
                    debug!("Ignoring close from stale connection {}", id);
                    return;
                }
                match reason {
                    Some(reason) => warn!(
                        "Push channel {} closed: {}; reconnecting in {} ms",
                        id, reason, RECONNECT_DELAY_MS
                    ),
                    None => info!(
                        "Push channel {} closed; reconnecting in {} ms",
                        id, RECONNECT_DELAY_MS
                    ),
                }
                self.core.on_close(id, now);
            }
        }
    }

    fn on_outcome(&mut self, outcome: Outcome) {
        if let Some(reason) = outcome.failure_reason() {
            warn!("{} failed: {}", outcome.label(), reason);
        } else {
            debug!("{} succeeded", outcome.label());
        }
        let effects = self.core.apply_outcome(outcome, self.clock.now_ms());
        self.execute(effects);
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Connect(id) => self.transport.connect(id),
                Effect::CloseConnection => self.transport.close(),
                Effect::Call(request) => self.spawn_call(request),
            }
        }
    }

    /// Each call runs as its own task; completions may arrive in any order
    fn spawn_call(&mut self, request: Request) {
        let api = Arc::clone(&self.api);
        match request {
            Request::ListRepos => {
                self.tasks
                    .spawn(async move { Outcome::ReposListed(api.list_repos().await) });
            }
            Request::CreateRepo(repo) => {
                info!("Creating repository {}", repo.name);
                self.tasks.spawn(async move {
                    let result = api.create_repo(&repo).await;
                    Outcome::RepoCreated {
                        name: repo.name,
                        result,
                    }
                });
            }
            Request::DeleteRepo(name) => {
                info!("Deleting repository {}", name);
                self.tasks.spawn(async move {
                    let result = api.delete_repo(&name).await;
                    Outcome::RepoDeleted { name, result }
                });
            }
            Request::TriggerUpdate(name) => {
                info!("Triggering update of {}", name);
                self.tasks.spawn(async move {
                    let result = api.trigger_update(&name).await;
                    Outcome::UpdateStarted { name, result }
                });
            }
            Request::Duplicates(name) => {
                self.tasks.spawn(async move {
                    let result = api.duplicates(&name).await;
                    Outcome::DuplicatesLoaded { name, result }
                });
            }
            Request::Browse(start) => {
                let browser = Arc::clone(&self.browser);
                self.tasks.spawn(async move {
                    // Directory listing is blocking I/O
                    let result =
                        tokio::task::spawn_blocking(move || browser.list(start.as_deref())).await;
                    let result = match result {
                        Ok(Ok(listing)) => Ok(listing),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(e) => Err(format!("browse task failed: {}", e)),
                    };
                    Outcome::Browsed(result)
                });
            }
        }
    }

    fn publish(&self) {
        self.dashboard_tx.send_replace(self.core.dashboard());
    }
}

/// Sleep for `wait`, or forever when no timer is pending
async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}
