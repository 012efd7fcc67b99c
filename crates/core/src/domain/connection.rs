//! Lifecycle of the single push-channel connection.
//!
//! The manager never touches a socket. It is told when the transport opened
//! or closed and answers with the actions the caller must perform. Time is
//! passed in as unix milliseconds so reconnect scheduling can be driven by a
//! real clock or a simulated one.

/// Fixed delay between a close and the next connect attempt
pub const RECONNECT_DELAY_MS: i64 = 2_000;

/// Identifies one connect attempt. Events from an older attempt are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// User-visible connection status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
        }
    }
}

/// Internal reconnect state. `Backoff` owns the only pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    Connecting(ConnectionId),
    Open(ConnectionId),
    Backoff { due_at: i64 },
}

/// Side effects requested by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a new transport tagged with this id
    Connect(ConnectionId),
    /// Close whatever transport is open
    Close,
    /// Data may have gone stale while disconnected
    RefreshRepositories,
}

#[derive(Debug, Clone)]
pub struct ConnectionManager {
    phase: ConnectionPhase,
    shutdown: bool,
    delay_ms: i64,
    next_id: u64,
    attempts: u64,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            shutdown: false,
            delay_ms: RECONNECT_DELAY_MS,
            next_id: 0,
            attempts: 0,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn status(&self) -> ConnectionStatus {
        match self.phase {
            ConnectionPhase::Idle | ConnectionPhase::Backoff { .. } => {
                ConnectionStatus::Disconnected
            }
            ConnectionPhase::Connecting(_) => ConnectionStatus::Connecting,
            ConnectionPhase::Open(_) => ConnectionStatus::Connected,
        }
    }

    /// Number of connect attempts issued so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown
    }

    /// Id of the transport currently considered live, if any
    pub fn current_id(&self) -> Option<ConnectionId> {
        match self.phase {
            ConnectionPhase::Connecting(id) | ConnectionPhase::Open(id) => Some(id),
            _ => None,
        }
    }

    /// Deadline of the pending reconnect timer
    pub fn next_deadline(&self) -> Option<i64> {
        match self.phase {
            ConnectionPhase::Backoff { due_at } => Some(due_at),
            _ => None,
        }
    }

    /// Kick off the first connection. Does nothing unless idle.
    pub fn start(&mut self) -> Option<ConnectionAction> {
        if self.shutdown || self.phase != ConnectionPhase::Idle {
            return None;
        }
        Some(self.begin_attempt())
    }

    pub fn on_open(&mut self, id: ConnectionId) -> Vec<ConnectionAction> {
        if self.shutdown || self.phase != ConnectionPhase::Connecting(id) {
            return Vec::new();
        }
        self.phase = ConnectionPhase::Open(id);
        vec![ConnectionAction::RefreshRepositories]
    }

    /// Every way a connection can end lands here, transport errors included.
    pub fn on_close(&mut self, id: ConnectionId, now: i64) {
        if self.current_id() != Some(id) {
            // Stale socket, or a timer is already pending
            return;
        }
        self.phase = if self.shutdown {
            ConnectionPhase::Idle
        } else {
            ConnectionPhase::Backoff {
                due_at: now + self.delay_ms,
            }
        };
    }

    /// Fire the reconnect timer once it is due
    pub fn poll(&mut self, now: i64) -> Option<ConnectionAction> {
        match self.phase {
            ConnectionPhase::Backoff { due_at } if now >= due_at && !self.shutdown => {
                Some(self.begin_attempt())
            }
            _ => None,
        }
    }

    /// Suppress reconnects, drop the pending timer and close the transport
    pub fn teardown(&mut self) -> Option<ConnectionAction> {
        self.shutdown = true;
        let had_transport = self.current_id().is_some();
        self.phase = ConnectionPhase::Idle;
        had_transport.then_some(ConnectionAction::Close)
    }

    fn begin_attempt(&mut self) -> ConnectionAction {
        self.next_id += 1;
        self.attempts += 1;
        let id = ConnectionId(self.next_id);
        self.phase = ConnectionPhase::Connecting(id);
        ConnectionAction::Connect(id)
    }
}
