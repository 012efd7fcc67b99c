use crate::domain::connection::ConnectionId;

/// What a transport reports back about one connection attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened { id: ConnectionId },
    Frame { id: ConnectionId, text: String },
    /// Normal close, handshake failure and mid-stream errors all end up here
    Closed { id: ConnectionId, reason: Option<String> },
}

/// Port for the persistent push channel.
///
/// Implementations deliver `TransportEvent`s tagged with the id they were
/// given, through whatever channel they were constructed with.
pub trait PushTransport: Send {
    /// Start connecting. Any previous connection is dropped first.
    fn connect(&mut self, id: ConnectionId);

    /// Close the current connection, if any
    fn close(&mut self);
}
