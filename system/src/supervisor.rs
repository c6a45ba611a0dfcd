use crate::message::ClientMessage;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    NotConnected,
    Open(String),
    Send(String),
}

/// One ordered, reliable, full-duplex channel to the server.
pub trait Transport {
    fn state(&self) -> TransportState;
    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError>;
    /// Detaches event listeners and closes the channel.
    fn disconnect(&mut self);
}

/// Creates transports. Opening starts the connection attempt.
pub trait Connector {
    type Transport: Transport;

    fn open(&mut self) -> Result<Self::Transport, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    Timeout,
    Transport(String),
}

/// Timestamps are offsets from an arbitrary client-chosen origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting { deadline: Duration },
    Connected { since: Duration },
    Disconnected,
    Failed(ConnectError),
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub connect_timeout: Duration,
}

impl std::default::Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Owns the client's single transport handle and its connection lifecycle.
///
/// At most one handle exists at a time. It is opened lazily and replaced only after it
/// reports `Disconnected`. A connect that does not complete within the timeout is
/// reported as failed and left for the user to retry.
pub struct Supervisor<C: Connector> {
    connector: C,
    handle: Option<C::Transport>,
    status: ConnectionStatus,
    config: SupervisorConfig,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(connector: C, config: SupervisorConfig) -> Self {
        Self {
            connector,
            handle: None,
            status: ConnectionStatus::Disconnected,
            config,
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.status, ConnectionStatus::Connected { .. })
    }

    /// Returns the live handle, opening a new one if there is none or the old one is gone.
    pub fn handle(&mut self) -> Result<&mut C::Transport, TransportError> {
        let reusable = self
            .handle
            .as_ref()
            .map_or(false, |h| h.state() != TransportState::Disconnected);
        if !reusable {
            if let Some(mut stale) = self.handle.take() {
                stale.disconnect();
            }
            log::debug!("Opening a new transport");
            self.handle = Some(self.connector.open()?);
        }
        self.handle.as_mut().ok_or(TransportError::NotConnected)
    }

    pub fn mount(&mut self, now: Duration) {
        match self.handle().map(|h| h.state()) {
            Ok(TransportState::Connected) => {
                log::info!("Transport already connected");
                self.status = ConnectionStatus::Connected { since: now };
            }
            Ok(_) => {
                self.status = ConnectionStatus::Connecting {
                    deadline: now + self.config.connect_timeout,
                };
            }
            Err(e) => {
                log::error!("Cannot open transport: {}", e);
                self.status = ConnectionStatus::Failed(ConnectError::Transport(e.to_string()));
            }
        }
    }

    /// Fails a pending connect whose deadline has passed. Returns true if it just failed.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.status {
            ConnectionStatus::Connecting { deadline } if now >= deadline => {
                log::warn!("Connection timeout reached");
                self.status = ConnectionStatus::Failed(ConnectError::Timeout);
                true
            }
            _ => false,
        }
    }

    /// Manual refresh: drops a handle that never connected and starts over.
    pub fn retry(&mut self, now: Duration) {
        if let Some(handle) = self.handle.as_mut() {
            if handle.state() != TransportState::Connected {
                handle.disconnect();
                self.handle = None;
            }
        }
        self.mount(now);
    }

    pub fn on_connected(&mut self, now: Duration) {
        log::info!("Transport connected");
        self.status = ConnectionStatus::Connected { since: now };
    }

    pub fn on_disconnected(&mut self) {
        log::info!("Transport disconnected");
        self.status = ConnectionStatus::Disconnected;
    }

    pub fn on_connect_error(&mut self, reason: &str) {
        log::error!("Connection error: {}", reason);
        self.status = ConnectionStatus::Failed(ConnectError::Transport(reason.to_owned()));
    }

    pub fn on_ping(&mut self) {
        if let Err(e) = self.send(&ClientMessage::PongCheck) {
            log::warn!("Cannot answer ping check: {}", e);
        }
    }

    pub fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        match self.handle.as_mut() {
            Some(handle) if handle.state() == TransportState::Connected => handle.send(message),
            _ => Err(TransportError::NotConnected),
        }
    }

    /// Best-effort goodbye before the page or process goes away.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            if handle.state() == TransportState::Connected {
                if let Err(e) = handle.send(&ClientMessage::Leave) {
                    log::debug!("Leave notice not sent: {}", e);
                }
            }
            handle.disconnect();
        }
        self.status = ConnectionStatus::Disconnected;
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotConnected => f.write_str("transport is not connected"),
            TransportError::Open(reason) => write!(f, "cannot open transport: {}", reason),
            TransportError::Send(reason) => write!(f, "cannot send message: {}", reason),
        }
    }
}

impl std::error::Error for TransportError {}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Timeout => f.write_str(
                "Connection is taking longer than expected. Please refresh the page.",
            ),
            ConnectError::Transport(reason) => write!(f, "Connection failed: {}", reason),
        }
    }
}

impl std::error::Error for ConnectError {}


#[cfg(test)]
mod tests {
    use super::fake::FakeConnector;
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn it_fails_fast_when_connect_does_not_arrive() {
        let connector = FakeConnector::default();
        let mut supervisor = Supervisor::new(connector.clone(), SupervisorConfig::default());

        supervisor.mount(secs(10));
        assert_eq!(
            supervisor.status(),
            &ConnectionStatus::Connecting { deadline: secs(12) }
        );
        assert!(!supervisor.poll(Duration::from_millis(11_999)));
        assert!(supervisor.poll(secs(12)));
        assert_eq!(
            supervisor.status(),
            &ConnectionStatus::Failed(ConnectError::Timeout)
        );
        // no silent retry
        assert!(!supervisor.poll(secs(60)));
        assert_eq!(connector.opens(), 1);
    }

    #[test]
    fn it_proceeds_immediately_when_already_connected() {
        let connector = FakeConnector::default();
        connector.set_state(TransportState::Connected);
        let mut supervisor = Supervisor::new(connector.clone(), SupervisorConfig::default());

        supervisor.mount(secs(1));
        assert_eq!(
            supervisor.status(),
            &ConnectionStatus::Connected { since: secs(1) }
        );
        assert!(!supervisor.poll(secs(100)));
    }

    #[test]
    fn it_reuses_handle_until_it_is_disconnected() {
        let connector = FakeConnector::default();
        let mut supervisor = Supervisor::new(connector.clone(), SupervisorConfig::default());

        supervisor.handle().expect("");
        supervisor.handle().expect("");
        assert_eq!(connector.opens(), 1);

        connector.set_state(TransportState::Disconnected);
        supervisor.handle().expect("");
        assert_eq!(connector.opens(), 2);
        assert_eq!(connector.wire.borrow().disconnects, 1);
    }

    #[test]
    fn it_answers_ping_with_pong() {
        let connector = FakeConnector::default();
        connector.set_state(TransportState::Connected);
        let mut supervisor = Supervisor::new(connector.clone(), SupervisorConfig::default());
        supervisor.mount(secs(0));

        supervisor.on_ping();
        assert_eq!(connector.sent(), vec![ClientMessage::PongCheck]);
    }

    #[test]
    fn it_sends_leave_before_disconnecting_on_teardown() {
        let connector = FakeConnector::default();
        connector.set_state(TransportState::Connected);
        let mut supervisor = Supervisor::new(connector.clone(), SupervisorConfig::default());
        supervisor.mount(secs(0));

        supervisor.teardown();
        assert_eq!(connector.sent(), vec![ClientMessage::Leave]);
        assert_eq!(connector.wire.borrow().disconnects, 1);
        assert_eq!(supervisor.status(), &ConnectionStatus::Disconnected);
        assert_eq!(
            supervisor.send(&ClientMessage::Clear),
            Err(TransportError::NotConnected)
        );
    }

    #[test]
    fn it_restarts_connect_wait_on_manual_retry() {
        let connector = FakeConnector::default();
        let mut supervisor = Supervisor::new(connector.clone(), SupervisorConfig::default());
        supervisor.mount(secs(0));
        supervisor.poll(secs(5));

        supervisor.retry(secs(5));
        assert_eq!(connector.opens(), 2);
        assert_eq!(
            supervisor.status(),
            &ConnectionStatus::Connecting { deadline: secs(7) }
        );

        supervisor.on_connected(secs(6));
        assert!(supervisor.is_connected());
    }

    #[test]
    fn it_surfaces_connect_error() {
        let mut supervisor =
            Supervisor::new(FakeConnector::default(), SupervisorConfig::default());
        supervisor.mount(secs(0));
        supervisor.on_connect_error("refused");
        assert_eq!(
            supervisor.status(),
            &ConnectionStatus::Failed(ConnectError::Transport("refused".into()))
        );
    }
}
