use std::convert::TryFrom;

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use sharedraw_system::{ServerMessage, SessionId, StrokeSegment};

use crate::config::ServerConfig;
use crate::live::LiveConnections;
use crate::registry::ConnectionRegistry;
use crate::session::Session;

pub type ServerTx = UnboundedSender<ConnectionCommand>;

/// What connection actors ask of the coordinating task.
#[derive(Debug)]
pub enum ConnectionCommand {
    Connect { session: Session },
    Disconnect { from: SessionId },
    Draw { from: SessionId, segment: StrokeSegment },
    Clear { from: SessionId },
}

/// Owns the registry and fans events out. Only the coordinating task touches it.
pub struct Server {
    registry: ConnectionRegistry,
    live: LiveConnections,
}

impl Server {
    pub fn new(live: LiveConnections) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            live,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { session } => {
                let before = self.registry.count();
                if self.registry.on_join(session) != before {
                    self.broadcast_user_count();
                }
            }
            ConnectionCommand::Disconnect { from } => {
                let before = self.registry.count();
                if self.registry.on_leave(&from) != before {
                    self.broadcast_user_count();
                }
            }
            ConnectionCommand::Draw { from, segment } => {
                self.warn_if_unregistered(&from);
                // the sender has already painted it
                self.broadcast(ServerMessage::Draw(segment), Some(&from));
            }
            ConnectionCommand::Clear { from } => {
                self.warn_if_unregistered(&from);
                self.broadcast(ServerMessage::Clear, None);
            }
        }
    }

    /// Compares the registry with the live connection set and repairs it.
    /// Returns true if a correction was made and broadcast.
    pub fn sweep(&mut self) -> bool {
        match self.registry.reconcile(self.live.snapshot()) {
            Some(count) => {
                log::info!("Sweep corrected user count to {}", count);
                self.broadcast_user_count();
                true
            }
            None => false,
        }
    }

    fn broadcast_user_count(&self) {
        let count = u32::try_from(self.registry.count()).unwrap_or(u32::MAX);
        self.broadcast(ServerMessage::UserCount(count), None);
    }

    fn broadcast(&self, message: ServerMessage, without: Option<&SessionId>) {
        for session in self.registry.sessions() {
            if without.map_or(false, |id| *id == session.id) {
                continue;
            }
            if !session.send(message.clone()) {
                log::debug!("Session {} is gone, skipping", session.id);
            }
        }
    }

    fn warn_if_unregistered(&self, session_id: &SessionId) {
        if !self.registry.contains(session_id) {
            log::debug!("Relaying for unregistered session {}", session_id);
        }
    }
}

pub fn spawn_server(config: &ServerConfig, live: LiveConnections) -> ServerTx {
    let sweep_interval = config.sweep_interval;
    let (srv_tx, mut srv_rx) = unbounded_channel::<ConnectionCommand>();

    tokio::spawn(async move {
        let mut server = Server::new(live);
        let mut sweep = tokio::time::interval(sweep_interval);

        log::info!("server task - started");
        loop {
            tokio::select! {
                command = srv_rx.recv() => match command {
                    Some(command) => server.handle_connection_command(command),
                    None => break,
                },
                _ = sweep.tick() => {
                    server.sweep();
                }
            }
        }
        log::info!("server task - terminated");
    });

    srv_tx
}
