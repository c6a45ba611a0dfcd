use sharedraw_system::{ServerMessage, SessionId};
use std::fmt;
use std::time::SystemTime;
use tokio::sync::mpsc::UnboundedSender;

pub type ConnectionTx = UnboundedSender<ServerMessage>;

/// One connected participant as seen by the server.
#[derive(Clone)]
pub struct Session {
    pub id: SessionId,
    pub connected_at: SystemTime,
    pub tx: ConnectionTx,
}

impl Session {
    pub fn new(id: SessionId, tx: ConnectionTx) -> Self {
        Self {
            id,
            connected_at: SystemTime::now(),
            tx,
        }
    }

    /// Fire-and-forget. Returns false if the connection is already gone.
    pub fn send(&self, message: ServerMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .finish()
    }
}
