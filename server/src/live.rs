use crate::session::Session;
use sharedraw_system::SessionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Sessions whose WebSocket is actually open right now.
///
/// Connection actors add and remove themselves here directly on start and stop, ahead of
/// the commands they queue for the coordinating task. That task only reads it.
#[derive(Clone, Default)]
pub struct LiveConnections {
    inner: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl LiveConnections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) {
        self.lock().insert(session.id, session);
    }

    pub fn remove(&self, session_id: &SessionId) -> Option<Session> {
        self.lock().remove(session_id)
    }

    pub fn snapshot(&self) -> HashMap<SessionId, Session> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Session>> {
        // a panicking holder cannot leave the map half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharedraw_system::uuid::Uuid;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn it_shares_state_between_clones() {
        let live = LiveConnections::new();
        let other = live.clone();
        let (tx, _rx) = unbounded_channel();
        let id = Uuid::new_v4();

        live.insert(Session::new(id, tx));
        assert_eq!(other.len(), 1);
        assert!(other.snapshot().contains_key(&id));

        other.remove(&id).expect("");
        assert!(live.is_empty());
    }
}
