use crate::session::Session;
use sharedraw_system::SessionId;
use std::collections::HashMap;

/// Sessions the server believes are connected. The presence count is derived from it.
pub struct ConnectionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Adds a session and returns the new count. Joining twice changes nothing.
    pub fn on_join(&mut self, session: Session) -> usize {
        let session_id = session.id;
        if self.sessions.contains_key(&session_id) {
            log::debug!("Session {} joined twice", session_id);
        } else {
            self.sessions.insert(session_id, session);
            log::info!(
                "User connected ({}). Total users: {}",
                session_id,
                self.count()
            );
        }
        self.count()
    }

    /// Removes a session and returns the new count. Leaving twice changes nothing.
    pub fn on_leave(&mut self, session_id: &SessionId) -> usize {
        if self.sessions.remove(session_id).is_some() {
            log::info!(
                "User disconnected ({}). Total users: {}",
                session_id,
                self.count()
            );
        } else {
            log::debug!("Session {} left but was not registered", session_id);
        }
        self.count()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Adopts `authoritative` if its members differ from ours. Returns the corrected count.
    pub fn reconcile(&mut self, authoritative: HashMap<SessionId, Session>) -> Option<usize> {
        let in_sync = authoritative.len() == self.sessions.len()
            && authoritative.keys().all(|id| self.sessions.contains_key(id));
        if in_sync {
            None
        } else {
            log::info!(
                "Registry drifted: tracked {}, live {}",
                self.sessions.len(),
                authoritative.len()
            );
            self.sessions = authoritative;
            Some(self.count())
        }
    }
}

impl std::default::Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharedraw_system::uuid::Uuid;
    use tokio::sync::mpsc::unbounded_channel;

    fn session() -> Session {
        let (tx, _rx) = unbounded_channel();
        Session::new(Uuid::new_v4(), tx)
    }

    #[test]
    fn it_counts_joins_and_leaves() {
        let mut registry = ConnectionRegistry::new();
        let (s1, s2) = (session(), session());
        let s1_id = s1.id;

        assert_eq!(registry.on_join(s1), 1);
        assert_eq!(registry.on_join(s2), 2);
        assert_eq!(registry.on_leave(&s1_id), 1);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn it_ignores_duplicate_join_and_late_leave() {
        let mut registry = ConnectionRegistry::new();
        let s1 = session();
        let s1_id = s1.id;

        assert_eq!(registry.on_join(s1.clone()), 1);
        assert_eq!(registry.on_join(s1), 1);
        assert_eq!(registry.on_leave(&s1_id), 0);
        assert_eq!(registry.on_leave(&s1_id), 0);
        assert_eq!(registry.on_leave(&Uuid::new_v4()), 0);
    }

    #[test]
    fn it_adopts_authoritative_set_only_on_mismatch() {
        let mut registry = ConnectionRegistry::new();
        let (s1, s2, s3) = (session(), session(), session());
        registry.on_join(s1.clone());
        registry.on_join(s2.clone());

        let same = vec![(s1.id, s1.clone()), (s2.id, s2.clone())]
            .into_iter()
            .collect::<HashMap<_, _>>();
        assert_eq!(registry.reconcile(same), None);

        // s2 vanished without a leave, s3 appeared without a join
        let live = vec![(s1.id, s1.clone()), (s3.id, s3.clone())]
            .into_iter()
            .collect::<HashMap<_, _>>();
        assert_eq!(registry.reconcile(live), Some(2));
        assert!(registry.contains(&s3.id));
        assert!(!registry.contains(&s2.id));
    }
}
