use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::realtime::events::ServerEvent;

pub type ConnId = Uuid;
pub type EventSender = UnboundedSender<ServerEvent>;

/// In-memory map of live socket sessions, keyed by user. A user may hold
/// several concurrent sessions (multiple devices or tabs); presence is
/// derived from whether the set is non-empty.
///
/// Membership here is the source of truth for presence. Each connection only
/// ever inserts or removes its own entry, so a plain mutex around single-step
/// map operations is all the coordination required.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, HashMap<ConnId, EventSender>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Add a session for a user. Returns true when this is the user's first
    /// live session (an offline -> online transition).
    pub fn register(&self, user_id: Uuid, conn_id: ConnId, sender: EventSender) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        let conns = sessions.entry(user_id).or_default();
        let first = conns.is_empty();
        conns.insert(conn_id, sender);
        first
    }

    /// Remove one session. Returns true when it was the user's last live
    /// session (an online -> offline transition).
    pub fn unregister(&self, user_id: Uuid, conn_id: ConnId) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        let Some(conns) = sessions.get_mut(&user_id) else {
            return false;
        };
        conns.remove(&conn_id);
        if conns.is_empty() {
            sessions.remove(&user_id);
            true
        } else {
            false
        }
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.sessions.lock().unwrap().contains_key(&user_id)
    }

    pub fn session_count(&self, user_id: Uuid) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .get(&user_id)
            .map_or(0, HashMap::len)
    }

    /// Deliver an event to every live session of one user. Returns how many
    /// sessions it was handed to; zero when the user is offline.
    pub fn send_to_user(&self, user_id: Uuid, event: ServerEvent) -> usize {
        let sessions = self.sessions.lock().unwrap();
        let Some(conns) = sessions.get(&user_id) else {
            return 0;
        };
        let mut delivered = 0;
        for sender in conns.values() {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Deliver an event to every connected session except one (the socket
    /// that triggered it). Used for presence announcements.
    pub fn broadcast_except(&self, except: ConnId, event: ServerEvent) {
        let sessions = self.sessions.lock().unwrap();
        for conns in sessions.values() {
            for (conn_id, sender) in conns {
                if *conn_id != except {
                    let _ = sender.send(event.clone());
                }
            }
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
