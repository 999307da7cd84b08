use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{service::DbService, DbPool, User};
use crate::realtime::events::ServerEvent;
use crate::realtime::registry::{ConnId, EventSender, SessionRegistry};

/// Derives online/offline state from registry membership transitions and
/// mirrors it into the durable store. The store flag is best effort: if the
/// process dies without a clean disconnect it goes stale until the user
/// reconnects, which is acceptable.
#[derive(Clone)]
pub struct PresenceTracker {
    registry: Arc<SessionRegistry>,
    pool: DbPool,
}

impl PresenceTracker {
    pub fn new(registry: Arc<SessionRegistry>, pool: DbPool) -> Self {
        Self { registry, pool }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.registry.is_online(user_id)
    }

    /// Admit a freshly authenticated session: register it, refresh the
    /// durable flag, and announce the user to everyone else connected.
    pub fn connected(&self, user: &User, conn_id: ConnId, sender: EventSender) {
        let first = self.registry.register(user.id, conn_id, sender);

        {
            let conn = self.pool.lock().unwrap();
            if let Err(e) = DbService::set_presence(&conn, user.id, true) {
                warn!("Failed to persist online flag for {}: {}", user.username, e);
            }
        }

        if first {
            info!("User connected: {} ({})", user.username, user.id);
        }

        self.registry.broadcast_except(
            conn_id,
            ServerEvent::UserOnline {
                user_id: user.id,
                username: user.username.clone(),
            },
        );
    }

    /// Drop one session. Only when the user's last session is gone does the
    /// user go offline, both in the store and on the wire.
    pub fn disconnected(&self, user: &User, conn_id: ConnId) {
        let last = self.registry.unregister(user.id, conn_id);
        if !last {
            return;
        }

        info!("User disconnected: {}", user.username);

        {
            let conn = self.pool.lock().unwrap();
            if let Err(e) = DbService::set_presence(&conn, user.id, false) {
                warn!("Failed to persist offline flag for {}: {}", user.username, e);
            }
        }

        self.registry
            .broadcast_except(conn_id, ServerEvent::UserOffline { user_id: user.id });
    }
}
