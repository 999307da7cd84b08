pub mod channel;
pub mod events;
pub mod presence;
pub mod registry;

use thiserror::Error;

pub use channel::MessagingChannel;
pub use presence::PresenceTracker;
pub use registry::SessionRegistry;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("{0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(#[from] duckdb::Error),
}
