//! Message surface contract: the handful of message operations the
//! paginator needs, implemented by the gateway adapter.

use async_trait::async_trait;

use crate::model::{MessageId, ReactionEvent, UserId};

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("missing permission")]
    PermissionDenied,
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait MessageSurface: Send + Sync {
    /// Post a new message, returning its id.
    async fn send(&self, body: &str, footer: Option<&str>) -> Result<MessageId, SurfaceError>;

    async fn edit(
        &self,
        message: MessageId,
        body: &str,
        footer: Option<&str>,
    ) -> Result<(), SurfaceError>;

    async fn add_reaction(&self, message: MessageId, emoji: &str) -> Result<(), SurfaceError>;

    async fn remove_reaction(
        &self,
        message: MessageId,
        emoji: &str,
        user: UserId,
    ) -> Result<(), SurfaceError>;

    async fn clear_reactions(&self, message: MessageId) -> Result<(), SurfaceError>;
}

/// Inbound reaction stream the paginator waits on. `None` means the
/// gateway connection is gone and the wait will never complete.
#[async_trait]
pub trait ReactionWaiter: Send {
    async fn next_reaction(&mut self) -> Option<ReactionEvent>;
}
