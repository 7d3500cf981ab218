//! Notification sink contract. The gateway adapter implements this; the
//! reminder logic only ever sees the trait.

use async_trait::async_trait;

use crate::model::{ChannelId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("missing permission to post in channel {0}")]
    PermissionDenied(ChannelId),
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Deliver `content` to `destination`, mentioning `mention` if set.
    async fn deliver(
        &self,
        destination: ChannelId,
        content: &str,
        mention: Option<UserId>,
    ) -> Result<(), NotifyError>;
}
