use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type ChannelId = u64;
pub type MessageId = u64;
pub type RoleId = u64;
pub type GuildId = u64;
pub type ReminderId = i64;

/// A reminder as stored by the site API. `expiration` is the absolute
/// deadline at which it fires; ids are assigned by the site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub author: UserId,
    pub channel_id: ChannelId,
    pub content: String,
    pub expiration: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Payload for creating a reminder; the site assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewReminder {
    pub author: UserId,
    pub channel_id: ChannelId,
    pub content: String,
    pub expiration: DateTime<Utc>,
}

/// Partial update for a reminder. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

/// One starboard record: the starred message and the bot's companion
/// message on the starboard channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StarboardEntry {
    pub message_id: MessageId,
    pub bot_message_id: MessageId,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub jump_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    pub colour: u32,
    pub permissions: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub roles: Vec<RoleId>,
    pub in_guild: bool,
}

/// A raw reaction event as delivered by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionEvent {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub emoji: String,
    pub guild_id: Option<GuildId>,
}
