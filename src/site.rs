//! Client for the companion site API: the source of truth for reminders,
//! starboard entries and the role/user directory.
//!
//! Expected conditions (entity absent, entry already stored) are variants,
//! not transport faults, so callers can branch on them without string
//! matching.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::config::Config;
use crate::model::{
    MessageId, NewReminder, Reminder, ReminderId, ReminderPatch, RoleRecord, StarboardEntry,
    UserId, UserRecord,
};

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("entity not found")]
    NotFound,
    #[error("entity already exists")]
    AlreadyExists,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("site error {status}: {body}")]
    Api { status: StatusCode, body: String },
}

pub type SiteResult<T> = Result<T, SiteError>;

/// CRUD over reminders.
#[async_trait]
pub trait ReminderStore: Send + Sync + 'static {
    /// All reminders still flagged active, across users.
    async fn active_reminders(&self) -> SiteResult<Vec<Reminder>>;

    /// Active reminders owned by one user.
    async fn reminders_for_user(&self, user_id: UserId) -> SiteResult<Vec<Reminder>>;

    async fn create_reminder(&self, new: &NewReminder) -> SiteResult<Reminder>;

    /// Partial update; `NotFound` when the reminder no longer exists
    /// (typically because it already fired).
    async fn update_reminder(&self, id: ReminderId, patch: &ReminderPatch) -> SiteResult<Reminder>;

    async fn delete_reminder(&self, id: ReminderId) -> SiteResult<()>;
}

/// CRUD over starboard entries, keyed by the starred message id.
#[async_trait]
pub trait StarboardStore: Send + Sync + 'static {
    async fn all_entries(&self) -> SiteResult<Vec<StarboardEntry>>;
    async fn get_entry(&self, message_id: MessageId) -> SiteResult<StarboardEntry>;
    async fn create_entry(&self, entry: &StarboardEntry) -> SiteResult<()>;
    async fn delete_entry(&self, message_id: MessageId) -> SiteResult<()>;
    async fn delete_all(&self) -> SiteResult<()>;
}

/// Mirror of guild roles and members.
#[async_trait]
pub trait DirectoryStore: Send + Sync + 'static {
    async fn create_role(&self, role: &RoleRecord) -> SiteResult<()>;
    async fn update_role(&self, role: &RoleRecord) -> SiteResult<()>;
    async fn upsert_user(&self, user: &UserRecord) -> SiteResult<()>;
    async fn set_user_in_guild(&self, user_id: UserId, in_guild: bool) -> SiteResult<()>;
}

#[derive(Clone)]
pub struct SiteClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for SiteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SiteClient {
    pub fn from_config(cfg: &Config) -> SiteResult<Self> {
        let base_url = Url::parse(&cfg.site.base_url)
            .map_err(|_| SiteError::Api {
                status: StatusCode::BAD_REQUEST,
                body: "invalid site.base_url".into(),
            })?;
        Ok(Self::with_base_url(cfg.site.api_key.clone(), base_url))
    }

    pub fn with_base_url(api_key: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("guildbot/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> SiteResult<Url> {
        self.base_url.join(path).map_err(|err| SiteError::Api {
            status: StatusCode::BAD_REQUEST,
            body: format!("invalid endpoint {path}: {err}"),
        })
    }

    async fn check(res: reqwest::Response) -> SiteResult<reqwest::Response> {
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SiteError::NotFound);
        }
        if status == StatusCode::CONFLICT {
            return Err(SiteError::AlreadyExists);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body, "site API error");
            return Err(SiteError::Api { status, body });
        }
        Ok(res)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SiteResult<T> {
        let res = self
            .http
            .get(self.endpoint(path)?)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        Ok(Self::check(res).await?.json::<T>().await?)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> SiteResult<reqwest::Response> {
        let res = self
            .http
            .request(method, self.endpoint(path)?)
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await?;
        Self::check(res).await
    }

    async fn delete(&self, path: &str) -> SiteResult<()> {
        let res = self
            .http
            .delete(self.endpoint(path)?)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for SiteClient {
    async fn active_reminders(&self) -> SiteResult<Vec<Reminder>> {
        self.get_json("bot/reminders?active=true").await
    }

    async fn reminders_for_user(&self, user_id: UserId) -> SiteResult<Vec<Reminder>> {
        self.get_json(&format!("bot/reminders?user__id={user_id}"))
            .await
    }

    async fn create_reminder(&self, new: &NewReminder) -> SiteResult<Reminder> {
        let res = self
            .send_json(reqwest::Method::POST, "bot/reminders", new)
            .await?;
        Ok(res.json().await?)
    }

    async fn update_reminder(&self, id: ReminderId, patch: &ReminderPatch) -> SiteResult<Reminder> {
        let res = self
            .send_json(reqwest::Method::PATCH, &format!("bot/reminders/{id}"), patch)
            .await?;
        Ok(res.json().await?)
    }

    async fn delete_reminder(&self, id: ReminderId) -> SiteResult<()> {
        self.delete(&format!("bot/reminders/{id}")).await
    }
}

#[async_trait]
impl StarboardStore for SiteClient {
    async fn all_entries(&self) -> SiteResult<Vec<StarboardEntry>> {
        #[derive(serde::Deserialize)]
        struct Listing {
            messages: Vec<StarboardEntry>,
        }
        let listing: Listing = self.get_json("bot/starboard").await?;
        Ok(listing.messages)
    }

    async fn get_entry(&self, message_id: MessageId) -> SiteResult<StarboardEntry> {
        self.get_json(&format!("bot/starboard?message_id={message_id}"))
            .await
    }

    async fn create_entry(&self, entry: &StarboardEntry) -> SiteResult<()> {
        // The starboard endpoint answers 400 when the message is already
        // stored; elsewhere a 400 is a genuine request error.
        match self
            .send_json(reqwest::Method::POST, "bot/starboard", entry)
            .await
        {
            Err(SiteError::Api { status, .. }) if status == StatusCode::BAD_REQUEST => {
                Err(SiteError::AlreadyExists)
            }
            Err(err) => Err(err),
            Ok(_) => Ok(()),
        }
    }

    async fn delete_entry(&self, message_id: MessageId) -> SiteResult<()> {
        self.delete(&format!("bot/starboard?message_id={message_id}"))
            .await
    }

    async fn delete_all(&self) -> SiteResult<()> {
        self.delete("bot/starboard/delete").await
    }
}

#[async_trait]
impl DirectoryStore for SiteClient {
    async fn create_role(&self, role: &RoleRecord) -> SiteResult<()> {
        self.send_json(reqwest::Method::POST, "bot/roles", role)
            .await?;
        Ok(())
    }

    async fn update_role(&self, role: &RoleRecord) -> SiteResult<()> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("bot/roles/{}", role.id),
            role,
        )
        .await?;
        Ok(())
    }

    async fn upsert_user(&self, user: &UserRecord) -> SiteResult<()> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("bot/users/{}", user.id),
            user,
        )
        .await?;
        Ok(())
    }

    async fn set_user_in_guild(&self, user_id: UserId, in_guild: bool) -> SiteResult<()> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("bot/users/{user_id}"),
            &serde_json::json!({ "in_guild": in_guild }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SiteClient {
        SiteClient::with_base_url(
            "secret-token".into(),
            Url::parse("https://api.example.org/").unwrap(),
        )
    }

    #[test]
    fn endpoint_joins_against_base() {
        let c = client();
        let url = c.endpoint("bot/reminders?active=true").unwrap();
        assert_eq!(url.as_str(), "https://api.example.org/bot/reminders?active=true");
    }

    #[test]
    fn debug_redacts_api_key() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("base_url"));
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = ReminderPatch {
            content: Some("updated".into()),
            expiration: None,
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "updated" }));
    }
}
