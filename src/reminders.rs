//! Reminder domain logic: bridges the site store and the scheduler.
//!
//! The store is the source of truth. Every mutating operation writes the
//! store first and touches the scheduler only after the write succeeds,
//! except the fire path, which always clears its scheduler entry so a
//! failed remote delete can at worst cause a duplicate notification after
//! a restart, never a stuck timer.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::model::{ChannelId, NewReminder, Reminder, ReminderId, ReminderPatch, RoleId, UserId};
use crate::notify::{Notifier, NotifyError};
use crate::scheduler::{ScheduleError, Scheduler};
use crate::site::{ReminderStore, SiteError};
use crate::timefmt;

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("no such active reminder")]
    NotFound,
    #[error("reminders are not allowed in this channel")]
    PermissionDenied,
    #[error("you have too many active reminders (limit {0})")]
    LimitExceeded(usize),
    #[error(transparent)]
    Store(SiteError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl From<SiteError> for ReminderError {
    fn from(err: SiteError) -> Self {
        match err {
            SiteError::NotFound => ReminderError::NotFound,
            other => ReminderError::Store(other),
        }
    }
}

/// Who is asking, and from where. Staff bypass the channel allow-list and
/// the per-user cap.
#[derive(Debug, Clone)]
pub struct Invoker {
    pub user_id: UserId,
    pub roles: Vec<RoleId>,
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone)]
pub struct ReminderPolicy {
    pub max_per_user: usize,
    pub whitelisted_channels: Vec<ChannelId>,
    pub staff_roles: Vec<RoleId>,
}

impl ReminderPolicy {
    fn is_staff(&self, invoker: &Invoker) -> bool {
        invoker.roles.iter().any(|r| self.staff_roles.contains(r))
    }
}

pub struct Reminders<S, N> {
    inner: Arc<Inner<S, N>>,
}

impl<S, N> Clone for Reminders<S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S, N> {
    store: S,
    notifier: N,
    scheduler: Scheduler,
    policy: ReminderPolicy,
}

impl<S, N> Reminders<S, N>
where
    S: ReminderStore,
    N: Notifier,
{
    pub fn new(store: S, notifier: N, scheduler: Scheduler, policy: ReminderPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                notifier,
                scheduler,
                policy,
            }),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Load all active reminders from the store, firing overdue ones
    /// immediately and scheduling the rest. A failure on one reminder is
    /// logged and does not abort the remainder.
    #[instrument(skip_all)]
    pub async fn recover(&self) -> Result<(), ReminderError> {
        let reminders = self.inner.store.active_reminders().await?;
        let now = Utc::now();
        info!(count = reminders.len(), "recovering reminders");

        for reminder in reminders {
            if reminder.expiration < now {
                let late = now - reminder.expiration;
                if let Err(err) = self.send_reminder(&reminder, Some(late)).await {
                    warn!(?err, id = reminder.id, "failed to fire overdue reminder");
                }
            } else if let Err(err) = self.schedule_reminder(reminder.clone()) {
                warn!(?err, id = reminder.id, "failed to schedule reminder");
            }
        }
        Ok(())
    }

    /// Create a reminder for `invoker`, applying the channel allow-list
    /// and the per-user cap to non-staff invokers. The store write happens
    /// before any scheduler mutation.
    #[instrument(skip_all)]
    pub async fn create(
        &self,
        invoker: &Invoker,
        content: &str,
        expiration: DateTime<Utc>,
    ) -> Result<Reminder, ReminderError> {
        let policy = &self.inner.policy;
        if !policy.is_staff(invoker) {
            if !policy.whitelisted_channels.contains(&invoker.channel_id) {
                return Err(ReminderError::PermissionDenied);
            }
            let active = self.inner.store.reminders_for_user(invoker.user_id).await?;
            if active.len() >= policy.max_per_user {
                return Err(ReminderError::LimitExceeded(policy.max_per_user));
            }
        }

        let reminder = self
            .inner
            .store
            .create_reminder(&NewReminder {
                author: invoker.user_id,
                channel_id: invoker.channel_id,
                content: content.to_string(),
                expiration,
            })
            .await?;

        info!(id = reminder.id, %expiration, "created reminder");
        self.schedule_reminder(reminder.clone())?;
        Ok(reminder)
    }

    /// Change a reminder's expiration. `NotFound` means it already fired;
    /// nothing is rescheduled in that case.
    pub async fn edit_expiration(
        &self,
        id: ReminderId,
        expiration: DateTime<Utc>,
    ) -> Result<Reminder, ReminderError> {
        self.edit(
            id,
            ReminderPatch {
                expiration: Some(expiration),
                ..Default::default()
            },
        )
        .await
    }

    /// Change a reminder's content, keeping its deadline.
    pub async fn edit_content(
        &self,
        id: ReminderId,
        content: &str,
    ) -> Result<Reminder, ReminderError> {
        self.edit(
            id,
            ReminderPatch {
                content: Some(content.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    async fn edit(&self, id: ReminderId, patch: ReminderPatch) -> Result<Reminder, ReminderError> {
        let updated = self.inner.store.update_reminder(id, &patch).await?;
        self.inner.scheduler.cancel(id);
        self.schedule_reminder(updated.clone())?;
        info!(id, "edited reminder");
        Ok(updated)
    }

    /// Delete a reminder. The scheduler cancel runs even when the store
    /// reports the reminder missing, so no timer can outlive the record.
    pub async fn delete(&self, id: ReminderId) -> Result<(), ReminderError> {
        let result = self.inner.store.delete_reminder(id).await;
        self.inner.scheduler.cancel(id);
        result?;
        info!(id, "deleted reminder");
        Ok(())
    }

    /// Render one line per reminder, soonest first. Pure query.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<String>, ReminderError> {
        let mut reminders = self.inner.store.reminders_for_user(user_id).await?;
        reminders.sort_by_key(|r| r.expiration);

        let now = Utc::now();
        Ok(reminders
            .iter()
            .map(|r| {
                format!(
                    "**Reminder #{}:** *expires in {}* (ID: {})\n{}",
                    r.id,
                    timefmt::humanize(r.expiration - now, 2),
                    r.id,
                    r.content
                )
            })
            .collect())
    }

    fn schedule_reminder(&self, reminder: Reminder) -> Result<(), ScheduleError> {
        let this = self.clone();
        let id = reminder.id;
        let deadline = reminder.expiration;
        self.inner.scheduler.schedule(id, deadline, async move {
            this.send_reminder(&reminder, None).await?;
            Ok(())
        })
    }

    /// Deliver the notification, then delete the remote record. A missing
    /// record is benign (already deleted); a transport failure is logged
    /// but does not keep the entry alive.
    async fn send_reminder(
        &self,
        reminder: &Reminder,
        late: Option<chrono::Duration>,
    ) -> Result<(), ReminderError> {
        let content = match late {
            Some(late) => format!(
                "Sorry it arrived {} late! Here's your reminder: `{}`",
                timefmt::humanize(late, 2),
                reminder.content
            ),
            None => format!("It has arrived! Here's your reminder: `{}`", reminder.content),
        };

        self.inner
            .notifier
            .deliver(reminder.channel_id, &content, Some(reminder.author))
            .await?;

        match self.inner.store.delete_reminder(reminder.id).await {
            Ok(()) | Err(SiteError::NotFound) => {}
            Err(err) => warn!(?err, id = reminder.id, "failed to delete fired reminder"),
        }
        self.inner.scheduler.cancel(reminder.id);
        Ok(())
    }
}
