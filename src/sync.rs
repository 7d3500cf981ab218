//! Mirrors guild roles and members onto the site directory. Thin glue:
//! each gateway event becomes one store call.

use std::sync::Arc;
use tracing::info;

use crate::model::{RoleRecord, UserRecord};
use crate::site::{DirectoryStore, SiteResult};

pub struct DirectorySync<S> {
    store: Arc<S>,
}

impl<S: DirectoryStore> DirectorySync<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn role_created(&self, role: &RoleRecord) -> SiteResult<()> {
        self.store.create_role(role).await?;
        info!(id = role.id, "mirrored new role");
        Ok(())
    }

    pub async fn role_updated(&self, role: &RoleRecord) -> SiteResult<()> {
        self.store.update_role(role).await?;
        info!(id = role.id, "mirrored role update");
        Ok(())
    }

    pub async fn member_joined(&self, user: &UserRecord) -> SiteResult<()> {
        let record = UserRecord {
            in_guild: true,
            ..user.clone()
        };
        self.store.upsert_user(&record).await?;
        info!(id = user.id, "mirrored member join");
        Ok(())
    }

    pub async fn member_left(&self, user: &UserRecord) -> SiteResult<()> {
        self.store.set_user_in_guild(user.id, false).await?;
        info!(id = user.id, "mirrored member leave");
        Ok(())
    }
}
