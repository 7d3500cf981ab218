use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use guildbot::events::{Dispatcher, Event};
use guildbot::model::{RoleRecord, UserId, UserRecord};
use guildbot::site::{DirectoryStore, SiteResult};
use guildbot::sync::DirectorySync;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    CreateRole(RoleRecord),
    UpdateRole(RoleRecord),
    UpsertUser(UserRecord),
    SetInGuild(UserId, bool),
}

#[derive(Default)]
struct RecordingDirectory {
    calls: Mutex<Vec<Call>>,
}

impl RecordingDirectory {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryStore for RecordingDirectory {
    async fn create_role(&self, role: &RoleRecord) -> SiteResult<()> {
        self.calls.lock().unwrap().push(Call::CreateRole(role.clone()));
        Ok(())
    }

    async fn update_role(&self, role: &RoleRecord) -> SiteResult<()> {
        self.calls.lock().unwrap().push(Call::UpdateRole(role.clone()));
        Ok(())
    }

    async fn upsert_user(&self, user: &UserRecord) -> SiteResult<()> {
        self.calls.lock().unwrap().push(Call::UpsertUser(user.clone()));
        Ok(())
    }

    async fn set_user_in_guild(&self, user_id: UserId, in_guild: bool) -> SiteResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::SetInGuild(user_id, in_guild));
        Ok(())
    }
}

fn role(id: u64) -> RoleRecord {
    RoleRecord {
        id,
        name: "Helpers".into(),
        colour: 0x00ff00,
        permissions: 104_324_673,
    }
}

fn user(id: u64) -> UserRecord {
    UserRecord {
        id,
        name: "lemon".into(),
        roles: vec![5],
        in_guild: false,
    }
}

fn wire(store: Arc<RecordingDirectory>) -> Dispatcher {
    let directory = Arc::new(DirectorySync::new(store));
    let mut dispatcher = Dispatcher::new();

    let sync = directory.clone();
    dispatcher.on_role_created(Box::new(move |role| {
        let sync = sync.clone();
        Box::pin(async move {
            sync.role_created(&role).await?;
            Ok(())
        })
    }));
    let sync = directory.clone();
    dispatcher.on_role_updated(Box::new(move |role| {
        let sync = sync.clone();
        Box::pin(async move {
            sync.role_updated(&role).await?;
            Ok(())
        })
    }));
    let sync = directory.clone();
    dispatcher.on_member_joined(Box::new(move |user| {
        let sync = sync.clone();
        Box::pin(async move {
            sync.member_joined(&user).await?;
            Ok(())
        })
    }));
    let sync = directory;
    dispatcher.on_member_left(Box::new(move |user| {
        let sync = sync.clone();
        Box::pin(async move {
            sync.member_left(&user).await?;
            Ok(())
        })
    }));
    dispatcher
}

#[tokio::test]
async fn role_events_are_mirrored() {
    let store = Arc::new(RecordingDirectory::default());
    let dispatcher = wire(store.clone());

    dispatcher.dispatch(Event::RoleCreated(role(5))).await;
    dispatcher.dispatch(Event::RoleUpdated(role(5))).await;

    assert_eq!(
        store.calls(),
        vec![Call::CreateRole(role(5)), Call::UpdateRole(role(5))]
    );
}

#[tokio::test]
async fn member_join_marks_user_in_guild() {
    let store = Arc::new(RecordingDirectory::default());
    let dispatcher = wire(store.clone());

    dispatcher.dispatch(Event::MemberJoined(user(9))).await;

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Call::UpsertUser(record) => {
            assert_eq!(record.id, 9);
            assert!(record.in_guild);
        }
        other => panic!("unexpected call: {other:?}"),
    }
}

#[tokio::test]
async fn member_leave_flips_in_guild_flag_only() {
    let store = Arc::new(RecordingDirectory::default());
    let dispatcher = wire(store.clone());

    dispatcher.dispatch(Event::MemberLeft(user(9))).await;

    assert_eq!(store.calls(), vec![Call::SetInGuild(9, false)]);
}
