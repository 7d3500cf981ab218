//! Gateway event model and dispatch.
//!
//! Events arrive as a tagged union and are fanned out to callbacks
//! registered per variant. One failing callback is logged and does not
//! stop the others.

use futures::future::BoxFuture;
use tracing::warn;

use crate::model::{ReactionEvent, RoleRecord, UserRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ReactionAdded(ReactionEvent),
    ReactionRemoved(ReactionEvent),
    MemberJoined(UserRecord),
    MemberLeft(UserRecord),
    RoleCreated(RoleRecord),
    RoleUpdated(RoleRecord),
}

pub type Callback<T> = Box<dyn Fn(T) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Per-variant dispatch table.
#[derive(Default)]
pub struct Dispatcher {
    reaction_added: Vec<Callback<ReactionEvent>>,
    reaction_removed: Vec<Callback<ReactionEvent>>,
    member_joined: Vec<Callback<UserRecord>>,
    member_left: Vec<Callback<UserRecord>>,
    role_created: Vec<Callback<RoleRecord>>,
    role_updated: Vec<Callback<RoleRecord>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_reaction_added(&mut self, cb: Callback<ReactionEvent>) -> &mut Self {
        self.reaction_added.push(cb);
        self
    }

    pub fn on_reaction_removed(&mut self, cb: Callback<ReactionEvent>) -> &mut Self {
        self.reaction_removed.push(cb);
        self
    }

    pub fn on_member_joined(&mut self, cb: Callback<UserRecord>) -> &mut Self {
        self.member_joined.push(cb);
        self
    }

    pub fn on_member_left(&mut self, cb: Callback<UserRecord>) -> &mut Self {
        self.member_left.push(cb);
        self
    }

    pub fn on_role_created(&mut self, cb: Callback<RoleRecord>) -> &mut Self {
        self.role_created.push(cb);
        self
    }

    pub fn on_role_updated(&mut self, cb: Callback<RoleRecord>) -> &mut Self {
        self.role_updated.push(cb);
        self
    }

    /// Invoke every callback registered for the event's variant.
    pub async fn dispatch(&self, event: Event) {
        match event {
            Event::ReactionAdded(ev) => run(&self.reaction_added, ev, "reaction_added").await,
            Event::ReactionRemoved(ev) => run(&self.reaction_removed, ev, "reaction_removed").await,
            Event::MemberJoined(ev) => run(&self.member_joined, ev, "member_joined").await,
            Event::MemberLeft(ev) => run(&self.member_left, ev, "member_left").await,
            Event::RoleCreated(ev) => run(&self.role_created, ev, "role_created").await,
            Event::RoleUpdated(ev) => run(&self.role_updated, ev, "role_updated").await,
        }
    }
}

async fn run<T: Clone>(callbacks: &[Callback<T>], event: T, kind: &'static str) {
    for cb in callbacks {
        if let Err(err) = cb(event.clone()).await {
            warn!(?err, kind, "event handler failed");
        }
    }
}
