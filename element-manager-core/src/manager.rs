//! ElementManager: runs [`ElementState`] transitions against a store and a notifier.
//!
//! Every operation takes `&mut self` and awaits its remote call before returning, so
//! at most one call is in flight per manager.

use crate::effects::{CallResult, Effect, Notice, RemoteCall};
use crate::error::SessionError;
use crate::notify::Notifier;
use crate::session::EditSession;
use crate::state::ElementState;
use crate::store::RemoteStore;
use crate::types::{Element, ElementRef};
use crate::validate::ValidationProfile;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

pub struct ElementManager {
    state: ElementState,
    store: Arc<dyn RemoteStore>,
    notifier: Arc<dyn Notifier>,
    confirm_deletes: bool,
}

impl ElementManager {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        notifier: Arc<dyn Notifier>,
        profile: ValidationProfile,
    ) -> Self {
        Self {
            state: ElementState::new(profile),
            store,
            notifier,
            confirm_deletes: true,
        }
    }

    /// Whether [`ElementManager::delete`] asks the notifier first (default true).
    pub fn with_confirm_deletes(mut self, confirm_deletes: bool) -> Self {
        self.confirm_deletes = confirm_deletes;
        self
    }

    pub fn state(&self) -> &ElementState {
        &self.state
    }

    pub fn elements(&self) -> &[Element] {
        self.state.elements()
    }

    /// Reload from the store. Returns the notices raised, so one-shot callers can
    /// tell a failed load from an empty catalog.
    pub async fn load(&mut self) -> Vec<Notice> {
        let effects = self.state.load();
        self.run(effects).await
    }

    // ── New-element form ──

    pub fn draft(&self) -> &Element {
        self.state.draft()
    }

    pub fn set_draft_name(&mut self, name: impl Into<String>) {
        self.state.draft_mut().name = name.into();
    }

    pub fn set_draft_field(&mut self, key: impl Into<String>, value: Value) {
        self.state.draft_mut().data.insert(key, value);
    }

    pub fn reset_draft(&mut self) {
        self.state.reset_draft();
    }

    /// Submit the form. Invalid drafts are rejected with a warning and no call.
    pub async fn save_draft(&mut self) {
        let effects = self.state.save_draft();
        self.run(effects).await;
    }

    /// Fill the form with `draft` and submit it.
    pub async fn create(&mut self, draft: Element) {
        *self.state.draft_mut() = draft;
        self.save_draft().await;
    }

    // ── Delete ──

    /// Delete `target` after confirmation. Unknown targets are ignored without
    /// prompting.
    pub async fn delete(&mut self, target: &ElementRef) {
        let Some(element) = self.state.find(target) else {
            debug!(%target, "delete target not in list");
            return;
        };

        if self.confirm_deletes {
            let prompt = format!("Delete '{}' ({})?", element.name, target);
            if !self.notifier.confirm(&prompt).await {
                debug!(%target, "delete cancelled");
                return;
            }
        }

        let effects = self.state.delete(target);
        self.run(effects).await;
    }

    // ── Edit session ──

    /// Open the detail view on `target`. False when it is not in the list.
    pub fn view(&mut self, target: &ElementRef) -> bool {
        self.state.view(target)
    }

    pub fn session(&self) -> &EditSession {
        self.state.session()
    }

    pub fn session_mut(&mut self) -> &mut EditSession {
        self.state.session_mut()
    }

    pub fn close(&mut self) {
        self.state.close();
    }

    /// Commit the open session. The session is closed afterwards even when the
    /// update call fails.
    pub async fn commit(&mut self) -> Result<(), SessionError> {
        let effects = self.state.commit()?;
        self.run(effects).await;
        Ok(())
    }

    // ── Effect loop ──

    async fn run(&mut self, effects: Vec<Effect>) -> Vec<Notice> {
        let mut delivered = Vec::new();
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Notify(notice) => {
                    self.notifier.notify(notice.kind, &notice.message).await;
                    delivered.push(notice);
                }
                Effect::Call(call) => {
                    debug!(verb = call.verb(), "dispatching remote call");
                    let result = self.dispatch(call).await;
                    queue.extend(self.state.complete(result));
                }
            }
        }
        delivered
    }

    async fn dispatch(&self, call: RemoteCall) -> CallResult {
        match call {
            RemoteCall::List => CallResult::Listed(self.store.list().await),
            RemoteCall::Create { local_id, payload } => CallResult::Created {
                local_id,
                result: self.store.create(&payload).await,
            },
            RemoteCall::Update { id, payload } => {
                let result = self.store.update(&id, &payload).await;
                CallResult::Updated { id, result }
            }
            RemoteCall::Delete { id } => {
                let result = self.store.delete(&id).await;
                CallResult::Deleted { id, result }
            }
        }
    }
}
