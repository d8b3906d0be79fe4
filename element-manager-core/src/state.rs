//! Reconciliation state for the element list.
//!
//! The list is optimistic: records created here are appended with a locally minted
//! sequence number even though the catalog may never return them from a later list.
//! Whether a mutation goes over the network is decided by the remote-owned id set,
//! which is a snapshot of the last successful load and is not updated by creates.

use crate::effects::{CallResult, Effect, Notice, RemoteCall};
use crate::error::SessionError;
use crate::session::EditSession;
use crate::types::{Element, ElementRef, WritePayload};
use crate::validate::{ValidationProfile, REJECTION_MESSAGE};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ElementState {
    elements: Vec<Element>,
    remote_ids: BTreeSet<String>,
    next_local_id: u64,
    profile: ValidationProfile,
    draft: Element,
    session: EditSession,
    deletes_enabled: bool,
}

impl Default for ElementState {
    fn default() -> Self {
        Self::new(ValidationProfile::default())
    }
}

impl ElementState {
    pub fn new(profile: ValidationProfile) -> Self {
        Self {
            elements: Vec::new(),
            remote_ids: BTreeSet::new(),
            next_local_id: 1,
            profile,
            draft: Element::blank_form(),
            session: EditSession::default(),
            deletes_enabled: false,
        }
    }

    // ── Accessors ──

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn remote_ids(&self) -> &BTreeSet<String> {
        &self.remote_ids
    }

    /// Sequence number the next successful create will receive.
    pub fn next_local_id(&self) -> u64 {
        self.next_local_id
    }

    pub fn profile(&self) -> ValidationProfile {
        self.profile
    }

    /// The new-element form.
    pub fn draft(&self) -> &Element {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Element {
        &mut self.draft
    }

    pub fn reset_draft(&mut self) {
        self.draft = Element::blank_form();
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// Presentation hint for delete buttons: off after a load, on after a
    /// successful create or update. Does not gate [`ElementState::delete`].
    pub fn deletes_enabled(&self) -> bool {
        self.deletes_enabled
    }

    pub fn is_remote_owned(&self, element: &Element) -> bool {
        !element.id.is_empty() && self.remote_ids.contains(&element.id)
    }

    pub fn position(&self, target: &ElementRef) -> Option<usize> {
        self.elements.iter().position(|e| e.matches(target))
    }

    pub fn find(&self, target: &ElementRef) -> Option<&Element> {
        self.position(target).map(|index| &self.elements[index])
    }

    // ── Transitions ──

    pub fn load(&self) -> Vec<Effect> {
        vec![Effect::Call(RemoteCall::List)]
    }

    /// Validate `draft` and request its creation under the next local id.
    /// The counter only advances once the create succeeds.
    pub fn create(&self, draft: &Element) -> Vec<Effect> {
        if let Err(err) = self.profile.validate(draft) {
            warn!(profile = %self.profile, error = %err, "draft rejected");
            return vec![Effect::Notify(Notice::warning(format!(
                "{} ({})",
                REJECTION_MESSAGE, err
            )))];
        }
        debug!(local_id = self.next_local_id, "requesting create");
        vec![Effect::Call(RemoteCall::Create {
            local_id: self.next_local_id,
            payload: WritePayload::from(draft),
        })]
    }

    /// [`ElementState::create`] applied to the new-element form.
    pub fn save_draft(&self) -> Vec<Effect> {
        self.create(&self.draft)
    }

    /// Remote-owned records are deleted over the network and removed once the call
    /// succeeds; anything else is removed immediately. Unknown targets are ignored.
    pub fn delete(&mut self, target: &ElementRef) -> Vec<Effect> {
        let Some(index) = self.position(target) else {
            debug!(%target, "delete target not in list");
            return Vec::new();
        };

        let element = &self.elements[index];
        if self.is_remote_owned(element) {
            return vec![Effect::Call(RemoteCall::Delete {
                id: element.id.clone(),
            })];
        }

        let removed = self.elements.remove(index);
        info!(%target, "removed locally owned element");
        vec![Effect::Notify(Notice::success(format!(
            "Deleted '{}'",
            removed.name
        )))]
    }

    /// Replace the entry that is the same record as `updated`, keeping the entry's
    /// `local_id` and, once assigned, its `id`. Returns false when nothing matched.
    pub fn update_in_list(&mut self, updated: Element) -> bool {
        let Some(existing) = self.elements.iter_mut().find(|e| e.same_record(&updated)) else {
            debug!(id = %updated.id, local_id = ?updated.local_id, "update target not in list");
            return false;
        };

        let id = if existing.id.is_empty() {
            updated.id
        } else {
            std::mem::take(&mut existing.id)
        };
        *existing = Element {
            id,
            local_id: existing.local_id,
            ..updated
        };
        true
    }

    /// Open the detail view on `target`. False when it is not in the list.
    pub fn view(&mut self, target: &ElementRef) -> bool {
        match self.find(target).cloned() {
            Some(element) => {
                self.session.open(&element);
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self) {
        self.session.close();
    }

    /// Commit the working copy.
    ///
    /// Remote-owned records produce an update call and the session stays open until
    /// its result arrives; the session is then closed whatever the outcome, so a
    /// failed update discards the edit. Other records are written into the list
    /// directly and the session closes now.
    pub fn commit(&mut self) -> Result<Vec<Effect>, SessionError> {
        let selected = self.session.selected().ok_or(SessionError::NotOpen)?;

        if self.is_remote_owned(selected) {
            let id = selected.id.clone();
            let payload = self
                .session
                .editing()
                .map(WritePayload::from)
                .ok_or(SessionError::NotOpen)?;
            debug!(%id, "requesting update");
            return Ok(vec![Effect::Call(RemoteCall::Update { id, payload })]);
        }

        let (_, editing) = self.session.take().ok_or(SessionError::NotOpen)?;
        let name = editing.name.clone();
        if self.update_in_list(editing) {
            self.deletes_enabled = true;
            Ok(vec![Effect::Notify(Notice::success(format!(
                "Updated '{}'",
                name
            )))])
        } else {
            Ok(Vec::new())
        }
    }

    /// Fold the outcome of a remote call back into the state.
    pub fn complete(&mut self, result: CallResult) -> Vec<Effect> {
        match result {
            CallResult::Listed(Ok(elements)) => {
                self.replace_all(elements);
                Vec::new()
            }
            CallResult::Listed(Err(err)) if err.is_malformed() => {
                error!(error = %err, "ignoring load: response is not a list");
                Vec::new()
            }
            CallResult::Listed(Err(err)) => {
                error!(error = %err, "failed to load elements");
                vec![Effect::Notify(Notice::error(format!(
                    "Failed to load elements: {}",
                    err
                )))]
            }

            CallResult::Created {
                local_id,
                result: Ok(created),
            } => {
                let name = created.name.clone();
                self.elements.push(Element {
                    local_id: Some(local_id),
                    ..created
                });
                self.next_local_id = self.next_local_id.max(local_id + 1);
                self.reset_draft();
                self.deletes_enabled = true;
                info!(local_id, "element created");
                vec![Effect::Notify(Notice::success(format!("Added '{}'", name)))]
            }
            CallResult::Created {
                local_id,
                result: Err(err),
            } => {
                error!(local_id, error = %err, "failed to create element");
                vec![Effect::Notify(Notice::error(format!(
                    "Failed to add element: {}",
                    err
                )))]
            }

            CallResult::Updated {
                id,
                result: Ok(updated),
            } => {
                self.session.close();
                let updated = if updated.id.is_empty() {
                    Element { id, ..updated }
                } else {
                    updated
                };
                let name = updated.name.clone();
                if self.update_in_list(updated) {
                    self.deletes_enabled = true;
                    vec![Effect::Notify(Notice::success(format!(
                        "Updated '{}'",
                        name
                    )))]
                } else {
                    Vec::new()
                }
            }
            CallResult::Updated {
                id,
                result: Err(err),
            } => {
                self.session.close();
                error!(%id, error = %err, "failed to update element");
                vec![Effect::Notify(Notice::error(format!(
                    "Failed to update element: {}",
                    err
                )))]
            }

            CallResult::Deleted { id, result: Ok(()) } => {
                let target = ElementRef::Remote(id);
                match self.position(&target) {
                    Some(index) => {
                        let removed = self.elements.remove(index);
                        info!(%target, "element deleted");
                        vec![Effect::Notify(Notice::success(format!(
                            "Deleted '{}'",
                            removed.name
                        )))]
                    }
                    None => Vec::new(),
                }
            }
            CallResult::Deleted {
                id,
                result: Err(err),
            } => {
                error!(%id, error = %err, "failed to delete element");
                vec![Effect::Notify(Notice::error(format!(
                    "Failed to delete element: {}",
                    err
                )))]
            }
        }
    }

    fn replace_all(&mut self, elements: Vec<Element>) {
        let total = elements.len();
        self.elements = elements
            .into_iter()
            .filter(|e| !e.id.is_empty())
            .map(|e| Element {
                local_id: None,
                ..e
            })
            .collect();
        if self.elements.len() != total {
            warn!(
                dropped = total - self.elements.len(),
                "ignoring listed elements without an id"
            );
        }
        self.remote_ids = self.elements.iter().map(|e| e.id.clone()).collect();
        self.next_local_id = self.elements.len() as u64 + 1;
        if self.session.is_open() {
            debug!("closing edit session: list reloaded");
            self.session.close();
        }
        self.deletes_enabled = false;
        info!(count = self.elements.len(), "elements loaded");
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::types::AttributeBag;
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_catalog() -> impl Strategy<Value = Vec<Element>> {
        prop::collection::btree_set("[a-z0-9]{1,8}", 0..12).prop_map(|ids| {
            ids.into_iter()
                .enumerate()
                .map(|(i, id)| Element {
                    name: format!("item {}", i),
                    data: vec![("price", json!(i as f64 + 1.0))]
                        .into_iter()
                        .collect::<AttributeBag>(),
                    id,
                    local_id: None,
                })
                .collect()
        })
    }

    fn arb_invalid_draft() -> impl Strategy<Value = Element> {
        let with_price = |name: &str, price: serde_json::Value| {
            Element::new(name, vec![("price", price)].into_iter().collect())
        };
        prop_oneof![
            (-1000.0f64..=0.0).prop_map(move |p| with_price("B", json!(p))),
            (1.0f64..1000.0).prop_map(move |p| with_price("", json!(p))),
            "[a-zA-Z]{1,8}".prop_map(move |s| with_price("B", json!(s))),
            Just(Element::new("B", AttributeBag::new())),
        ]
    }

    fn loaded(elements: Vec<Element>) -> ElementState {
        let mut state = ElementState::default();
        state.complete(CallResult::Listed(Ok(elements)));
        state
    }

    proptest! {
        #[test]
        fn load_marks_every_record_remote_owned(catalog in arb_catalog()) {
            let state = loaded(catalog.clone());
            prop_assert_eq!(state.elements().len(), catalog.len());
            for e in state.elements() {
                prop_assert!(state.remote_ids().contains(&e.id));
                prop_assert_eq!(e.local_id, None);
            }
            prop_assert_eq!(state.next_local_id(), catalog.len() as u64 + 1);
        }

        #[test]
        fn invalid_drafts_change_nothing(catalog in arb_catalog(), draft in arb_invalid_draft()) {
            let state = loaded(catalog);
            let effects = state.create(&draft);
            prop_assert!(effects.iter().all(|e| e.as_call().is_none()));
            prop_assert_eq!(effects.len(), 1);
        }

        #[test]
        fn each_create_advances_counter_by_one(catalog in arb_catalog(), creates in 1usize..6) {
            let mut state = loaded(catalog);
            for n in 0..creates {
                let before_len = state.elements().len();
                let before_counter = state.next_local_id();
                let draft = Element::new(
                    format!("new {}", n),
                    vec![("price", json!(1))].into_iter().collect(),
                );
                let effects = state.create(&draft);
                let Some(RemoteCall::Create { local_id, payload }) = effects[0].as_call().cloned() else {
                    panic!("expected create call, got {:?}", effects);
                };
                state.complete(CallResult::Created {
                    local_id,
                    result: Ok(payload.into_element(format!("srv-{}", n))),
                });
                prop_assert_eq!(state.next_local_id(), before_counter + 1);
                prop_assert_eq!(state.elements().len(), before_len + 1);
                prop_assert_eq!(
                    state.elements().iter().filter(|e| e.local_id == Some(before_counter)).count(),
                    1
                );
            }
        }

        #[test]
        fn open_then_close_is_a_no_op(catalog in arb_catalog(), pick in any::<prop::sample::Index>(), price in -50i64..50) {
            prop_assume!(!catalog.is_empty());
            let mut state = loaded(catalog);
            let target = state.elements()[pick.index(state.elements().len())].reference().unwrap();
            let before = serde_json::to_vec(state.find(&target).unwrap()).unwrap();

            state.view(&target);
            state.session_mut().set_attribute("price", json!(price)).unwrap();
            state.session_mut().set_name("scribble").unwrap();
            state.close();

            let after = serde_json::to_vec(state.find(&target).unwrap()).unwrap();
            prop_assert_eq!(before, after);
            prop_assert!(!state.session().is_open());
        }

        #[test]
        fn local_deletes_never_call(catalog in arb_catalog(), creates in 1u64..5) {
            let mut state = loaded(catalog);
            let first = state.next_local_id();
            for n in 0..creates {
                let draft = Element::new("x", vec![("price", json!(2))].into_iter().collect());
                let local_id = state.next_local_id();
                let payload = WritePayload::from(&draft);
                prop_assert_eq!(state.create(&draft).len(), 1);
                state.complete(CallResult::Created {
                    local_id,
                    result: Ok(payload.into_element(format!("srv-{}", n))),
                });
            }
            for local_id in first..first + creates {
                let effects = state.delete(&ElementRef::Local(local_id));
                prop_assert!(effects.iter().all(|e| e.as_call().is_none()));
            }
            prop_assert!(state.elements().iter().all(|e| e.local_id.is_none()));
        }
    }
}
