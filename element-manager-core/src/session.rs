//! Edit session: the record open in the detail view.
//!
//! `selected` is a snapshot of the list entry at the moment it was opened and
//! `editing` is an independent working copy. Nothing written to the working copy
//! reaches the list until the owning [`crate::ElementState`] commits it.

use crate::error::SessionError;
use crate::types::Element;
use serde_json::Value;

/// Immutable copy of a working copy, for restoring later.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Element);

impl Snapshot {
    pub fn element(&self) -> &Element {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSession {
    selected: Option<Element>,
    editing: Option<Element>,
    visible: bool,
}

impl EditSession {
    pub fn open(&mut self, element: &Element) {
        self.selected = Some(element.clone());
        self.editing = Some(element.clone());
        self.visible = true;
    }

    /// Tear down, discarding uncommitted edits.
    pub fn close(&mut self) {
        self.selected = None;
        self.editing = None;
        self.visible = false;
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn selected(&self) -> Option<&Element> {
        self.selected.as_ref()
    }

    pub fn editing(&self) -> Option<&Element> {
        self.editing.as_ref()
    }

    /// True when the working copy differs from the opened record.
    pub fn is_dirty(&self) -> bool {
        self.selected != self.editing
    }

    fn working_copy(&mut self) -> Result<&mut Element, SessionError> {
        self.editing.as_mut().ok_or(SessionError::NotOpen)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), SessionError> {
        self.working_copy()?.name = name.into();
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, SessionError> {
        Ok(self.working_copy()?.data.insert(key, value))
    }

    pub fn remove_attribute(&mut self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(self.working_copy()?.data.remove(key))
    }

    pub fn snapshot(&self) -> Result<Snapshot, SessionError> {
        self.editing
            .clone()
            .map(Snapshot)
            .ok_or(SessionError::NotOpen)
    }

    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), SessionError> {
        *self.working_copy()? = snapshot.0;
        Ok(())
    }

    /// Throw away edits, keeping the session open.
    pub fn revert(&mut self) -> Result<(), SessionError> {
        let original = self.selected.clone().ok_or(SessionError::NotOpen)?;
        *self.working_copy()? = original;
        Ok(())
    }

    /// Close and hand back `(selected, editing)`.
    pub(crate) fn take(&mut self) -> Option<(Element, Element)> {
        let pair = self.selected.take().zip(self.editing.take());
        self.close();
        pair
    }
}
