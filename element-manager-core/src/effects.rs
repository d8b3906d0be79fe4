//! Side-effect requests produced by [`crate::ElementState`] transitions, and the
//! results fed back into it.

use crate::error::StoreError;
use crate::types::{Element, WritePayload};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
            NoticeKind::Warning => "warning",
        };
        write!(f, "{}", label)
    }
}

/// A message for the user-facing notification surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }
}

/// One request against the remote collection.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    List,
    /// `local_id` is the sequence number reserved for the record if the call succeeds.
    Create {
        local_id: u64,
        payload: WritePayload,
    },
    Update {
        id: String,
        payload: WritePayload,
    },
    Delete {
        id: String,
    },
}

impl RemoteCall {
    pub fn verb(&self) -> &'static str {
        match self {
            RemoteCall::List => "list",
            RemoteCall::Create { .. } => "create",
            RemoteCall::Update { .. } => "update",
            RemoteCall::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Call(RemoteCall),
    Notify(Notice),
}

impl Effect {
    pub fn as_call(&self) -> Option<&RemoteCall> {
        match self {
            Effect::Call(call) => Some(call),
            Effect::Notify(_) => None,
        }
    }

    pub fn as_notice(&self) -> Option<&Notice> {
        match self {
            Effect::Notify(notice) => Some(notice),
            Effect::Call(_) => None,
        }
    }
}

/// Outcome of a [`RemoteCall`], carrying what the state needs to route it.
#[derive(Debug)]
pub enum CallResult {
    Listed(Result<Vec<Element>, StoreError>),
    Created {
        local_id: u64,
        result: Result<Element, StoreError>,
    },
    Updated {
        id: String,
        result: Result<Element, StoreError>,
    },
    Deleted {
        id: String,
        result: Result<(), StoreError>,
    },
}
