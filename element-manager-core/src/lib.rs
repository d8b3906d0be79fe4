//! Element manager core
//!
//! State management for a CRUD view over a remote object catalog whose writes are
//! accepted but not guaranteed to persist. The crate contains no transport code:
//!
//! - [`ElementState`] holds the element list, the remote-owned id set, the local
//!   sequence counter, the new-element form and the edit session. Its transitions
//!   are plain methods that return [`Effect`]s instead of performing I/O.
//! - [`RemoteStore`] and [`Notifier`] are the seams to the HTTP catalog and to the
//!   user-facing notification surface.
//! - [`ElementManager`] drives a state against a store and a notifier.

pub mod effects;
pub mod error;
pub mod manager;
pub mod notify;
pub mod session;
pub mod state;
pub mod store;
pub mod types;
pub mod validate;

pub use effects::{CallResult, Effect, Notice, NoticeKind, RemoteCall};
pub use error::{ParseRefError, SessionError, StoreError, ValidationError};
pub use manager::ElementManager;
pub use notify::{Notifier, RecordingNotifier, TracingNotifier};
pub use session::{EditSession, Snapshot};
pub use state::ElementState;
pub use store::{MemoryStore, RemoteStore, StoreCall, StoreOp};
pub use types::{AttributeBag, Element, ElementRef, WritePayload};
pub use validate::ValidationProfile;
