use crate::error::StoreError;
use crate::types::{Element, WritePayload};
use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, StoreError>;

/// The remote object collection.
///
/// One request per call: no retry, no rollback. Callers decide what a failure means
/// for local state.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Element>>;

    /// Returns the stored record with its server-assigned id.
    async fn create(&self, payload: &WritePayload) -> Result<Element>;

    async fn update(&self, id: &str, payload: &WritePayload) -> Result<Element>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Create,
    Update,
    Delete,
}

/// A call as received by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    List,
    Create(WritePayload),
    Update(String, WritePayload),
    Delete(String),
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::List => StoreOp::List,
            StoreCall::Create(_) => StoreOp::Create,
            StoreCall::Update(..) => StoreOp::Update,
            StoreCall::Delete(_) => StoreOp::Delete,
        }
    }
}

#[derive(Default)]
struct MemoryInner {
    records: Vec<Element>,
    calls: Vec<StoreCall>,
    log_calls: bool,
    failures: Vec<(StoreOp, StoreError)>,
}

/// In-memory collection with the same contract as the HTTP catalog.
///
/// With `persist_writes` off, creates and updates are answered but not stored,
/// which is how the public catalog treats most writes. Calls are recorded unless
/// the log is turned off with [`MemoryStore::without_call_log`], and failures can be
/// queued per operation.
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    persist_writes: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MemoryStore {
    pub fn new(records: Vec<Element>) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                records,
                log_calls: true,
                ..Default::default()
            }),
            persist_writes: true,
        }
    }

    pub fn non_persisting(records: Vec<Element>) -> Self {
        Self {
            persist_writes: false,
            ..Self::new(records)
        }
    }

    pub fn persists_writes(&self) -> bool {
        self.persist_writes
    }

    /// Stop recording calls. For long-running servers, where the log would only grow.
    pub fn without_call_log(self) -> Self {
        let mut inner = self.inner.into_inner();
        inner.log_calls = false;
        inner.calls.clear();
        Self {
            inner: Mutex::new(inner),
            persist_writes: self.persist_writes,
        }
    }

    /// Make the next call of kind `op` fail with `error`.
    pub async fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.inner.lock().await.failures.push((op, error));
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn count(&self, op: StoreOp) -> usize {
        self.inner
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    pub async fn records(&self) -> Vec<Element> {
        self.inner.lock().await.records.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Element> {
        self.inner
            .lock()
            .await
            .records
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    fn not_found(id: &str) -> StoreError {
        StoreError::Status {
            status: 404,
            body: format!("Object with id = {} was not found.", id),
        }
    }
}

impl MemoryInner {
    fn record(&mut self, call: StoreCall) -> Result<()> {
        let op = call.op();
        if self.log_calls {
            self.calls.push(call);
        }
        match self.failures.iter().position(|(queued, _)| *queued == op) {
            Some(index) => Err(self.failures.remove(index).1),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Element>> {
        let mut inner = self.inner.lock().await;
        inner.record(StoreCall::List)?;
        Ok(inner.records.clone())
    }

    async fn create(&self, payload: &WritePayload) -> Result<Element> {
        let mut inner = self.inner.lock().await;
        inner.record(StoreCall::Create(payload.clone()))?;
        let element = payload.clone().into_element(Uuid::new_v4().simple().to_string());
        if self.persist_writes {
            inner.records.push(element.clone());
        }
        Ok(element)
    }

    async fn update(&self, id: &str, payload: &WritePayload) -> Result<Element> {
        let mut inner = self.inner.lock().await;
        inner.record(StoreCall::Update(id.to_string(), payload.clone()))?;
        let index = inner
            .records
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        let element = payload.clone().into_element(id);
        if self.persist_writes {
            inner.records[index] = element.clone();
        }
        Ok(element)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.record(StoreCall::Delete(id.to_string()))?;
        let index = inner
            .records
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        inner.records.remove(index);
        Ok(())
    }
}
