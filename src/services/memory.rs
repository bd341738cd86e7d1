//! In-process collaborators for local development and tests.
//!
//! Each store can be switched into a failing mode to exercise the partial
//! failure paths of the handlers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::email::{EmailSender, OutgoingEmail};
use super::object_store::ObjectStore;
use super::records::{FieldEq, RecordStore};
use super::UpstreamError;

/// Attribute used as primary key by the in-memory tables.
const PRIMARY_KEY: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, StoredObject>,
    failing: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects.get(&format!("{bucket}/{key}")).map(|o| o.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String, UpstreamError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(UpstreamError::ObjectStore("simulated object store outage".into()));
        }
        self.objects.insert(
            format!("{bucket}/{key}"),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
                metadata,
            },
        );
        Ok(format!("memory://{bucket}/{key}"))
    }
}

/// Tables keep insertion order; a put with an existing `id` replaces in place.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: DashMap<String, Vec<Value>>,
    failing: AtomicBool,
    queries: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of a table's items.
    pub fn items(&self, table: &str) -> Vec<Value> {
        self.tables.get(table).map(|t| t.value().clone()).unwrap_or_default()
    }

    /// Number of index queries served, to tell query and scan paths apart.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), UpstreamError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(UpstreamError::RecordStore("simulated record store outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, table: &str, item: Value) -> Result<(), UpstreamError> {
        self.check()?;
        if !item.is_object() {
            return Err(UpstreamError::Decode("item must be an object".into()));
        }
        let mut rows = self.tables.entry(table.to_string()).or_default();
        let id = item.get(PRIMARY_KEY).cloned();
        let position = rows
            .iter()
            .position(|row| id.is_some() && row.get(PRIMARY_KEY) == id.as_ref());
        match position {
            Some(i) => rows[i] = item,
            None => rows.push(item),
        }
        Ok(())
    }

    async fn get(&self, table: &str, key: &FieldEq) -> Result<Option<Value>, UpstreamError> {
        self.check()?;
        Ok(self
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|row| key.matches(row)).cloned()))
    }

    async fn delete(&self, table: &str, key: &FieldEq) -> Result<(), UpstreamError> {
        self.check()?;
        if let Some(mut rows) = self.tables.get_mut(table) {
            rows.retain(|row| !key.matches(row));
        }
        Ok(())
    }

    async fn query(
        &self,
        table: &str,
        _index: &str,
        key: &FieldEq,
        filter: Option<&FieldEq>,
    ) -> Result<Vec<Value>, UpstreamError> {
        self.check()?;
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .items(table)
            .into_iter()
            .filter(|row| key.matches(row) && filter.map_or(true, |f| f.matches(row)))
            .collect())
    }

    async fn scan(&self, table: &str, filter: Option<&FieldEq>) -> Result<Vec<Value>, UpstreamError> {
        self.check()?;
        Ok(self
            .items(table)
            .into_iter()
            .filter(|row| filter.map_or(true, |f| f.matches(row)))
            .collect())
    }
}

/// Records outgoing mail instead of sending it.
#[derive(Default)]
pub struct MemoryEmailSender {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: AtomicBool,
}

impl MemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().expect("email outbox mutex poisoned").clone()
    }
}

#[async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), UpstreamError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(UpstreamError::Email("simulated email outage".into()));
        }
        tracing::info!(to = ?email.to, subject = %email.subject, "Email captured (memory sender)");
        self.sent
            .lock()
            .expect("email outbox mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}
