//! Favorites and community alerts, plus an in-memory record store.
//!
//! Stores publish the whole collection after every mutation through a
//! `tokio::sync::watch` channel, so screens hold a receiver instead of
//! sharing a mutable list.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::haversine::within_radius;
use crate::traits::{Record, RecordStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("no record with id {id:?}")]
    NotFound { id: String },
}

/// A location the user saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteLocation {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// (latitude, longitude)
    pub position: (f64, f64),
    #[serde(default)]
    pub description: String,
}

impl FavoriteLocation {
    pub fn new(name: impl Into<String>, position: (f64, f64), description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            position,
            description: description.into(),
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl Record for FavoriteLocation {
    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(self, id: String) -> Self {
        Self { id, ..self }
    }
}

/// A hazard report visible to every user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAlert {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// (latitude, longitude)
    pub position: (f64, f64),
}

impl UserAlert {
    pub fn new(title: impl Into<String>, description: impl Into<String>, position: (f64, f64)) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            description: description.into(),
            position,
        }
    }
}

impl Record for UserAlert {
    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(self, id: String) -> Self {
        Self { id, ..self }
    }
}

/// Renames a stored favorite in place.
pub async fn rename_favorite<S>(store: &S, id: &str, name: &str) -> Result<(), RecordError>
where
    S: RecordStore<FavoriteLocation> + ?Sized,
{
    let mut favorite = store
        .get(id)
        .await?
        .ok_or_else(|| RecordError::NotFound { id: id.to_string() })?;
    favorite.rename(name);
    store.update(favorite).await
}

/// Alerts within `radius_meters` of `center`, in store order.
pub fn alerts_near(alerts: &[UserAlert], center: (f64, f64), radius_meters: f64) -> Vec<UserAlert> {
    alerts
        .iter()
        .filter(|alert| within_radius(center, alert.position, radius_meters))
        .cloned()
        .collect()
}

struct Inner<T> {
    records: Vec<T>,
    next_id: u64,
}

/// Process-local [`RecordStore`] keeping records in insertion order.
pub struct MemoryStore<T> {
    inner: Mutex<Inner<T>>,
    snapshots: watch::Sender<Arc<Vec<T>>>,
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            inner: Mutex::new(Inner {
                records: Vec::new(),
                next_id: 1,
            }),
            snapshots,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, records: &[T]) {
        self.snapshots.send_replace(Arc::new(records.to_vec()));
    }

    fn position(records: &[T], id: &str) -> Result<usize, RecordError> {
        records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| RecordError::NotFound { id: id.to_string() })
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryStore<T> {
    async fn create(&self, record: T) -> Result<String, RecordError> {
        let mut inner = self.lock();
        let id = inner.next_id.to_string();
        inner.next_id += 1;
        inner.records.push(record.with_id(id.clone()));
        self.publish(&inner.records);
        debug!(%id, "record created");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<T>, RecordError> {
        Ok(self
            .lock()
            .records
            .iter()
            .find(|record| record.id() == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<T>, RecordError> {
        Ok(self.lock().records.clone())
    }

    async fn update(&self, record: T) -> Result<(), RecordError> {
        let mut inner = self.lock();
        let index = Self::position(&inner.records, record.id())?;
        inner.records[index] = record;
        self.publish(&inner.records);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RecordError> {
        let mut inner = self.lock();
        let index = Self::position(&inner.records, id)?;
        inner.records.remove(index);
        self.publish(&inner.records);
        debug!(id, "record deleted");
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.snapshots.subscribe()
    }
}
