//! Metadata store abstraction
//!
//! Every metadata backend exposes the same capability set. `StoreChain`
//! holds them in priority order and applies the fallback rules shared by
//! the list, get and insert paths.

use std::sync::Arc;

use async_trait::async_trait;

use super::models::{NewPodcast, Podcast};
use crate::error::AppError;
use crate::metrics::observe_store;

/// A metadata backend holding podcast rows
#[async_trait]
pub trait PodcastStore: Send + Sync {
    /// Short name used in logs and metrics
    fn name(&self) -> &'static str;

    /// True when deleting an absent id is indistinguishable from deleting
    /// an existing one
    fn idempotent_delete(&self) -> bool {
        false
    }

    /// All rows, newest first
    async fn list(&self) -> Result<Vec<Podcast>, AppError>;

    async fn get(&self, id: i64) -> Result<Option<Podcast>, AppError>;

    /// Insert a row and return it with its store-assigned id
    async fn insert(&self, podcast: &NewPodcast) -> Result<Podcast, AppError>;

    /// Returns whether a row was removed; idempotent stores always report true
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

/// Podcast row plus the store that produced it
#[derive(Debug, Clone)]
pub struct Stored {
    pub podcast: Podcast,
    pub store: &'static str,
}

/// Metadata stores in priority order
///
/// The last store is the store of last resort: its errors are returned to
/// the caller instead of being skipped.
#[derive(Clone)]
pub struct StoreChain {
    stores: Vec<Arc<dyn PodcastStore>>,
}

impl StoreChain {
    /// Build a chain from preferred to last-resort store.
    ///
    /// # Panics
    /// Panics if `stores` is empty.
    pub fn new(stores: Vec<Arc<dyn PodcastStore>>) -> Self {
        assert!(!stores.is_empty(), "store chain needs at least one store");
        Self { stores }
    }

    pub fn stores(&self) -> &[Arc<dyn PodcastStore>] {
        &self.stores
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stores.iter().map(|store| store.name()).collect()
    }

    fn is_last(&self, index: usize) -> bool {
        index + 1 == self.stores.len()
    }

    /// Rows from the first store that answers without error.
    ///
    /// An empty answer is final; only errors fall through.
    pub async fn list(&self) -> Result<Vec<Podcast>, AppError> {
        for (index, store) in self.stores.iter().enumerate() {
            match store.list().await {
                Ok(rows) => {
                    observe_store("list", store.name(), "ok");
                    tracing::debug!(store = store.name(), count = rows.len(), "Listed podcasts");
                    return Ok(rows);
                }
                Err(error) if !self.is_last(index) => {
                    observe_store("list", store.name(), "fallback");
                    tracing::warn!(store = store.name(), %error, "List failed, trying next store");
                }
                Err(error) => {
                    observe_store("list", store.name(), "error");
                    return Err(error);
                }
            }
        }
        unreachable!("store chain is never empty")
    }

    /// First exact id match in priority order.
    ///
    /// Misses and errors both fall through; a miss everywhere is `NotFound`,
    /// an error at the last store is returned as is.
    pub async fn get(&self, id: i64) -> Result<Stored, AppError> {
        for (index, store) in self.stores.iter().enumerate() {
            match store.get(id).await {
                Ok(Some(podcast)) => {
                    observe_store("get", store.name(), "ok");
                    return Ok(Stored {
                        podcast,
                        store: store.name(),
                    });
                }
                Ok(None) => {
                    observe_store("get", store.name(), "miss");
                }
                Err(error) if !self.is_last(index) => {
                    observe_store("get", store.name(), "fallback");
                    tracing::warn!(store = store.name(), id, %error, "Get failed, trying next store");
                }
                Err(error) => {
                    observe_store("get", store.name(), "error");
                    return Err(error);
                }
            }
        }
        Err(AppError::NotFound)
    }

    /// Insert into the first store that accepts the row; exactly one store
    /// is written on success.
    pub async fn insert(&self, podcast: &NewPodcast) -> Result<Stored, AppError> {
        for (index, store) in self.stores.iter().enumerate() {
            match store.insert(podcast).await {
                Ok(podcast) => {
                    observe_store("insert", store.name(), "ok");
                    tracing::info!(store = store.name(), id = podcast.id, "Podcast row inserted");
                    return Ok(Stored {
                        podcast,
                        store: store.name(),
                    });
                }
                Err(error) if !self.is_last(index) => {
                    observe_store("insert", store.name(), "fallback");
                    tracing::warn!(store = store.name(), %error, "Insert failed, trying next store");
                }
                Err(error) => {
                    observe_store("insert", store.name(), "error");
                    return Err(error);
                }
            }
        }
        unreachable!("store chain is never empty")
    }
}
