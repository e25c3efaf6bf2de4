//! A collection of records mirrored into one storage key.
//!
//! Every mutation rewrites the whole collection under its key before
//! returning, then publishes a [`ChangeEvent`] on the shared [`ChangeBus`].

use crate::error::StorageError;
use crate::model::Record;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

/// What a mutation does when the storage write fails.
///
/// The in-memory change is kept either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersistPolicy {
    /// Log the failure and report success to the caller.
    #[default]
    LogAndContinue,
    /// Hand the failure back to the caller.
    Propagate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
    Replaced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Storage key of the collection that changed.
    pub collection: &'static str,
    pub kind: ChangeKind,
    /// Collection length after the change.
    pub len: usize,
    pub persisted: bool,
}

/// Fan-out of change events to any number of subscribers.
///
/// Cloning shares the subscriber list.
#[derive(Debug, Clone, Default)]
pub struct ChangeBus {
    subscribers: Rc<RefCell<Vec<Sender<ChangeEvent>>>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn publish(&self, event: ChangeEvent) {
        // Dropped receivers fall out here.
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

pub struct Collection<T: Record> {
    key: &'static str,
    items: Vec<T>,
    storage: Rc<dyn Storage>,
    policy: PersistPolicy,
    bus: ChangeBus,
}

impl<T: Record> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Collection {{ key: {}, len: {}, policy: {:?} }}",
            self.key,
            self.items.len(),
            self.policy
        )
    }
}

impl<T: Record> Collection<T> {
    /// Load the collection stored under `key`.
    ///
    /// A missing key yields `defaults()`. An unreadable or undecodable value is
    /// logged and also yields `defaults()`, unless the policy is
    /// [`PersistPolicy::Propagate`].
    pub fn load(
        key: &'static str,
        storage: Rc<dyn Storage>,
        policy: PersistPolicy,
        bus: ChangeBus,
        defaults: impl FnOnce() -> Vec<T>,
    ) -> Result<Self, StorageError> {
        let loaded = storage.get_item(key).and_then(|raw| match raw {
            Some(text) => serde_json::from_str::<Vec<T>>(&text)
                .map(Some)
                .map_err(|source| StorageError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        });

        let items = match loaded {
            Ok(Some(items)) => {
                tracing::debug!(key, len = items.len(), "loaded collection");
                items
            }
            Ok(None) => defaults(),
            Err(e) if policy == PersistPolicy::Propagate => return Err(e),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to load collection, using defaults");
                defaults()
            }
        };

        Ok(Self {
            key,
            items,
            storage,
            policy,
            bus,
        })
    }

    pub fn set_policy(&mut self, policy: PersistPolicy) {
        self.policy = policy;
    }

    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Append without checking for an existing identifier.
    pub fn add(&mut self, item: T) -> Result<(), StorageError> {
        self.items.push(item);
        self.commit(ChangeKind::Added)
    }

    /// Replace the first record with the same identifier.
    ///
    /// Returns `Ok(false)` and leaves storage alone when nothing matches.
    pub fn update(&mut self, item: T) -> Result<bool, StorageError> {
        let Some(slot) = self.items.iter_mut().find(|cur| cur.id() == item.id()) else {
            return Ok(false);
        };
        *slot = item;
        self.commit(ChangeKind::Updated).map(|_| true)
    }

    /// Remove every record with this identifier and return how many went.
    pub fn delete(&mut self, id: &str) -> Result<usize, StorageError> {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        let removed = before - self.items.len();
        if removed == 0 {
            return Ok(0);
        }
        self.commit(ChangeKind::Deleted).map(|_| removed)
    }

    pub fn replace_all(&mut self, items: Vec<T>) -> Result<(), StorageError> {
        self.items = items;
        self.commit(ChangeKind::Replaced)
    }

    /// Write the current collection without publishing a change.
    pub fn persist(&self) -> Result<(), StorageError> {
        let text = serde_json::to_string(&self.items).map_err(|source| StorageError::Encode {
            key: self.key.to_string(),
            source,
        })?;
        self.storage.set_item(self.key, &text)
    }

    fn commit(&mut self, kind: ChangeKind) -> Result<(), StorageError> {
        let result = self.persist();
        self.bus.publish(ChangeEvent {
            collection: self.key,
            kind,
            len: self.items.len(),
            persisted: result.is_ok(),
        });

        match result {
            Ok(()) => Ok(()),
            Err(e) if self.policy == PersistPolicy::Propagate => Err(e),
            Err(e) => {
                tracing::error!(key = self.key, error = %e, "failed to persist collection");
                Ok(())
            }
        }
    }
}
