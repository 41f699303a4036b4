//! In-memory document store
//!
//! A tree of JSON data addressed by path segments. Readers take immutable
//! snapshots; writers apply copy-on-write transactions that are published
//! atomically, so an evaluation never observes a half-applied write.

use regent_core::Value;
use serde_json::Map;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Store error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store root must stay an object
    #[error("Store root must be an object")]
    RootNotObject,

    /// A path segment traverses a non-object value
    #[error("Path conflict at /{0}")]
    PathConflict(String),

    /// The path does not exist
    #[error("Path not found: /{0}")]
    NotFound(String),

    /// A writer panicked while holding the lock
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Immutable view of the store at one revision
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub root: Arc<Value>,
    pub revision: u64,
}

#[derive(Debug)]
struct StoreState {
    root: Arc<Value>,
    revision: u64,
}

/// Shared, transactional in-memory JSON store
///
/// Cloning is cheap; clones share the same underlying data.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    state: Arc<RwLock<StoreState>>,
}

impl DocumentStore {
    /// Create a store whose root is `root`
    pub fn new(root: Value) -> Result<Self, StoreError> {
        if !root.is_object() {
            return Err(StoreError::RootNotObject);
        }
        Ok(Self {
            state: Arc::new(RwLock::new(StoreState {
                root: Arc::new(root),
                revision: 0,
            })),
        })
    }

    /// Create a store holding `document` at `path`
    ///
    /// An empty path places the document at the root, which then has to be
    /// an object.
    pub fn seeded<S: AsRef<str>>(path: &[S], document: Value) -> Result<Self, StoreError> {
        let root = path
            .iter()
            .rev()
            .fold(document, |inner, segment| {
                let mut map = Map::new();
                map.insert(segment.as_ref().to_string(), inner);
                Value::Object(map)
            });
        Self::new(root)
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(StoreSnapshot {
            root: Arc::clone(&state.root),
            revision: state.revision,
        })
    }

    pub fn revision(&self) -> Result<u64, StoreError> {
        Ok(self.snapshot()?.revision)
    }

    /// Read the value at `path`
    pub fn read<S: AsRef<str>>(&self, path: &[S]) -> Result<Option<Value>, StoreError> {
        let snapshot = self.snapshot()?;
        let mut current = snapshot.root.as_ref();
        for segment in path {
            match current.get(segment.as_ref()) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current.clone()))
    }

    /// Write `value` at `path`, creating intermediate objects
    pub fn write<S: AsRef<str>>(&self, path: &[S], value: Value) -> Result<u64, StoreError> {
        self.transaction(|root| {
            let Some((last, parents)) = path.split_last() else {
                *root = value;
                return Ok(());
            };
            let mut current = root;
            for (depth, segment) in parents.iter().enumerate() {
                let map = current
                    .as_object_mut()
                    .ok_or_else(|| StoreError::PathConflict(join(&path[..depth])))?;
                current = map
                    .entry(segment.as_ref().to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
            }
            let map = current
                .as_object_mut()
                .ok_or_else(|| StoreError::PathConflict(join(parents)))?;
            map.insert(last.as_ref().to_string(), value);
            Ok(())
        })
    }

    /// Remove the value at `path`
    pub fn remove<S: AsRef<str>>(&self, path: &[S]) -> Result<u64, StoreError> {
        self.transaction(|root| {
            let Some((last, parents)) = path.split_last() else {
                return Err(StoreError::RootNotObject);
            };
            let mut current = root;
            for segment in parents {
                current = current
                    .get_mut(segment.as_ref())
                    .ok_or_else(|| StoreError::NotFound(join(path)))?;
            }
            current
                .as_object_mut()
                .and_then(|map| map.remove(last.as_ref()))
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(join(path)))
        })
    }

    /// Apply `f` to a private copy of the root and publish it atomically
    ///
    /// Writers are serialized; if `f` fails nothing is published. Returns the
    /// new revision.
    pub fn transaction<F>(&self, f: F) -> Result<u64, StoreError>
    where
        F: FnOnce(&mut Value) -> Result<(), StoreError>,
    {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        let mut working = state.root.as_ref().clone();
        f(&mut working)?;
        if !working.is_object() {
            return Err(StoreError::RootNotObject);
        }
        state.root = Arc::new(working);
        state.revision += 1;
        Ok(state.revision)
    }
}

fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("/")
}
