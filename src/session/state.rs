//! Key-value session state with change tracking.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys shared by every user of an app.
pub const APP_PREFIX: &str = "app:";
/// Keys shared by every session of a user.
pub const USER_PREFIX: &str = "user:";
/// Keys that live for the current turn only and are never persisted.
pub const TEMP_PREFIX: &str = "temp:";

/// Session state: current values plus the changes made since the last
/// [`State::take_delta`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    values: Map<String, Value>,
    #[serde(skip)]
    delta: Map<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing values without recording them as changes.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self {
            values,
            delta: Map::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Set a value and record it in the pending delta.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        self.values.insert(key.clone(), value.clone());
        self.delta.insert(key, value);
    }

    pub fn has_delta(&self) -> bool {
        !self.delta.is_empty()
    }

    /// Drain the changes recorded since the previous call.
    pub fn take_delta(&mut self) -> Map<String, Value> {
        std::mem::take(&mut self.delta)
    }

    /// Apply changes that were already recorded elsewhere.
    pub fn apply_delta(&mut self, delta: &Map<String, Value>) {
        for (key, value) in delta {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Drop every `temp:` key.
    pub fn clear_temp(&mut self) {
        self.values.retain(|k, _| !k.starts_with(TEMP_PREFIX));
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// State handle shared by the callbacks and tools of one turn.
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<Mutex<State>>);

impl SharedState {
    pub fn new(state: State) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking tool cannot leave a map half-written.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.lock().get_str(key).map(str::to_string)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().set(key, value);
    }

    pub fn take_delta(&self) -> Map<String, Value> {
        self.lock().take_delta()
    }

    pub fn snapshot(&self) -> State {
        self.lock().clone()
    }
}
