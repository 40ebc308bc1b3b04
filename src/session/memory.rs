//! In-process session storage.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

use super::state::{State, APP_PREFIX, TEMP_PREFIX, USER_PREFIX};
use super::{Session, SessionService};
use crate::error::AgentError;
use crate::events::Event;

type SessionKey = (String, String, String);

#[derive(Default)]
struct Store {
    sessions: HashMap<SessionKey, Session>,
    app_state: HashMap<String, Map<String, Value>>,
    user_state: HashMap<(String, String), Map<String, Value>>,
}

impl Store {
    /// Copy of a stored session with app- and user-scoped keys merged in.
    fn hydrate(&self, session: &Session) -> Session {
        let mut copy = session.clone();
        if let Some(app) = self.app_state.get(&session.app_name) {
            copy.state.apply_delta(app);
        }
        if let Some(user) = self
            .user_state
            .get(&(session.app_name.clone(), session.user_id.clone()))
        {
            copy.state.apply_delta(user);
        }
        copy
    }

    /// Route each key of a delta to the scope its prefix names.
    fn apply_scoped(&mut self, app_name: &str, user_id: &str, delta: &Map<String, Value>) -> Map<String, Value> {
        let mut session_delta = Map::new();
        for (key, value) in delta {
            if key.starts_with(TEMP_PREFIX) {
                continue;
            }
            if key.starts_with(APP_PREFIX) {
                self.app_state
                    .entry(app_name.to_string())
                    .or_default()
                    .insert(key.clone(), value.clone());
            } else if key.starts_with(USER_PREFIX) {
                self.user_state
                    .entry((app_name.to_string(), user_id.to_string()))
                    .or_default()
                    .insert(key.clone(), value.clone());
            } else {
                session_delta.insert(key.clone(), value.clone());
            }
        }
        session_delta
    }
}

/// Thread-safe session store that lives as long as the process.
#[derive(Default)]
pub struct InMemorySessionService {
    store: RwLock<Store>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Store>, AgentError> {
        self.store
            .read()
            .map_err(|_| AgentError::InvalidState("session store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Store>, AgentError> {
        self.store
            .write()
            .map_err(|_| AgentError::InvalidState("session store lock poisoned".into()))
    }
}

fn key(app_name: &str, user_id: &str, session_id: &str) -> SessionKey {
    (
        app_name.to_string(),
        user_id.to_string(),
        session_id.to_string(),
    )
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        state: Option<State>,
        session_id: Option<&str>,
    ) -> Result<Session, AgentError> {
        let id = session_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut store = self.write()?;
        let session_key = key(app_name, user_id, &id);
        if store.sessions.contains_key(&session_key) {
            return Err(AgentError::SessionExists(id));
        }

        let initial = state.map(|s| s.as_map().clone()).unwrap_or_default();
        let session_values = store.apply_scoped(app_name, user_id, &initial);

        let session = Session {
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            id: id.clone(),
            state: State::from_map(session_values),
            events: Vec::new(),
            last_update_time: Utc::now(),
        };
        store.sessions.insert(session_key, session.clone());
        debug!(app_name, user_id, session_id = %id, "session created");

        Ok(store.hydrate(&session))
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, AgentError> {
        let store = self.read()?;
        Ok(store
            .sessions
            .get(&key(app_name, user_id, session_id))
            .map(|s| store.hydrate(s)))
    }

    async fn list_sessions(
        &self,
        app_name: &str,
        user_id: &str,
    ) -> Result<Vec<Session>, AgentError> {
        let store = self.read()?;
        let mut sessions: Vec<Session> = store
            .sessions
            .values()
            .filter(|s| s.app_name == app_name && s.user_id == user_id)
            .map(|s| {
                let mut copy = store.hydrate(s);
                copy.events.clear();
                copy
            })
            .collect();
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sessions)
    }

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), AgentError> {
        self.write()?
            .sessions
            .remove(&key(app_name, user_id, session_id));
        Ok(())
    }

    async fn append_event(&self, session: &mut Session, event: Event) -> Result<Event, AgentError> {
        let mut store = self.write()?;
        let session_key = key(&session.app_name, &session.user_id, &session.id);
        if !store.sessions.contains_key(&session_key) {
            return Err(AgentError::SessionNotFound {
                app_name: session.app_name.clone(),
                user_id: session.user_id.clone(),
                session_id: session.id.clone(),
            });
        }

        let delta = &event.actions.state_delta;
        let session_delta = store.apply_scoped(&session.app_name, &session.user_id, delta);

        if let Some(stored) = store.sessions.get_mut(&session_key) {
            let mut persisted = event.clone();
            persisted
                .actions
                .state_delta
                .retain(|key, _| !key.starts_with(TEMP_PREFIX));
            stored.state.apply_delta(&session_delta);
            stored.events.push(persisted);
            stored.last_update_time = event.timestamp;
        }

        // The caller's copy keeps temp keys so later steps of the turn can read them.
        session.state.apply_delta(delta);
        session.events.push(event.clone());
        session.last_update_time = event.timestamp;

        Ok(event)
    }
}
