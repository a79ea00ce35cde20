//! In-memory session store for the web app.
//!
//! One serialized meal plan per session id; nothing survives a restart.
//! The store holds at most `capacity` sessions and evicts the least
//! recently saved one when a new session would exceed it.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use mealcraft_agent::MealPlan;
use mealcraft_llm::{Error, Result};
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "mealcraft_session";
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Debug, Default)]
struct Sessions {
    plans: HashMap<String, String>,
    /// Session ids, oldest save first
    order: VecDeque<String>,
}

impl Sessions {
    fn touch(&mut self, session_id: &str) {
        if let Some(pos) = self.order.iter().position(|id| id == session_id) {
            self.order.remove(pos);
        }
        self.order.push_back(session_id.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Sessions>>,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn poisoned() -> Error {
    Error::unexpected("session store lock poisoned").with_operation("session")
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store keeping at most `capacity` sessions (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store `plan` under `session_id`, replacing any earlier plan and
    /// evicting the oldest sessions beyond capacity.
    pub fn save_plan(&self, session_id: &str, plan: &MealPlan) -> Result<()> {
        let blob = plan.to_json()?;
        let mut sessions = self.inner.write().map_err(|_| poisoned())?;
        sessions.plans.insert(session_id.to_string(), blob);
        sessions.touch(session_id);
        while sessions.plans.len() > self.capacity {
            let Some(oldest) = sessions.order.pop_front() else {
                break;
            };
            sessions.plans.remove(&oldest);
            debug!(session = %oldest, "evicted session");
        }
        Ok(())
    }

    pub fn load_plan(&self, session_id: &str) -> Result<MealPlan> {
        let blob = {
            let sessions = self.inner.read().map_err(|_| poisoned())?;
            sessions.plans.get(session_id).cloned()
        };
        match blob {
            Some(blob) => MealPlan::from_json(&blob),
            None => Err(Error::session_not_found(session_id).with_operation("session::load")),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.plans.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
