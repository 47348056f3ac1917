//! [`StateStore`] backed by a [`LocalStore`]
//!
//! The whole [`AppState`] is one JSON document under [`STATE_STORAGE_KEY`],
//! written with a single `set`, so a replace either lands completely or not
//! at all. On read, each top-level collection is checked on its own: one with
//! the wrong shape is dropped and the others survive.

use std::sync::Arc;

use async_trait::async_trait;
use carelog_core::{LocalStore, StateStore};
use carelog_domain::constants::STATE_STORAGE_KEY;
use carelog_domain::{AppState, Result};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

/// Application state stored as one document
#[derive(Clone)]
pub struct LocalStateStore {
    store: Arc<dyn LocalStore>,
}

impl LocalStateStore {
    /// State store writing through `store`
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    async fn read_document(&self) -> Map<String, Value> {
        let raw = match self.store.get(STATE_STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Map::new(),
            Err(err) => {
                warn!(error = %err, "failed to read stored state, treating as empty");
                return Map::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                warn!("stored state is not an object, treating as empty");
                Map::new()
            }
            Err(err) => {
                warn!(error = %err, "stored state is malformed, treating as empty");
                Map::new()
            }
        }
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    #[instrument(skip(self))]
    async fn snapshot_state(&self) -> Result<AppState> {
        let mut object = Map::new();
        for (name, value) in self.read_document().await {
            let mut single = Map::new();
            single.insert(name.clone(), value.clone());
            if serde_json::from_value::<AppState>(Value::Object(single)).is_ok() {
                object.insert(name, value);
            } else {
                warn!(collection = %name, "stored collection has the wrong shape, ignoring");
            }
        }
        Ok(serde_json::from_value(Value::Object(object))?)
    }

    #[instrument(skip_all)]
    async fn replace_state(&self, state: AppState) -> Result<()> {
        let raw = serde_json::to_string(&state)?;
        self.store.set(STATE_STORAGE_KEY, &raw).await?;

        debug!(records = state.change_counters().total(), "state replaced");
        Ok(())
    }
}
