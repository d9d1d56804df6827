use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::AppState;

use super::{intents::Intent, reducer::reduce};

/// Shared holder of the current state snapshot. Every update goes through
/// [`reduce`], one intent at a time.
#[derive(Clone, Default)]
pub struct AppStore {
    inner: Arc<Mutex<AppState>>,
}

impl AppStore {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        // Snapshots are swapped in whole, so a poisoned lock still holds a consistent state.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> AppState {
        self.lock().clone()
    }

    pub fn apply(&self, intent: Intent) {
        let mut guard = self.lock();
        let next = reduce(guard.clone(), intent);
        *guard = next;
    }

    pub fn apply_all(&self, intents: impl IntoIterator<Item = Intent>) {
        let mut guard = self.lock();
        for intent in intents {
            let next = reduce(guard.clone(), intent);
            *guard = next;
        }
    }
}
