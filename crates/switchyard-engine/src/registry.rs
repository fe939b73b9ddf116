use crate::EngineError;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

type Entry = Arc<dyn Any + Send + Sync>;

/// Typed name → service map.
///
/// A lookup succeeds only when both the name and the requested type match,
/// so `lookup::<Arc<ShutdownLatch>>("switchyard.latch")` never hands back an
/// unrelated service registered under the same name.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `name`, replacing any previous entry.
    pub fn register<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Arc::new(value));
    }

    pub fn lookup<T: Any + Send + Sync + Clone>(&self, name: &str) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(name)?.downcast_ref::<T>().cloned()
    }

    pub fn require<T: Any + Send + Sync + Clone>(&self, name: &str) -> Result<T, EngineError> {
        self.lookup(name)
            .ok_or_else(|| EngineError::NotRegistered(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}
