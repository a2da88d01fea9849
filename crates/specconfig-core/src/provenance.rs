//! Records which provider satisfied each key lookup.
//!
//! A [`ProvenanceReporter`] is attached to a [`LayeredReader`] as its
//! [`AccessReporter`] and handed to the pipeline through
//! [`BuildOptions`](crate::pipeline::BuildOptions). After each successful
//! binding the pipeline asks the reporter where the key came from.
//!
//! [`LayeredReader`]: crate::reader::LayeredReader

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::reader::{AccessEvent, AccessOutcome, AccessReporter};
use crate::snapshot::Provenance;

/// Mutex-guarded key to provenance map, safe to share across threads.
#[derive(Debug, Default)]
pub struct ProvenanceReporter {
    by_key: Mutex<HashMap<String, Provenance>>,
}

impl ProvenanceReporter {
    pub fn new() -> Self {
        Self::default()
    }

    // Every update is a single map call; a poisoned map is still consistent.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Provenance>> {
        self.by_key.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Forget everything recorded so far, for a fresh build cycle.
    pub fn reset(&self) {
        self.entries().clear();
    }

    /// Most recently recorded provenance for `key`.
    pub fn provenance(&self, key: &str) -> Option<Provenance> {
        self.entries().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl AccessReporter for ProvenanceReporter {
    fn report(&self, event: &AccessEvent) {
        if event.key.is_empty() {
            return;
        }
        if let AccessOutcome::Found { provenance, .. } = &event.outcome {
            self.entries().insert(event.key.clone(), provenance.clone());
        }
    }
}
