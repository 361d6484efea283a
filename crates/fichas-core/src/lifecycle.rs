//! State transitions applied on operator request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ficha::{Ficha, FichaPatch};
use crate::store::FichaStore;
use crate::types::{FichaState, Priority};

/// Result of a batch transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn FichaStore>,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn FichaStore>) -> Self {
        Self { store }
    }

    /// Mark a pending ficha as contacted. Safe to retry: an already
    /// contacted ficha keeps its original `contacted_at`.
    pub fn mark_contacted(&self, id: &str) -> Result<Ficha> {
        self.transition(id, FichaState::Contacted)
    }

    /// Mark a ficha as discarded. Idempotent.
    pub fn mark_discarded(&self, id: &str) -> Result<Ficha> {
        self.transition(id, FichaState::Discarded)
    }

    /// Discard every pending low-priority ficha present at call time.
    ///
    /// Each ficha is updated independently; a failure is counted and logged
    /// and the rest of the batch still runs.
    pub fn bulk_discard_low_priority(&self) -> Result<BulkOutcome> {
        let targets: Vec<String> = self
            .store
            .list_by_state(FichaState::Pending)?
            .into_iter()
            .filter(|f| f.priority == Some(Priority::Low))
            .map(|f| f.id)
            .collect();

        let mut outcome = BulkOutcome::default();
        for id in &targets {
            match self.mark_discarded(id) {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => {
                    tracing::warn!(id = %id, kind = e.kind(), "bulk discard failed: {e}");
                    outcome.failed += 1;
                }
            }
        }
        tracing::info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "bulk discard of low-priority fichas finished"
        );
        Ok(outcome)
    }

    fn transition(&self, id: &str, target: FichaState) -> Result<Ficha> {
        let ficha = self.store.update(id, &FichaPatch::transition(target))?;
        tracing::info!(id = %ficha.id, state = %ficha.state, "ficha transitioned");
        Ok(ficha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FichaError;
    use crate::ficha::NewFicha;
    use crate::store::MemoryFichaStore;
    use crate::summary::Summary;
    use chrono::Utc;

    fn insert(store: &dyn FichaStore, id: &str, priority: &str) {
        let mut raw = NewFicha::new(format!("https://example.org/{id}"));
        raw.id = Some(id.into());
        raw.priority = Some(priority.into());
        store.insert(&raw.into_ficha(Utc::now()).unwrap()).unwrap();
    }

    /// Delegates to a memory store but fails updates for one id.
    struct FlakyStore {
        inner: MemoryFichaStore,
        broken_id: String,
    }

    impl FichaStore for FlakyStore {
        fn get(&self, id: &str) -> Result<Ficha> {
            self.inner.get(id)
        }
        fn list_by_state(&self, state: FichaState) -> Result<Vec<Ficha>> {
            self.inner.list_by_state(state)
        }
        fn list_all(&self) -> Result<Vec<Ficha>> {
            self.inner.list_all()
        }
        fn insert(&self, ficha: &Ficha) -> Result<()> {
            self.inner.insert(ficha)
        }
        fn update(&self, id: &str, patch: &FichaPatch) -> Result<Ficha> {
            if id == self.broken_id {
                return Err(FichaError::StorageUnavailable("disk unplugged".into()));
            }
            self.inner.update(id, patch)
        }
    }

    #[test]
    fn mark_contacted_sets_state_and_timestamp() {
        let store = Arc::new(MemoryFichaStore::new());
        insert(store.as_ref(), "A", "high");
        let svc = LifecycleService::new(store);

        let f = svc.mark_contacted("A").unwrap();
        assert_eq!(f.state, FichaState::Contacted);
        assert!(f.contacted_at.is_some());
    }

    #[test]
    fn mark_contacted_twice_is_idempotent() {
        let store = Arc::new(MemoryFichaStore::new());
        insert(store.as_ref(), "A", "high");
        let svc = LifecycleService::new(store);

        let once = svc.mark_contacted("A").unwrap();
        let twice = svc.mark_contacted("A").unwrap();
        assert_eq!(once.state, twice.state);
        assert_eq!(once.contacted_at, twice.contacted_at);
    }

    #[test]
    fn mark_discarded_is_idempotent() {
        let store = Arc::new(MemoryFichaStore::new());
        insert(store.as_ref(), "A", "low");
        let svc = LifecycleService::new(store);

        assert_eq!(svc.mark_discarded("A").unwrap().state, FichaState::Discarded);
        assert_eq!(svc.mark_discarded("A").unwrap().state, FichaState::Discarded);
    }

    #[test]
    fn missing_id_is_not_found_and_store_unchanged() {
        let store = Arc::new(MemoryFichaStore::new());
        insert(store.as_ref(), "A", "high");
        let before = store.list_all().unwrap();
        let svc = LifecycleService::new(store.clone());

        let err = svc.mark_contacted("missing-id").unwrap_err();
        assert!(matches!(err, FichaError::NotFound(ref id) if id == "missing-id"));
        assert_eq!(store.list_all().unwrap(), before);
    }

    #[test]
    fn contacted_ficha_can_be_discarded() {
        let store = Arc::new(MemoryFichaStore::new());
        insert(store.as_ref(), "A", "high");
        let svc = LifecycleService::new(store.clone());
        svc.mark_contacted("A").unwrap();

        let f = svc.mark_discarded("A").unwrap();
        assert_eq!(f.state, FichaState::Discarded);
        assert_eq!(f.contacted_at, None);
        assert_eq!(store.get("A").unwrap(), f);
    }

    #[test]
    fn discarded_cannot_be_contacted() {
        let store = Arc::new(MemoryFichaStore::new());
        insert(store.as_ref(), "A", "high");
        let svc = LifecycleService::new(store.clone());
        svc.mark_discarded("A").unwrap();

        let err = svc.mark_contacted("A").unwrap_err();
        assert!(matches!(err, FichaError::InvalidTransition { .. }));
        assert_eq!(store.get("A").unwrap().state, FichaState::Discarded);
    }

    #[test]
    fn bulk_discard_only_touches_pending_low() {
        let store = Arc::new(MemoryFichaStore::new());
        insert(store.as_ref(), "H", "alta");
        insert(store.as_ref(), "L1", "baja");
        insert(store.as_ref(), "L2", "Low");
        insert(store.as_ref(), "U", "unknown");
        let svc = LifecycleService::new(store.clone());

        let outcome = svc.bulk_discard_low_priority().unwrap();
        assert_eq!(outcome, BulkOutcome { succeeded: 2, failed: 0 });
        assert_eq!(store.get("H").unwrap().state, FichaState::Pending);
        assert_eq!(store.get("U").unwrap().state, FichaState::Pending);
        assert_eq!(store.get("L1").unwrap().state, FichaState::Discarded);
        assert_eq!(store.get("L2").unwrap().state, FichaState::Discarded);
    }

    #[test]
    fn bulk_discard_isolates_per_item_failures() {
        let flaky = FlakyStore {
            inner: MemoryFichaStore::new(),
            broken_id: "L2".into(),
        };
        insert(&flaky, "L1", "low");
        insert(&flaky, "L2", "low");
        insert(&flaky, "L3", "low");
        let store = Arc::new(flaky);
        let svc = LifecycleService::new(store.clone());

        let outcome = svc.bulk_discard_low_priority().unwrap();
        assert_eq!(outcome, BulkOutcome { succeeded: 2, failed: 1 });
        assert_eq!(store.get("L1").unwrap().state, FichaState::Discarded);
        assert_eq!(store.get("L2").unwrap().state, FichaState::Pending);
        assert_eq!(store.get("L3").unwrap().state, FichaState::Discarded);
    }

    #[test]
    fn transitions_are_visible_to_summary() {
        let store = Arc::new(MemoryFichaStore::new());
        insert(store.as_ref(), "A", "high");
        insert(store.as_ref(), "B", "low");
        let svc = LifecycleService::new(store.clone());
        svc.mark_contacted("A").unwrap();
        svc.mark_discarded("B").unwrap();

        let s: Summary = store.summary().unwrap();
        assert_eq!((s.pending, s.contacted, s.discarded), (0, 1, 1));
    }
}
