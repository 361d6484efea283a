use std::sync::Arc;

use fichas_core::{AggregationService, FichaStore, LifecycleService, TriageService};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FichaStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn FichaStore>) -> Self {
        Self { store }
    }

    pub fn triage(&self) -> TriageService {
        TriageService::new(Arc::clone(&self.store))
    }

    pub fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(Arc::clone(&self.store))
    }

    pub fn aggregation(&self) -> AggregationService {
        AggregationService::new(Arc::clone(&self.store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fichas_core::{MemoryFichaStore, NewFicha};

    #[test]
    fn services_share_one_store() {
        let state = AppState::new(Arc::new(MemoryFichaStore::new()));
        let ficha = NewFicha::new("https://example.org")
            .into_ficha(chrono::Utc::now())
            .unwrap();
        state.store.insert(&ficha).unwrap();

        state.lifecycle().mark_contacted(&ficha.id).unwrap();
        assert_eq!(state.aggregation().summary().unwrap().contacted, 1);
        assert!(state.triage().rank_pending().unwrap().is_empty());
    }
}
