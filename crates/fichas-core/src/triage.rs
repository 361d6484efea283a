//! Ordering and filtering of fichas for operator attention.
//!
//! Ranking is recomputed from the store on every call so that transitions
//! made by other sessions show up immediately.

use std::cmp::Reverse;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ficha::Ficha;
use crate::store::FichaStore;
use crate::types::{rank_of, FichaState, Priority};

/// Sort by priority rank (high first, unrecognized last), then newest first.
/// Ties on both keys fall back to id so the order is fully deterministic.
pub fn rank(mut fichas: Vec<Ficha>) -> Vec<Ficha> {
    fichas.sort_by(|a, b| {
        (rank_of(a.priority), Reverse(a.created_at), &a.id).cmp(&(
            rank_of(b.priority),
            Reverse(b.created_at),
            &b.id,
        ))
    });
    fichas
}

// ---------------------------------------------------------------------------
// TriageFilter
// ---------------------------------------------------------------------------

/// Client-side refinement layered over a ranked list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageFilter {
    /// Case-insensitive substring matched against title, institution and
    /// recommended channel.
    #[serde(default, alias = "q")]
    pub query: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl TriageFilter {
    pub fn is_empty(&self) -> bool {
        self.needle().is_none() && self.priority.is_none()
    }

    fn needle(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, ficha: &Ficha) -> bool {
        if let Some(p) = self.priority {
            if ficha.priority != Some(p) {
                return false;
            }
        }
        match self.needle() {
            None => true,
            Some(needle) => [
                &ficha.title,
                &ficha.institution,
                &ficha.recommended_channel,
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle)),
        }
    }

    /// Keep matching fichas, preserving the incoming order.
    pub fn apply(&self, fichas: Vec<Ficha>) -> Vec<Ficha> {
        if self.is_empty() {
            return fichas;
        }
        fichas.into_iter().filter(|f| self.matches(f)).collect()
    }
}

// ---------------------------------------------------------------------------
// TriageService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TriageService {
    store: Arc<dyn FichaStore>,
}

impl TriageService {
    pub fn new(store: Arc<dyn FichaStore>) -> Self {
        Self { store }
    }

    /// Pending fichas in triage order.
    pub fn rank_pending(&self) -> Result<Vec<Ficha>> {
        self.list(FichaState::Pending)
    }

    /// Fichas in `state`, in triage order.
    pub fn list(&self, state: FichaState) -> Result<Vec<Ficha>> {
        Ok(rank(self.store.list_by_state(state)?))
    }
}
