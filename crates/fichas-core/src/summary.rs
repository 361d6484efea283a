//! Aggregate counts over the ficha store.

use crate::error::Result;
use crate::ficha::Ficha;
use crate::store::FichaStore;
use crate::types::{FichaState, Priority};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: u64,
    pub pending: u64,
    pub contacted: u64,
    pub discarded: u64,
    pub processed: u64,
    pub unprocessed: u64,
}

impl Summary {
    /// Count over an already-materialized snapshot.
    pub fn from_fichas<'a>(fichas: impl IntoIterator<Item = &'a Ficha>) -> Self {
        let mut s = Summary::default();
        for f in fichas {
            s.total += 1;
            match f.state {
                FichaState::Pending => s.pending += 1,
                FichaState::Contacted => s.contacted += 1,
                FichaState::Discarded => s.discarded += 1,
            }
            if f.processed {
                s.processed += 1;
            } else {
                s.unprocessed += 1;
            }
        }
        s
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub unranked: u64,
}

impl PriorityBreakdown {
    pub fn from_fichas<'a>(fichas: impl IntoIterator<Item = &'a Ficha>) -> Self {
        let mut b = PriorityBreakdown::default();
        for f in fichas {
            match f.priority {
                Some(Priority::High) => b.high += 1,
                Some(Priority::Medium) => b.medium += 1,
                Some(Priority::Low) => b.low += 1,
                None => b.unranked += 1,
            }
        }
        b
    }
}

/// Summary and priority breakdown taken from the same snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(flatten)]
    pub summary: Summary,
    pub priorities: PriorityBreakdown,
}

impl Stats {
    pub fn from_fichas(fichas: &[Ficha]) -> Self {
        Self {
            summary: Summary::from_fichas(fichas),
            priorities: PriorityBreakdown::from_fichas(fichas),
        }
    }
}

/// Read-only service deriving counts from the store on every call.
#[derive(Clone)]
pub struct AggregationService {
    store: Arc<dyn FichaStore>,
}

impl AggregationService {
    pub fn new(store: Arc<dyn FichaStore>) -> Self {
        Self { store }
    }

    pub fn summary(&self) -> Result<Summary> {
        self.store.summary()
    }

    pub fn priorities(&self) -> Result<PriorityBreakdown> {
        self.store.priority_breakdown()
    }

    /// Both aggregates from one read of the store.
    pub fn stats(&self) -> Result<Stats> {
        self.store.stats()
    }
}
