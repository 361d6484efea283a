//! Durable keyed storage of fichas.
//!
//! Services hold an `Arc<dyn FichaStore>` handed to them at construction;
//! nothing reaches a backend through global state. Every backend applies
//! updates via [`crate::ficha::Ficha::apply`] inside its own critical
//! section, which makes each update an atomic read-modify-write per id.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryFichaStore;
pub use sqlite::SqliteFichaStore;

use crate::error::Result;
use crate::ficha::{Ficha, FichaPatch};
use crate::summary::{PriorityBreakdown, Stats, Summary};
use crate::types::FichaState;

pub trait FichaStore: Send + Sync {
    /// Fetch one ficha, or `NotFound`.
    fn get(&self, id: &str) -> Result<Ficha>;

    /// All fichas in `state`, in no particular order.
    fn list_by_state(&self, state: FichaState) -> Result<Vec<Ficha>>;

    fn list_all(&self) -> Result<Vec<Ficha>>;

    /// Insert a new ficha. Fails with `Conflict` when the id or url is taken.
    fn insert(&self, ficha: &Ficha) -> Result<()>;

    /// Apply `patch` to the ficha and return the stored result.
    /// Fails with `NotFound` when absent; always refreshes `updated_at`.
    fn update(&self, id: &str, patch: &FichaPatch) -> Result<Ficha>;

    /// Summary and priority breakdown computed from one snapshot.
    fn stats(&self) -> Result<Stats> {
        let fichas = self.list_all()?;
        Ok(Stats::from_fichas(&fichas))
    }

    fn summary(&self) -> Result<Summary> {
        Ok(self.stats()?.summary)
    }

    fn priority_breakdown(&self) -> Result<PriorityBreakdown> {
        Ok(self.stats()?.priorities)
    }
}
