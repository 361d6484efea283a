pub mod config;
pub mod error;
pub mod export;
pub mod ficha;
pub mod ingest;
pub mod io;
pub mod lifecycle;
pub mod paths;
pub mod store;
pub mod summary;
pub mod triage;
pub mod types;

pub use error::{FichaError, Result};
pub use ficha::{Ficha, FichaPatch, NewFicha};
pub use lifecycle::{BulkOutcome, LifecycleService};
pub use store::{FichaStore, MemoryFichaStore, SqliteFichaStore};
pub use summary::{AggregationService, PriorityBreakdown, Stats, Summary};
pub use triage::{TriageFilter, TriageService};
pub use types::{FichaState, Priority};
