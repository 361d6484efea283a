//! Batch insertion of discovered leads.
//!
//! Duplicate ids or urls are counted and skipped rather than treated as
//! failures, which lets a discovery run be replayed safely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FichaError, Result};
use crate::ficha::{Ficha, NewFicha};
use crate::store::FichaStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub inserted: u64,
    pub duplicates: u64,
    pub failed: u64,
}

/// Normalize and insert a single payload.
pub fn ingest_one(store: &dyn FichaStore, raw: NewFicha, now: DateTime<Utc>) -> Result<Ficha> {
    let ficha = raw.into_ficha(now)?;
    store.insert(&ficha)?;
    tracing::debug!(id = %ficha.id, url = %ficha.url, "ingested ficha");
    Ok(ficha)
}

pub fn ingest_all(
    store: &dyn FichaStore,
    batch: Vec<NewFicha>,
    now: DateTime<Utc>,
) -> IngestReport {
    let mut report = IngestReport::default();
    for raw in batch {
        let url = raw.url.clone();
        match ingest_one(store, raw, now) {
            Ok(_) => report.inserted += 1,
            Err(FichaError::Conflict(what)) => {
                tracing::debug!(url = %url, "skipping duplicate: {what}");
                report.duplicates += 1;
            }
            Err(e) => {
                tracing::warn!(url = %url, kind = e.kind(), "ingest failed: {e}");
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryFichaStore;

    #[test]
    fn duplicates_and_invalid_rows_are_counted_separately() {
        let store = MemoryFichaStore::new();
        let batch = vec![
            NewFicha::new("https://a.example"),
            NewFicha::new("https://b.example"),
            NewFicha::new("https://a.example"),
            NewFicha::new(""),
        ];
        let report = ingest_all(&store, batch, Utc::now());
        assert_eq!(
            report,
            IngestReport {
                inserted: 2,
                duplicates: 1,
                failed: 1
            }
        );
        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn replaying_a_batch_inserts_nothing_new() {
        let store = MemoryFichaStore::new();
        let batch = || vec![NewFicha::new("https://a.example")];
        ingest_all(&store, batch(), Utc::now());
        let again = ingest_all(&store, batch(), Utc::now());
        assert_eq!(again.inserted, 0);
        assert_eq!(again.duplicates, 1);
    }
}
