//! Static JSON snapshot of the whole store, for offline dashboards.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ficha::Ficha;
use crate::io;
use crate::store::FichaStore;
use crate::summary::{PriorityBreakdown, Summary};

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub summary: Summary,
    pub priorities: PriorityBreakdown,
    /// Every ficha, newest first.
    pub fichas: Vec<Ficha>,
}

/// Build a snapshot from one read of the store; counts are derived from the
/// same list that is exported so the two always agree.
pub fn snapshot(store: &dyn FichaStore, now: DateTime<Utc>) -> Result<Snapshot> {
    let mut fichas = store.list_all()?;
    fichas.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Snapshot {
        generated_at: now,
        version: SNAPSHOT_VERSION.to_string(),
        summary: Summary::from_fichas(&fichas),
        priorities: PriorityBreakdown::from_fichas(&fichas),
        fichas,
    })
}

pub fn write_json(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let data = serde_json::to_vec_pretty(snapshot)?;
    io::atomic_write(path, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ficha::NewFicha;
    use crate::store::MemoryFichaStore;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn snapshot_is_newest_first_with_matching_counts() {
        let store = MemoryFichaStore::new();
        let t = Utc::now();
        for (i, p) in ["alta", "baja"].iter().enumerate() {
            let mut raw = NewFicha::new(format!("https://example.org/{i}"));
            raw.id = Some(format!("F{i}"));
            raw.priority = Some(p.to_string());
            raw.created_at = Some(t + Duration::seconds(i as i64));
            store.insert(&raw.into_ficha(t).unwrap()).unwrap();
        }

        let snap = snapshot(&store, t).unwrap();
        assert_eq!(snap.fichas[0].id, "F1");
        assert_eq!(snap.summary.total, 2);
        assert_eq!(snap.priorities.high, 1);
        assert_eq!(snap.priorities.low, 1);
    }

    #[test]
    fn write_json_produces_parseable_file() {
        let dir = TempDir::new().unwrap();
        let store = MemoryFichaStore::new();
        store
            .insert(&NewFicha::new("https://example.org").into_ficha(Utc::now()).unwrap())
            .unwrap();
        let path = dir.path().join("fichas.json");
        write_json(&path, &snapshot(&store, Utc::now()).unwrap()).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["version"], SNAPSHOT_VERSION);
        assert_eq!(parsed["summary"]["pending"], 1);
        assert_eq!(parsed["fichas"].as_array().unwrap().len(), 1);
    }
}
