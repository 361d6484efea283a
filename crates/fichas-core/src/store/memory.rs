use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::error::{FichaError, Result};
use crate::ficha::{Ficha, FichaPatch};
use crate::types::FichaState;

use super::FichaStore;

/// In-process store keyed by id.
#[derive(Debug, Default)]
pub struct MemoryFichaStore {
    fichas: RwLock<BTreeMap<String, Ficha>>,
}

impl MemoryFichaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Ficha>>> {
        self.fichas
            .read()
            .map_err(|_| FichaError::StorageUnavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Ficha>>> {
        self.fichas
            .write()
            .map_err(|_| FichaError::StorageUnavailable("memory store lock poisoned".into()))
    }
}

impl FichaStore for MemoryFichaStore {
    fn get(&self, id: &str) -> Result<Ficha> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| FichaError::NotFound(id.to_string()))
    }

    fn list_by_state(&self, state: FichaState) -> Result<Vec<Ficha>> {
        Ok(self
            .read()?
            .values()
            .filter(|f| f.state == state)
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<Ficha>> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn insert(&self, ficha: &Ficha) -> Result<()> {
        let mut fichas = self.write()?;
        if fichas.contains_key(&ficha.id) {
            return Err(FichaError::Conflict(format!("id {}", ficha.id)));
        }
        if fichas.values().any(|f| f.url == ficha.url) {
            return Err(FichaError::Conflict(format!("url {}", ficha.url)));
        }
        fichas.insert(ficha.id.clone(), ficha.clone());
        Ok(())
    }

    fn update(&self, id: &str, patch: &FichaPatch) -> Result<Ficha> {
        let mut fichas = self.write()?;
        let stored = fichas
            .get_mut(id)
            .ok_or_else(|| FichaError::NotFound(id.to_string()))?;
        stored.apply(patch, Utc::now())?;
        Ok(stored.clone())
    }
}
