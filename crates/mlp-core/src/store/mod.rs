//! Contrato `ArtifactStore` y backend en memoria.
//!
//! El store es un key-value sin lógica de orden: nombre lógico → blob. La
//! única garantía adicional es `put_batch`, que confirma todos los artifacts
//! de un intento o ninguno.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::errors::StoreError;
use crate::model::{Artifact, ArtifactDecl, ArtifactFormat};

pub trait ArtifactStore: Send + Sync {
    /// Escribe (o sobreescribe) un artifact. Atómico para el lector.
    fn put(&self, name: &str, blob: &[u8], format: ArtifactFormat) -> Result<(), StoreError>;

    /// Lee el blob de un artifact. `NotFound` si nunca fue escrito.
    fn get(&self, name: &str) -> Result<Vec<u8>, StoreError>;

    /// Confirma un lote completo: o quedan visibles todos, o ninguno.
    fn put_batch(&self, artifacts: &[Artifact]) -> Result<(), StoreError>;

    fn exists(&self, name: &str) -> bool;

    /// Lee un artifact declarado y lo envuelve con su formato.
    fn load(&self, decl: &ArtifactDecl) -> Result<Artifact, StoreError> {
        let blob = self.get(decl.name)?;
        Ok(Artifact::new(decl.name, decl.format, blob))
    }
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for Arc<T> {
    fn put(&self, name: &str, blob: &[u8], format: ArtifactFormat) -> Result<(), StoreError> {
        (**self).put(name, blob, format)
    }
    fn get(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        (**self).get(name)
    }
    fn put_batch(&self, artifacts: &[Artifact]) -> Result<(), StoreError> {
        (**self).put_batch(artifacts)
    }
    fn exists(&self, name: &str) -> bool {
        (**self).exists(name)
    }
}

/// Store en memoria con la misma semántica que el backend de archivos.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    inner: RwLock<HashMap<String, Artifact>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nombres presentes, ordenados.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.inner.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        names.sort();
        names
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn put(&self, name: &str, blob: &[u8], format: ArtifactFormat) -> Result<(), StoreError> {
        let mut guard = self.inner.write().map_err(|e| StoreError::Io(format!("lock poisoned: {e}")))?;
        guard.insert(name.to_string(), Artifact::new(name, format, blob.to_vec()));
        debug!("memory_store:put name={name} bytes={}", blob.len());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let guard = self.inner.read().map_err(|e| StoreError::Io(format!("lock poisoned: {e}")))?;
        guard.get(name)
             .map(|a| a.blob.clone())
             .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn put_batch(&self, artifacts: &[Artifact]) -> Result<(), StoreError> {
        // Un único write-lock: ningún lector observa el lote a medias.
        let mut guard = self.inner.write().map_err(|e| StoreError::Io(format!("lock poisoned: {e}")))?;
        for a in artifacts {
            guard.insert(a.name.clone(), a.clone());
        }
        debug!("memory_store:put_batch count={}", artifacts.len());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.inner.read().map(|g| g.contains_key(name)).unwrap_or(false)
    }
}
