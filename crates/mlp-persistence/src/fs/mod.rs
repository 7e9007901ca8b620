//! `ArtifactStore` sobre el sistema de archivos.
//!
//! - Cada artifact es un archivo cuyo nombre es el nombre lógico.
//! - `put` escribe a un temporal hermano, hace `sync_all` y renombra: un
//!   lector ve el contenido anterior o el nuevo, nunca uno parcial.
//! - `put_batch` escribe todos los temporales antes de renombrar ninguno; si
//!   falla alguna escritura se borran los temporales y nada cambia.
//! - En lotes de más de un artifact cada destino existente se aparta a un
//!   `.bak` hermano antes del rename. Si un rename falla se deshacen los ya
//!   hechos y se restauran los `.bak`; sólo se borran cuando todo el lote
//!   quedó en su lugar.
//! - Los directorios se crean en la primera escritura.

mod layout;

pub use layout::ArtifactLayout;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, error, warn};
use mlp_core::{Artifact, ArtifactFormat, ArtifactStore, PipelineConfig, StoreError};

use crate::error::PersistenceError;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    layout: ArtifactLayout,
}

impl FsArtifactStore {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self { layout }
    }

    /// Todos los artifacts bajo un único directorio.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(ArtifactLayout::single_dir(dir))
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(ArtifactLayout::from_config(config))
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn path_of(&self, name: &str) -> Result<PathBuf, PersistenceError> {
        self.layout.path_for(name)
    }

    fn write_temp(&self, target: &Path, blob: &[u8]) -> Result<PathBuf, PersistenceError> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        with_retry(|| fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e)))?;
        let tmp = sibling(target, "tmp");
        let written = with_retry(|| {
            let mut f = File::create(&tmp).map_err(|e| PersistenceError::io(&tmp, e))?;
            f.write_all(blob).map_err(|e| PersistenceError::io(&tmp, e))?;
            f.sync_all().map_err(|e| PersistenceError::io(&tmp, e))
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(tmp)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, PersistenceError> {
        let path = self.path_of(name)?;
        with_retry(|| match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(PersistenceError::NotFound(name.to_string())),
            Err(e) => Err(PersistenceError::io(&path, e)),
        })
    }

    fn write_batch(&self, items: &[(&str, &[u8])]) -> Result<(), PersistenceError> {
        // Resolver todas las rutas antes de tocar el disco.
        let targets = items.iter()
                           .map(|(name, _)| self.path_of(name))
                           .collect::<Result<Vec<_>, _>>()?;

        let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(items.len());
        for ((_, blob), target) in items.iter().zip(&targets) {
            match self.write_temp(target, blob) {
                Ok(tmp) => staged.push((tmp, target.as_path())),
                Err(e) => {
                    for (tmp, _) in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    return Err(e);
                }
            }
        }

        let keep_backup = staged.len() > 1;
        let mut committed: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(staged.len());
        for (i, (tmp, target)) in staged.iter().enumerate() {
            match swap_in(tmp, target, keep_backup) {
                Ok(backup) => committed.push((*target, backup)),
                Err(e) => {
                    error!("fs_store:rename_failed target={} committed={i}/{}", target.display(), staged.len());
                    roll_back(&committed);
                    for (rest, _) in &staged[i..] {
                        let _ = fs::remove_file(rest);
                    }
                    return Err(e);
                }
            }
        }
        for backup in committed.iter().filter_map(|(_, b)| b.as_ref()) {
            if let Err(e) = fs::remove_file(backup) {
                warn!("fs_store:backup_cleanup_failed path={} err={e}", backup.display());
            }
        }
        debug!("fs_store:commit count={}", staged.len());
        Ok(())
    }
}

/// Ruta oculta junto a `target`: `.{nombre}.{kind}-{pid}-{n}`.
fn sibling(target: &Path, kind: &str) -> PathBuf {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let file_name = target.file_name().and_then(|f| f.to_str()).unwrap_or("artifact");
    dir.join(format!(".{file_name}.{kind}-{}-{}",
                     std::process::id(),
                     TMP_COUNTER.fetch_add(1, Ordering::Relaxed)))
}

/// Mueve `tmp` a `target`. Con `keep_backup` el archivo previo queda en un
/// `.bak` hermano, cuya ruta se devuelve.
fn swap_in(tmp: &Path, target: &Path, keep_backup: bool) -> Result<Option<PathBuf>, PersistenceError> {
    let backup = if keep_backup && target.is_file() {
        let bak = sibling(target, "bak");
        fs::rename(target, &bak).map_err(|e| PersistenceError::io(target, e))?;
        Some(bak)
    } else {
        None
    };
    if let Err(e) = fs::rename(tmp, target) {
        if let Some(bak) = &backup {
            let _ = fs::rename(bak, target);
        }
        return Err(PersistenceError::io(target, e));
    }
    Ok(backup)
}

/// Deshace renames ya hechos, del último al primero.
fn roll_back(committed: &[(&Path, Option<PathBuf>)]) {
    for (target, backup) in committed.iter().rev() {
        let restored = match backup {
            Some(bak) => fs::rename(bak, target),
            None => fs::remove_file(target),
        };
        if let Err(e) = restored {
            error!("fs_store:rollback_failed target={} err={e}", target.display());
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&self, name: &str, blob: &[u8], format: ArtifactFormat) -> Result<(), StoreError> {
        debug!("fs_store:put name={name} format={} bytes={}", format.as_str(), blob.len());
        Ok(self.write_batch(&[(name, blob)])?)
    }

    fn get(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        Ok(self.read(name)?)
    }

    fn put_batch(&self, artifacts: &[Artifact]) -> Result<(), StoreError> {
        let items: Vec<(&str, &[u8])> = artifacts.iter().map(|a| (a.name.as_str(), a.blob.as_slice())).collect();
        Ok(self.write_batch(&items)?)
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// Reintenta operaciones de IO transitorias con backoff lineal corto.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if e.is_transient() && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("transient io error (attempt {}): {} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_creates_directories_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::in_dir(dir.path().join("nested/results"));
        store.put("metrics", b"{}", ArtifactFormat::Metrics).unwrap();

        let parent = dir.path().join("nested/results");
        let entries: Vec<String> = fs::read_dir(&parent).unwrap()
                                                        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                                                        .collect();
        assert_eq!(entries, vec!["metrics".to_string()]);
        assert_eq!(store.get("metrics").unwrap(), b"{}".to_vec());
    }

    #[test]
    fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::in_dir(dir.path());
        assert_eq!(store.get("model"), Err(StoreError::NotFound("model".into())));
        assert!(!store.exists("model"));
    }

    #[test]
    fn batch_with_invalid_name_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::in_dir(dir.path());
        store.put("scaler", b"old", ArtifactFormat::Transformer).unwrap();
        let batch = vec![Artifact::new("scaler", ArtifactFormat::Transformer, b"new".to_vec()),
                         Artifact::new("../escape", ArtifactFormat::Tabular, b"x".to_vec()),];
        assert!(store.put_batch(&batch).is_err());
        assert_eq!(store.get("scaler").unwrap(), b"old".to_vec());
    }

    #[test]
    fn batch_failing_mid_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        let processed = dir.path().join("processed");
        // `processed` es un archivo: no se puede crear el directorio.
        fs::write(&processed, b"not a dir").unwrap();
        let store = FsArtifactStore::new(ArtifactLayout::new(results.join("raw-dataset"), processed, results.clone()));
        store.put("model", b"v1", ArtifactFormat::Model).unwrap();

        let batch = vec![Artifact::new("model", ArtifactFormat::Model, b"v2".to_vec()),
                         Artifact::new("scaler", ArtifactFormat::Transformer, b"s".to_vec()),];
        assert!(matches!(store.put_batch(&batch), Err(StoreError::Io(_))));
        assert_eq!(store.get("model").unwrap(), b"v1".to_vec());
        let leftovers = fs::read_dir(&results).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn batch_failing_mid_rename_restores_earlier_targets() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::in_dir(dir.path());
        store.put("train-features", b"old", ArtifactFormat::Tabular).unwrap();
        // Un directorio no vacío en el lugar de `test-features` hace fallar su rename.
        let blocker = dir.path().join("test-features");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), b"x").unwrap();

        let batch = vec![Artifact::new("train-features", ArtifactFormat::Tabular, b"new".to_vec()),
                         Artifact::new("test-features", ArtifactFormat::Tabular, b"new".to_vec()),];
        assert!(matches!(store.put_batch(&batch), Err(StoreError::Io(_))));

        assert_eq!(store.get("train-features").unwrap(), b"old".to_vec());
        assert!(blocker.join("keep").is_file());
        let mut entries: Vec<String> = fs::read_dir(dir.path()).unwrap()
                                                               .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                                                               .collect();
        entries.sort();
        assert_eq!(entries, vec!["test-features".to_string(), "train-features".to_string()]);
    }

    #[test]
    fn successful_batch_overwrites_and_drops_backups() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::in_dir(dir.path());
        store.put("model", b"v1", ArtifactFormat::Model).unwrap();
        store.put("metrics", b"m1", ArtifactFormat::Metrics).unwrap();

        let batch = vec![Artifact::new("model", ArtifactFormat::Model, b"v2".to_vec()),
                         Artifact::new("metrics", ArtifactFormat::Metrics, b"m2".to_vec()),];
        store.put_batch(&batch).unwrap();

        assert_eq!(store.get("model").unwrap(), b"v2".to_vec());
        assert_eq!(store.get("metrics").unwrap(), b"m2".to_vec());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
