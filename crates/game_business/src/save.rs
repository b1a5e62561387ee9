//! The on-disk save artifact.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use engine_logic::{GameState, StateError};
use tracing::{debug, warn};

use crate::error::LoaderError;

/// File name of the save artifact inside the save directory.
pub const SAVED_GAME_FILE: &str = "saved_game.json";

/// Reads, writes and deletes `saved_game.json` in one directory.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(SAVED_GAME_FILE)
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Write `state`, replacing any previous save.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Save`]; the partially written file is deleted.
    pub fn write(&self, state: &GameState) -> Result<(), LoaderError> {
        self.write_with(|writer| state.write_to(writer))
    }

    fn write_with<F>(&self, write: F) -> Result<(), LoaderError>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), StateError>,
    {
        let path = self.path();
        match write_file(&self.dir, &path, write) {
            Ok(()) => {
                debug!(path = %path.display(), "game saved");
                Ok(())
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "save failed, deleting artifact");
                remove(&path);
                Err(LoaderError::Save(err))
            }
        }
    }

    /// Read the saved state, or `None` if there is no save.
    ///
    /// # Errors
    ///
    /// [`LoaderError::Open`] if the file exists but cannot be opened and
    /// [`LoaderError::Corrupt`] if it does not parse.
    pub fn read(&self) -> Result<Option<GameState>, LoaderError> {
        let file = match File::open(self.path()) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(LoaderError::Open(err)),
        };
        GameState::read_from(BufReader::new(file))
            .map(Some)
            .map_err(LoaderError::Corrupt)
    }

    /// Delete the save. Returns whether a file was removed.
    pub fn delete(&self) -> bool {
        remove(&self.path())
    }
}

fn write_file<F>(dir: &Path, path: &Path, write: F) -> Result<(), StateError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), StateError>,
{
    fs::create_dir_all(dir)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn remove(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not delete save");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("nested"));
        assert!(store.read().unwrap().is_none());

        let mut state = GameState::new();
        state.put_int("appVersion", 3);
        state.put_string("mapId", "original");
        store.write(&state).unwrap();

        assert!(store.exists());
        assert_eq!(store.read().unwrap(), Some(state));
    }

    #[test]
    fn test_failed_write_deletes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());

        let err = store
            .write_with(|writer| {
                writer.write_all(br#"{"appVersion": 1, "#)?;
                writer.flush()?;
                Err(StateError::Io(io::Error::other("disk full")))
            })
            .unwrap_err();

        assert!(matches!(err, LoaderError::Save(_)));
        assert!(!store.exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.read(), Err(LoaderError::Corrupt(_))));
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path());
        assert!(!store.delete());
        fs::write(store.path(), "{}").unwrap();
        assert!(store.delete());
        assert!(!store.exists());
    }
}
