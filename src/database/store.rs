use std::{
    cell::RefCell,
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::errors::PersistenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Workouts,
    Drawings,
}

impl StorageKey {
    pub const ALL: [StorageKey; 2] = [StorageKey::Workouts, StorageKey::Drawings];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Workouts => "workouts",
            StorageKey::Drawings => "drawings",
        }
    }
}

/// Durable string storage addressed by key, the way a browser's local storage is.
pub trait KeyValueStore {
    fn save(&self, key: StorageKey, value: &str) -> Result<(), PersistenceError>;
    fn load(&self, key: StorageKey) -> Result<Option<String>, PersistenceError>;
    fn clear(&self) -> Result<(), PersistenceError>;
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<StorageKey, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, key: StorageKey) -> Option<String> {
        self.entries.borrow().get(&key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn save(&self, key: StorageKey, value: &str) -> Result<(), PersistenceError> {
        self.entries.borrow_mut().insert(key, value.to_string());
        Ok(())
    }

    fn load(&self, key: StorageKey) -> Result<Option<String>, PersistenceError> {
        Ok(self.get(key))
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

/// One `<key>.json` file per key inside `directory`.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
        }
    }

    fn path_of(&self, key: StorageKey) -> PathBuf {
        self.directory.join(format!("{}.json", key.as_str()))
    }
}

impl KeyValueStore for FileStore {
    fn save(&self, key: StorageKey, value: &str) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.directory)?;

        // staged, then renamed over the target
        let target = self.path_of(key);
        let staging = target.with_extension("json.tmp");
        std::fs::write(&staging, value)?;
        std::fs::rename(&staging, &target)?;

        Ok(())
    }

    fn load(&self, key: StorageKey) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.path_of(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        for key in StorageKey::ALL {
            match std::fs::remove_file(self.path_of(key)) {
                Err(err) if err.kind() != ErrorKind::NotFound => return Err(err.into()),
                _ => {}
            }
        }

        Ok(())
    }
}
