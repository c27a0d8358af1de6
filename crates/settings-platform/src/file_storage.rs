//! JSON-file backed local storage.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{LocalStorage, StorageError, StorageKey};

/// Stores all keys in one JSON object, rewritten atomically on every change.
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(StorageError::Unavailable(format!(
                    "failed reading storage {}: {err}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_str(&raw).map_err(|err| {
            StorageError::Backend(format!(
                "failed parsing storage {}: {err}",
                self.path.display()
            ))
        })
    }

    fn save(&self, data: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                StorageError::Unavailable(format!(
                    "failed creating storage directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let encoded =
            serde_json::to_vec_pretty(data).map_err(|err| StorageError::Backend(err.to_string()))?;
        let temp_path = temp_path_for(&self.path);
        fs::write(&temp_path, encoded).map_err(|err| {
            StorageError::Unavailable(format!(
                "failed writing temp storage {}: {err}",
                temp_path.display()
            ))
        })?;

        if let Err(rename_err) = fs::rename(&temp_path, &self.path) {
            // Windows does not allow replacing existing files via rename.
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    let _ = fs::remove_file(&temp_path);
                    return Err(StorageError::Unavailable(format!(
                        "failed replacing storage {} after rename error ({rename_err}): {err}",
                        self.path.display()
                    )));
                }
            }
            fs::rename(&temp_path, &self.path).map_err(|err| {
                let _ = fs::remove_file(&temp_path);
                StorageError::Unavailable(format!(
                    "failed writing storage {} after temp write: {err}",
                    self.path.display()
                ))
            })?;
        }

        Ok(())
    }

    fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock".to_owned()))?;
        let mut data = self.load()?;
        mutate(&mut data);
        self.save(&data)
    }
}

impl LocalStorage for FileStorage {
    fn get_string(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key.as_str()))
    }

    fn set_string(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.update(|data| {
            data.insert(key.as_str().to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        self.update(|data| {
            data.remove(key.as_str());
        })
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("storage.json");
    let now_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    parent.join(format!(".{file_name}.{now_nanos}.tmp"))
}
