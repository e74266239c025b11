use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ServerError;
use crate::models::{Profile, Registry};

/// Trait for server list persistence
pub trait RegistryStorage {
    /// Load every stored record, in order
    fn load(&self) -> Result<Registry, ServerError>;

    /// Append one profile as the last record, creating the file if needed
    fn append(&self, profile: &Profile) -> Result<(), ServerError>;

    /// Overwrite the whole store with the given registry
    fn replace_all(&self, registry: &Registry) -> Result<(), ServerError>;

    /// Get the storage file path
    fn path(&self) -> &Path;
}

/// Plain-text implementation of RegistryStorage, one record per line
/// Rewrites use the atomic .tmp-then-rename pattern
pub struct TextRegistryStorage {
    path: PathBuf,
}

impl TextRegistryStorage {
    /// Create a new TextRegistryStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TextRegistryStorage { path }
    }

    /// File that rewrites land on; a symlinked list is followed to its target
    fn write_target(&self) -> Result<PathBuf, ServerError> {
        match fs::symlink_metadata(&self.path) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                fs::canonicalize(&self.path).map_err(|e| ServerError::io(&self.path, e))
            }
            _ => Ok(self.path.clone()),
        }
    }

    fn ensure_parent(&self) -> Result<(), ServerError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ServerError::io(parent, e))?;
        }
        Ok(())
    }
}

impl RegistryStorage for TextRegistryStorage {
    fn load(&self) -> Result<Registry, ServerError> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServerError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(ServerError::io(&self.path, e)),
        };

        if !metadata.is_file() {
            return Err(ServerError::NotAFile(self.path.clone()));
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|e| ServerError::io(&self.path, e))?;
        let records: Vec<String> = contents.lines().map(str::to_string).collect();

        log::debug!("Loaded {} servers from {:?}", records.len(), self.path);
        Ok(Registry::from_records(records))
    }

    fn append(&self, profile: &Profile) -> Result<(), ServerError> {
        self.ensure_parent()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ServerError::io(&self.path, e))?;

        // Whole record in a single write
        let mut line = profile.encode();
        line.push('\n');
        file.write_all(line.as_bytes())
            .map_err(|e| ServerError::io(&self.path, e))?;

        log::info!("Appended {} to {:?}", profile.server_name(), self.path);
        Ok(())
    }

    fn replace_all(&self, registry: &Registry) -> Result<(), ServerError> {
        self.ensure_parent()?;

        let mut contents = String::new();
        for record in registry.records() {
            contents.push_str(record);
            contents.push('\n');
        }

        // Atomic write pattern: write to .tmp, sync, then rename
        let target = self.write_target()?;
        let tmp_path = tmp_path_for(&target);
        let mut file = File::create(&tmp_path).map_err(|e| ServerError::io(&tmp_path, e))?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| ServerError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &target).map_err(|e| ServerError::io(&target, e))?;

        log::info!("Wrote {} servers to {:?}", registry.len(), self.path);
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Sibling temporary file, e.g. `servers` -> `servers.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let storage = TextRegistryStorage::new(dir.path().join("servers"));
        assert!(matches!(storage.load(), Err(ServerError::NotFound(_))));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempdir().unwrap();
        let storage = TextRegistryStorage::new(dir.path().to_path_buf());
        assert!(matches!(storage.load(), Err(ServerError::NotAFile(_))));
    }

    #[test]
    fn test_append_creates_file_and_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/var/servers");
        let storage = TextRegistryStorage::new(path.clone());

        storage.append(&Profile::new("alice", "one")).unwrap();
        storage.append(&Profile::new("bob", "two")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "alice@one 22  #\nbob@two 22  #\n");

        let registry = storage.load().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.profile(2).unwrap().user, "bob");
    }

    #[test]
    fn test_load_keeps_raw_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers");
        fs::write(&path, "a@b 22 -v #x\r\nc@d 2200  #y\n").unwrap();

        let storage = TextRegistryStorage::new(path);
        let registry = storage.load().unwrap();
        assert_eq!(registry.records(), &["a@b 22 -v #x", "c@d 2200  #y"]);
    }

    #[test]
    fn test_replace_all_rewrites_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers");
        fs::write(&path, "a@1 22  #\nb@2 22  #\nc@3 22  #\n").unwrap();

        let storage = TextRegistryStorage::new(path.clone());
        let mut registry = storage.load().unwrap();
        registry.remove_positions(&[2]);
        storage.replace_all(&registry).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a@1 22  #\nc@3 22  #\n");
        assert!(!tmp_path_for(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_all_follows_symlink() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real-servers");
        let link = dir.path().join("servers");
        fs::write(&real, "a@1 22  #\nb@2 22  #\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let storage = TextRegistryStorage::new(link.clone());
        let mut registry = storage.load().unwrap();
        registry.remove_positions(&[1]);
        storage.replace_all(&registry).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "b@2 22  #\n");
        assert_eq!(fs::read_to_string(&link).unwrap(), "b@2 22  #\n");
        assert!(!tmp_path_for(&real).exists());
    }

    #[test]
    fn test_replace_all_empty_registry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers");
        fs::write(&path, "a@1 22  #\n").unwrap();

        let storage = TextRegistryStorage::new(path.clone());
        storage.replace_all(&Registry::default()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert!(storage.load().unwrap().is_empty());
    }
}
