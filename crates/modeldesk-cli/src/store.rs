//! Token persistence for the CLI: a small YAML file holding the `token` key.

use std::path::{Path, PathBuf};

use modeldesk::{ModeldeskError, Result, TokenStore};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Serialize, Deserialize)]
struct TokenFile {
    token: String,
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.modeldesk/token`, or `.modeldesk/token` when `HOME` is unset.
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(".modeldesk")
            .join("token")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_yaml::from_str::<TokenFile>(&content) {
            Ok(file) => Some(file.token),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable token file");
                None
            }
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(&TokenFile {
            token: token.to_string(),
        })?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ModeldeskError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeldesk::Session;
    use tempfile::TempDir;

    #[test]
    fn round_trips_through_session() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("token");

        let session = Session::new(FileTokenStore::new(&path));
        assert!(!session.is_authenticated());
        session.establish("abc123").unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("token: abc123"));

        let restored = Session::new(FileTokenStore::new(&path));
        assert_eq!(restored.authorization().as_deref(), Some("Bearer abc123"));

        restored.end().unwrap();
        assert!(!path.exists());
        FileTokenStore::new(&path).clear().unwrap();
    }

    #[test]
    fn garbage_file_is_no_session() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("token");
        std::fs::write(&path, "not: [valid").unwrap();
        assert_eq!(FileTokenStore::new(&path).load(), None);
    }
}
