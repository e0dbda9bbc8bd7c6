//! Single-file access used by the unit store and the session file

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::UnitError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Whole file as UTF-8 text
    pub async fn read_string(&self) -> Result<String, UnitError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, UnitError> {
        let contents = self.read_string().await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replace the file's contents, creating missing parent directories.
    pub async fn write_string(&self, contents: &str) -> Result<(), UnitError> {
        self.create_parent().await?;
        fs::write(&self.path, contents).await?;
        Ok(())
    }

    /// Replace the file through a sibling temp file readable only by the
    /// owner, so readers never observe a half-written or world-readable file.
    pub async fn write_private(&self, contents: &[u8]) -> Result<(), UnitError> {
        self.create_parent().await?;
        let temp_path = self.temp_path();

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn create_parent(&self) -> Result<(), UnitError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).await?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// `<name>.tmp` next to the file; keeps dotted names like `.unit-cli.json` intact
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("file"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_keeps_full_name() {
        let file = File::new("/home/a/.unit-cli.json");
        assert_eq!(file.temp_path(), PathBuf::from("/home/a/.unit-cli.json.tmp"));
    }

    #[tokio::test]
    async fn test_write_string_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let file = File::new(dir.path().join("hello/index.js"));
        file.write_string("// hi").await.unwrap();
        assert!(file.exists().await);
        assert_eq!(file.read_string().await.unwrap(), "// hi");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_private_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = File::new(dir.path().join(".unit-cli.json"));
        file.write_private(b"{}").await.unwrap();

        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!file.temp_path().exists());
    }
}
