//! Directory access for the units root and unit directories

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::UnitError;
use crate::filesys::file::File;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dir {
    path: PathBuf,
}

#[derive(Clone, Copy)]
enum EntryKind {
    File,
    Dir,
}

impl Dir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last path component, if it is valid UTF-8
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create the directory and its parents; a no-op if it exists
    pub async fn create(&self) -> Result<(), UnitError> {
        fs::create_dir_all(&self.path)
            .await
            .map_err(|e| UnitError::DirectoryCreate {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Remove the directory tree. A missing directory is not an error.
    pub async fn delete(&self) -> Result<(), UnitError> {
        match fs::remove_dir_all(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Regular files directly inside, sorted
    pub async fn list_files(&self) -> Result<Vec<PathBuf>, UnitError> {
        self.entries(EntryKind::File).await
    }

    /// Subdirectories directly inside, sorted
    pub async fn list_dirs(&self) -> Result<Vec<PathBuf>, UnitError> {
        self.entries(EntryKind::Dir).await
    }

    async fn entries(&self, kind: EntryKind) -> Result<Vec<PathBuf>, UnitError> {
        let mut found = Vec::new();
        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let wanted = match kind {
                EntryKind::File => file_type.is_file(),
                EntryKind::Dir => file_type.is_dir(),
            };
            if wanted {
                found.push(entry.path());
            }
        }
        found.sort();
        Ok(found)
    }

    pub fn file(&self, name: &str) -> File {
        File::new(self.path.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listings_are_sorted_and_split() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("zeta")).unwrap();
        std::fs::create_dir(root.path().join("alpha")).unwrap();
        std::fs::write(root.path().join("notes.txt"), "").unwrap();

        let dir = Dir::new(root.path());
        assert_eq!(
            dir.list_dirs().await.unwrap(),
            vec![root.path().join("alpha"), root.path().join("zeta")]
        );
        assert_eq!(dir.list_files().await.unwrap(), vec![root.path().join("notes.txt")]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let root = tempfile::tempdir().unwrap();
        assert!(Dir::new(root.path().join("gone")).delete().await.is_ok());
    }
}
