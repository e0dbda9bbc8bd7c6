//! Storage layout configuration

use std::path::{Path, PathBuf};

use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// Name of the session file in the user's home directory
pub const CONFIG_FILE_NAME: &str = ".unit-cli.json";

/// Code file of a local unit
pub const CODE_FILE: &str = "index.js";

/// Readme file of a local unit
pub const README_FILE: &str = "readme.md";

/// Parameter document of a local unit
pub const CONFIG_FILE: &str = "config.json";

/// Location of the per-user session file
#[derive(Debug, Clone)]
pub struct ConfigLayout {
    /// Directory holding the session file
    pub base_dir: PathBuf,
}

impl ConfigLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the session file
    pub fn config_file(&self) -> File {
        File::new(self.base_dir.join(CONFIG_FILE_NAME))
    }
}

impl Default for ConfigLayout {
    fn default() -> Self {
        let base_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base_dir)
    }
}

/// The three files of one local unit
#[derive(Debug, Clone)]
pub struct UnitLayout {
    dir: Dir,
}

impl UnitLayout {
    /// Layout of unit `name` under the units root
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            dir: Dir::new(root.join(name)),
        }
    }

    pub fn dir(&self) -> &Dir {
        &self.dir
    }

    pub fn code_file(&self) -> File {
        self.dir.file(CODE_FILE)
    }

    pub fn readme_file(&self) -> File {
        self.dir.file(README_FILE)
    }

    pub fn config_file(&self) -> File {
        self.dir.file(CONFIG_FILE)
    }

    /// Code, readme and config paths, in that order
    pub fn paths(&self) -> [PathBuf; 3] {
        [
            self.code_file().path().to_path_buf(),
            self.readme_file().path().to_path_buf(),
            self.config_file().path().to_path_buf(),
        ]
    }
}
