//! User session file management

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::UnitError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Canonical remote endpoint
pub const DEFAULT_SERVER: &str = "https://unitcluster.com";

/// Current schema version of the session file
pub const CONFIG_VERSION: u32 = 1;

/// Credentials and local settings of the signed-in user
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub login: String,

    /// API key sent as `Authorization: UCKEY <key>`
    #[serde(default)]
    pub key: String,

    /// Directory units are mirrored to
    #[serde(default = "default_path")]
    pub path: PathBuf,

    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_path() -> PathBuf {
    PathBuf::from("units")
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("login", &self.login)
            .field("key", &self.masked_key())
            .field("path", &self.path)
            .field("server", &self.server)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Explicit settings that take precedence over the stored session
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    pub dir: Option<PathBuf>,
    pub login: Option<String>,
    pub key: Option<String>,
    pub server: Option<String>,
    pub log_level: Option<LogLevel>,
}

impl Session {
    /// Build a session from overrides alone, filling defaults
    pub fn from_overrides(overrides: &SessionOverrides) -> Self {
        let mut session = Session {
            login: String::new(),
            key: String::new(),
            path: default_path(),
            server: default_server(),
            log_level: LogLevel::default(),
        };
        session.merge(overrides);
        session
    }

    /// Apply overrides. Returns `true` when any field changed.
    pub fn merge(&mut self, overrides: &SessionOverrides) -> bool {
        let before = self.clone();
        if let Some(dir) = &overrides.dir {
            self.path = dir.clone();
        }
        if let Some(login) = &overrides.login {
            self.login = login.clone();
        }
        if let Some(key) = &overrides.key {
            self.key = key.clone();
        }
        if let Some(server) = &overrides.server {
            self.server = server.trim_end_matches('/').to_string();
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        *self != before
    }

    /// Check the session is usable
    pub fn validate(&self) -> Result<(), UnitError> {
        if self.login.is_empty() || self.key.is_empty() {
            return Err(UnitError::ConfigError(
                "login and API key are required, run with --login=<login> --key=<key>".to_string(),
            ));
        }
        url::Url::parse(&self.server)
            .map_err(|e| UnitError::ConfigError(format!("invalid server {}: {}", self.server, e)))?;
        Ok(())
    }

    /// Key with everything but the last four characters hidden
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.key.chars().collect();
        let visible = chars.len().saturating_sub(4);
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < visible { '*' } else { *c })
            .collect()
    }

    /// `login/name` as the API expects it
    pub fn full_name(&self, unit_name: &str) -> String {
        format!("{}/{}", self.login, unit_name)
    }
}

/// Contents of the session file.
///
/// Keys other than `version` and `user` belong to other tools and are kept
/// as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub user: Option<Session>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Load the session from the session file.
///
/// Returns `Ok(None)` if the file does not exist or holds no user.
pub async fn load_session(file: &File) -> Result<Option<Session>, UnitError> {
    if !file.exists().await {
        return Ok(None);
    }
    let document: ConfigDocument = file.read_json().await.map_err(|e| {
        UnitError::ConfigError(format!(
            "Error while reading config {}: {}",
            file.path().display(),
            e
        ))
    })?;
    Ok(document.user)
}

/// Save the session, keeping any other keys already in the file
pub async fn save_session(file: &File, session: &Session) -> Result<(), UnitError> {
    let mut document = if file.exists().await {
        file.read_json::<ConfigDocument>().await.map_err(|e| {
            UnitError::ConfigError(format!(
                "Refusing to overwrite unreadable config {}: {}",
                file.path().display(),
                e
            ))
        })?
    } else {
        ConfigDocument::default()
    };
    document.version = CONFIG_VERSION;
    document.user = Some(session.clone());

    let contents = serde_json::to_vec_pretty(&document)?;
    file.write_private(&contents).await?;
    info!("Saved session for {} to {}", session.login, file.path().display());
    Ok(())
}
