//! Build metadata

use serde::{Deserialize, Serialize};

/// What `--version` prints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
    pub target: String,
}

pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
        target: option_env!("BUILD_TARGET").unwrap_or("unknown").to_string(),
    }
}

/// `User-Agent` sent with every API request
pub fn user_agent() -> String {
    let info = version_info();
    format!("unitsync/{} ({})", info.version, info.git_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.git_hash.is_empty());
    }

    #[test]
    fn test_user_agent_names_the_tool() {
        assert!(user_agent().starts_with(&format!("unitsync/{} (", env!("CARGO_PKG_VERSION"))));
    }
}
