//! Map a changed unit file to the content it carries.
//!
//! Dispatch is by file role only, the base name without extension:
//! `index` is code, `readme` is the readme, `config` holds parameters.
//! Contents are never diffed.

use std::path::Path;

use crate::codec::params;
use crate::errors::UnitError;
use crate::filesys::file::File;
use crate::models::unit::Parameter;

/// Which part of a unit a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Code,
    Readme,
    Parameters,
}

impl ContentKind {
    /// Role of a file, from its base name
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.file_stem().and_then(|s| s.to_str())? {
            "index" => Some(ContentKind::Code),
            "readme" => Some(ContentKind::Readme),
            "config" => Some(ContentKind::Parameters),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Code => "code",
            ContentKind::Readme => "readme",
            ContentKind::Parameters => "parameters",
        }
    }
}

/// New content of one part of a unit
#[derive(Debug, Clone, PartialEq)]
pub enum ChangedContent {
    Code(String),
    Readme(String),
    Parameters(Vec<Parameter>),
}

impl ChangedContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            ChangedContent::Code(_) => ContentKind::Code,
            ChangedContent::Readme(_) => ContentKind::Readme,
            ChangedContent::Parameters(_) => ContentKind::Parameters,
        }
    }
}

/// Name of the unit owning `path`: its parent directory
pub fn unit_name(path: &Path) -> Option<&str> {
    path.parent()?.file_name()?.to_str()
}

/// `unit/file` label used in user-facing errors
fn unit_label(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match unit_name(path) {
        Some(unit) => format!("{}/{}", unit, file),
        None => file,
    }
}

/// Read `path` and classify it. Files with an unknown role yield `None`
/// without being read.
pub async fn classify(path: &Path) -> Result<Option<ChangedContent>, UnitError> {
    let Some(kind) = ContentKind::from_path(path) else {
        return Ok(None);
    };
    let contents = File::new(path).read_string().await?;
    let changed = match kind {
        ContentKind::Code => ChangedContent::Code(contents),
        ContentKind::Readme => ChangedContent::Readme(contents),
        ContentKind::Parameters => {
            ChangedContent::Parameters(params::decode_str(&contents, &unit_label(path))?)
        }
    };
    Ok(Some(changed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ignores_extension() {
        assert_eq!(ContentKind::from_path(Path::new("/u/a/index.js")), Some(ContentKind::Code));
        assert_eq!(ContentKind::from_path(Path::new("/u/a/index.ts")), Some(ContentKind::Code));
        assert_eq!(ContentKind::from_path(Path::new("/u/a/readme.md")), Some(ContentKind::Readme));
        assert_eq!(ContentKind::from_path(Path::new("/u/a/readme")), Some(ContentKind::Readme));
        assert_eq!(
            ContentKind::from_path(Path::new("/u/a/config.yaml")),
            Some(ContentKind::Parameters)
        );
        assert_eq!(ContentKind::from_path(Path::new("/u/a/notes.txt")), None);
        assert_eq!(ContentKind::from_path(Path::new("/u/a/INDEX.js")), None);
    }

    #[test]
    fn test_unit_name_is_parent_dir() {
        assert_eq!(unit_name(Path::new("/units/hello/index.js")), Some("hello"));
    }

    #[tokio::test]
    async fn test_classify_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let unit = dir.path().join("hello");
        std::fs::create_dir_all(&unit).unwrap();
        std::fs::write(unit.join("index.js"), "module.exports = 1").unwrap();
        std::fs::write(unit.join("config.json"), r#"{"public": {"a": "1"}, "secret": {}}"#).unwrap();
        std::fs::write(unit.join("other.js"), "ignored").unwrap();

        let code = classify(&unit.join("index.js")).await.unwrap();
        assert_eq!(code, Some(ChangedContent::Code("module.exports = 1".to_string())));

        let params = classify(&unit.join("config.json")).await.unwrap();
        assert_eq!(
            params,
            Some(ChangedContent::Parameters(vec![Parameter::public("a", "1")]))
        );

        assert_eq!(classify(&unit.join("other.js")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_classify_malformed_config_names_unit() {
        let dir = tempfile::tempdir().unwrap();
        let unit = dir.path().join("hello");
        std::fs::create_dir_all(&unit).unwrap();
        std::fs::write(unit.join("config.json"), "{ oops").unwrap();

        let err = classify(&unit.join("config.json")).await.unwrap_err();
        assert!(err.to_string().contains("hello/config.json"), "{err}");
    }
}
