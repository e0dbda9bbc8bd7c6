//! On-disk representation of units

use std::path::{Path, PathBuf};

use colored::Colorize;
use globset::Glob;
use tracing::{debug, warn};

use crate::codec::params;
use crate::errors::UnitError;
use crate::filesys::dir::Dir;
use crate::models::unit::Unit;
use crate::storage::layout::UnitLayout;
use crate::storage::session::Session;
use crate::watch::session::WatchRegistry;

/// Write `unit` to `root/<name>/` and register its three files.
///
/// Existing local files are overwritten. Returns the unit directory.
pub async fn materialize(
    unit: &Unit,
    root: &Path,
    registry: &WatchRegistry,
) -> Result<PathBuf, UnitError> {
    let layout = UnitLayout::new(root, &unit.name);
    for path in layout.paths() {
        registry.register(path);
    }
    debug!("Materializing {} at {}", unit.name, layout.dir().path().display());

    layout.dir().create().await?;
    layout.code_file().write_string(&unit.code).await?;
    layout.readme_file().write_string(&unit.readme).await?;
    layout
        .config_file()
        .write_string(&params::to_pretty_string(&unit.parameters)?)
        .await?;

    Ok(layout.dir().path().to_path_buf())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true)
}

/// Find the first unit directory under `root` whose name matches `pattern`.
///
/// `pattern` is a glob (`hel*`, `te?t`); hidden directories are skipped.
/// A missing root yields `None`.
pub async fn find_local_unit(root: &Path, pattern: &str) -> Result<Option<PathBuf>, UnitError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    let root = Dir::new(root);
    if !root.exists().await {
        return Ok(None);
    }
    let matcher = match Glob::new(pattern) {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            warn!("Invalid unit pattern {:?}, matching literally: {}", pattern, e);
            None
        }
    };

    let found = root.list_dirs().await?.into_iter().find(|dir| {
        if is_hidden(dir) {
            return false;
        }
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        match &matcher {
            Some(m) => m.is_match(name),
            None => name == pattern,
        }
    });
    Ok(found)
}

/// Remove a unit directory and everything in it
pub async fn delete_local_unit(path: &Path) -> Result<(), UnitError> {
    let dir = Dir::new(path);
    dir.delete().await.map_err(|e| UnitError::DeleteLocal {
        unit: dir.name().unwrap_or_default().to_string(),
        reason: e.to_string(),
    })
}

/// A local unit and, when listed in detail, its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUnit {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<String>,
}

/// List unit directories under `root`. Files are listed when `level > 0`.
pub async fn list_local_units(root: &Path, level: u32) -> Result<Vec<LocalUnit>, UnitError> {
    let root = Dir::new(root);
    if !root.exists().await {
        return Ok(Vec::new());
    }
    let mut units = Vec::new();
    for path in root.list_dirs().await? {
        if is_hidden(&path) {
            continue;
        }
        let dir = Dir::new(&path);
        let files = if level > 0 {
            dir.list_files()
                .await?
                .iter()
                .filter_map(|f| f.file_name().and_then(|n| n.to_str()).map(str::to_string))
                .collect()
        } else {
            Vec::new()
        };
        units.push(LocalUnit {
            name: dir.name().unwrap_or_default().to_string(),
            path,
            files,
        });
    }
    Ok(units)
}

/// Draw units as a tree below `header`
pub fn render_tree(header: &str, units: &[LocalUnit]) -> String {
    let mut out = String::from(header);
    for (i, unit) in units.iter().enumerate() {
        let last = i + 1 == units.len();
        out.push('\n');
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&unit.name);
        for (j, file) in unit.files.iter().enumerate() {
            out.push('\n');
            out.push_str(if last { "    " } else { "│   " });
            out.push_str(if j + 1 == unit.files.len() { "└── " } else { "├── " });
            out.push_str(file);
        }
    }
    out
}

/// Render the local units of `session` as a tree, with files when
/// `level > 0`.
pub async fn print_units(session: Option<&Session>, level: u32) -> Result<String, UnitError> {
    let session = session.ok_or(UnitError::NoUser)?;
    let units = list_local_units(&session.path, level).await?;
    let header = format!("[{}] {}", session.login, session.path.display());
    Ok(render_tree(&header.cyan().to_string(), &units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::unit::Parameter;

    fn unit(name: &str) -> Unit {
        Unit {
            id: None,
            name: name.to_string(),
            language: "javascript".to_string(),
            code: "module.exports = 1".to_string(),
            readme: "# readme".to_string(),
            parameters: vec![Parameter::public("a", "1"), Parameter::secret("b", "2")],
        }
    }

    #[tokio::test]
    async fn test_materialize_writes_and_registers() {
        let root = tempfile::tempdir().unwrap();
        let registry = WatchRegistry::new();

        let path = materialize(&unit("hello"), root.path(), &registry).await.unwrap();
        assert_eq!(path, root.path().join("hello"));
        assert_eq!(
            std::fs::read_to_string(path.join("index.js")).unwrap(),
            "module.exports = 1"
        );
        assert_eq!(std::fs::read_to_string(path.join("readme.md")).unwrap(), "# readme");
        let config: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path.join("config.json")).unwrap())
                .unwrap();
        assert_eq!(config, serde_json::json!({"public": {"a": "1"}, "secret": {"b": "2"}}));

        assert_eq!(registry.len(), 3);
        materialize(&unit("hello"), root.path(), &registry).await.unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_find_local_unit_globs() {
        let root = tempfile::tempdir().unwrap();
        for name in ["alpha", "beta", ".hidden"] {
            std::fs::create_dir_all(root.path().join(name)).unwrap();
        }

        let found = find_local_unit(root.path(), "al*").await.unwrap();
        assert_eq!(found, Some(root.path().join("alpha")));
        assert_eq!(find_local_unit(root.path(), "beta").await.unwrap(), Some(root.path().join("beta")));
        assert_eq!(find_local_unit(root.path(), ".hid*").await.unwrap(), None);
        assert_eq!(find_local_unit(root.path(), "gamma").await.unwrap(), None);
        assert_eq!(find_local_unit(&root.path().join("missing"), "alpha").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_and_render() {
        let root = tempfile::tempdir().unwrap();
        let registry = WatchRegistry::new();
        materialize(&unit("alpha"), root.path(), &registry).await.unwrap();
        materialize(&unit("beta"), root.path(), &registry).await.unwrap();

        let shallow = list_local_units(root.path(), 0).await.unwrap();
        assert_eq!(render_tree("[me] units", &shallow), "[me] units\n├── alpha\n└── beta");

        let deep = list_local_units(root.path(), 1).await.unwrap();
        assert_eq!(deep[0].files, vec!["config.json", "index.js", "readme.md"]);
        let tree = render_tree("[me] units", &deep);
        assert!(tree.contains("│   ├── config.json"));
        assert!(tree.ends_with("    └── readme.md"));
    }

    #[tokio::test]
    async fn test_print_units_requires_session() {
        assert!(matches!(print_units(None, 0).await, Err(UnitError::NoUser)));

        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("hello")).unwrap();
        let mut session: Session = serde_json::from_str(r#"{"login": "me", "key": "k"}"#).unwrap();
        session.path = root.path().to_path_buf();
        let tree = print_units(Some(&session), 0).await.unwrap();
        assert!(tree.contains("[me]"));
        assert!(tree.ends_with("└── hello"));
    }
}
