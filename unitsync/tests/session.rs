//! Session file persistence

use tokio_test::assert_ok;

use unitsync::filesys::file::File;
use unitsync::storage::session::{load_session, save_session, Session, SessionOverrides};

fn session() -> Session {
    Session::from_overrides(&SessionOverrides {
        login: Some("alice".to_string()),
        key: Some("k3y".to_string()),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_missing_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = File::new(dir.path().join(".unit-cli.json"));
    assert_eq!(assert_ok!(load_session(&file).await), None);
}

#[tokio::test]
async fn test_save_keeps_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".unit-cli.json");
    std::fs::write(&path, r#"{"theme": "dark", "user": {"login": "old", "key": "x"}}"#).unwrap();
    let file = File::new(&path);

    assert_ok!(save_session(&file, &session()).await);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["theme"], "dark");
    assert_eq!(raw["version"], 1);
    assert_eq!(raw["user"]["login"], "alice");
    assert_eq!(assert_ok!(load_session(&file).await), Some(session()));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[tokio::test]
async fn test_unreadable_session_file_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".unit-cli.json");
    std::fs::write(&path, "{ broken").unwrap();
    let file = File::new(&path);

    assert!(load_session(&file).await.is_err());
    assert!(save_session(&file, &session()).await.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ broken");
}
