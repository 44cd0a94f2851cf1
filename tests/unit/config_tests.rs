//! Configuration loading from env files

use feedwatch::{Config, Profile};
use std::fs;
use tempfile::TempDir;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_load_from_env_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watch.env");
    fs::write(
        &path,
        "TOKEN=file-token\nCHANNEL_ID=123456789\nROW_LAYOUT=legacy\nBATCH_SIZE=5\n",
    )
    .unwrap();

    let config = Config::load_with(Some(path.as_path()), no_env).unwrap();
    assert_eq!(config.token, "file-token");
    assert_eq!(config.channel_id, "123456789");
    assert_eq!(config.layout.name, "legacy");
    assert_eq!(config.batch_size, 5);
}

#[test]
fn test_environment_wins_over_env_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watch.env");
    fs::write(&path, "TOKEN=file-token\nCHANNEL_ID=123\nBATCH_SIZE=5\n").unwrap();

    let config = Config::load_with(Some(path.as_path()), |key| match key {
        "TOKEN" => Some("env-token".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.token, "env-token");
    assert_eq!(config.channel_id, "123");
    assert_eq!(config.batch_size, 5);
}

#[test]
fn test_missing_env_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.env");
    assert!(Config::load(Some(path.as_path())).is_err());
    assert!(Config::load_with(Some(path.as_path()), no_env).is_err());
}

#[test]
fn test_lenient_profile_from_env_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lenient.env");
    fs::write(&path, "TOKEN=t\nCHANNEL_ID=announcements\nPROFILE=lenient\n").unwrap();

    let config = Config::load_with(Some(path.as_path()), no_env).unwrap();
    assert_eq!(config.profile, Profile::Lenient);
    assert_eq!(config.channel_id, "announcements");
    assert!(!config.reject_malformed);
}
