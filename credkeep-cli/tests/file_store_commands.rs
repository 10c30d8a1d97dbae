//! Integration tests for the CLI commands against a file-backed store.
//!
//! Each step reopens the store from configuration, as separate `credkeep`
//! invocations would.

use credkeep_cli::commands::{self, NewCredential, OutputFormat};
use credkeep_core::{Config, CredentialStore, EngineKind, open_configured_store, open_store};
use tempfile::TempDir;

/// Helper to create a file-engine config in a temporary directory.
fn test_config() -> (Config, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        engine: EngineKind::File,
        data_file: Some(temp_dir.path().join("credentials.json")),
        ..Config::default()
    };
    (config, temp_dir)
}

fn reopen(config: &Config) -> Box<dyn CredentialStore> {
    open_store(config).unwrap()
}

#[test]
fn test_store_load_delete_across_invocations() {
    let (config, _temp) = test_config();

    let fields = NewCredential {
        access_token: Some("access-1".to_string()),
        refresh_token: Some("refresh-1".to_string()),
        expires_in: Some(3600),
        scopes: Some("email".to_string()),
    };
    commands::store_credential(&*reopen(&config), "alice", fields, &mut Vec::new()).unwrap();

    let mut buf = Vec::new();
    commands::load_credential(&*reopen(&config), "alice", OutputFormat::Json, true, &mut buf)
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(value["access_token"], "access-1");
    assert_eq!(value["refresh_token"], "refresh-1");
    assert_eq!(value["scopes"][0], "email");

    commands::delete_credential(&*reopen(&config), "alice", &mut Vec::new()).unwrap();

    let result = commands::load_credential(
        &*reopen(&config),
        "alice",
        OutputFormat::Text,
        false,
        &mut Vec::new(),
    );
    assert!(result.is_err(), "load after delete should fail");
}

#[test]
fn test_store_overwrites_previous_fields() {
    let (config, _temp) = test_config();

    let first = NewCredential {
        access_token: Some("access-1".to_string()),
        refresh_token: Some("refresh-1".to_string()),
        ..NewCredential::default()
    };
    commands::store_credential(&*reopen(&config), "alice", first, &mut Vec::new()).unwrap();

    let second = NewCredential {
        access_token: Some("access-2".to_string()),
        ..NewCredential::default()
    };
    commands::store_credential(&*reopen(&config), "alice", second, &mut Vec::new()).unwrap();

    let mut buf = Vec::new();
    commands::load_credential(&*reopen(&config), "alice", OutputFormat::Json, true, &mut buf)
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(value["access_token"], "access-2");
    assert!(value["refresh_token"].is_null());
}

#[test]
fn test_configured_store_from_toml() {
    let temp_dir = TempDir::new().unwrap();
    let data_file = temp_dir.path().join("data/credentials.json");
    let config_path = temp_dir.path().join("credkeep.toml");
    std::fs::write(
        &config_path,
        format!(
            "engine = \"file\"\ndata_file = {:?}\nlock_granularity = \"per_key\"\n",
            data_file.to_string_lossy()
        ),
    )
    .unwrap();

    let (config, store) = open_configured_store(Some(&config_path)).unwrap();
    assert_eq!(config.data_file, Some(data_file.clone()));

    commands::store_credential(&*store, "alice", NewCredential::default(), &mut Vec::new())
        .unwrap();
    assert!(data_file.exists());
}
