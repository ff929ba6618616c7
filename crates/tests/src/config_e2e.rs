//! Config file -> credential store + engine wiring

use std::sync::Arc;

use auth::CredentialStore;
use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{DestinationKey, Record, StorageKind};
use engine::Engine;
use flusher::StorageSink;

use crate::support::read_lines;

fn config_toml(files_dir: &str) -> String {
    format!(
        r#"
[server]
listen_addr = "127.0.0.1:0"

[engine]
dispatcher_workers = 1
initial_delivery_workers = 1
max_delivery_workers = 1
flush_interval_ms = 60000

[retry]
max_attempts = 2
retry_delay_ms = 10

[storage]
kind = "file"
files_dir = "{files_dir}"

[auth]
valid_tokens = ["valid_token_1", "valid_token_2"]

[[destinations]]
key = "file1"

[[bindings]]
token = "valid_token_1"
destination = "file1"
"#
    )
}

#[test]
fn test_sample_config_parses() {
    let blueprint =
        ConfigLoader::load_from_str(&config_toml("files"), ConfigFormat::Toml).unwrap();

    assert_eq!(blueprint.storage.kind, StorageKind::File);
    assert_eq!(blueprint.retry.max_attempts, 2);
    assert_eq!(blueprint.destination_keys(), vec![DestinationKey::from("file1")]);
    // Unset engine fields keep their defaults
    assert_eq!(blueprint.engine.ingress_capacity, 1000);
}

#[tokio::test]
async fn test_blueprint_drives_engine() {
    let dir = tempfile::tempdir().unwrap();
    let files_dir = dir.path().display().to_string();
    let blueprint =
        ConfigLoader::load_from_str(&config_toml(&files_dir), ConfigFormat::Toml).unwrap();

    let credentials =
        CredentialStore::from_config(&blueprint.auth, &blueprint.bindings).unwrap();
    assert_eq!(credentials.destination_of("valid_token_1").unwrap(), "file1");
    assert!(credentials.destination_of("valid_token_2").is_none());

    let sink = StorageSink::from_config(&blueprint.storage).unwrap();
    let engine = Engine::new(blueprint.engine.clone(), blueprint.retry, Arc::new(sink));
    engine.start(blueprint.destination_keys()).unwrap();

    engine
        .handle()
        .submit(Record::new("file1", "configured"))
        .await
        .unwrap();
    let stats = engine.shutdown().await.unwrap();

    assert_eq!(stats.flush.records_written, 1);
    assert_eq!(read_lines(&dir.path().join("file1.txt")), vec!["configured"]);
}
