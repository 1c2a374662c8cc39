//! Parameter store integration tests
//!
//! Loads the bundled manifest and payload, then checks that broken copies
//! fail at load time with configuration errors, before any decoder step.
//!
//! Run with:
//! ```bash
//! cargo test -p genie --test store_tests
//! ```

mod helpers;

use genie::core::{Error as CoreError, ParameterStore, WeightsManifest};
use genie::prelude::*;
use genie::Error;
use helpers::*;

const PAYLOAD_BYTES: usize = 28_768;

#[test]
fn test_bundled_model_layout() {
    let manifest = WeightsManifest::load(manifest_path()).unwrap();
    let layout = manifest.layout().unwrap();
    assert_eq!(layout.len(), 8);
    assert_eq!(layout[0].offset, 0);
    assert_eq!(layout[0].shape, vec![91, 16]);
    assert_eq!(layout[1].offset, 91 * 16 * 4);
    let last = layout.last().unwrap();
    assert_eq!(last.offset + last.length, PAYLOAD_BYTES);
    assert_eq!(manifest.total_bytes().unwrap(), PAYLOAD_BYTES);
}

#[test]
fn test_bundled_model_loads() {
    let store = load_store();
    let config = DecoderConfig::default();
    assert_eq!(store.len(), 8);
    assert_eq!(store.total_bytes(), PAYLOAD_BYTES);

    let kernel = store.lookup(&config.names.lstm_kernel(1)).unwrap();
    assert_eq!(kernel.shape(), &[32, 64]);
    assert_eq!(
        store.lookup(&config.names.output_bias).unwrap().shape(),
        &[88]
    );
    assert!(matches!(
        store.lookup("phero_model/decoder/missing"),
        Err(CoreError::MissingParameter(_))
    ));
}

#[test]
fn test_truncated_payload_fails_before_forward() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = copy_fixture(dir.path(), |payload| payload.truncate(payload.len() - 4));

    assert!(matches!(
        ParameterStore::load(&manifest),
        Err(CoreError::Configuration(_))
    ));
    let result = GenieEngine::builder().manifest(&manifest).build();
    assert!(matches!(
        result,
        Err(Error::Core(CoreError::Configuration(_)))
    ));
}

#[test]
fn test_oversized_payload_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = copy_fixture(dir.path(), |payload| payload.extend_from_slice(&[0; 8]));
    assert!(matches!(
        ParameterStore::load(manifest),
        Err(CoreError::Configuration(_))
    ));
}

#[test]
fn test_declared_shape_disagreeing_with_payload_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = copy_fixture(dir.path(), |_| {});
    let json = std::fs::read_to_string(&manifest).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value[0]["weights"][1]["shape"] = serde_json::json!([17]);
    std::fs::write(&manifest, value.to_string()).unwrap();

    assert!(matches!(
        ParameterStore::load(&manifest),
        Err(CoreError::Configuration(_))
    ));
}

#[test]
fn test_missing_shard_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = copy_fixture(dir.path(), |_| {});
    std::fs::remove_file(dir.path().join("group1-shard1of1.bin")).unwrap();
    assert!(matches!(
        ParameterStore::load(manifest),
        Err(CoreError::Configuration(_))
    ));
}

#[test]
fn test_malformed_manifest_json_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("weights_manifest.json");
    std::fs::write(&manifest, "{ not json").unwrap();
    assert!(matches!(
        ParameterStore::load(manifest),
        Err(CoreError::Configuration(_))
    ));
}

#[test]
fn test_sidecar_next_to_copied_manifest_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = copy_fixture(dir.path(), |_| {});
    std::fs::write(dir.path().join("weights_manifest.toml"), "gate_order = \"ifjo\"\n").unwrap();

    let engine = GenieEngine::builder().manifest(&manifest).build().unwrap();
    assert_eq!(engine.config().gate_order, genie::GateOrder::Ifjo);
}
