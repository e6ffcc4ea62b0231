use std::fs;

use serde_json::json;
use zkdd_verifier::vk::{load_pinned_verification_key, load_verification_key};

fn write_key(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let g1 = json!(["1", "2", "1"]);
    let g2 = json!([["1", "2"], ["3", "4"], ["1", "0"]]);
    let key = json!({
        "protocol": "groth16",
        "curve": "bn128",
        "nPublic": 6,
        "vk_alpha_1": g1,
        "vk_beta_2": g2,
        "vk_gamma_2": g2,
        "vk_delta_2": g2,
        "IC": vec![g1; 7],
    });
    let path = dir.path().join("verification_key.json");
    fs::write(&path, serde_json::to_vec_pretty(&key).unwrap()).unwrap();
    path
}

#[test]
fn fingerprint_matches_file_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_key(&dir);
    let loaded = load_verification_key(&path).unwrap();
    let expected = blake3::hash(&fs::read(&path).unwrap()).to_hex().to_string();
    assert_eq!(loaded.fingerprint, expected);
    assert!(load_pinned_verification_key(&path, &expected).is_ok());
}

#[test]
fn pinned_load_rejects_other_hash() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_key(&dir);
    let err = load_pinned_verification_key(&path, "00").unwrap_err();
    assert!(err.to_string().contains("hash mismatch"));
}

#[test]
fn missing_file_reports_path() {
    let err = load_verification_key("/nonexistent/vk.json").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/vk.json"));
}
