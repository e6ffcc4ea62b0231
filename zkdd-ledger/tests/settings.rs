use std::fs;

use serde_json::json;
use zkdd_common::Address;
use zkdd_ledger::{FeeMode, LedgerError, LedgerSettings};

fn write_settings(dir: &tempfile::TempDir, value: serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join("ledger.json");
    fs::write(&path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
    path
}

#[test]
fn json_settings_fill_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let owner = Address::from_label("owner");
    let path = write_settings(&dir, json!({ "owner": owner.to_string() }));

    let settings = LedgerSettings::from_json_file(&path).expect("settings");
    assert_eq!(settings.owner, owner);
    assert_eq!(settings.ledger_address, Address::from_label("zkdd-ledger"));
    assert_eq!(settings.fee_mode, FeeMode::Dual);
    assert_eq!(settings.fee_policy().unwrap().divider(), 200);

    let config = settings.into_config().unwrap();
    assert_eq!(config.fee_recipient(), owner);
    assert_eq!(config.relayers().count(), 0);
}

#[test]
fn json_settings_carry_relayers_and_recipient() {
    let dir = tempfile::tempdir().unwrap();
    let owner = Address::from_label("owner");
    let relayer = Address::from_label("relayer");
    let treasury = Address::from_label("treasury");
    let path = write_settings(
        &dir,
        json!({
            "owner": owner.to_string(),
            "feeMode": "single",
            "feeDivider": 50,
            "feeRecipient": treasury.to_string(),
            "relayers": [relayer.to_string()],
        }),
    );

    let config = LedgerSettings::from_json_file(&path)
        .unwrap()
        .into_config()
        .unwrap();
    assert_eq!(config.fee_policy().mode(), FeeMode::Single);
    assert_eq!(config.fee_policy().divider(), 50);
    assert_eq!(config.fee_recipient(), treasury);
    assert!(config.is_relayer(&relayer));
}

#[test]
fn invalid_divider_is_rejected_at_config_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_settings(
        &dir,
        json!({
            "owner": Address::from_label("owner").to_string(),
            "feeDivider": 1,
        }),
    );
    let settings = LedgerSettings::from_json_file(&path).unwrap();
    assert_eq!(
        settings.into_config().unwrap_err(),
        LedgerError::InvalidFeeDivider {
            divider: 1,
            mode: FeeMode::Dual,
        }
    );
}

#[test]
fn missing_or_malformed_files_report_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    let err = LedgerSettings::from_json_file(&missing).unwrap_err();
    assert!(err.to_string().contains("absent.json"));

    let path = dir.path().join("broken.json");
    fs::write(&path, b"{ not json").unwrap();
    let err = LedgerSettings::from_json_file(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse"));
}
