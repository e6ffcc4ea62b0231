//! Snarkjs verification keys.
//!
//! The key itself is consumed by the external verifier. Loading it here pins
//! the shape the ledger relies on (Groth16 over bn128 with six public
//! signals) and records a blake3 fingerprint for deployment manifests.

use std::{fs, path::Path};

use anyhow::{anyhow, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use zkdd_common::{fq_from_decimal, hash_bytes_hex, PUBLIC_SIGNAL_COUNT};

pub const EXPECTED_PROTOCOL: &str = "groth16";
pub const EXPECTED_CURVE: &str = "bn128";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    pub protocol: String,
    pub curve: String,
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    pub vk_alpha_1: Vec<String>,
    pub vk_beta_2: Vec<Vec<String>>,
    pub vk_gamma_2: Vec<Vec<String>>,
    pub vk_delta_2: Vec<Vec<String>>,
    #[serde(rename = "IC")]
    pub ic: Vec<Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct LoadedVerificationKey {
    pub key: VerificationKey,
    /// blake3 of the raw JSON bytes.
    pub fingerprint: String,
}

impl VerificationKey {
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let key: VerificationKey =
            serde_json::from_slice(bytes).context("failed to parse verification key JSON")?;
        key.validate()?;
        Ok(key)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.protocol == EXPECTED_PROTOCOL,
            "unsupported protocol {}, expected {}",
            self.protocol,
            EXPECTED_PROTOCOL
        );
        ensure!(
            self.curve == EXPECTED_CURVE,
            "unsupported curve {}, expected {}",
            self.curve,
            EXPECTED_CURVE
        );
        ensure!(
            self.n_public == PUBLIC_SIGNAL_COUNT,
            "verification key expects {} public signals, payment intents carry {}",
            self.n_public,
            PUBLIC_SIGNAL_COUNT
        );
        ensure!(
            self.ic.len() == PUBLIC_SIGNAL_COUNT + 1,
            "IC must hold {} points, found {}",
            PUBLIC_SIGNAL_COUNT + 1,
            self.ic.len()
        );

        check_coordinates(&self.vk_alpha_1, "vk_alpha_1")?;
        for (label, point) in [
            ("vk_beta_2", &self.vk_beta_2),
            ("vk_gamma_2", &self.vk_gamma_2),
            ("vk_delta_2", &self.vk_delta_2),
        ] {
            ensure!(point.len() >= 2, "{} needs at least two rows", label);
            for row in point.iter().take(2) {
                check_coordinates(row, label)?;
            }
        }
        for (idx, point) in self.ic.iter().enumerate() {
            check_coordinates(point, &format!("IC[{idx}]"))?;
        }
        Ok(())
    }
}

pub fn load_verification_key(path: impl AsRef<Path>) -> Result<LoadedVerificationKey> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read verification key at {}", path.display()))?;
    let key = VerificationKey::from_json_bytes(&bytes)
        .with_context(|| format!("invalid verification key at {}", path.display()))?;
    let fingerprint = hash_bytes_hex(&bytes);
    tracing::debug!(path = %path.display(), %fingerprint, "loaded verification key");
    Ok(LoadedVerificationKey { key, fingerprint })
}

/// Loads a key and checks it against a recorded fingerprint.
pub fn load_pinned_verification_key(
    path: impl AsRef<Path>,
    expected_blake3: &str,
) -> Result<LoadedVerificationKey> {
    let loaded = load_verification_key(path)?;
    ensure!(
        loaded.fingerprint == expected_blake3,
        "verification key hash mismatch, expected {} but computed {}",
        expected_blake3,
        loaded.fingerprint
    );
    Ok(loaded)
}

fn check_coordinates(values: &[String], label: &str) -> Result<()> {
    ensure!(values.len() >= 2, "{} needs at least two coordinates", label);
    for value in values.iter().take(2) {
        fq_from_decimal(value).map_err(|err| anyhow!("{label}: {err}"))?;
    }
    Ok(())
}
