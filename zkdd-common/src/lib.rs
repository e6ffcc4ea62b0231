//! Shared building blocks for private direct debits.
//!
//! Everything a payer's client and the ledger must agree on lives here:
//! the BN254 field helpers, the Poseidon commitment scheme, the 62-byte note
//! encoding, the six public signals bound by a payment-intent proof, the
//! packed Groth16 proof layout and the encrypted-message packing.

use std::{fmt, str::FromStr};

use halo2curves_axiom::ff::{Field, PrimeField};
use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub mod commitment;
pub mod encryption;
pub mod error;
pub mod hex_format;
pub mod intent;
pub mod note;
pub mod proof;
pub mod signals;

pub use commitment::{commitment, intent_nullifier, Commitment, IntentNullifier};
pub use error::{CodecError, Result};
pub use hex_format::{bytes_to_hex, field_to_hex, hex_to_field, integer_to_hex};
pub use note::{
    create_account_secrets, decode_account_secrets, decode_note, encode_note,
    new_account_secrets, note_from_hex, note_to_hex, AccountSecrets, SecretPair, NOTE_LEN,
};
pub use proof::{Groth16Proof, PackedProof};
pub use signals::{PaymentIntentSignals, PUBLIC_SIGNAL_COUNT};

pub use halo2curves_axiom::bn256::{Fq, Fr};

pub fn hash_bytes_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Little-endian canonical encoding.
pub fn fr_to_bytes(fr: &Fr) -> [u8; 32] {
    field_to_le_bytes(fr)
}

pub fn fr_from_bytes(bytes: &[u8; 32]) -> Result<Fr> {
    field_from_le_bytes(bytes)
}

pub fn fr_to_be_bytes(fr: &Fr) -> [u8; 32] {
    let mut bytes = fr_to_bytes(fr);
    bytes.reverse();
    bytes
}

/// Parses up to 32 big-endian bytes, rejecting values at or above the modulus.
pub fn fr_from_be_bytes(bytes: &[u8]) -> Result<Fr> {
    field_from_be_bytes(bytes)
}

/// Amounts on the ledger are `u128`, which always fit in the scalar field.
pub fn fr_from_u128(value: u128) -> Fr {
    let shift = Fr::from(1u64 << 32).square();
    Fr::from((value >> 64) as u64) * shift + Fr::from(value as u64)
}

/// Interprets big-endian bytes as an integer reduced into the field.
pub fn reduce_be_bytes_to_fr(bytes: &[u8]) -> Fr {
    let mut acc = Fr::zero();
    let base = Fr::from(256);
    for byte in bytes.iter() {
        acc = acc * base + Fr::from(*byte as u64);
    }
    acc
}

pub fn fr_from_decimal(digits: &str) -> Result<Fr> {
    field_from_decimal(digits)
}

pub fn fr_to_decimal(fr: &Fr) -> String {
    field_to_decimal(fr)
}

/// Parses a decimal base-field coordinate, as found in snarkjs JSON.
pub fn fq_from_decimal(digits: &str) -> Result<Fq> {
    field_from_decimal(digits)
}

pub(crate) fn field_to_le_bytes<F: PrimeField>(value: &F) -> [u8; 32] {
    let repr = value.to_repr();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(repr.as_ref());
    bytes
}

pub(crate) fn field_from_le_bytes<F: PrimeField>(bytes: &[u8; 32]) -> Result<F> {
    let mut repr = F::Repr::default();
    repr.as_mut().copy_from_slice(bytes);
    Option::from(F::from_repr(repr))
        .ok_or_else(|| CodecError::InvalidFieldElement(hex::encode(bytes)))
}

pub(crate) fn field_from_be_bytes<F: PrimeField>(bytes: &[u8]) -> Result<F> {
    if bytes.len() > 32 {
        return Err(CodecError::ValueTooWide {
            needed: bytes.len(),
            width: 32,
        });
    }
    let mut le = [0u8; 32];
    for (dst, src) in le.iter_mut().zip(bytes.iter().rev()) {
        *dst = *src;
    }
    field_from_le_bytes(&le)
}

pub(crate) fn field_from_decimal<F: PrimeField>(digits: &str) -> Result<F> {
    let value = BigUint::parse_bytes(digits.trim().as_bytes(), 10)
        .ok_or_else(|| CodecError::InvalidFieldElement(digits.to_string()))?;
    field_from_be_bytes(&value.to_bytes_be())
        .map_err(|_| CodecError::InvalidFieldElement(digits.to_string()))
}

pub(crate) fn field_to_decimal<F: PrimeField>(value: &F) -> String {
    BigUint::from_bytes_le(&field_to_le_bytes(value)).to_str_radix(10)
}

/// A 20-byte ledger address.
///
/// Inside the payment-intent proof the payee is the big-endian integer value
/// of these bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 20] = bytes
            .try_into()
            .map_err(|_| CodecError::InvalidAddress(format!("{} bytes", bytes.len())))?;
        Ok(Self(raw))
    }

    /// Deterministic address derived from a label, handy for named parties.
    pub fn from_label(label: &str) -> Self {
        let digest = blake3::hash(label.as_bytes());
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&digest.as_bytes()[..20]);
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_field(&self) -> Fr {
        reduce_be_bytes_to_fr(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|err| CodecError::InvalidAddress(err.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Serializes `u128` amounts as decimal strings so JSON consumers keep full precision.
pub mod serde_decimal {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.trim().parse().map_err(de::Error::custom)
    }
}
