//! Poseidon commitment scheme.
//!
//! ```text
//! commitment        = Poseidon(nullifier, secret)
//! intent nullifier  = Poseidon(nullifier, nonce)
//! ```
//!
//! Both hashes are the circomlib Poseidon over the BN254 scalar field (width 3,
//! initial state `[0, a, b]`, output `state[0]`), so they agree bit-for-bit with
//! the `commitmentHash` and `paymentIntent` signals the circuit produces.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use ark_bn254::Fr as ArkFr;
use ark_ff::{BigInteger, PrimeField as _};
use halo2curves_axiom::bn256::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error::Result, fr_from_be_bytes, fr_to_be_bytes, hex_format::hex_to_field, CodecError,
};

/// Account identifier derived from a secret pair.
pub fn commitment(nullifier: &Fr, secret: &Fr) -> Result<Fr> {
    poseidon_hash(&[*nullifier, *secret])
}

/// One-time identifier of a debit schedule; a fresh nonce yields a fresh intent.
pub fn intent_nullifier(secret_nullifier: &Fr, nonce: &Fr) -> Result<Fr> {
    poseidon_hash(&[*secret_nullifier, *nonce])
}

fn poseidon_hash(values: &[Fr]) -> Result<Fr> {
    let inputs: Vec<ArkFr> = values
        .iter()
        .map(|value| ArkFr::from_be_bytes_mod_order(&fr_to_be_bytes(value)))
        .collect();
    let digest = Poseidon::<ArkFr>::new_circom(inputs.len())
        .and_then(|mut hasher| hasher.hash(&inputs))
        .map_err(|err| CodecError::Hash(err.to_string()))?;
    fr_from_be_bytes(&digest.into_bigint().to_bytes_be())
}

macro_rules! field_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq)]
        pub struct $name(Fr);

        impl $name {
            pub fn from_field(value: Fr) -> Self {
                Self(value)
            }

            pub fn to_field(&self) -> Fr {
                self.0
            }

            pub fn to_be_bytes(&self) -> [u8; 32] {
                fr_to_be_bytes(&self.0)
            }

            pub fn from_be_bytes(bytes: &[u8]) -> Result<Self> {
                crate::fr_from_be_bytes(bytes).map(Self)
            }

            /// `0x` followed by 64 lowercase hex digits.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.to_be_bytes()))
            }
        }

        impl From<Fr> for $name {
            fn from(value: Fr) -> Self {
                Self(value)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.to_be_bytes().hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.to_be_bytes().cmp(&other.to_be_bytes())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = CodecError;

            fn from_str(s: &str) -> Result<Self> {
                hex_to_field(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

field_newtype!(
    /// Public account key: `Poseidon(nullifier, secret)`.
    Commitment
);

field_newtype!(
    /// Public key of a payment-intent record: `Poseidon(nullifier, nonce)`.
    IntentNullifier
);

impl Commitment {
    pub fn derive(nullifier: &Fr, secret: &Fr) -> Result<Self> {
        commitment(nullifier, secret).map(Self)
    }
}

impl IntentNullifier {
    pub fn derive(secret_nullifier: &Fr, nonce: &Fr) -> Result<Self> {
        intent_nullifier(secret_nullifier, nonce).map(Self)
    }
}
