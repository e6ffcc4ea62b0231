//! The 62-byte account note.
//!
//! ```text
//! note = le31(nullifier) || le31(secret)
//! ```
//!
//! The note is everything a client needs to control an account. It only ever
//! reaches the ledger in encrypted form.

use halo2curves_axiom::bn256::Fr;
use rand::{CryptoRng, RngCore};

use crate::{
    commitment::Commitment,
    error::Result,
    fr_from_bytes, fr_to_bytes,
    hex_format::{bytes_to_hex, decode_hex},
    reduce_be_bytes_to_fr, CodecError,
};

pub const NOTE_LEN: usize = 62;
const ELEMENT_LEN: usize = 31;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecretPair {
    pub nullifier: Fr,
    pub secret: Fr,
}

impl SecretPair {
    pub fn new(nullifier: Fr, secret: Fr) -> Self {
        Self { nullifier, secret }
    }

    /// Samples both halves from 31 random bytes, so they always fit the note.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            nullifier: random_element(rng),
            secret: random_element(rng),
        }
    }

    pub fn commitment(&self) -> Result<Commitment> {
        Commitment::derive(&self.nullifier, &self.secret)
    }
}

/// A random field element below 2^248, whose little-endian bytes are the
/// 31 bytes drawn from `rng`.
pub fn random_element<R: RngCore + CryptoRng>(rng: &mut R) -> Fr {
    let mut bytes = [0u8; ELEMENT_LEN];
    rng.fill_bytes(&mut bytes);
    bytes.reverse();
    // 31 bytes stay below the modulus, so nothing is reduced.
    reduce_be_bytes_to_fr(&bytes)
}

pub fn encode_note(pair: &SecretPair) -> Result<[u8; NOTE_LEN]> {
    let mut note = [0u8; NOTE_LEN];
    note[..ELEMENT_LEN].copy_from_slice(&element_bytes(&pair.nullifier)?);
    note[ELEMENT_LEN..].copy_from_slice(&element_bytes(&pair.secret)?);
    Ok(note)
}

pub fn decode_note(bytes: &[u8]) -> Result<SecretPair> {
    if bytes.len() != NOTE_LEN {
        return Err(CodecError::InvalidNoteLength {
            expected: NOTE_LEN,
            actual: bytes.len(),
        });
    }
    Ok(SecretPair {
        nullifier: element_from_bytes(&bytes[..ELEMENT_LEN])?,
        secret: element_from_bytes(&bytes[ELEMENT_LEN..])?,
    })
}

pub fn note_to_hex(pair: &SecretPair) -> Result<String> {
    bytes_to_hex(&encode_note(pair)?, NOTE_LEN)
}

pub fn note_from_hex(input: &str) -> Result<SecretPair> {
    decode_note(&decode_hex(input)?)
}

fn element_bytes(value: &Fr) -> Result<[u8; ELEMENT_LEN]> {
    let le = fr_to_bytes(value);
    if le[ELEMENT_LEN] != 0 {
        return Err(CodecError::ValueTooWide {
            needed: 32,
            width: ELEMENT_LEN,
        });
    }
    let mut out = [0u8; ELEMENT_LEN];
    out.copy_from_slice(&le[..ELEMENT_LEN]);
    Ok(out)
}

fn element_from_bytes(bytes: &[u8]) -> Result<Fr> {
    let mut le = [0u8; 32];
    le[..ELEMENT_LEN].copy_from_slice(bytes);
    fr_from_bytes(&le)
}

/// A secret pair together with its note preimage and commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSecrets {
    pub pair: SecretPair,
    pub preimage: [u8; NOTE_LEN],
    pub commitment: Commitment,
}

pub fn create_account_secrets(pair: SecretPair) -> Result<AccountSecrets> {
    Ok(AccountSecrets {
        preimage: encode_note(&pair)?,
        commitment: pair.commitment()?,
        pair,
    })
}

/// Fresh account secrets, returned as the hex note a client stores.
pub fn new_account_secrets<R: RngCore + CryptoRng>(rng: &mut R) -> Result<String> {
    let secrets = create_account_secrets(SecretPair::random(rng))?;
    bytes_to_hex(&secrets.preimage, NOTE_LEN)
}

pub fn decode_account_secrets(note: &str) -> Result<AccountSecrets> {
    create_account_secrets(note_from_hex(note)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{
        rngs::{OsRng, StdRng},
        SeedableRng,
    };

    #[test]
    fn encodes_little_endian_halves() {
        let pair = SecretPair::new(Fr::from(0x0102), Fr::from(0x03));
        let note = encode_note(&pair).unwrap();
        assert_eq!(&note[..3], &[0x02, 0x01, 0x00]);
        assert_eq!(note[31], 0x03);
        assert_eq!(decode_note(&note).unwrap(), pair);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            decode_note(&[0u8; 61]),
            Err(CodecError::InvalidNoteLength {
                expected: 62,
                actual: 61
            })
        );
    }

    #[test]
    fn rejects_elements_wider_than_31_bytes() {
        let wide = -Fr::from(1);
        let pair = SecretPair::new(wide, Fr::from(1));
        assert!(matches!(
            encode_note(&pair),
            Err(CodecError::ValueTooWide { .. })
        ));
    }

    #[test]
    fn random_elements_keep_the_drawn_bytes() {
        let mut drawn = [0u8; ELEMENT_LEN];
        StdRng::seed_from_u64(11).fill_bytes(&mut drawn);
        let element = random_element(&mut StdRng::seed_from_u64(11));

        let le = fr_to_bytes(&element);
        assert_eq!(&le[..ELEMENT_LEN], &drawn[..]);
        assert_eq!(le[ELEMENT_LEN], 0);
        assert_ne!(element, Fr::from(0));
        assert_ne!(element, random_element(&mut StdRng::seed_from_u64(12)));
    }

    #[test]
    fn new_note_decodes_to_matching_commitment() {
        let note = new_account_secrets(&mut OsRng).unwrap();
        assert_eq!(note.len(), 2 + NOTE_LEN * 2);
        let secrets = decode_account_secrets(&note).unwrap();
        assert_eq!(secrets.commitment, secrets.pair.commitment().unwrap());
        assert_eq!(note_to_hex(&secrets.pair).unwrap(), note);
    }
}
