//! Packing of encrypted notes for on-ledger storage.
//!
//! ```text
//! packed = 0x || hex(nonce[24] || ephemPublicKey[32] || ciphertext)
//! ```
//!
//! The scheme identifier is implied and never stored. The encryption itself is
//! performed by the payer's wallet; [`NoteCipher`] is the seam for it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{error::Result, hex_format::decode_hex, CodecError};

pub const ENCRYPTION_VERSION: &str = "x25519-xsalsa20-poly1305";
const NONCE_LEN: usize = 24;
const EPHEM_KEY_LEN: usize = 32;

/// An encrypted payload with base64 fields, as wallets exchange it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedMessage {
    pub version: String,
    pub nonce: String,
    pub ephem_public_key: String,
    pub ciphertext: String,
}

/// Asymmetric encryption of a hex note to a recipient public key.
pub trait NoteCipher {
    type Error;

    fn encrypt(
        &self,
        public_key: &[u8],
        note: &str,
    ) -> std::result::Result<EncryptedMessage, Self::Error>;

    fn decrypt(
        &self,
        private_key: &[u8],
        message: &EncryptedMessage,
    ) -> std::result::Result<String, Self::Error>;
}

pub fn pack_encrypted_message(message: &EncryptedMessage) -> Result<String> {
    let nonce = decode_field(&message.nonce, "nonce")?;
    let ephem = decode_field(&message.ephem_public_key, "ephemPublicKey")?;
    let ciphertext = decode_field(&message.ciphertext, "ciphertext")?;

    let mut packed = Vec::with_capacity(NONCE_LEN + EPHEM_KEY_LEN + ciphertext.len());
    push_left_padded(&mut packed, &nonce, NONCE_LEN)?;
    push_left_padded(&mut packed, &ephem, EPHEM_KEY_LEN)?;
    packed.extend_from_slice(&ciphertext);
    Ok(format!("0x{}", hex::encode(packed)))
}

pub fn unpack_encrypted_message(packed: &str) -> Result<EncryptedMessage> {
    let bytes = decode_hex(packed)?;
    if bytes.len() < NONCE_LEN + EPHEM_KEY_LEN {
        return Err(CodecError::MessageTooShort(bytes.len()));
    }
    let (nonce, rest) = bytes.split_at(NONCE_LEN);
    let (ephem, ciphertext) = rest.split_at(EPHEM_KEY_LEN);
    Ok(EncryptedMessage {
        version: ENCRYPTION_VERSION.to_string(),
        nonce: STANDARD.encode(nonce),
        ephem_public_key: STANDARD.encode(ephem),
        ciphertext: STANDARD.encode(ciphertext),
    })
}

/// Raw bytes of a packed message, the form stored next to a commitment.
pub fn packed_message_bytes(packed: &str) -> Result<Vec<u8>> {
    decode_hex(packed)
}

fn decode_field(value: &str, field: &'static str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|err| CodecError::InvalidBase64 {
            field,
            reason: err.to_string(),
        })
}

fn push_left_padded(out: &mut Vec<u8>, bytes: &[u8], width: usize) -> Result<()> {
    if bytes.len() > width {
        return Err(CodecError::ValueTooWide {
            needed: bytes.len(),
            width,
        });
    }
    out.resize(out.len() + width - bytes.len(), 0);
    out.extend_from_slice(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(nonce: &[u8], ephem: &[u8], ciphertext: &[u8]) -> EncryptedMessage {
        EncryptedMessage {
            version: ENCRYPTION_VERSION.to_string(),
            nonce: STANDARD.encode(nonce),
            ephem_public_key: STANDARD.encode(ephem),
            ciphertext: STANDARD.encode(ciphertext),
        }
    }

    #[test]
    fn pack_then_unpack_restores_fields() {
        let sealed = message(&[7u8; 24], &[9u8; 32], b"sealed note bytes");
        let packed = pack_encrypted_message(&sealed).unwrap();
        assert!(packed.starts_with("0x0707"));
        assert_eq!(packed.len(), 2 + 2 * (24 + 32 + 17));
        assert_eq!(unpack_encrypted_message(&packed).unwrap(), sealed);
    }

    #[test]
    fn short_fields_are_left_padded() {
        let packed = pack_encrypted_message(&message(&[1u8; 20], &[2u8; 32], b"x")).unwrap();
        let bytes = packed_message_bytes(&packed).unwrap();
        assert_eq!(&bytes[..4], &[0, 0, 0, 0]);
        assert_eq!(bytes[4], 1);
        assert_eq!(bytes[24], 2);
    }

    #[test]
    fn rejects_truncated_messages() {
        let short = format!("0x{}", "00".repeat(55));
        assert_eq!(
            unpack_encrypted_message(&short),
            Err(CodecError::MessageTooShort(55))
        );
    }

    #[test]
    fn rejects_bad_base64() {
        let mut bad = message(&[0u8; 24], &[0u8; 32], b"");
        bad.nonce = "***".into();
        assert!(matches!(
            pack_encrypted_message(&bad),
            Err(CodecError::InvalidBase64 { field: "nonce", .. })
        ));
    }
}
