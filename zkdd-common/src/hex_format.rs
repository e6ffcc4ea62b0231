//! `0x`-prefixed, left-padded hex rendering.
//!
//! A value is rendered as `0x` followed by exactly `length * 2` lowercase hex
//! digits. Values that need more digits are rejected rather than truncated.

use halo2curves_axiom::bn256::Fr;
use num_bigint::BigUint;

use crate::{error::Result, fr_from_be_bytes, fr_to_be_bytes, CodecError};

/// Renders a big-endian unsigned integer.
pub fn integer_to_hex(be_bytes: &[u8], length: usize) -> Result<String> {
    let digits = BigUint::from_bytes_be(be_bytes).to_str_radix(16);
    pad(digits, length)
}

pub fn field_to_hex(value: &Fr, length: usize) -> Result<String> {
    integer_to_hex(&fr_to_be_bytes(value), length)
}

/// Renders raw bytes verbatim, leading zero bytes included.
pub fn bytes_to_hex(bytes: &[u8], length: usize) -> Result<String> {
    pad(hex::encode(bytes), length)
}

/// Parses a hex scalar with or without `0x`, rejecting non-canonical values.
pub fn hex_to_field(input: &str) -> Result<Fr> {
    let bytes = decode_hex(input)?;
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    fr_from_be_bytes(&bytes[first_nonzero..])
}

pub(crate) fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    let normalized = if stripped.len() % 2 == 1 {
        format!("0{stripped}")
    } else {
        stripped.to_string()
    };
    hex::decode(normalized).map_err(|err| CodecError::InvalidHex(err.to_string()))
}

fn pad(digits: String, length: usize) -> Result<String> {
    let width = length * 2;
    if digits.len() > width {
        return Err(CodecError::ValueTooWide {
            needed: (digits.len() + 1) / 2,
            width: length,
        });
    }
    Ok(format!("0x{digits:0>width$}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fr_from_decimal;

    const VECTOR: &str =
        "16000534653676138996713327308904050705310694920288652176050461465752592825931";

    #[test]
    fn renders_known_vector_at_full_width() {
        let value = fr_from_decimal(VECTOR).unwrap();
        assert_eq!(
            field_to_hex(&value, 32).unwrap(),
            "0x235ffb4f845bec7dcb1fffbd82391cecbc278bca9187fbcd7cddf854fed5be4b"
        );
    }

    #[test]
    fn overflowing_width_fails() {
        let value = fr_from_decimal(VECTOR).unwrap();
        assert_eq!(
            field_to_hex(&value, 31),
            Err(CodecError::ValueTooWide {
                needed: 32,
                width: 31
            })
        );
        assert!(bytes_to_hex(&[1, 2, 3], 2).is_err());
    }

    #[test]
    fn pads_small_values() {
        assert_eq!(field_to_hex(&Fr::from(255), 4).unwrap(), "0x000000ff");
        assert_eq!(integer_to_hex(&[], 1).unwrap(), "0x00");
        assert_eq!(bytes_to_hex(&[0, 1], 3).unwrap(), "0x000001");
    }

    #[test]
    fn parses_hex_back_into_field() {
        let value = fr_from_decimal(VECTOR).unwrap();
        let rendered = field_to_hex(&value, 32).unwrap();
        assert_eq!(hex_to_field(&rendered).unwrap(), value);
        assert_eq!(hex_to_field("0xf").unwrap(), Fr::from(15));
        assert!(hex_to_field("0xzz").is_err());
        assert!(hex_to_field(&format!("0x{}", "ff".repeat(32))).is_err());
    }
}
