//! Groth16 proof shapes.
//!
//! Snarkjs emits proofs as JSON with decimal coordinates and a projective
//! third coordinate. The on-ledger verifier takes eight base-field elements:
//!
//! ```text
//! [A.x, A.y, B.x1, B.x0, B.y1, B.y0, C.x, C.y]
//! ```
//!
//! The B coordinates swap within each pair because the verifier expects the
//! degree-2 extension limbs high limb first.

use halo2curves_axiom::bn256::Fq;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error::Result, field_from_be_bytes, field_from_decimal, field_to_decimal, field_to_le_bytes,
    hex_format::decode_hex, CodecError,
};

pub const PACKED_PROOF_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G1Point {
    pub x: Fq,
    pub y: Fq,
}

/// Coordinates in snarkjs limb order `[c0, c1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G2Point {
    pub x: [Fq; 2],
    pub y: [Fq; 2],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Groth16Proof {
    pub a: G1Point,
    pub b: G2Point,
    pub c: G1Point,
}

/// Proof JSON as written by `snarkjs groth16 prove`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnarkjsProof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_curve")]
    pub curve: String,
}

fn default_protocol() -> String {
    "groth16".to_string()
}

fn default_curve() -> String {
    "bn128".to_string()
}

impl Groth16Proof {
    pub fn from_snarkjs(proof: &SnarkjsProof) -> Result<Self> {
        if proof.protocol != "groth16" {
            return Err(CodecError::MalformedProof(format!(
                "unsupported protocol {}",
                proof.protocol
            )));
        }
        let b = proof
            .pi_b
            .get(..2)
            .ok_or_else(|| CodecError::MalformedProof("pi_b needs two rows".into()))?;
        Ok(Self {
            a: g1_from_strings(&proof.pi_a, "pi_a")?,
            b: G2Point {
                x: limbs_from_strings(&b[0], "pi_b[0]")?,
                y: limbs_from_strings(&b[1], "pi_b[1]")?,
            },
            c: g1_from_strings(&proof.pi_c, "pi_c")?,
        })
    }

    pub fn from_snarkjs_json(json: &str) -> Result<Self> {
        let proof: SnarkjsProof = serde_json::from_str(json)
            .map_err(|err| CodecError::MalformedProof(err.to_string()))?;
        Self::from_snarkjs(&proof)
    }

    pub fn to_snarkjs(&self) -> SnarkjsProof {
        let g1 = |p: &G1Point| vec![field_to_decimal(&p.x), field_to_decimal(&p.y), "1".into()];
        let limbs = |l: &[Fq; 2]| vec![field_to_decimal(&l[0]), field_to_decimal(&l[1])];
        SnarkjsProof {
            pi_a: g1(&self.a),
            pi_b: vec![
                limbs(&self.b.x),
                limbs(&self.b.y),
                vec!["1".into(), "0".into()],
            ],
            pi_c: g1(&self.c),
            protocol: default_protocol(),
            curve: default_curve(),
        }
    }

    pub fn pack(&self) -> PackedProof {
        PackedProof([
            self.a.x,
            self.a.y,
            self.b.x[1],
            self.b.x[0],
            self.b.y[1],
            self.b.y[0],
            self.c.x,
            self.c.y,
        ])
    }
}

fn g1_from_strings(values: &[String], label: &str) -> Result<G1Point> {
    if values.len() < 2 {
        return Err(CodecError::MalformedProof(format!(
            "{label} needs at least two coordinates"
        )));
    }
    Ok(G1Point {
        x: field_from_decimal(&values[0])?,
        y: field_from_decimal(&values[1])?,
    })
}

fn limbs_from_strings(values: &[String], label: &str) -> Result<[Fq; 2]> {
    if values.len() != 2 {
        return Err(CodecError::MalformedProof(format!(
            "{label} needs exactly two limbs"
        )));
    }
    Ok([
        field_from_decimal(&values[0])?,
        field_from_decimal(&values[1])?,
    ])
}

/// The eight-element proof accepted by the ledger's verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedProof(pub [Fq; PACKED_PROOF_LEN]);

impl PackedProof {
    pub fn unpack(&self) -> Groth16Proof {
        let p = &self.0;
        Groth16Proof {
            a: G1Point { x: p[0], y: p[1] },
            b: G2Point {
                x: [p[3], p[2]],
                y: [p[5], p[4]],
            },
            c: G1Point { x: p[6], y: p[7] },
        }
    }

    /// Big-endian 32-byte words.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|f| be_word(f)).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PACKED_PROOF_LEN * 32 {
            return Err(CodecError::MalformedProof(format!(
                "packed proof must be {} bytes, got {}",
                PACKED_PROOF_LEN * 32,
                bytes.len()
            )));
        }
        let mut words = [Fq::zero(); PACKED_PROOF_LEN];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(32)) {
            *word = field_from_be_bytes(chunk)?;
        }
        Ok(Self(words))
    }

    pub fn to_hex_words(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|f| format!("0x{}", hex::encode(be_word(f))))
            .collect()
    }

    pub fn from_hex_words<S: AsRef<str>>(words: &[S]) -> Result<Self> {
        if words.len() != PACKED_PROOF_LEN {
            return Err(CodecError::MalformedProof(format!(
                "packed proof must have {} words, got {}",
                PACKED_PROOF_LEN,
                words.len()
            )));
        }
        let mut out = [Fq::zero(); PACKED_PROOF_LEN];
        for (slot, word) in out.iter_mut().zip(words) {
            let bytes = decode_hex(word.as_ref())?;
            let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
            *slot = field_from_be_bytes(&bytes[start..])?;
        }
        Ok(Self(out))
    }
}

fn be_word(value: &Fq) -> [u8; 32] {
    let mut bytes = field_to_le_bytes(value);
    bytes.reverse();
    bytes
}

impl Serialize for PackedProof {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_hex_words().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PackedProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let words = Vec::<String>::deserialize(deserializer)?;
        Self::from_hex_words(&words).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "pi_a": ["1", "2", "1"],
            "pi_b": [["3", "4"], ["5", "6"], ["1", "0"]],
            "pi_c": ["7", "8", "1"],
            "protocol": "groth16",
            "curve": "bn128"
        }"#
    }

    #[test]
    fn packs_with_b_limbs_swapped() {
        let proof = Groth16Proof::from_snarkjs_json(sample_json()).unwrap();
        let packed = proof.pack();
        let expected: Vec<Fq> = [1u64, 2, 4, 3, 6, 5, 7, 8].iter().map(|v| Fq::from(*v)).collect();
        assert_eq!(packed.0.to_vec(), expected);
        assert_eq!(packed.unpack(), proof);
    }

    #[test]
    fn hex_words_and_bytes_round_trip() {
        let packed = Groth16Proof::from_snarkjs_json(sample_json()).unwrap().pack();
        let words = packed.to_hex_words();
        assert_eq!(
            words[2],
            "0x0000000000000000000000000000000000000000000000000000000000000004"
        );
        assert_eq!(PackedProof::from_hex_words(&words).unwrap(), packed);
        assert_eq!(PackedProof::from_bytes(&packed.to_bytes()).unwrap(), packed);
    }

    #[test]
    fn rejects_other_protocols() {
        let json = sample_json().replace("groth16", "plonk");
        assert!(matches!(
            Groth16Proof::from_snarkjs_json(&json),
            Err(CodecError::MalformedProof(_))
        ));
    }

    #[test]
    fn snarkjs_round_trip_keeps_coordinates() {
        let proof = Groth16Proof::from_snarkjs_json(sample_json()).unwrap();
        let again = Groth16Proof::from_snarkjs(&proof.to_snarkjs()).unwrap();
        assert_eq!(again, proof);
    }
}
