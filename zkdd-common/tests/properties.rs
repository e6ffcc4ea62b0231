use proptest::prelude::*;
use zkdd_common::{
    bytes_to_hex, commitment, decode_note, encode_note, fr_from_bytes, integer_to_hex, Fr,
    SecretPair,
};

fn element(bytes: [u8; 31]) -> Fr {
    let mut le = [0u8; 32];
    le[..31].copy_from_slice(&bytes);
    fr_from_bytes(&le).unwrap()
}

fn arb_pair() -> impl Strategy<Value = SecretPair> {
    (any::<[u8; 31]>(), any::<[u8; 31]>())
        .prop_map(|(n, s)| SecretPair::new(element(n), element(s)))
}

proptest! {
    #[test]
    fn note_round_trips(pair in arb_pair()) {
        let note = encode_note(&pair).unwrap();
        prop_assert_eq!(decode_note(&note).unwrap(), pair);
    }

    #[test]
    fn distinct_pairs_give_distinct_commitments(a in arb_pair(), b in arb_pair()) {
        prop_assume!(a != b);
        prop_assert_ne!(
            commitment(&a.nullifier, &a.secret).unwrap(),
            commitment(&b.nullifier, &b.secret).unwrap()
        );
    }

    #[test]
    fn hex_is_fixed_width_or_rejected(value in any::<u64>(), length in 1usize..12) {
        let digits = if value == 0 { 1 } else { 16 - value.leading_zeros() as usize / 4 };
        let rendered = integer_to_hex(&value.to_be_bytes(), length);
        if digits <= length * 2 {
            let rendered = rendered.unwrap();
            prop_assert_eq!(rendered.len(), 2 + length * 2);
            prop_assert_eq!(u64::from_str_radix(&rendered[2..], 16).unwrap(), value);
        } else {
            prop_assert!(rendered.is_err());
        }
    }

    #[test]
    fn raw_bytes_keep_leading_zeros(bytes in prop::collection::vec(any::<u8>(), 0..16)) {
        let rendered = bytes_to_hex(&bytes, 16).unwrap();
        prop_assert_eq!(rendered.len(), 34);
        prop_assert!(rendered.ends_with(&hex::encode(&bytes)));
    }
}
