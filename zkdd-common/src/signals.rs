//! Public signals of the payment-intent proof.
//!
//! The ledger always hands the verifier exactly six signals in this order:
//!
//! ```text
//! [0] paymentIntentNullifier
//! [1] commitmentHash
//! [2] payeeAddress
//! [3] maxDebitAmount
//! [4] debitTimes
//! [5] debitInterval
//! ```

use halo2curves_axiom::bn256::Fr;
use serde::{Deserialize, Serialize};

use crate::{
    commitment::{Commitment, IntentNullifier},
    error::Result,
    fr_from_decimal, fr_from_u128, fr_to_decimal, Address, CodecError,
};

pub const PUBLIC_SIGNAL_COUNT: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentSignals {
    pub payment_intent: IntentNullifier,
    pub commitment: Commitment,
    pub payee: Address,
    #[serde(with = "crate::serde_decimal")]
    pub max_debit_amount: u128,
    pub debit_times: u64,
    pub debit_interval: u64,
}

impl PaymentIntentSignals {
    pub fn to_field_elements(&self) -> [Fr; PUBLIC_SIGNAL_COUNT] {
        [
            self.payment_intent.to_field(),
            self.commitment.to_field(),
            self.payee.to_field(),
            fr_from_u128(self.max_debit_amount),
            Fr::from(self.debit_times),
            Fr::from(self.debit_interval),
        ]
    }

    /// Decimal strings, as snarkjs reports `publicSignals`.
    pub fn to_decimal_strings(&self) -> Vec<String> {
        self.to_field_elements().iter().map(fr_to_decimal).collect()
    }

    /// Rebuilds typed signals from snarkjs decimal strings.
    pub fn from_decimal_strings(values: &[String]) -> Result<Self> {
        if values.len() < PUBLIC_SIGNAL_COUNT {
            return Err(CodecError::MalformedProof(format!(
                "expected {} public signals, got {}",
                PUBLIC_SIGNAL_COUNT,
                values.len()
            )));
        }
        let payee_field = fr_from_decimal(&values[2])?;
        let payee_bytes = crate::fr_to_be_bytes(&payee_field);
        if payee_bytes[..12].iter().any(|b| *b != 0) {
            return Err(CodecError::InvalidAddress(values[2].clone()));
        }
        Ok(Self {
            payment_intent: IntentNullifier::from_field(fr_from_decimal(&values[0])?),
            commitment: Commitment::from_field(fr_from_decimal(&values[1])?),
            payee: Address::from_slice(&payee_bytes[12..])?,
            max_debit_amount: parse_integer(&values[3])?,
            debit_times: parse_integer(&values[4])?,
            debit_interval: parse_integer(&values[5])?,
        })
    }
}

fn parse_integer<T: std::str::FromStr>(value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CodecError::InvalidFieldElement(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PaymentIntentSignals {
        PaymentIntentSignals {
            payment_intent: IntentNullifier::from_field(Fr::from(1)),
            commitment: Commitment::from_field(Fr::from(2)),
            payee: Address([0x11; 20]),
            max_debit_amount: 10_000_000_000_000_000_000,
            debit_times: 12,
            debit_interval: 30 * 24 * 60 * 60,
        }
    }

    #[test]
    fn field_order_is_fixed() {
        let signals = sample();
        let fields = signals.to_field_elements();
        assert_eq!(fields[0], Fr::from(1));
        assert_eq!(fields[1], Fr::from(2));
        assert_eq!(fields[2], signals.payee.to_field());
        assert_eq!(fields[3], fr_from_u128(10_000_000_000_000_000_000));
        assert_eq!(fields[4], Fr::from(12));
        assert_eq!(fields[5], Fr::from(2_592_000));
    }

    #[test]
    fn decimal_strings_round_trip() {
        let signals = sample();
        let strings = signals.to_decimal_strings();
        assert_eq!(strings[4], "12");
        assert_eq!(
            PaymentIntentSignals::from_decimal_strings(&strings).unwrap(),
            signals
        );
        assert!(PaymentIntentSignals::from_decimal_strings(&strings[..5]).is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("paymentIntent").is_some());
        assert!(json.get("maxDebitAmount").is_some());
    }
}
