//! Client-side construction of a payment intent.
//!
//! The payer derives a fresh intent nullifier from the account nullifier and
//! a random nonce, then hands the prover both the public signals and the
//! private witness `(secret, nonce, nullifier)`.

use halo2curves_axiom::bn256::Fr;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    commitment::{Commitment, IntentNullifier},
    error::Result,
    fr_to_decimal,
    note::{decode_account_secrets, random_element, SecretPair},
    signals::PaymentIntentSignals,
    Address, CodecError,
};

/// What the payer authorizes: who may pull, how much, how often.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentSecret {
    /// Hex note of the paying account.
    pub note: String,
    pub payee: Address,
    #[serde(with = "crate::serde_decimal")]
    pub max_debit_amount: u128,
    pub debit_times: u64,
    pub debit_interval: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentIntentWitness {
    pub signals: PaymentIntentSignals,
    pub pair: SecretPair,
    pub nonce: Fr,
}

impl PaymentIntentWitness {
    pub fn build(intent: &PaymentIntentSecret, nonce: Fr) -> Result<Self> {
        let secrets = decode_account_secrets(&intent.note)?;
        let signals = PaymentIntentSignals {
            payment_intent: IntentNullifier::derive(&secrets.pair.nullifier, &nonce)?,
            commitment: secrets.commitment,
            payee: intent.payee,
            max_debit_amount: intent.max_debit_amount,
            debit_times: intent.debit_times,
            debit_interval: intent.debit_interval,
        };
        Ok(Self {
            signals,
            pair: secrets.pair,
            nonce,
        })
    }

    pub fn random<R: RngCore + CryptoRng>(
        intent: &PaymentIntentSecret,
        rng: &mut R,
    ) -> Result<Self> {
        Self::build(intent, random_element(rng))
    }

    /// Checks the relations the circuit enforces between private and public signals.
    pub fn check(&self) -> Result<()> {
        if Commitment::derive(&self.pair.nullifier, &self.pair.secret)? != self.signals.commitment {
            return Err(CodecError::WitnessMismatch("commitment does not match secret pair"));
        }
        if IntentNullifier::derive(&self.pair.nullifier, &self.nonce)? != self.signals.payment_intent
        {
            return Err(CodecError::WitnessMismatch(
                "payment intent does not match nullifier and nonce",
            ));
        }
        Ok(())
    }

    /// Input JSON for the witness generator, public signals first.
    pub fn circuit_input(&self) -> Value {
        let s = &self.signals;
        json!({
            "paymentIntent": fr_to_decimal(&s.payment_intent.to_field()),
            "commitmentHash": fr_to_decimal(&s.commitment.to_field()),
            "payee": fr_to_decimal(&s.payee.to_field()),
            "maxDebitAmount": s.max_debit_amount.to_string(),
            "debitTimes": s.debit_times.to_string(),
            "debitInterval": s.debit_interval.to_string(),
            "secret": fr_to_decimal(&self.pair.secret),
            "nonce": fr_to_decimal(&self.nonce),
            "nullifier": fr_to_decimal(&self.pair.nullifier),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::note_to_hex;
    use rand::rngs::OsRng;

    fn intent() -> (SecretPair, PaymentIntentSecret) {
        let pair = SecretPair::new(Fr::from(1234), Fr::from(5678));
        let secret = PaymentIntentSecret {
            note: note_to_hex(&pair).unwrap(),
            payee: Address([0x22; 20]),
            max_debit_amount: 1_000,
            debit_times: 3,
            debit_interval: 60,
        };
        (pair, secret)
    }

    #[test]
    fn witness_binds_commitment_and_intent() {
        let (pair, secret) = intent();
        let witness = PaymentIntentWitness::build(&secret, Fr::from(42)).unwrap();
        assert_eq!(witness.signals.commitment, pair.commitment().unwrap());
        assert_eq!(
            witness.signals.payment_intent,
            IntentNullifier::derive(&pair.nullifier, &Fr::from(42)).unwrap()
        );
        witness.check().unwrap();
    }

    #[test]
    fn fresh_nonces_give_fresh_intents() {
        let (_, secret) = intent();
        let a = PaymentIntentWitness::random(&secret, &mut OsRng).unwrap();
        let b = PaymentIntentWitness::random(&secret, &mut OsRng).unwrap();
        assert_eq!(a.signals.commitment, b.signals.commitment);
        assert_ne!(a.signals.payment_intent, b.signals.payment_intent);
    }

    #[test]
    fn tampered_witness_fails_check() {
        let (_, secret) = intent();
        let mut witness = PaymentIntentWitness::build(&secret, Fr::from(1)).unwrap();
        witness.nonce = Fr::from(2);
        assert!(witness.check().is_err());
    }

    #[test]
    fn circuit_input_uses_decimal_strings() {
        let (_, secret) = intent();
        let witness = PaymentIntentWitness::build(&secret, Fr::from(9)).unwrap();
        let input = witness.circuit_input();
        assert_eq!(input["nonce"], "9");
        assert_eq!(input["debitTimes"], "3");
        assert_eq!(input["maxDebitAmount"], "1000");
    }
}
