use std::{fmt, fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::OsRng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zkdd_common::{
    decode_account_secrets,
    encryption::{pack_encrypted_message, unpack_encrypted_message, EncryptedMessage},
    field_to_hex, fr_from_decimal, fr_to_decimal,
    intent::{PaymentIntentSecret, PaymentIntentWitness},
    new_account_secrets,
    proof::SnarkjsProof,
    Address, Groth16Proof,
};
use zkdd_ledger::{FeePolicy, LedgerSettings};
use zkdd_verifier::vk::{load_pinned_verification_key, load_verification_key};

#[derive(Parser)]
#[command(
    name = "zkdd-tools",
    about = "Utility commands for private direct debits"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh account note and its commitment.
    NewNote(OutputArgs),
    /// Print the commitment behind a hex note.
    Commitment(NoteArgs),
    /// Build the witness input and public signals for a payment intent.
    Intent(IntentArgs),
    /// Render a decimal field element as fixed-width hex.
    ToHex(ToHexArgs),
    /// Split a debit amount into fees and net payout.
    Fee(FeeArgs),
    /// Pack a snarkjs proof into eight base-field words.
    PackProof(PackProofArgs),
    /// Pack an encrypted message JSON into its stored hex form.
    PackMessage(PackMessageArgs),
    /// Expand a packed hex message back into its JSON form.
    UnpackMessage(UnpackMessageArgs),
    /// Validate a verification key and print its fingerprint.
    InspectVk(InspectVkArgs),
}

#[derive(Args)]
struct OutputArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct NoteArgs {
    /// 62-byte hex note.
    #[arg(long)]
    note: String,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct IntentArgs {
    #[arg(long)]
    note: String,
    #[arg(long)]
    payee: Address,
    /// Largest amount a single debit may pull.
    #[arg(long)]
    max_debit_amount: u128,
    #[arg(long)]
    debit_times: u64,
    /// Seconds between debits.
    #[arg(long, default_value_t = 0)]
    debit_interval: u64,
    /// Decimal nonce; a random one is drawn if omitted.
    #[arg(long)]
    nonce: Option<String>,
}

#[derive(Args)]
struct ToHexArgs {
    /// Decimal value.
    value: String,
    /// Width in bytes.
    #[arg(long, default_value_t = 32)]
    length: usize,
}

#[derive(Args)]
struct FeeArgs {
    amount: u128,
    /// JSON settings file; `ZKDD_*` variables are read when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PackProofArgs {
    /// snarkjs proof.json
    #[arg(long)]
    proof: PathBuf,
}

#[derive(Args)]
struct PackMessageArgs {
    #[arg(long)]
    message: PathBuf,
}

#[derive(Args)]
struct UnpackMessageArgs {
    packed: String,
}

#[derive(Args)]
struct InspectVkArgs {
    #[arg(long)]
    vk: PathBuf,
    /// Fail unless the key's blake3 matches.
    #[arg(long)]
    expect_blake3: Option<String>,
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zkdd_tools=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::NewNote(args) => new_note(args),
        Commands::Commitment(args) => commitment(args),
        Commands::Intent(args) => intent(args),
        Commands::ToHex(args) => to_hex(args),
        Commands::Fee(args) => fee(args),
        Commands::PackProof(args) => pack_proof(args),
        Commands::PackMessage(args) => pack_message(args),
        Commands::UnpackMessage(args) => unpack_message(args),
        Commands::InspectVk(args) => inspect_vk(args),
    }
}

fn new_note(args: OutputArgs) -> Result<()> {
    let note = new_account_secrets(&mut OsRng)?;
    let secrets = decode_account_secrets(&note)?;
    info!(commitment = %secrets.commitment, "generated account note");
    output_summary(
        &NoteSummary {
            note: Some(note),
            commitment: secrets.commitment.to_hex(),
        },
        args.json,
    )
}

fn commitment(args: NoteArgs) -> Result<()> {
    let secrets = decode_account_secrets(&args.note).context("invalid note")?;
    output_summary(
        &NoteSummary {
            note: None,
            commitment: secrets.commitment.to_hex(),
        },
        args.json,
    )
}

fn intent(args: IntentArgs) -> Result<()> {
    let secret = PaymentIntentSecret {
        note: args.note,
        payee: args.payee,
        max_debit_amount: args.max_debit_amount,
        debit_times: args.debit_times,
        debit_interval: args.debit_interval,
    };
    let witness = match args.nonce {
        Some(nonce) => {
            let nonce = fr_from_decimal(&nonce).context("invalid nonce")?;
            PaymentIntentWitness::build(&secret, nonce)?
        }
        None => PaymentIntentWitness::random(&secret, &mut OsRng)?,
    };
    info!(
        payment_intent = %witness.signals.payment_intent,
        nonce = %fr_to_decimal(&witness.nonce),
        "built payment intent"
    );
    let document = serde_json::json!({
        "input": witness.circuit_input(),
        "publicSignals": witness.signals.to_decimal_strings(),
        "signals": witness.signals,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn to_hex(args: ToHexArgs) -> Result<()> {
    let value = fr_from_decimal(&args.value).context("value is not a field element")?;
    println!("{}", field_to_hex(&value, args.length)?);
    Ok(())
}

fn fee(args: FeeArgs) -> Result<()> {
    let settings = match &args.settings {
        Some(path) => LedgerSettings::from_json_file(path)?,
        None => LedgerSettings::from_env()?,
    };
    let policy: FeePolicy = settings.fee_policy()?;
    let split = policy.split(args.amount);
    output_summary(
        &FeeSummary {
            mode: policy.mode().to_string(),
            divider: policy.divider().to_string(),
            amount: args.amount.to_string(),
            protocol_fee: split.protocol_fee.to_string(),
            relayer_fee: split.relayer_fee.to_string(),
            net: split.net.to_string(),
        },
        args.json,
    )
}

fn pack_proof(args: PackProofArgs) -> Result<()> {
    let raw = fs::read(&args.proof)
        .with_context(|| format!("failed to read {}", args.proof.display()))?;
    let proof: SnarkjsProof = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", args.proof.display()))?;
    let packed = Groth16Proof::from_snarkjs(&proof)?.pack();
    println!("{}", serde_json::to_string_pretty(&packed.to_hex_words())?);
    Ok(())
}

fn pack_message(args: PackMessageArgs) -> Result<()> {
    let raw = fs::read(&args.message)
        .with_context(|| format!("failed to read {}", args.message.display()))?;
    let message: EncryptedMessage = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", args.message.display()))?;
    println!("{}", pack_encrypted_message(&message)?);
    Ok(())
}

fn unpack_message(args: UnpackMessageArgs) -> Result<()> {
    let message = unpack_encrypted_message(&args.packed)?;
    println!("{}", serde_json::to_string_pretty(&message)?);
    Ok(())
}

fn inspect_vk(args: InspectVkArgs) -> Result<()> {
    let loaded = match &args.expect_blake3 {
        Some(expected) => load_pinned_verification_key(&args.vk, expected)?,
        None => load_verification_key(&args.vk)?,
    };
    let summary = VkSummary {
        path: args.vk.display().to_string(),
        protocol: loaded.key.protocol.clone(),
        curve: loaded.key.curve.clone(),
        n_public: loaded.key.n_public,
        ic_points: loaded.key.ic.len(),
        fingerprint: loaded.fingerprint,
    };
    output_summary(&summary, args.json)
}

fn output_summary<T>(summary: &T, json: bool) -> Result<()>
where
    T: Serialize + fmt::Display,
{
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

#[derive(Serialize)]
struct NoteSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    commitment: String,
}

impl fmt::Display for NoteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(note) = &self.note {
            writeln!(f, "note: {}", note)?;
        }
        write!(f, "commitment: {}", self.commitment)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeeSummary {
    mode: String,
    divider: String,
    amount: String,
    protocol_fee: String,
    relayer_fee: String,
    net: String,
}

impl fmt::Display for FeeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mode: {} (divider {})", self.mode, self.divider)?;
        writeln!(f, "amount: {}", self.amount)?;
        writeln!(f, "protocol fee: {}", self.protocol_fee)?;
        writeln!(f, "relayer fee: {}", self.relayer_fee)?;
        write!(f, "net: {}", self.net)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VkSummary {
    path: String,
    protocol: String,
    curve: String,
    n_public: usize,
    ic_points: usize,
    fingerprint: String,
}

impl fmt::Display for VkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "verification key: {}", self.path)?;
        writeln!(f, "protocol: {} over {}", self.protocol, self.curve)?;
        writeln!(f, "public signals: {}", self.n_public)?;
        writeln!(f, "IC points: {}", self.ic_points)?;
        write!(f, "blake3: {}", self.fingerprint)
    }
}
