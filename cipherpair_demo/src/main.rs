mod messaging;

use anyhow::{Context, Result, bail};
use cipherpair_core::aead::AEAD_KEY_BYTES;
use cipherpair_core::{
    BlockCipher, Cipher, QuadraticPublicKey, QuadraticResidueCryptosystem, ReferenceCipher,
    SecurityLevel, SecurityPreset, secure_rng, security_preset,
};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use hex::encode as hex_encode;
use log::{LevelFilter, debug, info};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::messaging::{Person, ReceivedMessage, SecureChannel};

const DEFAULT_MESSAGES: [&str; 2] = [
    "Hello Bob! This is a secret message from Alice",
    "Hi Alice! I received your message, thank you",
];

#[derive(Parser)]
#[command(
    name = "cipherpair",
    author,
    version,
    about = "Alice/Bob messaging simulation over classical ciphers"
)]
struct Cli {
    #[arg(long, global = true)]
    debug: bool,
    #[arg(long, global = true, value_enum, default_value = "standard")]
    security_level: SecurityLevelArg,
    /// Override the preset's quadratic-residue key size in bits.
    #[arg(long, global = true, value_name = "BITS")]
    key_size: Option<u64>,
    /// Override the preset's Miller-Rabin round count.
    #[arg(long, global = true, value_name = "N")]
    rounds: Option<usize>,
    /// Message to exchange; repeat for several. Senders alternate between Alice and Bob.
    #[arg(long = "message", global = true, value_name = "TEXT")]
    messages: Vec<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SecurityLevelArg {
    Toy,
    Standard,
    Paranoid,
}

impl From<SecurityLevelArg> for SecurityLevel {
    fn from(arg: SecurityLevelArg) -> Self {
        match arg {
            SecurityLevelArg::Toy => SecurityLevel::Toy,
            SecurityLevelArg::Standard => SecurityLevel::Standard,
            SecurityLevelArg::Paranoid => SecurityLevel::Paranoid,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    Blowfish,
    Reference,
}

#[derive(Subcommand)]
enum Commands {
    /// Alice and Bob share a random secret key and exchange messages.
    Symmetric {
        #[arg(long, value_enum, default_value = "blowfish")]
        algorithm: AlgorithmArg,
    },
    /// Bob publishes a quadratic-residue public key; Alice writes to him with it.
    Asymmetric,
    /// Alice wraps a fresh block cipher key under Bob's public key, then both chat.
    KeyExchange,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let mut preset = security_preset(cli.security_level.into());
    if let Some(bits) = cli.key_size {
        preset = preset.with_key_size(bits);
    }
    if let Some(rounds) = cli.rounds {
        preset = preset.with_primality_rounds(rounds);
    }
    let messages = if cli.messages.is_empty() {
        DEFAULT_MESSAGES.iter().map(|text| text.to_string()).collect()
    } else {
        cli.messages
    };
    debug!(
        "preset level={:?} key_size={} rounds={} session_key_bytes={}",
        preset.level, preset.key_size_bits, preset.primality_rounds, preset.session_key_bytes
    );

    match cli.command {
        Commands::Symmetric { algorithm } => cmd_symmetric(algorithm, preset, &messages),
        Commands::Asymmetric => cmd_asymmetric(preset, &messages),
        Commands::KeyExchange => cmd_key_exchange(preset, &messages),
    }
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(Env::default().filter_or("CIPHERPAIR_LOG", "info"));
    builder.format_timestamp(None).format_target(false);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn random_key(len: usize) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; len]);
    secure_rng().fill_bytes(key.as_mut_slice());
    key
}

fn cmd_symmetric(
    algorithm: AlgorithmArg,
    preset: SecurityPreset,
    messages: &[String],
) -> Result<()> {
    let mut alice = Person::new("Alice");
    let mut bob = Person::new("Bob");

    let (shared_key, cipher): (_, Box<dyn Cipher>) = match algorithm {
        AlgorithmArg::Blowfish => {
            let key = random_key(preset.session_key_bytes);
            let cipher = BlockCipher::new(&key).context("building block cipher")?;
            (key, Box::new(cipher) as Box<dyn Cipher>)
        }
        AlgorithmArg::Reference => {
            let key = random_key(AEAD_KEY_BYTES);
            let cipher = ReferenceCipher::from_slice(&key).context("building reference cipher")?;
            (key, Box::new(cipher) as Box<dyn Cipher>)
        }
    };
    let mut channel = SecureChannel::new(cipher);

    println!(
        "\n----- SYMMETRIC KEY SETUP ({}) -----",
        channel.algorithm().to_uppercase()
    );
    println!(
        "[setup] {alice} and {bob} share the secret key: {}",
        hex_encode(shared_key.as_slice())
    );
    println!("[setup] The key was exchanged over a secure channel");
    println!("{}", "-".repeat(50));

    converse(&mut channel, &mut alice, &mut bob, messages)?;
    alice.print_inbox();
    bob.print_inbox();
    Ok(())
}

fn cmd_asymmetric(preset: SecurityPreset, messages: &[String]) -> Result<()> {
    let bob = Person::new("Bob");
    let bob_keys = generate_keys(&bob, preset)?;
    run_asymmetric(&bob_keys, messages)
}

/// Bob publishes the public half of `bob_keys` as JSON; Alice encrypts each
/// message with what she parsed and Bob decrypts it.
fn run_asymmetric(bob_keys: &QuadraticResidueCryptosystem, messages: &[String]) -> Result<()> {
    let alice = Person::new("Alice");
    let mut bob = Person::new("Bob");

    let published = serde_json::to_string(bob_keys.public_key())?;
    println!("[setup] {bob} publishes: {published}");
    let public: QuadraticPublicKey =
        serde_json::from_str(&published).context("parsing Bob's published key")?;
    println!(
        "[setup] {alice} loaded Bob's key, fingerprint {}",
        hex_encode(&public.fingerprint()[..8])
    );
    let capacity = public.modulus_len().saturating_sub(2);

    for (index, text) in messages.iter().enumerate() {
        let sequence = index as u64;
        if text.len() > capacity {
            bail!(
                "message #{sequence} is {} bytes; the {}-bit key takes at most {capacity}",
                text.len(),
                public.modulus().bits()
            );
        }
        println!("\n----- {alice} SENDS A MESSAGE TO {bob} -----");
        println!("[#{sequence}] {alice}: original message: {text}");
        let ciphertext = public
            .encrypt(text.as_bytes())
            .with_context(|| format!("encrypting message #{sequence} for Bob"))?;
        println!("[#{sequence}] {alice}: encrypted message: {}", hex_encode(&ciphertext));

        let plaintext = bob_keys
            .decrypt(&ciphertext)
            .with_context(|| format!("Bob decrypting message #{sequence}"))?;
        let message = String::from_utf8(plaintext)
            .with_context(|| format!("message #{sequence} is not valid UTF-8"))?;
        println!("[#{sequence}] {bob}: decrypted message: {message}");
        bob.received.push(ReceivedMessage {
            from: alice.name.clone(),
            message,
            sequence,
        });
    }

    alice.print_inbox();
    bob.print_inbox();
    Ok(())
}

fn cmd_key_exchange(preset: SecurityPreset, messages: &[String]) -> Result<()> {
    let bob = Person::new("Bob");
    let bob_keys = generate_keys(&bob, preset)?;
    let session_key = random_key(preset.session_key_bytes);
    run_key_exchange(&bob_keys, session_key, messages)
}

fn run_key_exchange(
    bob_keys: &QuadraticResidueCryptosystem,
    session_key: Zeroizing<Vec<u8>>,
    messages: &[String],
) -> Result<()> {
    let mut alice = Person::new("Alice");
    let mut bob = Person::new("Bob");

    let wrapped = wrap_session_key(bob_keys.public_key(), &session_key)?;
    println!("\n----- KEY EXCHANGE -----");
    println!("[setup] {alice} generated a {}-byte session key", session_key.len());
    println!(
        "[setup] {alice} sends the wrapped key: {}",
        hex_encode(&wrapped.ciphertext)
    );

    let unwrapped = unwrap_session_key(bob_keys, &wrapped, session_key.len())?;
    println!("[setup] {bob} unwrapped the session key");
    println!("{}", "-".repeat(50));

    let cipher = BlockCipher::new(&unwrapped).context("building block cipher")?;
    let mut channel = SecureChannel::new(Box::new(cipher));
    converse(&mut channel, &mut alice, &mut bob, messages)?;
    alice.print_inbox();
    bob.print_inbox();
    Ok(())
}

/// A session key encrypted to Bob, plus a hash Bob uses to pick the right
/// decoding among the candidates.
struct WrappedKey {
    ciphertext: Vec<u8>,
    confirmation: [u8; 32],
}

fn session_key_confirmation(key: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"cipherpair::session-key-confirmation");
    hasher.update(key);
    *hasher.finalize().as_bytes()
}

fn wrap_session_key(public: &QuadraticPublicKey, session_key: &[u8]) -> Result<WrappedKey> {
    let ciphertext = public
        .encrypt(session_key)
        .context("wrapping the session key under Bob's public key")?;
    Ok(WrappedKey {
        ciphertext,
        confirmation: session_key_confirmation(session_key),
    })
}

fn unwrap_session_key(
    keys: &QuadraticResidueCryptosystem,
    wrapped: &WrappedKey,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let candidates = keys.decrypt_candidates(&wrapped.ciphertext);
    debug!("session key unwrap candidates={}", candidates.len());
    for candidate in candidates.into_iter().map(Zeroizing::new) {
        let Ok(padded) = left_pad(&candidate, key_len) else {
            continue;
        };
        if session_key_confirmation(&padded) == wrapped.confirmation {
            return Ok(padded);
        }
    }
    bail!("no decoding of the wrapped key matches its confirmation hash")
}

/// The integer encoding drops leading zero bytes; both sides know the agreed
/// session key length, so Bob restores them.
fn left_pad(bytes: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>> {
    if bytes.len() > len {
        bail!("unwrapped key is {} bytes, expected {len}", bytes.len());
    }
    let mut padded = Zeroizing::new(vec![0u8; len - bytes.len()]);
    padded.extend_from_slice(bytes);
    Ok(padded)
}

fn generate_keys(owner: &Person, preset: SecurityPreset) -> Result<QuadraticResidueCryptosystem> {
    println!(
        "\n----- {} GENERATES A {}-BIT QUADRATIC-RESIDUE KEY -----",
        owner, preset.key_size_bits
    );
    let mut rng = secure_rng();
    let keys = QuadraticResidueCryptosystem::with_rng(
        preset.key_size_bits,
        preset.primality_rounds,
        &mut rng,
    )
    .with_context(|| format!("generating {}'s key pair", owner))?;
    info!(
        "{} key ready: modulus {} bits",
        owner,
        keys.public_key().modulus().bits()
    );
    debug!("{} private key {:?}", owner, keys.private_key());
    Ok(keys)
}

/// Alternates senders: even messages go Alice -> Bob, odd ones Bob -> Alice.
fn converse(
    channel: &mut SecureChannel,
    alice: &mut Person,
    bob: &mut Person,
    messages: &[String],
) -> Result<()> {
    for (index, text) in messages.iter().enumerate() {
        if index % 2 == 0 {
            channel.send(alice, bob, text)?;
        } else {
            channel.send(bob, alice, text)?;
        }
    }
    Ok(())
}
