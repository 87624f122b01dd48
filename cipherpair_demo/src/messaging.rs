use anyhow::{Context, Result};
use cipherpair_core::Cipher;
use hex::encode as hex_encode;
use log::debug;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub from: String,
    pub message: String,
    pub sequence: u64,
}

#[derive(Debug)]
pub struct Person {
    pub name: String,
    pub received: Vec<ReceivedMessage>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            received: Vec::new(),
        }
    }

    pub fn print_inbox(&self) {
        println!("\nMessages received by {}:", self.name);
        if self.received.is_empty() {
            println!("  (none)");
        }
        for entry in &self.received {
            println!("  - #{} from {}: {}", entry.sequence, entry.from, entry.message);
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A cipher both endpoints agree on, plus the running message counter.
pub struct SecureChannel {
    cipher: Box<dyn Cipher>,
    next_sequence: u64,
}

impl SecureChannel {
    pub fn new(cipher: Box<dyn Cipher>) -> Self {
        Self {
            cipher,
            next_sequence: 0,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        self.cipher.name()
    }

    /// Encrypts `text` on the sender side, decrypts it on the recipient side
    /// and files it in the recipient's inbox.
    pub fn send(&mut self, sender: &Person, recipient: &mut Person, text: &str) -> Result<()> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        println!("\n----- {} SENDS A MESSAGE TO {} -----", sender, recipient);
        println!("[#{sequence}] {sender}: original message: {text}");
        let ciphertext = self
            .cipher
            .encrypt(text.as_bytes())
            .with_context(|| format!("{} encrypting message #{sequence}", self.algorithm()))?;
        println!(
            "[#{sequence}] {sender}: encrypted message: {}",
            hex_encode(&ciphertext)
        );
        debug!(
            "channel send algorithm={} seq={} plaintext_len={} ciphertext_len={}",
            self.algorithm(),
            sequence,
            text.len(),
            ciphertext.len()
        );

        println!("\n----- {} RECEIVES A MESSAGE FROM {} -----", recipient, sender);
        let plaintext = self
            .cipher
            .decrypt(&ciphertext)
            .with_context(|| format!("{} decrypting message #{sequence}", self.algorithm()))?;
        let message = String::from_utf8(plaintext)
            .with_context(|| format!("message #{sequence} is not valid UTF-8"))?;
        println!("[#{sequence}] {recipient}: decrypted message: {message}");

        recipient.received.push(ReceivedMessage {
            from: sender.name.clone(),
            message,
            sequence,
        });
        println!("{}", "-".repeat(50));
        Ok(())
    }
}
