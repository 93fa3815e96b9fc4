//! Signed command components.
//!
//! A control command is authenticated by appending four components to its
//! name:
//!
//! ```text
//! /<command name>/<timestamp>/<nonce>/<SignatureInfo>/<SignatureValue>
//! ```
//!
//! The timestamp is wall-clock milliseconds and must increase strictly from
//! one command to the next, because the forwarder rejects replays. The nonce
//! is eight random bytes. The signature covers the encoded components from
//! the first one through SignatureInfo.
//!
//! [`CommandSigner`] produces SignatureInfo and SignatureValue;
//! [`CommandStamper`] owns the timestamp sequence and assembles the name.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use ed25519_dalek::{Signer as _, SigningKey};
use ndncc_proto::{
    Name, NameComponent,
    tlv::{self, types},
};
use sha2::{Digest, Sha256};

use crate::env::Environment;

/// SignatureType code for DigestSha256.
pub const SIGNATURE_DIGEST_SHA256: u64 = 0;

/// SignatureType code for Ed25519.
pub const SIGNATURE_ED25519: u64 = 5;

/// Produces the signature elements of a command.
pub trait CommandSigner: Send + Sync {
    /// Complete SignatureInfo element.
    fn signature_info(&self) -> Vec<u8>;

    /// Raw signature bytes over `signed_portion`.
    fn sign(&self, signed_portion: &[u8]) -> Vec<u8>;
}

/// Ed25519 signature with a KeyLocator naming the key.
pub struct Ed25519Signer {
    key: SigningKey,
    key_name: Name,
}

impl Ed25519Signer {
    /// Signer for `key`, published under `key_name`.
    pub fn new(key: SigningKey, key_name: Name) -> Self {
        Self { key, key_name }
    }

    /// Signer from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32], key_name: Name) -> Self {
        Self::new(SigningKey::from_bytes(seed), key_name)
    }

    /// Name in the KeyLocator.
    pub fn key_name(&self) -> &Name {
        &self.key_name
    }

    /// Public half of the key.
    pub fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.key.verifying_key()
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer").field("key_name", &self.key_name).finish_non_exhaustive()
    }
}

impl CommandSigner for Ed25519Signer {
    fn signature_info(&self) -> Vec<u8> {
        let mut locator = Vec::new();
        self.key_name.encode(&mut locator);

        let mut value = Vec::new();
        tlv::write_nonneg(&mut value, types::SIGNATURE_TYPE, SIGNATURE_ED25519);
        tlv::write_element(&mut value, types::KEY_LOCATOR, &locator);

        let mut info = Vec::new();
        tlv::write_element(&mut info, types::SIGNATURE_INFO, &value);
        info
    }

    fn sign(&self, signed_portion: &[u8]) -> Vec<u8> {
        self.key.sign(signed_portion).to_bytes().to_vec()
    }
}

/// SHA-256 digest "signature". Integrity only, no key.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestSigner;

impl CommandSigner for DigestSigner {
    fn signature_info(&self) -> Vec<u8> {
        let mut value = Vec::new();
        tlv::write_nonneg(&mut value, types::SIGNATURE_TYPE, SIGNATURE_DIGEST_SHA256);

        let mut info = Vec::new();
        tlv::write_element(&mut info, types::SIGNATURE_INFO, &value);
        info
    }

    fn sign(&self, signed_portion: &[u8]) -> Vec<u8> {
        Sha256::digest(signed_portion).to_vec()
    }
}

/// Appends signed-command components using a [`CommandSigner`].
///
/// Shared by every operation of one client so that timestamps stay strictly
/// increasing across concurrent callers.
pub struct CommandStamper {
    signer: Arc<dyn CommandSigner>,
    last_timestamp: AtomicU64,
}

impl CommandStamper {
    /// Stamper around `signer`.
    pub fn new(signer: impl CommandSigner + 'static) -> Self {
        Self::from_arc(Arc::new(signer))
    }

    /// Stamper around a shared signer.
    pub fn from_arc(signer: Arc<dyn CommandSigner>) -> Self {
        Self { signer, last_timestamp: AtomicU64::new(0) }
    }

    /// Next timestamp: the wall clock, bumped past the previous stamp when
    /// the clock has not advanced.
    fn next_timestamp(&self, wall_clock: u64) -> u64 {
        let mut previous = self.last_timestamp.load(Ordering::Relaxed);
        loop {
            let next = wall_clock.max(previous.saturating_add(1));
            match self.last_timestamp.compare_exchange_weak(
                previous,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => previous = actual,
            }
        }
    }

    /// Append timestamp, nonce, SignatureInfo and SignatureValue to `name`.
    pub fn stamp<E: Environment>(&self, name: Name, env: &E) -> Name {
        let timestamp = self.next_timestamp(env.unix_millis());
        let mut nonce = [0u8; 8];
        env.random_bytes(&mut nonce);

        let name = name
            .append_generic(tlv::nonneg_bytes(timestamp))
            .append_generic(nonce.to_vec())
            .append_generic(self.signer.signature_info());

        let signature = self.signer.sign(&name.encode_value());
        let mut value = Vec::with_capacity(signature.len() + 2);
        tlv::write_element(&mut value, types::SIGNATURE_VALUE, &signature);

        name.append(NameComponent::generic(value))
    }
}

impl std::fmt::Debug for CommandStamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStamper")
            .field("last_timestamp", &self.last_timestamp.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
