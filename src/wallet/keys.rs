//! Key generation, address derivation, and ECDSA signing.
//!
//! Keys live on the NIST P-256 curve. An address is the lower-case hex
//! SHA-256 digest of the uncompressed SEC1 point of the public key, so it is
//! always 64 characters. Signatures travel as the raw (r, s) concatenation at
//! a fixed 64 bytes; verification rejects anything of a different length
//! before touching the curve.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{NodeError, Result};

/// Raw (r ‖ s) signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Hex length of an address (SHA-256 digest).
pub const ADDRESS_LEN: usize = 64;

/// A P-256 keypair. Owned exclusively by one wallet and never serialized.
#[derive(Debug, Clone)]
pub struct Keypair {
    signing: SigningKey,
    verifying: VerifyingKey,
}

impl Keypair {
    /// Generates a fresh keypair over OS randomness.
    pub fn generate() -> Keypair {
        let mut rng = OsRng;
        let signing = SigningKey::random(&mut rng);
        let verifying = *signing.verifying_key();
        Keypair { signing, verifying }
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying
    }

    /// Address derived from this keypair's public half.
    pub fn address(&self) -> String {
        address_of(&self.verifying)
    }

    /// Signs `msg` and returns the raw (r ‖ s) bytes. The field encoding is
    /// fixed-width, so the result is always exactly 64 bytes.
    pub fn sign(&self, msg: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
        let signature: Signature = self
            .signing
            .try_sign(msg)
            .map_err(|e| NodeError::Crypto(format!("signing failed: {e}")))?;
        let mut raw = [0u8; SIGNATURE_LEN];
        raw.copy_from_slice(&signature.to_bytes());
        Ok(raw)
    }
}

/// SHA-256 of the uncompressed SEC1 point, hex lower-case.
pub fn address_of(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    hex::encode(Sha256::digest(point.as_bytes()))
}

/// Verifies a raw 64-byte (r ‖ s) signature. A signature of the wrong length,
/// or any parse or curve failure, verifies false rather than erroring.
pub fn verify(key: &VerifyingKey, msg: &[u8], sig: &[u8]) -> bool {
    if sig.len() != SIGNATURE_LEN {
        return false;
    }
    match Signature::from_slice(sig) {
        Ok(signature) => key.verify(msg, &signature).is_ok(),
        Err(_) => false,
    }
}

/// Hex encoding of the uncompressed SEC1 point, the form public keys take on
/// the wire.
pub fn encode_public_key(key: &VerifyingKey) -> String {
    hex::encode(key.to_encoded_point(false).as_bytes())
}

/// Parses a wire-format public key.
pub fn decode_public_key(encoded: &str) -> Result<VerifyingKey> {
    let bytes = hex::decode(encoded)
        .map_err(|e| NodeError::Crypto(format!("malformed public key hex: {e}")))?;
    VerifyingKey::from_sec1_bytes(&bytes)
        .map_err(|e| NodeError::Crypto(format!("invalid P-256 point: {e}")))
}
