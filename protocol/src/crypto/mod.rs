//! # Cryptographic Primitives for the Checkout Protocol
//!
//! The gateway dictates the cryptography, so there is nothing to choose
//! here, only things to get exactly right:
//!
//! - **RSA PKCS#1 v1.5** encryption of sensitive records for the gateway.
//! - **RSASSA-PKCS1-v1_5 / SHA-256** signatures with the merchant key.
//! - **SHA-1**, upper-case hex, for the Initialize challenge.
//!
//! Everything is a thin wrapper around the RustCrypto crates. If you're
//! tempted to "improve" the padding scheme, don't: the gateway won't follow.

pub mod envelope;
pub mod hash;
pub mod keys;

pub use envelope::{canonical_json, decrypt, encrypt, sign, verify, CryptoEnvelope, SealedEnvelope};
pub use hash::challenge_hash;
pub use keys::{format_key, KeyKind, KeyPair};
