//! # Hashing Utilities
//!
//! The checkout protocol needs exactly one hash: SHA-1 over the order ID,
//! hex-encoded and upper-cased, as the Initialize-phase challenge. It's a
//! deterministic binding token, not a security control. SHA-1 is what the
//! gateway recomputes on its side, so SHA-1 is what we send.
//!
//! SHA-256 shows up too, but only inside the RSA signature scheme; see
//! [`super::envelope`].

use sha1::{Digest, Sha1};

/// Length of a hex-encoded SHA-1 digest.
pub const SHA1_HEX_LENGTH: usize = 40;

/// SHA-1 of the UTF-8 bytes of `input`, as 40 uppercase hex characters.
///
/// # Example
///
/// ```
/// use nagad_protocol::crypto::challenge_hash;
///
/// let challenge = challenge_hash("ORD123");
/// assert_eq!(challenge.len(), 40);
/// assert_eq!(challenge, challenge.to_uppercase());
/// ```
pub fn challenge_hash(input: &str) -> String {
    hex::encode_upper(Sha1::digest(input.as_bytes()))
}
