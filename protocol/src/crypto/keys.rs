//! # Key Material
//!
//! Loading and normalizing the two RSA keys the protocol needs:
//!
//! - the **merchant private key**: signs every outbound envelope and
//!   decrypts what the gateway sends back;
//! - the **gateway public key**: encrypts every outbound envelope.
//!
//! Merchants get their keys from the Nagad onboarding portal, and in
//! practice they show up in every shape imaginable: full PEM files, PEM
//! text pasted into an environment variable, or just the bare base64 body
//! with the armor lines stripped. [`format_key`] turns all of those into
//! PEM; [`KeyPair::load`] parses the result into RSA handles once, at
//! construction, so a bad key fails fast instead of on the first payment.
//!
//! ## Security considerations
//!
//! - Key text is never logged and never appears in `Debug` output.
//! - Files are read once, at construction. No hot reloading.

use std::fmt;
use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::NagadError;

/// Which half of a key pair a piece of key text is supposed to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    Private,
    Public,
}

impl KeyKind {
    /// The word used in the PEM armor: `PRIVATE` or `PUBLIC`.
    pub fn label(self) -> &'static str {
        match self {
            KeyKind::Private => "PRIVATE",
            KeyKind::Public => "PUBLIC",
        }
    }
}

/// Normalize key text into a PEM document.
///
/// If the text already contains a `begin` marker (any case), it's trimmed
/// and returned as-is. Otherwise the trimmed text is treated as a bare
/// base64 body and wrapped in `-----BEGIN {kind} KEY-----` armor.
///
/// This is purely textual. Whether the result is actually a valid key is
/// decided by [`KeyPair::from_pem`].
///
/// # Example
///
/// ```
/// use nagad_protocol::crypto::keys::{format_key, KeyKind};
///
/// let pem = format_key("  MIIBIjAN  ", KeyKind::Public);
/// assert_eq!(pem, "-----BEGIN PUBLIC KEY-----\nMIIBIjAN\n-----END PUBLIC KEY-----");
/// ```
pub fn format_key(text: &str, kind: KeyKind) -> String {
    let trimmed = text.trim();
    if trimmed.to_ascii_lowercase().contains("begin") {
        return trimmed.to_string();
    }
    let label = kind.label();
    format!("-----BEGIN {label} KEY-----\n{trimmed}\n-----END {label} KEY-----")
}

/// Read key text from `raw_or_path` and normalize it with [`format_key`].
///
/// When `is_path` is true the argument is a filesystem path and the file is
/// read as UTF-8; otherwise the argument is the key text itself.
pub fn load_key_text(
    raw_or_path: &str,
    kind: KeyKind,
    is_path: bool,
) -> Result<String, NagadError> {
    if !is_path {
        return Ok(format_key(raw_or_path, kind));
    }

    let path = Path::new(raw_or_path);
    let text = std::fs::read_to_string(path).map_err(|e| {
        NagadError::KeyFormat(format!(
            "cannot read {} key file {}: {e}",
            kind.label().to_ascii_lowercase(),
            path.display()
        ))
    })?;
    Ok(format_key(&text, kind))
}

/// Re-flow a PEM body into 64-column lines.
///
/// The PEM decoder is strict RFC 7468 and refuses the single-line bodies
/// that [`format_key`] produces from pasted keys. The armor lines are kept;
/// everything between them is stripped of whitespace and re-wrapped. Text
/// without armor is returned unchanged and left for the decoder to reject.
fn rewrap_pem(pem: &str) -> String {
    let lines: Vec<&str> = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let (first, last) = match (lines.first(), lines.last()) {
        (Some(first), Some(last))
            if lines.len() >= 2 && first.starts_with("-----") && last.starts_with("-----") =>
        {
            (*first, *last)
        }
        _ => return pem.to_string(),
    };

    let body: Vec<char> = lines[1..lines.len() - 1]
        .iter()
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(pem.len() + body.len() / 64 + 2);
    out.push_str(first);
    out.push('\n');
    for chunk in body.chunks(64) {
        out.extend(chunk.iter());
        out.push('\n');
    }
    out.push_str(last);
    out.push('\n');
    out
}

/// Parse a PEM private key. PKCS#8 first (what Nagad issues), PKCS#1 as a
/// fallback for keys generated with older `openssl genrsa`.
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, NagadError> {
    let pem = rewrap_pem(pem);
    RsaPrivateKey::from_pkcs8_pem(&pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
        .map_err(|e| {
            NagadError::KeyFormat(format!(
                "merchant private key is not a valid RSA PEM key: {e}"
            ))
        })
}

/// Parse a PEM public key. SPKI first, PKCS#1 as a fallback.
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, NagadError> {
    let pem = rewrap_pem(pem);
    RsaPublicKey::from_public_key_pem(&pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(&pem))
        .map_err(|e| {
            NagadError::KeyFormat(format!("gateway public key is not a valid RSA PEM key: {e}"))
        })
}

/// The merchant's private key and the gateway's public key, parsed.
///
/// Immutable after construction. The protocol client wraps this in an
/// `Arc` and shares it read-only across concurrent payments; RSA operations
/// on immutable keys need no locking.
#[derive(Clone)]
pub struct KeyPair {
    merchant_private: RsaPrivateKey,
    gateway_public: RsaPublicKey,
}

impl KeyPair {
    /// Build a key pair from raw key text or file paths.
    ///
    /// # Errors
    ///
    /// [`NagadError::KeyFormat`] if a file can't be read or either key
    /// doesn't parse.
    pub fn load(private_key: &str, public_key: &str, is_path: bool) -> Result<Self, NagadError> {
        let private_pem = load_key_text(private_key, KeyKind::Private, is_path)?;
        let public_pem = load_key_text(public_key, KeyKind::Public, is_path)?;
        Self::from_pem(&private_pem, &public_pem)
    }

    /// Build a key pair from PEM text, normalizing bare bodies first.
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, NagadError> {
        let merchant_private = parse_private_key(&format_key(private_pem, KeyKind::Private))?;
        let gateway_public = parse_public_key(&format_key(public_pem, KeyKind::Public))?;
        Ok(Self::from_keys(merchant_private, gateway_public))
    }

    /// Wrap already-parsed keys.
    pub fn from_keys(merchant_private: RsaPrivateKey, gateway_public: RsaPublicKey) -> Self {
        Self {
            merchant_private,
            gateway_public,
        }
    }

    pub fn merchant_private(&self) -> &RsaPrivateKey {
        &self.merchant_private
    }

    pub fn gateway_public(&self) -> &RsaPublicKey {
        &self.gateway_public
    }

    /// Largest plaintext, in bytes, the gateway key can encrypt in one
    /// PKCS#1 v1.5 block.
    pub fn max_plaintext_len(&self) -> usize {
        self.gateway_public
            .size()
            .saturating_sub(crate::config::PKCS1_PADDING_OVERHEAD)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("merchant_private", &"<redacted>")
            .field("gateway_public_bits", &(self.gateway_public.size() * 8))
            .finish()
    }
}
