//! # The RSA Envelope
//!
//! Every sensitive record the merchant sends is handled twice:
//!
//! - **encrypted** with the gateway's RSA public key (PKCS#1 v1.5 padding),
//!   so only the gateway can read it;
//! - **signed** with the merchant's RSA private key (RSASSA-PKCS1-v1_5 over
//!   SHA-256), so the gateway knows it came from us.
//!
//! Both results travel base64-encoded, as `sensitiveData` and `signature`.
//! Inbound sensitive data goes the other way: base64 → RSA decrypt with the
//! merchant private key → JSON.
//!
//! ## The one rule
//!
//! The signature must cover *exactly* the bytes that were encrypted. The
//! gateway decrypts, then verifies the signature over what it decrypted; if
//! the two serializations differ by a single space, the signature fails and
//! the gateway answers with an unhelpful `reason` code. [`CryptoEnvelope::seal`]
//! serializes once with [`canonical_json`] and feeds that one buffer to both
//! primitives, so there is no second serialization to drift.
//!
//! ## Size limit
//!
//! PKCS#1 v1.5 encrypts a single block: at most `modulus_bytes - 11` bytes of
//! plaintext (245 bytes for a 2048-bit key). Sensitive records are a handful
//! of short fields and fit comfortably. Anything bigger fails with
//! [`NagadError::Encryption`] rather than being silently chunked.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::keys::KeyPair;
use crate::config::PKCS1_PADDING_OVERHEAD;
use crate::error::NagadError;

/// Serialize a record to the bytes that get both encrypted and signed.
///
/// Compact JSON, fields in struct declaration order. Each envelope type in
/// [`crate::checkout::wire`] declares its fields in the order the gateway
/// expects, so this is the one and only serialization for that type.
pub fn canonical_json<T: Serialize>(record: &T) -> Result<Vec<u8>, NagadError> {
    serde_json::to_vec(record).map_err(|e| NagadError::Serialization(e.to_string()))
}

/// RSA-encrypt `plaintext` for `public_key` and base64 the ciphertext.
///
/// # Errors
///
/// [`NagadError::Encryption`] if the plaintext exceeds the single-block
/// limit of the key, or the RSA primitive fails.
pub fn encrypt(public_key: &RsaPublicKey, plaintext: &[u8]) -> Result<String, NagadError> {
    let limit = public_key.size().saturating_sub(PKCS1_PADDING_OVERHEAD);
    if plaintext.len() > limit {
        return Err(NagadError::Encryption(format!(
            "plaintext is {} bytes, the {}-bit key can encrypt at most {limit}",
            plaintext.len(),
            public_key.size() * 8
        )));
    }

    let ciphertext = public_key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
        .map_err(|e| NagadError::Encryption(e.to_string()))?;
    Ok(STANDARD.encode(ciphertext))
}

/// Base64-decode and RSA-decrypt `data` with `private_key`.
///
/// Deliberately vague on failure: bad base64, bad padding and the wrong key
/// all come back as [`NagadError::Decryption`].
pub fn decrypt(private_key: &RsaPrivateKey, data: &str) -> Result<Vec<u8>, NagadError> {
    let ciphertext = STANDARD
        .decode(data.trim())
        .map_err(|e| NagadError::Decryption(format!("sensitive data is not valid base64: {e}")))?;

    private_key
        .decrypt(Pkcs1v15Encrypt, &ciphertext)
        .map_err(|_| {
            NagadError::Decryption("wrong key or corrupted ciphertext".to_string())
        })
}

/// RSASSA-PKCS1-v1_5 / SHA-256 signature over `message`, base64-encoded.
pub fn sign(private_key: &RsaPrivateKey, message: &[u8]) -> Result<String, NagadError> {
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    let signature = signing_key
        .try_sign(message)
        .map_err(|e| NagadError::Encryption(format!("signing failed: {e}")))?;
    Ok(STANDARD.encode(signature.to_bytes()))
}

/// Check a base64 RSASSA-PKCS1-v1_5 / SHA-256 signature over `message`.
///
/// This is the gateway's half of the contract. The client never needs it
/// on the happy path, but anything simulating the gateway does.
pub fn verify(
    public_key: &RsaPublicKey,
    message: &[u8],
    signature_b64: &str,
) -> Result<(), NagadError> {
    let raw = STANDARD
        .decode(signature_b64.trim())
        .map_err(|e| NagadError::Decryption(format!("signature is not valid base64: {e}")))?;
    let signature = Signature::try_from(raw.as_slice())
        .map_err(|_| NagadError::Decryption("malformed signature".to_string()))?;

    VerifyingKey::<Sha256>::new(public_key.clone())
        .verify(message, &signature)
        .map_err(|_| NagadError::Decryption("signature verification failed".to_string()))
}

/// The `sensitiveData` / `signature` pair that goes on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedEnvelope {
    /// Base64 RSA ciphertext of the canonical JSON.
    pub sensitive_data: String,
    /// Base64 RSA-SHA256 signature over the same canonical JSON.
    pub signature: String,
}

/// Record-level encrypt / sign / decrypt bound to one merchant key pair.
///
/// Cheap to clone: the keys sit behind an `Arc` and are never mutated.
#[derive(Clone, Debug)]
pub struct CryptoEnvelope {
    keys: Arc<KeyPair>,
}

impl CryptoEnvelope {
    pub fn new(keys: KeyPair) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }

    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    /// Encrypt and sign `record` from a single serialization.
    pub fn seal<T: Serialize>(&self, record: &T) -> Result<SealedEnvelope, NagadError> {
        let plaintext = canonical_json(record)?;
        Ok(SealedEnvelope {
            sensitive_data: encrypt(self.keys.gateway_public(), &plaintext)?,
            signature: sign(self.keys.merchant_private(), &plaintext)?,
        })
    }

    /// Encrypt `record` for the gateway.
    pub fn encrypt<T: Serialize>(&self, record: &T) -> Result<String, NagadError> {
        encrypt(self.keys.gateway_public(), &canonical_json(record)?)
    }

    /// Sign `record` with the merchant key.
    pub fn sign<T: Serialize>(&self, record: &T) -> Result<String, NagadError> {
        sign(self.keys.merchant_private(), &canonical_json(record)?)
    }

    /// Decrypt gateway-issued sensitive data and parse it as `T`.
    ///
    /// # Errors
    ///
    /// [`NagadError::Decryption`] if the ciphertext can't be decrypted,
    /// [`NagadError::MalformedResponse`] if the plaintext isn't the JSON
    /// shape we expect.
    pub fn decrypt<T: DeserializeOwned>(&self, data: &str) -> Result<T, NagadError> {
        let plaintext = decrypt(self.keys.merchant_private(), data)?;
        serde_json::from_slice(&plaintext).map_err(|e| {
            NagadError::MalformedResponse(format!(
                "decrypted sensitive data is not the expected JSON: {e}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::crypto::test_support::{gateway_keys, merchant_envelope, merchant_keys};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Record {
        merchant_id: String,
        order_id: String,
        challenge: String,
    }

    fn record() -> Record {
        Record {
            merchant_id: "683002007104225".to_string(),
            order_id: "ORD123".to_string(),
            challenge: "A9993E364706816ABA3E25717850C26C9CD0D89D".to_string(),
        }
    }

    #[test]
    fn canonical_json_keeps_declaration_order() {
        let bytes = canonical_json(&record()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            r#"{"merchantId":"683002007104225","orderId":"ORD123","challenge":"A9993E364706816ABA3E25717850C26C9CD0D89D"}"#
        );
    }

    #[test]
    fn gateway_can_read_what_we_encrypt() {
        let envelope = merchant_envelope();
        let ciphertext = envelope.encrypt(&record()).unwrap();

        let plaintext = decrypt(&gateway_keys().private, &ciphertext).unwrap();
        let recovered: Record = serde_json::from_slice(&plaintext).unwrap();
        assert_eq!(recovered, record());
    }

    #[test]
    fn we_can_read_what_the_gateway_encrypts() {
        let reply = json!({ "paymentReferenceId": "MDYyMzE1", "challenge": "8D4C2A" });
        let ciphertext = encrypt(
            &merchant_keys().public,
            &serde_json::to_vec(&reply).unwrap(),
        )
        .unwrap();

        let recovered: serde_json::Value = merchant_envelope().decrypt(&ciphertext).unwrap();
        assert_eq!(recovered, reply);
    }

    #[test]
    fn signature_verifies_with_merchant_public_key() {
        let envelope = merchant_envelope();
        let signature = envelope.sign(&record()).unwrap();
        let message = canonical_json(&record()).unwrap();
        assert!(verify(&merchant_keys().public, &message, &signature).is_ok());
    }

    #[test]
    fn signature_does_not_verify_with_other_key() {
        let envelope = merchant_envelope();
        let signature = envelope.sign(&record()).unwrap();
        let message = canonical_json(&record()).unwrap();
        assert!(verify(&gateway_keys().public, &message, &signature).is_err());
    }

    #[test]
    fn sealed_signature_covers_the_encrypted_bytes() {
        let sealed = merchant_envelope().seal(&record()).unwrap();

        let plaintext = decrypt(&gateway_keys().private, &sealed.sensitive_data).unwrap();
        assert!(verify(&merchant_keys().public, &plaintext, &sealed.signature).is_ok());
    }

    #[test]
    fn encryption_is_randomized() {
        // PKCS#1 v1.5 padding is random, so the same record encrypts
        // differently every time. The signature does not.
        let envelope = merchant_envelope();
        let a = envelope.seal(&record()).unwrap();
        let b = envelope.seal(&record()).unwrap();
        assert_ne!(a.sensitive_data, b.sensitive_data);
        assert_eq!(a.signature, b.signature);
    }

    #[test]
    fn oversized_plaintext_is_rejected() {
        let envelope = merchant_envelope();
        let limit = envelope.keys().max_plaintext_len();
        let too_big = vec![b'x'; limit + 1];
        let err = encrypt(envelope.keys().gateway_public(), &too_big).unwrap_err();
        assert!(matches!(err, NagadError::Encryption(_)));

        let just_fits = vec![b'x'; limit];
        assert!(encrypt(envelope.keys().gateway_public(), &just_fits).is_ok());
    }

    #[test]
    fn bad_base64_is_decryption_error() {
        let err = merchant_envelope()
            .decrypt::<serde_json::Value>("%%% not base64 %%%")
            .unwrap_err();
        assert!(matches!(err, NagadError::Decryption(_)));
    }

    #[test]
    fn wrong_key_is_decryption_error() {
        // Encrypted for the gateway, not for us.
        let ciphertext = merchant_envelope().encrypt(&record()).unwrap();
        let err = merchant_envelope()
            .decrypt::<serde_json::Value>(&ciphertext)
            .unwrap_err();
        // PKCS#1 v1.5 has no integrity check, so once in a blue moon the
        // wrong key yields well-formed padding around garbage.
        assert!(matches!(
            err,
            NagadError::Decryption(_) | NagadError::MalformedResponse(_)
        ));
    }

    #[test]
    fn non_json_plaintext_is_malformed_response() {
        let ciphertext = encrypt(&merchant_keys().public, b"<html>oops</html>").unwrap();
        let err = merchant_envelope()
            .decrypt::<serde_json::Value>(&ciphertext)
            .unwrap_err();
        assert!(matches!(err, NagadError::MalformedResponse(_)));
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let message = canonical_json(&record()).unwrap();
        assert!(verify(&merchant_keys().public, &message, "AAAA").is_err());
    }
}
