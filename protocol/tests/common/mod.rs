//! Shared fixtures for the integration tests: RSA key pairs, a ready-made
//! config, and an in-memory gateway that speaks the checkout protocol.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};

use nagad_protocol::config::DEFAULT_REQUEST_TIMEOUT;
use nagad_protocol::crypto::{challenge_hash, decrypt, encrypt, sign, verify};
use nagad_protocol::time::FixedClock;
use nagad_protocol::transport::{GatewayRequest, HttpTransport, Method};
use nagad_protocol::{GatewayConfig, NagadError};

pub const MERCHANT_ID: &str = "683002007104225";
pub const MERCHANT_NUMBER: &str = "01711428036";
pub const CALLBACK_URL: &str = "https://shop.example/nagad/callback";
pub const API_VERSION: &str = "v-0.2.0";
pub const BASE_URL: &str = "http://gateway.test/remote-payment-gateway-1.0";
pub const REDIRECT_BASE: &str = "https://sandbox.gateway.test/check-out";

// ---------------------------------------------------------------------------
// Key Fixtures
// ---------------------------------------------------------------------------

pub struct Keys {
    pub private: RsaPrivateKey,
    pub public: RsaPublicKey,
    pub private_pem: String,
    pub public_pem: String,
}

fn generate() -> Keys {
    let private = RsaPrivateKey::new(&mut OsRng, 2048).expect("rsa keygen");
    let public = RsaPublicKey::from(&private);
    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .expect("encode private key")
        .to_string();
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .expect("encode public key");
    Keys {
        private,
        public,
        private_pem,
        public_pem,
    }
}

/// The merchant's key pair. Generated once per test binary.
pub fn merchant_keys() -> &'static Keys {
    static KEYS: OnceLock<Keys> = OnceLock::new();
    KEYS.get_or_init(generate)
}

/// The gateway's key pair. Generated once per test binary.
pub fn gateway_keys() -> &'static Keys {
    static KEYS: OnceLock<Keys> = OnceLock::new();
    KEYS.get_or_init(generate)
}

/// A config pointing at [`BASE_URL`] with raw PEM keys.
pub fn config() -> GatewayConfig {
    GatewayConfig {
        base_url: format!("{BASE_URL}/"),
        merchant_id: MERCHANT_ID.to_string(),
        merchant_number: MERCHANT_NUMBER.to_string(),
        private_key: merchant_keys().private_pem.clone(),
        public_key: gateway_keys().public_pem.clone(),
        callback_url: CALLBACK_URL.to_string(),
        api_version: API_VERSION.to_string(),
        is_path: false,
        timeout: DEFAULT_REQUEST_TIMEOUT,
    }
}

/// 2026-10-15 12:00:00 in Dhaka.
pub fn fixed_clock() -> FixedClock {
    let instant = Utc
        .with_ymd_and_hms(2026, 10, 15, 6, 0, 0)
        .single()
        .expect("valid instant");
    FixedClock::at(&instant)
}

// ---------------------------------------------------------------------------
// Simulated Gateway
// ---------------------------------------------------------------------------

/// A payment as the simulated gateway tracks it.
#[derive(Clone, Debug)]
pub struct GatewayPayment {
    pub order_id: String,
    pub challenge: String,
    pub amount: Option<String>,
    pub confirmed: bool,
    pub additional_merchant_info: Option<Value>,
}

#[derive(Default)]
struct Ledger {
    requests: Vec<GatewayRequest>,
    payments: HashMap<String, GatewayPayment>,
    issued: u64,
    confirm_rejection: Option<(String, String)>,
}

/// In-memory gateway.
///
/// Decrypts every sealed envelope with the gateway key, checks the
/// merchant's signature over the decrypted bytes, and answers the way the
/// real gateway does: encrypted `{paymentReferenceId, challenge}` on
/// Initialize, `callBackUrl` on Confirm, plaintext status on Verify, and
/// `{reason, message}` bodies for rejections.
#[derive(Default)]
pub struct SimulatedGateway {
    ledger: Mutex<Ledger>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent Confirm fail with this reason.
    pub fn reject_confirm_with(&self, reason: &str, message: &str) {
        self.ledger.lock().confirm_rejection = Some((reason.to_string(), message.to_string()));
    }

    /// Everything the client has sent so far.
    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.ledger.lock().requests.clone()
    }

    pub fn payment(&self, reference: &str) -> Option<GatewayPayment> {
        self.ledger.lock().payments.get(reference).cloned()
    }

    pub fn payment_count(&self) -> usize {
        self.ledger.lock().payments.len()
    }

    /// Decrypt and signature-check a sealed body.
    pub fn open(body: &Value) -> Result<Value, Value> {
        let sensitive = body["sensitiveData"].as_str().unwrap_or_default();
        let signature = body["signature"].as_str().unwrap_or_default();

        let plaintext = decrypt(&gateway_keys().private, sensitive)
            .map_err(|_| rejection("DECRYPTION_FAILED", "Could not decrypt sensitive data"))?;
        verify(&merchant_keys().public, &plaintext, signature)
            .map_err(|_| rejection("INVALID_SIGNATURE", "Signature verification failed"))?;
        serde_json::from_slice(&plaintext)
            .map_err(|_| rejection("INVALID_PAYLOAD", "Sensitive data is not JSON"))
    }

    fn initialize(&self, order_id: &str, body: &Value) -> Value {
        let record = match Self::open(body) {
            Ok(record) => record,
            Err(reply) => return reply,
        };

        if record["orderId"] != order_id || record["merchantId"] != MERCHANT_ID {
            return rejection("ORDER_MISMATCH", "Path and sensitive data disagree");
        }
        if record["challenge"] != challenge_hash(order_id).as_str() {
            return rejection("INVALID_CHALLENGE", "Challenge is not the order hash");
        }
        if record["datetime"] != body["dateTime"] {
            return rejection("DATETIME_MISMATCH", "Timestamps disagree");
        }

        let mut ledger = self.ledger.lock();
        if ledger.payments.values().any(|p| p.order_id == order_id) {
            return json!({
                "devMessage": "Duplicate order id",
                "reason": "DUPLICATE_ORDER"
            });
        }

        ledger.issued += 1;
        let reference = format!("MDYy{:010}", ledger.issued);
        let challenge = format!("GWCH{:08X}", ledger.issued * 7919);
        ledger.payments.insert(
            reference.clone(),
            GatewayPayment {
                order_id: order_id.to_string(),
                challenge: challenge.clone(),
                amount: None,
                confirmed: false,
                additional_merchant_info: None,
            },
        );
        drop(ledger);

        let reply = serde_json::to_vec(&json!({
            "paymentReferenceId": reference,
            "challenge": challenge,
            "acceptDateTime": "20261015120001"
        }))
        .expect("serialize reply");
        json!({
            "sensitiveData": encrypt(&merchant_keys().public, &reply).expect("encrypt reply"),
            "signature": sign(&gateway_keys().private, &reply).expect("sign reply"),
        })
    }

    fn confirm(&self, reference: &str, body: &Value) -> Value {
        let record = match Self::open(body) {
            Ok(record) => record,
            Err(reply) => return reply,
        };

        let mut ledger = self.ledger.lock();
        if let Some((reason, message)) = ledger.confirm_rejection.clone() {
            return rejection(&reason, &message);
        }
        let Some(payment) = ledger.payments.get_mut(reference) else {
            return rejection("INVALID_REFERENCE", "Unknown payment reference");
        };
        if body["paymentRefId"] != reference {
            return rejection("INVALID_REFERENCE", "Body and path disagree");
        }
        if record["challenge"] != payment.challenge.as_str() {
            return rejection("INVALID_CHALLENGE", "Challenge mismatch");
        }
        if record["orderId"] != payment.order_id.as_str() || record["currencyCode"] != "050" {
            return rejection("INVALID_PAYLOAD", "Order or currency mismatch");
        }
        if payment.confirmed {
            return rejection("ALREADY_CONFIRMED", "Payment already confirmed");
        }

        payment.confirmed = true;
        payment.amount = record["amount"].as_str().map(str::to_string);
        payment.additional_merchant_info = Some(body["additionalMerchantInfo"].clone());

        json!({
            "callBackUrl": format!("{REDIRECT_BASE}/{reference}"),
            "status": "Success",
            "devMessage": null
        })
    }

    fn verify(&self, reference: &str) -> Value {
        let ledger = self.ledger.lock();
        let Some(payment) = ledger.payments.get(reference) else {
            return rejection("INVALID_REFERENCE", "Unknown payment reference");
        };
        let (status, status_code) = if payment.confirmed {
            ("Success", "000")
        } else {
            ("Initiated", "001")
        };
        json!({
            "merchantId": MERCHANT_ID,
            "orderId": payment.order_id,
            "paymentRefId": reference,
            "amount": payment.amount,
            "clientMobileNo": null,
            "merchantMobileNo": MERCHANT_NUMBER,
            "orderDateTime": "2026-10-15 12:00:00.0",
            "issuerPaymentDateTime": null,
            "issuerPaymentRefNo": null,
            "additionalMerchantInfo": payment.additional_merchant_info,
            "status": status,
            "statusCode": status_code,
            "cancelIssuerDateTime": null
        })
    }
}

fn rejection(reason: &str, message: &str) -> Value {
    json!({ "reason": reason, "message": message })
}

/// Last path segments of `url` after `marker`.
fn after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    url.split_once(marker).map(|(_, rest)| rest)
}

#[async_trait]
impl HttpTransport for SimulatedGateway {
    async fn send(&self, request: GatewayRequest) -> Result<Value, NagadError> {
        self.ledger.lock().requests.push(request.clone());

        let body = request.body.clone().unwrap_or(Value::Null);
        let reply = match request.method {
            Method::Post => {
                if let Some(rest) = after(&request.url, "/api/dfs/check-out/initialize/") {
                    match rest.split_once('/') {
                        Some((merchant, order_id)) if merchant == MERCHANT_ID => {
                            self.initialize(order_id, &body)
                        }
                        _ => rejection("INVALID_MERCHANT", "Unknown merchant"),
                    }
                } else if let Some(reference) = after(&request.url, "/api/dfs/check-out/complete/") {
                    self.confirm(reference, &body)
                } else {
                    return Err(NagadError::Transport(format!("404 from {}", request.url)));
                }
            }
            Method::Get => match after(&request.url, "/api/dfs/verify/payment/") {
                Some(reference) => self.verify(reference),
                None => return Err(NagadError::Transport(format!("404 from {}", request.url))),
            },
        };
        Ok(reply)
    }
}
