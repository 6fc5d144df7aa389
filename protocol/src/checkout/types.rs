//! Caller-facing checkout types: what a merchant hands in, and what the
//! gateway hands back from Verify.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::STATUS_SUCCESS;
use crate::error::NagadError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Gateway-assigned transaction identifier.
///
/// Returned by Initialize, required by Confirm and Verify. It is the join
/// key across the whole protocol, and the thing to keep when something goes
/// wrong halfway.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReferenceId(String);

impl PaymentReferenceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PaymentReferenceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Gateway-issued single-use token binding Initialize to Confirm.
///
/// Opaque. Carried byte-for-byte from the Initialize response into the
/// Confirm envelope. Never constructed by the merchant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Challenge(String);

impl Challenge {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// The challenge lives inside the encrypted envelope; keep it out of logs.
impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Challenge(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Client Type
// ---------------------------------------------------------------------------

/// Where the payer is checking out from. Sent as `X-KM-Client-Type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    PcWeb,
    MobileWeb,
    MobileApp,
    WalletWebView,
    BillKey,
}

impl ClientType {
    pub const ALL: [ClientType; 5] = [
        ClientType::PcWeb,
        ClientType::MobileWeb,
        ClientType::MobileApp,
        ClientType::WalletWebView,
        ClientType::BillKey,
    ];

    /// The wire value, e.g. `PC_WEB`.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientType::PcWeb => "PC_WEB",
            ClientType::MobileWeb => "MOBILE_WEB",
            ClientType::MobileApp => "MOBILE_APP",
            ClientType::WalletWebView => "WALLET_WEB_VIEW",
            ClientType::BillKey => "BILL_KEY",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientType {
    type Err = NagadError;

    /// Accepts the wire value in any case, with `-` or `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        ClientType::ALL
            .into_iter()
            .find(|ct| ct.as_str() == wanted)
            .ok_or_else(|| NagadError::InvalidRequest(format!("unknown client type {s:?}")))
    }
}

// ---------------------------------------------------------------------------
// Payment Request
// ---------------------------------------------------------------------------

/// One payment to create. Built per call, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Merchant-unique order ID. Ends up as a URL path segment.
    pub order_id: String,
    /// Amount in BDT as a decimal string, e.g. `"100"` or `"99.50"`.
    pub amount: String,
    /// Payer's IP address as seen by the merchant.
    pub ip: String,
    pub client_type: ClientType,
    /// Free-form key/value pairs forwarded verbatim as
    /// `additionalMerchantInfo` on Confirm.
    #[serde(default)]
    pub product_details: BTreeMap<String, String>,
}

impl PaymentRequest {
    pub fn new(
        order_id: impl Into<String>,
        amount: impl Into<String>,
        ip: impl Into<String>,
        client_type: ClientType,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            amount: amount.into(),
            ip: ip.into(),
            client_type,
            product_details: BTreeMap::new(),
        }
    }

    pub fn with_product_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.product_details.insert(key.into(), value.into());
        self
    }

    pub fn with_product_details(mut self, details: BTreeMap<String, String>) -> Self {
        self.product_details = details;
        self
    }

    /// Reject requests the gateway would reject anyway, before spending a
    /// round trip (and an order ID) on them.
    pub fn validate(&self) -> Result<(), NagadError> {
        if self.order_id.is_empty() {
            return Err(NagadError::InvalidRequest("order ID must not be empty".to_string()));
        }
        if !is_path_segment_safe(&self.order_id) {
            return Err(NagadError::InvalidRequest(format!(
                "order ID {:?} cannot be used as a URL path segment",
                self.order_id
            )));
        }
        if !is_positive_decimal(&self.amount) {
            return Err(NagadError::InvalidRequest(format!(
                "amount {:?} is not a positive decimal",
                self.amount
            )));
        }
        if self.ip.trim().is_empty() {
            return Err(NagadError::InvalidRequest("client IP must not be empty".to_string()));
        }
        Ok(())
    }
}

/// True when `value` can be appended to a URL path as-is: no separators,
/// no query or fragment markers, no escapes and no whitespace.
pub(crate) fn is_path_segment_safe(value: &str) -> bool {
    !value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%'))
}

/// `digits[.digits]`, not all zeros.
fn is_positive_decimal(amount: &str) -> bool {
    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (amount, None),
    };

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || fraction.is_some_and(|f| !digits(f)) {
        return false;
    }

    amount.bytes().any(|b| matches!(b, b'1'..=b'9'))
}

// ---------------------------------------------------------------------------
// Verification Result
// ---------------------------------------------------------------------------

/// Settlement status of a payment, as reported by the Verify endpoint.
///
/// Returned as the gateway sent it: plaintext, no decryption. Fields the
/// gateway adds beyond the documented set are kept in `extra`.
///
/// The gateway is loose about scalar types (`amount` may be `100.0`,
/// `statusCode` may be `0`), so text fields also accept bare numbers and
/// booleans and keep their JSON rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    #[serde(default, deserialize_with = "lenient_text")]
    pub merchant_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub payment_ref_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub client_mobile_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub merchant_mobile_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub order_date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub issuer_payment_date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub issuer_payment_ref_no: Option<String>,
    /// Whatever `additionalMerchantInfo` was on Confirm. The gateway echoes
    /// it back as a string or an object depending on the day.
    #[serde(default)]
    pub additional_merchant_info: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerificationResult {
    /// True when the gateway reports the payment as settled.
    pub fn is_successful(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
