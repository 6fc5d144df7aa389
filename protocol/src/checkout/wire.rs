//! # Wire Formats
//!
//! Exact JSON shapes the gateway expects and returns. Field order in the
//! sensitive envelopes matters: it is the serialization order, and the
//! signature covers those exact bytes. Reorder a field and every signature
//! the gateway checks afterwards will fail.
//!
//! ```text
//! Initialize  POST /api/dfs/check-out/initialize/{merchantId}/{orderId}
//!   sensitive: { merchantId, datetime, orderId, challenge }
//!   body:      { accountNumber, dateTime, sensitiveData, signature }
//!   reply:     { sensitiveData, signature } → { paymentReferenceId, challenge }
//!
//! Confirm     POST /api/dfs/check-out/complete/{paymentReferenceId}
//!   sensitive: { merchantId, orderId, amount, currencyCode, challenge }
//!   body:      { paymentRefId, sensitiveData, signature,
//!                merchantCallbackURL, additionalMerchantInfo }
//!   reply:     { callBackUrl, status, ... }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Initialize
// ---------------------------------------------------------------------------

/// Encrypted and signed on Initialize. Note `datetime`, all lower case,
/// unlike the outer body's `dateTime`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeSensitiveData {
    #[serde(rename = "merchantId")]
    pub merchant_id: String,
    pub datetime: String,
    #[serde(rename = "orderId")]
    pub order_id: String,
    /// SHA-1 of the order ID, upper-case hex.
    pub challenge: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequestBody {
    /// Merchant MSISDN.
    pub account_number: String,
    /// Same timestamp as the sensitive envelope's `datetime`.
    pub date_time: String,
    pub sensitive_data: String,
    pub signature: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponseBody {
    #[serde(default)]
    pub sensitive_data: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// What the gateway encrypts for us in the Initialize reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeSensitiveResponse {
    pub payment_reference_id: String,
    pub challenge: String,
}

// ---------------------------------------------------------------------------
// Confirm
// ---------------------------------------------------------------------------

/// Encrypted and signed on Confirm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSensitiveData {
    pub merchant_id: String,
    pub order_id: String,
    pub amount: String,
    /// Always `"050"`.
    pub currency_code: String,
    /// The gateway-issued challenge from Initialize. Not our hash.
    pub challenge: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRequestBody {
    #[serde(rename = "paymentRefId")]
    pub payment_ref_id: String,
    #[serde(rename = "sensitiveData")]
    pub sensitive_data: String,
    pub signature: String,
    #[serde(rename = "merchantCallbackURL")]
    pub merchant_callback_url: String,
    #[serde(rename = "additionalMerchantInfo")]
    pub additional_merchant_info: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponseBody {
    #[serde(default)]
    pub call_back_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
