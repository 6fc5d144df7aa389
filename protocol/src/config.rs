//! # Protocol Configuration & Constants
//!
//! Every magic string the gateway insists on lives here: endpoint paths,
//! header names, the placeholder IPs, the currency code. If you're
//! hardcoding one of these somewhere else, move it here.
//!
//! The second half of the file is [`GatewayConfig`], the construction-time
//! configuration for [`NagadGateway`](crate::NagadGateway).

use std::fmt;
use std::time::Duration;

use crate::error::NagadError;

/// Version of this library, as published.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Initialize endpoint, relative to the base URL. Followed by
/// `/{merchantId}/{orderId}`.
pub const INITIALIZE_PATH: &str = "/api/dfs/check-out/initialize";

/// Confirm endpoint, relative to the base URL. Followed by
/// `/{paymentReferenceId}`.
pub const CONFIRM_PATH: &str = "/api/dfs/check-out/complete";

/// Verify endpoint, relative to the base URL. Followed by
/// `/{paymentReferenceId}`.
pub const VERIFY_PATH: &str = "/api/dfs/verify/payment";

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// API version header, sent on every request.
pub const HEADER_API_VERSION: &str = "X-KM-Api-Version";

/// Client IP header, sent on Initialize and Confirm.
pub const HEADER_CLIENT_IP: &str = "X-KM-IP-V4";

/// Client type header, sent on Initialize and Confirm.
pub const HEADER_CLIENT_TYPE: &str = "X-KM-Client-Type";

/// Both `content-type` and `Accept` carry this on every request.
pub const JSON_CONTENT_TYPE: &str = "application/json";

// ---------------------------------------------------------------------------
// Protocol Values
// ---------------------------------------------------------------------------

/// Placeholder sent instead of a loopback client IP during Initialize.
///
/// The gateway rejects loopback addresses outright. Initialize and Confirm
/// validate the IP independently and have historically been fed different
/// placeholders; the two values are kept distinct on purpose.
pub const INITIALIZE_PLACEHOLDER_IP: &str = "103.100.200.100";

/// Placeholder sent instead of a loopback client IP during Confirm.
pub const CONFIRM_PLACEHOLDER_IP: &str = "103.100.102.100";

/// Addresses the gateway refuses to accept in `X-KM-IP-V4`.
pub const LOOPBACK_ADDRESSES: [&str; 2] = ["::1", "127.0.0.1"];

/// ISO 4217 numeric code for BDT. The only currency the checkout accepts.
pub const CURRENCY_CODE_BDT: &str = "050";

/// Gateway timestamps are civil time in Asia/Dhaka, which is UTC+6 with no
/// daylight saving.
pub const GATEWAY_UTC_OFFSET_SECS: i32 = 6 * 3600;

/// `YYYYMMDDHHmmss`, as a chrono format string.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Length of a formatted gateway timestamp.
pub const TIMESTAMP_LENGTH: usize = 14;

/// PKCS#1 v1.5 encryption padding overhead in bytes. The largest plaintext
/// an RSA key can encrypt is `modulus_bytes - 11`.
pub const PKCS1_PADDING_OVERHEAD: usize = 11;

/// Verification status the gateway reports for a settled payment.
pub const STATUS_SUCCESS: &str = "Success";

/// Per-request deadline used when the caller doesn't configure one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Construction Config
// ---------------------------------------------------------------------------

/// Everything [`NagadGateway`](crate::NagadGateway) needs at construction.
///
/// `private_key` and `public_key` are either raw key text or filesystem
/// paths, selected by `is_path`. Raw text may be a full PEM document or just
/// the base64 body; see [`crate::crypto::keys::format_key`].
#[derive(Clone)]
pub struct GatewayConfig {
    /// Gateway base URL, e.g. `http://sandbox.mynagad.com/remote-payment-gateway`.
    /// Trailing slashes are stripped.
    pub base_url: String,
    /// Merchant ID issued by Nagad.
    pub merchant_id: String,
    /// Merchant account MSISDN.
    pub merchant_number: String,
    /// Merchant RSA private key (text or path).
    pub private_key: String,
    /// Nagad's RSA public key (text or path).
    pub public_key: String,
    /// Where the gateway sends the payer after checkout.
    pub callback_url: String,
    /// Value of the `X-KM-Api-Version` header.
    pub api_version: String,
    /// Whether `private_key` / `public_key` are filesystem paths.
    pub is_path: bool,
    /// Deadline for each individual HTTP round trip.
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Base URL without trailing slashes.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Reject configs that can't possibly work before touching keys or
    /// the network.
    pub fn validate(&self) -> Result<(), NagadError> {
        let required = [
            ("base_url", &self.base_url),
            ("merchant_id", &self.merchant_id),
            ("merchant_number", &self.merchant_number),
            ("private_key", &self.private_key),
            ("public_key", &self.public_key),
            ("callback_url", &self.callback_url),
            ("api_version", &self.api_version),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(NagadError::Config(format!("{name} must not be empty")));
            }
        }

        let base = self.normalized_base_url();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(NagadError::Config(format!(
                "base_url must be an http(s) URL, got {base:?}"
            )));
        }

        if self.timeout.is_zero() {
            return Err(NagadError::Config("timeout must be non-zero".to_string()));
        }

        Ok(())
    }
}

// Key text can end up in here verbatim, so Debug only says which mode.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_field = |value: &str| {
            if self.is_path {
                value.to_string()
            } else {
                "<redacted>".to_string()
            }
        };
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("merchant_id", &self.merchant_id)
            .field("merchant_number", &self.merchant_number)
            .field("private_key", &key_field(&self.private_key))
            .field("public_key", &key_field(&self.public_key))
            .field("callback_url", &self.callback_url)
            .field("api_version", &self.api_version)
            .field("is_path", &self.is_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}
