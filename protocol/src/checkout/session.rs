//! # Checkout State Machine
//!
//! ```text
//!   Created ──initialize──▶ Initialized ──confirm──▶ Confirmed
//!      │                         │
//!      └──────────┬──────────────┘
//!                 ▼
//!               Failed
//! ```
//!
//! The states are not a runtime enum that gets checked; they are types.
//! [`InitializedPayment`] can only be built from a decrypted Initialize
//! response, and Confirm takes it by value. Confirming twice, or confirming
//! something that was never initialized, doesn't compile.
//!
//! Everything in here is pure: payload construction and response parsing.
//! The network round trips live in [`crate::client`].

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use super::ip::{normalize_ip, Phase};
use super::types::{
    is_path_segment_safe, Challenge, ClientType, PaymentReferenceId, PaymentRequest,
};
use super::wire::{
    ConfirmRequestBody, ConfirmResponseBody, ConfirmSensitiveData, InitializeRequestBody,
    InitializeResponseBody, InitializeSensitiveData, InitializeSensitiveResponse,
};
use crate::config::{GatewayConfig, CURRENCY_CODE_BDT};
use crate::crypto::{challenge_hash, CryptoEnvelope, SealedEnvelope};
use crate::error::NagadError;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Where a payment is in the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaymentState {
    Created,
    Initialized,
    Confirmed,
    Failed,
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentState::Created => "created",
            PaymentState::Initialized => "initialized",
            PaymentState::Confirmed => "confirmed",
            PaymentState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Who the merchant is, as far as the gateway cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerchantIdentity {
    pub merchant_id: String,
    /// MSISDN, sent as `accountNumber`.
    pub merchant_number: String,
    pub callback_url: String,
}

impl From<&GatewayConfig> for MerchantIdentity {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            merchant_id: config.merchant_id.clone(),
            merchant_number: config.merchant_number.clone(),
            callback_url: config.callback_url.clone(),
        }
    }
}

/// A payment the gateway has accepted into its Initialize phase.
///
/// Holds the gateway's reference ID and challenge. Only
/// [`NagadGateway::initialize`](crate::NagadGateway::initialize) produces
/// one.
#[derive(Clone, Debug)]
pub struct InitializedPayment {
    order_id: String,
    amount: String,
    client_type: ClientType,
    product_details: BTreeMap<String, String>,
    ip: String,
    payment_reference_id: PaymentReferenceId,
    challenge: Challenge,
}

impl InitializedPayment {
    pub(crate) fn new(
        request: &PaymentRequest,
        ip: String,
        payment_reference_id: PaymentReferenceId,
        challenge: Challenge,
    ) -> Self {
        Self {
            order_id: request.order_id.clone(),
            amount: request.amount.clone(),
            client_type: request.client_type,
            product_details: request.product_details.clone(),
            ip,
            payment_reference_id,
            challenge,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    pub fn product_details(&self) -> &BTreeMap<String, String> {
        &self.product_details
    }

    /// The IP as sent on Initialize, after normalization.
    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn payment_reference_id(&self) -> &PaymentReferenceId {
        &self.payment_reference_id
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn state(&self) -> PaymentState {
        PaymentState::Initialized
    }

    /// IP for the Confirm `X-KM-IP-V4` header.
    pub fn confirm_ip(&self) -> String {
        normalize_ip(&self.ip, Phase::Confirm)
    }
}

/// A payment the gateway confirmed. Send the payer to `redirect_url`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmedPayment {
    pub order_id: String,
    pub payment_reference_id: PaymentReferenceId,
    pub redirect_url: String,
}

impl ConfirmedPayment {
    pub fn state(&self) -> PaymentState {
        PaymentState::Confirmed
    }
}

/// A payment that stopped partway.
///
/// `payment_reference_id` is set whenever Initialize got that far, so a
/// failed Confirm can still be reconciled through Verify. Nothing is
/// retried automatically.
#[derive(Debug, Error)]
#[error("payment for order {order_id} failed while {failed_during}: {error}")]
pub struct PaymentFailure {
    pub order_id: String,
    /// The state the payment was in when the failing step ran.
    pub failed_during: PaymentState,
    pub payment_reference_id: Option<PaymentReferenceId>,
    #[source]
    pub error: NagadError,
}

impl PaymentFailure {
    /// Failure before the gateway assigned a reference ID.
    pub fn before_initialize(order_id: impl Into<String>, error: NagadError) -> Self {
        Self {
            order_id: order_id.into(),
            failed_during: PaymentState::Created,
            payment_reference_id: None,
            error,
        }
    }

    /// Failure after Initialize succeeded.
    pub fn after_initialize(payment: &InitializedPayment, error: NagadError) -> Self {
        Self {
            order_id: payment.order_id.clone(),
            failed_during: PaymentState::Initialized,
            payment_reference_id: Some(payment.payment_reference_id.clone()),
            error,
        }
    }

    pub fn state(&self) -> PaymentState {
        PaymentState::Failed
    }
}

// ---------------------------------------------------------------------------
// Initialize payloads
// ---------------------------------------------------------------------------

/// The record that gets sealed on Initialize.
pub fn initialize_envelope(
    merchant: &MerchantIdentity,
    order_id: &str,
    datetime: &str,
) -> InitializeSensitiveData {
    InitializeSensitiveData {
        merchant_id: merchant.merchant_id.clone(),
        datetime: datetime.to_string(),
        order_id: order_id.to_string(),
        challenge: challenge_hash(order_id),
    }
}

/// Outer Initialize body. `datetime` must be the one sealed in the envelope.
pub fn initialize_body(
    merchant: &MerchantIdentity,
    datetime: &str,
    sealed: SealedEnvelope,
) -> InitializeRequestBody {
    InitializeRequestBody {
        account_number: merchant.merchant_number.clone(),
        date_time: datetime.to_string(),
        sensitive_data: sealed.sensitive_data,
        signature: sealed.signature,
    }
}

/// Decrypt the Initialize reply into the reference ID and challenge.
///
/// The gateway's signature on the reply is not checked; the gateway never
/// documented what it signs.
pub fn open_initialize_response(
    envelope: &CryptoEnvelope,
    body: Value,
) -> Result<(PaymentReferenceId, Challenge), NagadError> {
    let body: InitializeResponseBody = serde_json::from_value(body).map_err(|e| {
        NagadError::MalformedResponse(format!("unexpected Initialize response shape: {e}"))
    })?;

    let sensitive = body
        .sensitive_data
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            NagadError::MalformedResponse("Initialize response has no sensitiveData".to_string())
        })?;

    let opened: InitializeSensitiveResponse = envelope.decrypt(&sensitive)?;
    if opened.payment_reference_id.is_empty() || opened.challenge.is_empty() {
        return Err(NagadError::MalformedResponse(
            "Initialize response has an empty paymentReferenceId or challenge".to_string(),
        ));
    }
    if !is_path_segment_safe(&opened.payment_reference_id) {
        return Err(NagadError::MalformedResponse(format!(
            "Initialize response paymentReferenceId {:?} cannot be used as a URL path segment",
            opened.payment_reference_id
        )));
    }

    Ok((
        PaymentReferenceId::new(opened.payment_reference_id),
        Challenge::new(opened.challenge),
    ))
}

// ---------------------------------------------------------------------------
// Confirm payloads
// ---------------------------------------------------------------------------

/// The record that gets sealed on Confirm.
pub fn confirm_envelope(
    merchant: &MerchantIdentity,
    payment: &InitializedPayment,
) -> ConfirmSensitiveData {
    ConfirmSensitiveData {
        merchant_id: merchant.merchant_id.clone(),
        order_id: payment.order_id.clone(),
        amount: payment.amount.clone(),
        currency_code: CURRENCY_CODE_BDT.to_string(),
        challenge: payment.challenge.as_str().to_string(),
    }
}

/// Outer Confirm body. Product details go through unmodified.
pub fn confirm_body(
    merchant: &MerchantIdentity,
    payment: &InitializedPayment,
    sealed: SealedEnvelope,
) -> ConfirmRequestBody {
    ConfirmRequestBody {
        payment_ref_id: payment.payment_reference_id.as_str().to_string(),
        sensitive_data: sealed.sensitive_data,
        signature: sealed.signature,
        merchant_callback_url: merchant.callback_url.clone(),
        additional_merchant_info: payment.product_details.clone(),
    }
}

/// Pull the payer redirect URL out of the Confirm reply.
pub fn redirect_url(body: Value) -> Result<String, NagadError> {
    let body: ConfirmResponseBody = serde_json::from_value(body).map_err(|e| {
        NagadError::MalformedResponse(format!("unexpected Confirm response shape: {e}"))
    })?;

    body.call_back_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            NagadError::MalformedResponse("Confirm response has no callBackUrl".to_string())
        })
}
