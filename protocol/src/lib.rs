// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Nagad Protocol: Checkout Client Library
//!
//! A merchant-side implementation of the Nagad checkout protocol: the
//! two-phase, RSA-authenticated handshake a merchant backend performs to
//! obtain a payment redirect URL, plus the verification lookup used to
//! settle the outcome afterwards.
//!
//! The gateway is not a friendly counterparty. Every sensitive payload has
//! to be RSA-encrypted for the gateway *and* RSA-signed by the merchant,
//! the first phase must prove it knows the order ID, and the second phase
//! must echo back a challenge the gateway just invented. Get any of that
//! wrong and the gateway answers with a terse `reason` code.
//!
//! ## Architecture
//!
//! - **crypto**: RSA key loading, the encrypt/sign/decrypt envelope, hashing.
//! - **time**: Gateway timestamps (UTC+6, `YYYYMMDDHHmmss`).
//! - **transport**: HTTP plumbing and gateway error classification.
//! - **checkout**: Wire formats and the Initialize → Confirm state machine.
//! - **client**: [`NagadGateway`], the public entry point.
//! - **config**: Protocol constants and construction config.
//! - **error**: The [`NagadError`] taxonomy.
//!
//! ## Quick start
//!
//! ```no_run
//! use nagad_protocol::{ClientType, GatewayConfig, NagadGateway, PaymentRequest};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig {
//!     base_url: "http://sandbox.mynagad.com:10080/remote-payment-gateway-1.0".into(),
//!     merchant_id: "683002007104225".into(),
//!     merchant_number: "01711428036".into(),
//!     private_key: ".keys/merchant.pem".into(),
//!     public_key: ".keys/nagad.pem".into(),
//!     callback_url: "https://shop.example/nagad/callback".into(),
//!     api_version: "v-0.2.0".into(),
//!     is_path: true,
//!     timeout: nagad_protocol::config::DEFAULT_REQUEST_TIMEOUT,
//! };
//! let gateway = NagadGateway::new(config)?;
//!
//! let request = PaymentRequest::new("ORD123", "100", "203.0.113.7", ClientType::PcWeb)
//!     .with_product_detail("sku", "coffee-250g");
//! let redirect_url = gateway.create_payment(&request).await?;
//! println!("send the payer to {redirect_url}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Ground rules
//!
//! 1. No automatic retries. Ever. Confirm is not idempotent on the gateway.
//! 2. Sensitive envelopes, keys and signatures never reach the logs.
//! 3. Every failure after Initialize carries the payment reference ID, so
//!    the caller can reconcile through Verify.

pub mod checkout;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod time;
pub mod transport;

pub use checkout::{
    ClientType, ConfirmedPayment, InitializedPayment, PaymentFailure, PaymentReferenceId,
    PaymentRequest, PaymentState, VerificationResult,
};
pub use client::NagadGateway;
pub use config::GatewayConfig;
pub use error::NagadError;
