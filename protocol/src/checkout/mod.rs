//! # Checkout Protocol
//!
//! The merchant side of a Nagad checkout:
//!
//! ```text
//!   Merchant                                        Gateway
//!      │  Initialize: seal{merchantId, datetime,       │
//!      │              orderId, SHA1(orderId)}          │
//!      │──────────────────────────────────────────────▶│
//!      │      sealed{paymentReferenceId, challenge}    │
//!      │◀──────────────────────────────────────────────│
//!      │  Confirm: seal{merchantId, orderId, amount,   │
//!      │           "050", challenge}                   │
//!      │──────────────────────────────────────────────▶│
//!      │                 { callBackUrl }               │
//!      │◀──────────────────────────────────────────────│
//!      │                                               │
//!      │  Verify (any time later): paymentReferenceId  │
//!      │──────────────────────────────────────────────▶│
//!      │                 plaintext status              │
//!      │◀──────────────────────────────────────────────│
//! ```
//!
//! - [`types`]: what callers hand in and get back.
//! - [`wire`]: the JSON the gateway speaks.
//! - [`ip`]: loopback IP substitution for the client IP header.
//! - [`session`]: state types and payload builders.

pub mod ip;
pub mod session;
pub mod types;
pub mod wire;

pub use ip::{normalize_ip, Phase};
pub use session::{
    ConfirmedPayment, InitializedPayment, MerchantIdentity, PaymentFailure, PaymentState,
};
pub use types::{Challenge, ClientType, PaymentReferenceId, PaymentRequest, VerificationResult};
