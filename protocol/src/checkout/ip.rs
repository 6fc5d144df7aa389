//! Client IP normalization for the `X-KM-IP-V4` header.
//!
//! The gateway rejects loopback addresses, which is exactly what a merchant
//! sees during local development. Loopback is swapped for a placeholder
//! public address. Initialize and Confirm validate the header independently
//! and each has its own placeholder; see
//! [`INITIALIZE_PLACEHOLDER_IP`] and [`CONFIRM_PLACEHOLDER_IP`].

use crate::config::{CONFIRM_PLACEHOLDER_IP, INITIALIZE_PLACEHOLDER_IP, LOOPBACK_ADDRESSES};

/// Which checkout endpoint the IP is going to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Initialize,
    Confirm,
}

impl Phase {
    pub fn placeholder_ip(self) -> &'static str {
        match self {
            Phase::Initialize => INITIALIZE_PLACEHOLDER_IP,
            Phase::Confirm => CONFIRM_PLACEHOLDER_IP,
        }
    }
}

/// Replace a loopback IP with the phase's placeholder; pass anything else
/// through untouched.
///
/// Only the two literal forms the gateway has been seen rejecting are
/// replaced. Other loopback spellings (`127.0.0.2`, `::ffff:127.0.0.1`)
/// pass through as-is.
pub fn normalize_ip(ip: &str, phase: Phase) -> String {
    if LOOPBACK_ADDRESSES.contains(&ip) {
        phase.placeholder_ip().to_string()
    } else {
        ip.to_string()
    }
}
