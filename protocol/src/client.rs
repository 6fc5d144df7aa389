//! # Gateway Client
//!
//! [`NagadGateway`] ties the pieces together: keys are loaded and parsed
//! once at construction, then every call is a short sequence of
//! seal → POST → classify → open.
//!
//! The client holds no per-payment state. Everything a checkout needs
//! travels in the values passed between [`NagadGateway::initialize`] and
//! [`NagadGateway::confirm`], so one client can drive any number of
//! concurrent checkouts.

use std::sync::Arc;

use tracing::{info, warn};

use crate::checkout::session::{
    confirm_body, confirm_envelope, initialize_body, initialize_envelope,
    open_initialize_response, redirect_url,
};
use crate::checkout::types::is_path_segment_safe;
use crate::checkout::{
    normalize_ip, ConfirmedPayment, InitializedPayment, MerchantIdentity, PaymentFailure,
    PaymentRequest, Phase, VerificationResult,
};
use crate::config::{GatewayConfig, CONFIRM_PATH, INITIALIZE_PATH, VERIFY_PATH};
use crate::crypto::{CryptoEnvelope, KeyPair};
use crate::error::NagadError;
use crate::time::{DhakaClock, TimestampProvider};
use crate::transport::{HttpTransport, ReqwestTransport, RequestHeaders, TransportClient};

/// Merchant-side client for the Nagad checkout gateway.
///
/// Generic over the wire so tests can run the full protocol against an
/// in-memory gateway; production code uses the default
/// [`ReqwestTransport`] via [`NagadGateway::new`].
pub struct NagadGateway<T = ReqwestTransport> {
    base_url: String,
    api_version: String,
    merchant: MerchantIdentity,
    envelope: CryptoEnvelope,
    transport: TransportClient<T>,
    clock: Arc<dyn TimestampProvider>,
}

impl NagadGateway<ReqwestTransport> {
    /// Build a client that talks HTTP(S) to `config.base_url`.
    ///
    /// # Errors
    ///
    /// [`NagadError::Config`] for an unusable config,
    /// [`NagadError::KeyFormat`] if either key can't be read or parsed.
    pub fn new(config: GatewayConfig) -> Result<Self, NagadError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, transport)
    }
}

impl<T: HttpTransport> NagadGateway<T> {
    /// Build a client on top of a caller-supplied transport.
    pub fn with_transport(config: GatewayConfig, transport: T) -> Result<Self, NagadError> {
        config.validate()?;
        let keys = KeyPair::load(&config.private_key, &config.public_key, config.is_path)?;

        info!(
            merchant_id = %config.merchant_id,
            base_url = %config.normalized_base_url(),
            api_version = %config.api_version,
            "nagad gateway client ready"
        );

        Ok(Self {
            base_url: config.normalized_base_url().to_string(),
            api_version: config.api_version.clone(),
            merchant: MerchantIdentity::from(&config),
            envelope: CryptoEnvelope::new(keys),
            transport: TransportClient::new(transport),
            clock: Arc::new(DhakaClock),
        })
    }

    /// Replace the wall clock used for Initialize timestamps.
    pub fn with_clock(mut self, clock: impl TimestampProvider + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn merchant(&self) -> &MerchantIdentity {
        &self.merchant
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        self.transport.inner()
    }

    // -----------------------------------------------------------------------
    // Checkout
    // -----------------------------------------------------------------------

    /// Run Initialize then Confirm and return the URL to send the payer to.
    ///
    /// Not retried on failure. If the error carries a payment reference ID,
    /// the gateway knows about the payment; use
    /// [`verify_payment`](Self::verify_payment) before trying again with a
    /// new order ID.
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<String, PaymentFailure> {
        let initialized = self.initialize(request).await?;
        let confirmed = self.confirm(initialized).await?;
        Ok(confirmed.redirect_url)
    }

    /// Phase one: register the order with the gateway and receive its
    /// reference ID and challenge.
    pub async fn initialize(
        &self,
        request: &PaymentRequest,
    ) -> Result<InitializedPayment, PaymentFailure> {
        info!(order_id = %request.order_id, client_type = %request.client_type, "initializing payment");

        self.try_initialize(request).await.map_err(|error| {
            warn!(order_id = %request.order_id, error = %error, "initialize failed");
            PaymentFailure::before_initialize(request.order_id.clone(), error)
        })
    }

    async fn try_initialize(&self, request: &PaymentRequest) -> Result<InitializedPayment, NagadError> {
        request.validate()?;

        let datetime = self.clock.now();
        let record = initialize_envelope(&self.merchant, &request.order_id, &datetime);
        let sealed = self.envelope.seal(&record)?;
        let body = initialize_body(&self.merchant, &datetime, sealed);

        let ip = normalize_ip(&request.ip, Phase::Initialize);
        let headers = RequestHeaders::base(&self.api_version)
            .with_client(ip.clone(), request.client_type.as_str());
        let url = format!(
            "{}{}/{}/{}",
            self.base_url, INITIALIZE_PATH, self.merchant.merchant_id, request.order_id
        );

        let reply = self.transport.post(&url, &body, headers).await?;
        let (payment_reference_id, challenge) = open_initialize_response(&self.envelope, reply)?;

        info!(
            order_id = %request.order_id,
            payment_reference_id = %payment_reference_id,
            "payment initialized"
        );
        Ok(InitializedPayment::new(request, ip, payment_reference_id, challenge))
    }

    /// Phase two: echo the gateway's challenge and obtain the payer
    /// redirect URL. Consumes the initialized payment.
    pub async fn confirm(
        &self,
        payment: InitializedPayment,
    ) -> Result<ConfirmedPayment, PaymentFailure> {
        info!(
            order_id = %payment.order_id(),
            payment_reference_id = %payment.payment_reference_id(),
            "confirming payment"
        );

        match self.try_confirm(&payment).await {
            Ok(redirect_url) => {
                info!(
                    order_id = %payment.order_id(),
                    payment_reference_id = %payment.payment_reference_id(),
                    "payment confirmed"
                );
                Ok(ConfirmedPayment {
                    order_id: payment.order_id().to_string(),
                    payment_reference_id: payment.payment_reference_id().clone(),
                    redirect_url,
                })
            }
            Err(error) => {
                warn!(
                    order_id = %payment.order_id(),
                    payment_reference_id = %payment.payment_reference_id(),
                    error = %error,
                    "confirm failed; reconcile with verify before retrying"
                );
                Err(PaymentFailure::after_initialize(&payment, error))
            }
        }
    }

    async fn try_confirm(&self, payment: &InitializedPayment) -> Result<String, NagadError> {
        let record = confirm_envelope(&self.merchant, payment);
        let sealed = self.envelope.seal(&record)?;
        let body = confirm_body(&self.merchant, payment, sealed);

        let headers = RequestHeaders::base(&self.api_version)
            .with_client(payment.confirm_ip(), payment.client_type().as_str());
        let url = format!(
            "{}{}/{}",
            self.base_url,
            CONFIRM_PATH,
            payment.payment_reference_id()
        );

        let reply = self.transport.post(&url, &body, headers).await?;
        redirect_url(reply)
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// Look up a payment's settlement status. Needs nothing from a prior
    /// checkout in this process, only the reference ID.
    pub async fn verify_payment(
        &self,
        payment_reference_id: &str,
    ) -> Result<VerificationResult, NagadError> {
        let reference = payment_reference_id.trim();
        if reference.is_empty() {
            return Err(NagadError::InvalidRequest(
                "payment reference ID must not be empty".to_string(),
            ));
        }
        if !is_path_segment_safe(reference) {
            return Err(NagadError::InvalidRequest(format!(
                "payment reference ID {reference:?} cannot be used as a URL path segment"
            )));
        }

        let url = format!("{}{}/{}", self.base_url, VERIFY_PATH, reference);
        let body = self
            .transport
            .get(&url, RequestHeaders::base(&self.api_version))
            .await?;

        let result: VerificationResult = serde_json::from_value(body).map_err(|e| {
            NagadError::MalformedResponse(format!("unexpected Verify response shape: {e}"))
        })?;

        info!(
            payment_reference_id = %reference,
            status = result.status.as_deref().unwrap_or("-"),
            "payment verified"
        );
        Ok(result)
    }
}
