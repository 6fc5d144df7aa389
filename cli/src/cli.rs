//! # CLI Interface
//!
//! Command-line structure for `nagad`, via `clap` derive. Three
//! subcommands: `create`, `verify` and `version`.
//!
//! Every gateway setting can come from a flag or a `NAGAD_*` environment
//! variable, so a merchant can keep credentials in the environment and
//! only pass per-payment values on the command line.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use nagad_protocol::{ClientType, GatewayConfig};

use crate::logging::LogFormat;

/// Nagad checkout gateway client.
///
/// Creates payments through the Initialize / Confirm handshake and looks
/// up their settlement status.
#[derive(Parser, Debug)]
#[command(
    name = "nagad",
    about = "Nagad checkout gateway client",
    version,
    propagate_version = true
)]
pub struct NagadCli {
    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "NAGAD_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Log filter when `RUST_LOG` is not set.
    #[arg(
        long,
        global = true,
        env = "NAGAD_LOG_LEVEL",
        default_value = "nagad=info,nagad_protocol=info"
    )]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a payment and print the URL to send the payer to.
    Create(CreateArgs),
    /// Print a payment's verification record as JSON.
    Verify(VerifyArgs),
    /// Print version information and exit.
    Version,
}

/// Merchant credentials and gateway location.
#[derive(Args, Debug, Clone)]
pub struct GatewayArgs {
    /// Gateway base URL.
    #[arg(long, env = "NAGAD_BASE_URL")]
    pub base_url: String,

    /// Merchant ID issued by Nagad.
    #[arg(long, env = "NAGAD_MERCHANT_ID")]
    pub merchant_id: String,

    /// Merchant account number (MSISDN).
    #[arg(long, env = "NAGAD_MERCHANT_NUMBER")]
    pub merchant_number: String,

    /// Merchant RSA private key: PEM text, bare base64 body, or a path
    /// with `--keys-are-paths`.
    #[arg(long, env = "NAGAD_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Nagad RSA public key, in the same forms as `--private-key`.
    #[arg(long, env = "NAGAD_PUBLIC_KEY", hide_env_values = true)]
    pub public_key: String,

    /// Where the gateway sends the payer after checkout.
    #[arg(long, env = "NAGAD_CALLBACK_URL")]
    pub callback_url: String,

    /// Value of the `X-KM-Api-Version` header.
    #[arg(long, env = "NAGAD_API_VERSION", default_value = "v-0.2.0")]
    pub api_version: String,

    /// Treat `--private-key` / `--public-key` as file paths.
    #[arg(long, env = "NAGAD_KEYS_ARE_PATHS")]
    pub keys_are_paths: bool,

    /// Per-request timeout in seconds.
    #[arg(long, env = "NAGAD_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl GatewayArgs {
    pub fn to_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.base_url.clone(),
            merchant_id: self.merchant_id.clone(),
            merchant_number: self.merchant_number.clone(),
            private_key: self.private_key.clone(),
            public_key: self.public_key.clone(),
            callback_url: self.callback_url.clone(),
            api_version: self.api_version.clone(),
            is_path: self.keys_are_paths,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Arguments for the `create` subcommand.
#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Merchant order ID. A fresh one is generated when omitted.
    #[arg(long)]
    pub order_id: Option<String>,

    /// Amount in BDT, e.g. `100` or `99.50`.
    #[arg(long)]
    pub amount: String,

    /// Payer IP address. Loopback is replaced with a placeholder the
    /// gateway accepts.
    #[arg(long, default_value = "127.0.0.1")]
    pub ip: String,

    /// PC_WEB, MOBILE_WEB, MOBILE_APP, WALLET_WEB_VIEW or BILL_KEY.
    #[arg(long, default_value = "PC_WEB")]
    pub client_type: ClientType,

    /// Product detail forwarded as additional merchant info. Repeatable.
    #[arg(long = "detail", value_name = "KEY=VALUE", value_parser = parse_detail)]
    pub details: Vec<(String, String)>,
}

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Payment reference ID returned by the gateway.
    pub payment_ref_id: String,
}

fn parse_detail(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}
