// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Nagad CLI
//!
//! Entry point for the `nagad` binary. Parses arguments, sets up logging,
//! and runs one gateway operation:
//!
//! - `create`  : Initialize + Confirm, prints the payer redirect URL
//! - `verify`  : prints a payment's verification record as JSON
//! - `version` : prints build version information

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use nagad_protocol::{NagadGateway, PaymentRequest};

use cli::{Commands, CreateArgs, GatewayArgs, NagadCli, VerifyArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = NagadCli::parse();

    match cli.command {
        Commands::Create(args) => {
            logging::init_logging(&cli.log_level, cli.log_format);
            create_payment(args).await
        }
        Commands::Verify(args) => {
            logging::init_logging(&cli.log_level, cli.log_format);
            verify_payment(args).await
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn build_gateway(args: &GatewayArgs) -> Result<NagadGateway> {
    NagadGateway::new(args.to_config()).with_context(|| {
        format!(
            "failed to set up gateway client for merchant {} at {}",
            args.merchant_id, args.base_url
        )
    })
}

/// `ORD` plus 17 hex digits of a v4 UUID: unique enough, and short enough
/// for the gateway's order ID limit.
fn generate_order_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ORD{}", &id[..17])
}

/// Runs the two-phase checkout and prints the redirect URL to stdout.
async fn create_payment(args: CreateArgs) -> Result<()> {
    let gateway = build_gateway(&args.gateway)?;

    let order_id = args.order_id.unwrap_or_else(generate_order_id);
    let request = PaymentRequest::new(order_id.clone(), args.amount, args.ip, args.client_type)
        .with_product_details(args.details.into_iter().collect());

    tracing::info!(
        order_id = %order_id,
        amount = %request.amount,
        client_type = %request.client_type,
        "creating payment"
    );

    match gateway.create_payment(&request).await {
        Ok(redirect_url) => {
            println!("{redirect_url}");
            Ok(())
        }
        Err(failure) => {
            let context = match &failure.payment_reference_id {
                Some(reference) => format!(
                    "payment {reference} for order {order_id} did not complete; \
                     check it with `nagad verify {reference}` before retrying"
                ),
                None => format!("payment for order {order_id} was not created"),
            };
            Err(anyhow::Error::new(failure).context(context))
        }
    }
}

/// Looks up a payment and prints the gateway's record as pretty JSON.
async fn verify_payment(args: VerifyArgs) -> Result<()> {
    let gateway = build_gateway(&args.gateway)?;

    let result = gateway
        .verify_payment(&args.payment_ref_id)
        .await
        .with_context(|| format!("failed to verify payment {}", args.payment_ref_id))?;

    if !result.is_successful() {
        tracing::warn!(
            payment_ref_id = %args.payment_ref_id,
            status = result.status.as_deref().unwrap_or("-"),
            "payment is not settled"
        );
    }

    let json = serde_json::to_string_pretty(&result).context("failed to render result")?;
    println!("{json}");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("nagad          {}", env!("CARGO_PKG_VERSION"));
    println!("nagad-protocol {}", nagad_protocol::config::LIBRARY_VERSION);
    println!("rustc          {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
