use clap::{Parser, Subcommand};
use gasless_common::monitoring::{Metric, Tracer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::command::address::{command_address, AddressCommandParameters};
use crate::command::balance::{command_balance, command_paymaster_balance, command_token_balance, TokenBalanceCommandParameters};
use crate::command::quote::{command_quote, QuoteCommandParameters};
use crate::command::receipt::{command_receipt, ReceiptCommandParameters};
use crate::command::transfer::{command_transfer, TransferCommandParameters};
use crate::core::context::Context;
use crate::core::{Error, Fmt};

mod command;
mod core;

#[derive(Parser)]
#[command(about = "Gasless jetton transfers from a TON wallet v5r1")]
struct Cli {
    /// JSON profile holding the configuration
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Configuration override, e.g. `--config ton_network=testnet`
    #[arg(long = "config", global = true, value_name = "NAME=VALUE")]
    config: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print the wallet address of the account")]
    Address(AddressCommandParameters),

    #[command(about = "Native balance of the wallet, in nanotons")]
    Balance,

    #[command(about = "Jetton balance of the wallet")]
    TokenBalance(TokenBalanceCommandParameters),

    #[command(about = "Balance of the jetton paying the relayer commissions")]
    PaymasterBalance,

    #[command(about = "Commission asked by the relayer for a transfer, nothing is sent")]
    Quote(QuoteCommandParameters),

    #[command(about = "Transfer jettons, the commission being paid in the paymaster token")]
    Transfer(TransferCommandParameters),

    #[command(about = "Look up the transaction of a previous transfer")]
    Receipt(ReceiptCommandParameters),
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    let context = Context::load(cli.profile.as_deref(), &cli.config)?;

    let monitoring = context.configuration.monitoring.clone();
    let metric_layer = monitoring.as_ref().map(Metric::layer).transpose().map_err(Error::Configuration)?;
    let tracer_layer = monitoring.as_ref().map(Tracer::layer).transpose().map_err(Error::Configuration)?;
    let fmt_layer = Fmt::layer(&context.configuration.verbosity);

    let subscriber = Registry::default().with(fmt_layer).with(metric_layer).with(tracer_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(|e| Error::Configuration(e.to_string()))?;

    match cli.command {
        Commands::Address(params) => command_address(params, &context).await?,
        Commands::Balance => command_balance(&context).await?,
        Commands::TokenBalance(params) => command_token_balance(params, &context).await?,
        Commands::PaymasterBalance => command_paymaster_balance(&context).await?,
        Commands::Quote(params) => command_quote(params, &context).await?,
        Commands::Transfer(params) => command_transfer(params, &context).await?,
        Commands::Receipt(params) => command_receipt(params, &context).await?,
    }

    Ok(())
}
