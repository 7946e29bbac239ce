use std::str::FromStr;

use clap::Args;
use gasless_account::ReadAccount;
use gasless_ton::Address;
use serde_json::json;
use tracing::info;

use crate::command::print;
use crate::core::context::Context;
use crate::core::Error;

#[derive(Args, Clone)]
pub struct TokenBalanceCommandParameters {
    /// Master contract of the jetton
    #[clap(long)]
    pub token: String,
}

pub async fn command_balance(context: &Context) -> Result<(), Error> {
    let account = context.read_only_account()?;

    let balance = account.get_balance().await?;
    info!("💰 native balance of {:?}: {}", account.address(), balance);

    print(&json!({ "balance": balance }))
}

pub async fn command_token_balance(params: TokenBalanceCommandParameters, context: &Context) -> Result<(), Error> {
    let token = Address::from_str(&params.token).map_err(|e| Error::Validation(e.to_string()))?;
    let account = context.read_only_account()?;

    let balance = account.get_token_balance(token).await?;
    info!("💰 balance of {:?} in {:?}: {}", account.address(), token, balance);

    print(&json!({ "token": token, "balance": balance }))
}

pub async fn command_paymaster_balance(context: &Context) -> Result<(), Error> {
    let account = context.read_only_account()?;
    let token = account.paymaster().paymaster_token.address;

    let balance = account.get_paymaster_token_balance().await?;
    info!("💰 paymaster token balance of {:?}: {}", account.address(), balance);

    print(&json!({ "token": token, "balance": balance }))
}
