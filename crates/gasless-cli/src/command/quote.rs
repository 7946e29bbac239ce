use std::str::FromStr;

use clap::Args;
use gasless_account::types::{TransferOptions, TransferRequest};
use gasless_account::ReadAccount;
use gasless_ton::{Address, Coins};
use tracing::info;

use crate::command::print;
use crate::core::context::Context;
use crate::core::Error;

/// Transfer shared by the quote and transfer commands
#[derive(Args, Clone)]
pub struct TransferParameters {
    /// Master contract of the transferred jetton
    #[clap(long)]
    pub token: String,

    #[clap(long)]
    pub recipient: String,

    /// Amount in the jetton base units
    #[clap(long)]
    pub amount: String,

    /// Jetton paying the relayer commission, defaults to the configured paymaster token
    #[clap(long)]
    pub paymaster_token: Option<String>,
}

impl TransferParameters {
    pub fn request(&self) -> Result<TransferRequest, Error> {
        TransferRequest::parse(&self.token, &self.recipient, &self.amount).map_err(|e| Error::Validation(e.to_string()))
    }

    pub fn options(&self, transfer_max_fee: Option<&str>) -> Result<TransferOptions, Error> {
        let paymaster_token = self
            .paymaster_token
            .as_deref()
            .map(Address::from_str)
            .transpose()
            .map_err(|e| Error::Validation(e.to_string()))?;

        let transfer_max_fee = transfer_max_fee
            .map(Coins::from_str)
            .transpose()
            .map_err(|e| Error::Validation(e.to_string()))?;

        Ok(TransferOptions {
            paymaster_token,
            transfer_max_fee,
        })
    }
}

#[derive(Args, Clone)]
pub struct QuoteCommandParameters {
    #[command(flatten)]
    pub transfer: TransferParameters,
}

pub async fn command_quote(params: QuoteCommandParameters, context: &Context) -> Result<(), Error> {
    let request = params.transfer.request()?;
    let options = params.transfer.options(None)?;
    let account = context.read_only_account()?;

    let quote = account.quote_transfer(&request, &options).await?;
    info!("relayer commission for {} of {:?}: {}", request.amount, request.token, quote.fee);

    print(&quote)
}
