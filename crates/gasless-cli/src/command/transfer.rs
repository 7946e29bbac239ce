use clap::Args;
use gasless_account::SigningAccount;
use tracing::info;

use crate::command::print;
use crate::command::quote::TransferParameters;
use crate::core::context::Context;
use crate::core::Error;

#[derive(Args, Clone)]
pub struct TransferCommandParameters {
    #[command(flatten)]
    pub transfer: TransferParameters,

    /// Highest commission accepted, in the paymaster token base units
    #[clap(long)]
    pub max_fee: Option<String>,
}

pub async fn command_transfer(params: TransferCommandParameters, context: &Context) -> Result<(), Error> {
    let request = params.transfer.request()?;
    let options = params.transfer.options(params.max_fee.as_deref())?;
    let account = context.signing_account()?;

    info!("🚀 sending {} of {:?} to {:?}", request.amount, request.token, request.recipient);
    let result = account.transfer(&request, &options).await;
    account.dispose();

    let result = result?;
    info!("✅ transfer submitted with hash {}", result.hash);

    print(&result)
}
