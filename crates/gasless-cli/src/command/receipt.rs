use clap::Args;
use gasless_account::ReadAccount;
use tracing::info;

use crate::command::print;
use crate::core::context::Context;
use crate::core::Error;

#[derive(Args, Clone)]
pub struct ReceiptCommandParameters {
    /// Hash returned by the transfer command, or the hash of the wallet transaction
    #[clap(long)]
    pub hash: String,
}

pub async fn command_receipt(params: ReceiptCommandParameters, context: &Context) -> Result<(), Error> {
    let account = context.read_only_account()?;

    match account.get_transaction_receipt(&params.hash).await? {
        Some(receipt) => {
            info!("transaction {} found", params.hash);
            print(&receipt)
        },
        None => Err(Error::Execution(format!("transaction {} is not on chain yet", params.hash))),
    }
}
