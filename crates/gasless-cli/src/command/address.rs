use clap::Args;
use gasless_account::ReadAccount;
use serde_json::json;
use tracing::info;

use crate::command::print;
use crate::core::context::Context;
use crate::core::Error;

#[derive(Args, Clone)]
pub struct AddressCommandParameters {
    /// Print the bounceable form of the address
    #[clap(long, default_value_t = false)]
    pub bounceable: bool,
}

pub async fn command_address(params: AddressCommandParameters, context: &Context) -> Result<(), Error> {
    let account = context.read_only_account()?;
    let testnet = context.configuration.gasless.network().is_testnet();

    let address = account.address();
    info!("wallet address {:?}", address);

    print(&json!({
        "address": address.to_friendly(params.bounceable, testnet),
        "raw_address": address.to_raw_string(),
        "public_key": account.public_key().to_hex(),
    }))
}
