use gasless_ton::wallet::WalletV5R1;
use gasless_ton::Address;
use gasless_tonapi::types::{EstimateMessage, EstimateRequest};
use gasless_tonapi::Client as RelayerClient;
use tracing::instrument;

use crate::transfer::TransferInstruction;
use crate::types::FeeQuote;
use crate::Error;

/// Ask the relayer for a binding quote of `instruction` sent from `wallet`, the commission being
/// paid in `paymaster_token`. Does not consume the seqno of the wallet.
#[instrument(name = "estimate_fee", skip(client, wallet, instruction))]
pub async fn estimate_fee(client: &RelayerClient, paymaster_token: Address, wallet: &WalletV5R1, instruction: &TransferInstruction) -> Result<FeeQuote, Error> {
    let request = EstimateRequest {
        wallet_address: wallet.address(),
        wallet_public_key: wallet.public_key(),
        messages: vec![EstimateMessage::new(&instruction.to_cell()?)],
    };

    let params = client
        .gasless_estimate(paymaster_token, &request)
        .await
        .map_err(|e| Error::QuoteFailed(e.to_string()))?;

    Ok(params.into())
}
