use gasless_ton::Address;
use gasless_tonapi::Client as RelayerClient;
use tracing::instrument;

use crate::Error;

/// Fetch the current relay address. It is never cached since the relayer may rotate it and
/// the excess of every transfer is refunded to it.
#[instrument(name = "resolve_relay_address", skip(client))]
pub async fn resolve_relay_address(client: &RelayerClient) -> Result<Address, Error> {
    let config = client
        .gasless_config()
        .await
        .map_err(|e| Error::PaymasterUnavailable(e.to_string()))?;

    Ok(config.relay_address)
}
