use std::time::Duration;

use async_trait::async_trait;
use gasless_common::{log_if_error, measure_duration, metric};
use gasless_ton::constants::TRANSFER_VALIDITY;
use gasless_ton::keys::{KeyPair, PublicKey};
use gasless_ton::message::InternalMessage;
use gasless_ton::wallet::{SendMode, ValidUntil};
use gasless_ton::{Address, Client as TonClient, Coins};
use gasless_tonapi::types::SendRequest;
use gasless_tonapi::Client as RelayerClient;
use tracing::instrument;

use crate::types::{FeeQuote, QuoteResult, TransactionReceipt, TransferOptions, TransferRequest, TransferResult};
use crate::{AccountConfiguration, Error, ReadAccount, ReadOnlyAccount, SigningAccount};

/// Wallet v5r1 account owning its key pair. Transfers are relayed, their fees being paid in
/// the paymaster token instead of TON.
pub struct GaslessAccount {
    key_pair: KeyPair,
    view: ReadOnlyAccount,
}

impl GaslessAccount {
    pub fn new(key_pair: KeyPair, configuration: &AccountConfiguration) -> Result<Self, Error> {
        let view = ReadOnlyAccount::new(key_pair.public_key(), configuration)?;

        Ok(Self { key_pair, view })
    }

    pub fn with_ton_client(mut self, client: TonClient) -> Self {
        self.view = self.view.with_ton_client(client);
        self
    }

    pub fn with_relayer_client(mut self, client: RelayerClient) -> Self {
        self.view = self.view.with_relayer_client(client);
        self
    }

    pub fn view(&self) -> &ReadOnlyAccount {
        &self.view
    }

    /// Same account without its key pair
    pub fn to_read_only(&self) -> ReadOnlyAccount {
        self.view.clone()
    }

    /// Consumes the account, wiping its secret key
    pub fn dispose(self) {
        self.key_pair.dispose()
    }

    async fn sign_and_send(&self, quote: &FeeQuote) -> Result<String, Error> {
        let ton = self.view.ton().map_err(|e| Error::SendFailed(e.to_string()))?;
        let relayer = self.view.relayer().map_err(|e| Error::SendFailed(e.to_string()))?;
        let wallet = self.view.wallet();

        let seqno = ton
            .get_seqno(wallet.address())
            .await
            .map_err(|e| Error::SendFailed(format!("could not fetch seqno: {}", e)))?;

        let messages = quote.internal_messages().map_err(|e| Error::SendFailed(e.to_string()))?;
        let valid_until = ValidUntil::valid_for(Duration::from_secs(TRANSFER_VALIDITY));

        let body = wallet
            .create_transfer(&self.key_pair, seqno, valid_until, &messages, SendMode::PAY_GAS_SEPARATELY | SendMode::IGNORE_ERRORS)
            .map_err(|e| Error::SendFailed(e.to_string()))?;

        let message = wallet
            .external_message(seqno, body.clone())
            .and_then(|x| x.to_cell())
            .map_err(|e| Error::SendFailed(e.to_string()))?;

        let request = SendRequest {
            wallet_public_key: wallet.public_key(),
            boc: message.to_boc_hex(),
        };
        relayer
            .gasless_send(&request)
            .await
            .map_err(|e| Error::SendFailed(e.to_string()))?;

        Ok(body.hash_hex())
    }
}

#[async_trait]
impl ReadAccount for GaslessAccount {
    fn address(&self) -> Address {
        self.view.address()
    }

    fn public_key(&self) -> PublicKey {
        self.key_pair.public_key()
    }

    async fn get_balance(&self) -> Result<Coins, Error> {
        self.view.get_balance().await
    }

    async fn get_token_balance(&self, token: Address) -> Result<Coins, Error> {
        self.view.get_token_balance(token).await
    }

    async fn get_paymaster_token_balance(&self) -> Result<Coins, Error> {
        self.view.get_paymaster_token_balance().await
    }

    async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<TransactionReceipt>, Error> {
        self.view.get_transaction_receipt(hash).await
    }

    async fn quote_transfer(&self, request: &TransferRequest, options: &TransferOptions) -> Result<QuoteResult, Error> {
        self.view.quote_transfer(request, options).await
    }
}

#[async_trait]
impl SigningAccount for GaslessAccount {
    fn sign(&self, message: &[u8]) -> String {
        hex::encode(self.key_pair.sign(message))
    }

    #[instrument(name = "transfer", skip(self, request, options))]
    async fn transfer(&self, request: &TransferRequest, options: &TransferOptions) -> Result<TransferResult, Error> {
        let (result, duration) = measure_duration!(log_if_error!(
            async {
                let paymaster = self.view.paymaster().with_options(options);
                let quote = self.view.estimate_transfer(request, &paymaster).await?;

                if let Some(max_fee) = paymaster.transfer_max_fee {
                    if quote.commission >= max_fee {
                        return Err(Error::FeeExceeded { fee: quote.commission, max_fee });
                    }
                }

                let hash = self.sign_and_send(&quote).await?;
                tracing::info!(hash = %hash, fee = %quote.commission, "transfer submitted to relayer");

                Ok(TransferResult { hash, fee: quote.commission })
            }
            .await
        ));

        metric!(counter[gasless_transfer] = 1, method = "transfer");
        metric!(histogram[gasless_transfer_duration_milliseconds] = duration.as_millis(), method = "transfer");
        metric!(on error result => counter [ gasless_transfer_error ] = 1, method = "transfer");

        result
    }

    async fn send_transaction(&self, _messages: &[InternalMessage]) -> Result<TransferResult, Error> {
        Err(Error::OperationNotSupported("raw transactions cannot be sent by a gasless account, use transfer".to_string()))
    }

    async fn quote_send_transaction(&self, _messages: &[InternalMessage]) -> Result<QuoteResult, Error> {
        Err(Error::OperationNotSupported("raw transactions cannot be quoted by a gasless account, use quote_transfer".to_string()))
    }
}
