use async_trait::async_trait;
use gasless_ton::keys::PublicKey;
use gasless_ton::wallet::WalletV5R1;
use gasless_ton::{Address, Client as TonClient, Coins};
use gasless_tonapi::Client as RelayerClient;
use tracing::instrument;

use crate::transfer::{estimate_fee, resolve_relay_address, TransferInstruction};
use crate::types::{FeeQuote, PaymasterConfiguration, QuoteResult, TransactionReceipt, TransferOptions, TransferRequest};
use crate::{AccountConfiguration, Error, ReadAccount, RECEIPT_LOOKUP_PAGES, RECEIPT_PAGE_SIZE};

/// Wallet v5r1 account known by its public key only
#[derive(Clone)]
pub struct ReadOnlyAccount {
    wallet: WalletV5R1,
    paymaster: PaymasterConfiguration,

    ton: Option<TonClient>,
    relayer: Option<RelayerClient>,
}

impl ReadOnlyAccount {
    pub fn new(public_key: PublicKey, configuration: &AccountConfiguration) -> Result<Self, Error> {
        let wallet = WalletV5R1::from_configuration(&configuration.wallet, configuration.network(), public_key)?;

        let ton = configuration.ton.as_ref().map(TonClient::new).transpose()?;
        let relayer = configuration
            .tonapi
            .as_ref()
            .map(RelayerClient::new)
            .transpose()
            .map_err(|e| Error::PaymasterUnavailable(e.to_string()))?;

        Ok(Self {
            wallet,
            paymaster: configuration.paymaster,
            ton,
            relayer,
        })
    }

    pub fn with_ton_client(mut self, client: TonClient) -> Self {
        self.ton = Some(client);
        self
    }

    pub fn with_relayer_client(mut self, client: RelayerClient) -> Self {
        self.relayer = Some(client);
        self
    }

    pub fn wallet(&self) -> &WalletV5R1 {
        &self.wallet
    }

    /// Paymaster defaults of the account
    pub fn paymaster(&self) -> &PaymasterConfiguration {
        &self.paymaster
    }

    pub(crate) fn ton(&self) -> Result<&TonClient, Error> {
        self.ton.as_ref().ok_or(Error::ClientNotConnected("ton".to_string()))
    }

    pub(crate) fn relayer(&self) -> Result<&RelayerClient, Error> {
        self.relayer.as_ref().ok_or(Error::ClientNotConnected("tonapi".to_string()))
    }

    /// Jetton wallet of this account for the jetton `token`
    pub async fn jetton_wallet(&self, token: Address) -> Result<Address, Error> {
        Ok(self.ton()?.fetch_jetton_wallet_address(token, self.wallet.address()).await?)
    }

    /// Builds the transfer of `request` against a freshly resolved relay address and asks the
    /// relayer for its quote
    #[instrument(name = "estimate_transfer", skip(self, request))]
    pub(crate) async fn estimate_transfer(&self, request: &TransferRequest, paymaster: &PaymasterConfiguration) -> Result<FeeQuote, Error> {
        let relayer = self.relayer()?;
        let jetton_wallet = self.jetton_wallet(request.token).await?;

        let relay_address = resolve_relay_address(relayer).await?;
        let instruction = TransferInstruction::build(request, jetton_wallet, relay_address)?;

        estimate_fee(relayer, paymaster.paymaster_token.address, &self.wallet, &instruction).await
    }
}

#[async_trait]
impl ReadAccount for ReadOnlyAccount {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    fn public_key(&self) -> PublicKey {
        self.wallet.public_key()
    }

    #[instrument(name = "get_balance", skip(self))]
    async fn get_balance(&self) -> Result<Coins, Error> {
        Ok(self.ton()?.get_balance(self.wallet.address()).await?)
    }

    #[instrument(name = "get_token_balance", skip(self))]
    async fn get_token_balance(&self, token: Address) -> Result<Coins, Error> {
        let jetton_wallet = self.jetton_wallet(token).await?;

        Ok(self.ton()?.fetch_jetton_balance(jetton_wallet).await?)
    }

    async fn get_paymaster_token_balance(&self) -> Result<Coins, Error> {
        self.get_token_balance(self.paymaster.paymaster_token.address).await
    }

    #[instrument(name = "get_transaction_receipt", skip(self))]
    async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<TransactionReceipt>, Error> {
        Ok(self
            .ton()?
            .find_transaction(self.wallet.address(), hash, RECEIPT_PAGE_SIZE, RECEIPT_LOOKUP_PAGES)
            .await?)
    }

    async fn quote_transfer(&self, request: &TransferRequest, options: &TransferOptions) -> Result<QuoteResult, Error> {
        let quote = self
            .estimate_transfer(request, &self.paymaster.with_options(options))
            .await?;

        Ok(QuoteResult { fee: quote.commission })
    }
}
