use async_trait::async_trait;
use gasless_ton::keys::PublicKey;
use gasless_ton::message::InternalMessage;
use gasless_ton::wallet::WalletConfiguration;
use gasless_ton::{Address, Coins, Network};
use serde::{Deserialize, Serialize};

mod account;
pub use account::GaslessAccount;

mod error;
pub use error::Error;

pub mod transfer;
pub mod types;

mod view;
pub use view::ReadOnlyAccount;

#[cfg(feature = "testing")]
pub mod testing;

use crate::types::{PaymasterConfiguration, QuoteResult, TransactionReceipt, TransferOptions, TransferRequest, TransferResult};

/// Wallet transactions fetched per page when looking for a receipt
pub const RECEIPT_PAGE_SIZE: u32 = 20;

/// Pages walked back before a receipt lookup gives up
pub const RECEIPT_LOOKUP_PAGES: u32 = 50;

/// Account configuration. Clients left unconfigured can be injected afterward, operations
/// needing a missing client fail with [`Error::ClientNotConnected`].
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AccountConfiguration {
    #[serde(default)]
    pub ton: Option<gasless_ton::Configuration>,

    #[serde(default)]
    pub tonapi: Option<gasless_tonapi::Configuration>,

    #[serde(flatten)]
    pub paymaster: PaymasterConfiguration,

    #[serde(default)]
    pub wallet: WalletConfiguration,
}

impl AccountConfiguration {
    /// Network of the chain client, mainnet when none is configured
    pub fn network(&self) -> Network {
        self.ton
            .as_ref()
            .map(gasless_ton::Configuration::network)
            .unwrap_or(Network::Mainnet)
    }
}

/// Operations available without the secret key
#[async_trait]
pub trait ReadAccount: Send + Sync {
    fn address(&self) -> Address;

    fn public_key(&self) -> PublicKey;

    /// Native balance of the wallet, in nanotons
    async fn get_balance(&self) -> Result<Coins, Error>;

    /// Balance of the jetton `token`, 0 when the wallet never received it
    async fn get_token_balance(&self, token: Address) -> Result<Coins, Error>;

    async fn get_paymaster_token_balance(&self) -> Result<Coins, Error>;

    /// Transaction designated by `hash`, `None` while it is not observed on chain
    async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<TransactionReceipt>, Error>;

    /// Commission the relayer asks to execute `request`. Never consumes the seqno nor sends anything.
    async fn quote_transfer(&self, request: &TransferRequest, options: &TransferOptions) -> Result<QuoteResult, Error>;

    /// Whether `signature`, hex encoded, is a signature of `message` by this account
    fn verify(&self, message: &[u8], signature: &str) -> bool {
        hex::decode(signature.trim_start_matches("0x"))
            .map(|signature| self.public_key().verify(message, &signature))
            .unwrap_or(false)
    }
}

/// Operations requiring the secret key
#[async_trait]
pub trait SigningAccount: ReadAccount {
    /// Hex encoded ed25519 signature of `message`
    fn sign(&self, message: &[u8]) -> String;

    /// Transfer jettons through the relayer, the fees being paid in the paymaster token
    async fn transfer(&self, request: &TransferRequest, options: &TransferOptions) -> Result<TransferResult, Error>;

    /// Raw sends are not available, every transfer goes through the relayer
    async fn send_transaction(&self, messages: &[InternalMessage]) -> Result<TransferResult, Error>;

    async fn quote_send_transaction(&self, messages: &[InternalMessage]) -> Result<QuoteResult, Error>;
}
