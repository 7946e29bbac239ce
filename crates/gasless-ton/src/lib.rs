use gasless_common::{log_if_error, measure_duration, metric};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

pub mod cell;
pub mod client;
pub mod constants;
pub mod jetton;
pub mod keys;
pub mod message;
pub mod wallet;

mod address;
pub use address::Address;

mod coins;
pub use coins::Coins;

mod network;
pub use network::{Network, DEFAULT_MAINNET_ENDPOINT, DEFAULT_TESTNET_ENDPOINT};
pub use tracing;

use crate::client::{ContractState, GetMethodResult, RawGetMethodResult, StackArgument, ToncenterClient, Transaction, TransactionId};

#[cfg(feature = "testing")]
pub mod testing;

#[derive(Error, Debug)]
pub enum Error {
    #[error("internal error {0}")]
    Internal(String),

    #[error("invalid url {0}")]
    URL(String),

    #[error(transparent)]
    HTTP(#[from] reqwest::Error),

    #[error("wrong format error {0}")]
    Format(String),

    #[error("rate limited")]
    RateLimited,

    #[error("provider error {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("get method {method} failed with exit code {exit_code}")]
    ExitCode { method: String, exit_code: i32 },

    #[error("cell overflow {0}")]
    CellOverflow(String),

    #[error("cell underflow {0}")]
    CellUnderflow(String),

    #[error("invalid bag of cells {0}")]
    Boc(String),

    #[error("invalid address {0}")]
    InvalidAddress(String),

    #[error("invalid amount {0}")]
    InvalidAmount(String),

    #[error("invalid key {0}")]
    InvalidKey(String),

    #[error("wallet code is not configured, it is required to deploy the wallet")]
    MissingWalletCode,
}

impl Error {
    /// Whether the error was raised by the remote node rather than by the transport
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::ExitCode { .. })
    }
}

fn default_timeout() -> u64 {
    10
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToncenterConfiguration {
    pub network: Network,

    /// Defaults to the public Toncenter endpoint of the network
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl ToncenterConfiguration {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            endpoint: None,
            api_key: None,
            timeout: default_timeout(),
            fallbacks: vec![],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum Configuration {
    #[cfg(feature = "testing")]
    #[serde(skip)]
    Mock(std::sync::Arc<dyn testing::MockTonProvider>),

    Toncenter(ToncenterConfiguration),
}

#[cfg(feature = "testing")]
impl Configuration {
    pub fn mock<T: testing::MockTonProvider>() -> Self {
        Self::Mock(std::sync::Arc::new(T::new()))
    }
}

impl Configuration {
    pub fn network(&self) -> Network {
        match self {
            #[cfg(feature = "testing")]
            Self::Mock(x) => x.network(),

            Self::Toncenter(x) => x.network,
        }
    }
}

#[derive(Clone)]
enum Provider {
    #[cfg(feature = "testing")]
    Mock(std::sync::Arc<dyn testing::MockTonProvider>),

    Toncenter(ToncenterClient),
}

/// Read client of the TON blockchain
#[derive(Clone)]
pub struct Client {
    network: Network,

    inner: Provider,
}

impl Client {
    pub fn new(configuration: &Configuration) -> Result<Self, Error> {
        let inner = match configuration {
            #[cfg(feature = "testing")]
            Configuration::Mock(x) => Provider::Mock(x.clone()),

            Configuration::Toncenter(x) => Provider::Toncenter(ToncenterClient::new(x)?),
        };

        Ok(Self {
            network: configuration.network(),
            inner,
        })
    }

    #[cfg(feature = "testing")]
    pub fn mock<I: 'static + testing::MockTonProvider>() -> Self {
        let provider = I::new();

        Self {
            network: provider.network(),
            inner: Provider::Mock(std::sync::Arc::new(provider)),
        }
    }

    /// Returns the network on which this client is bound
    pub fn network(&self) -> Network {
        self.network
    }

    /// Runs the get-method `method` of the contract at `address`. A non-zero exit code is an error.
    #[instrument(name = "run_get_method", skip(self, stack))]
    pub async fn run_get_method(&self, address: Address, method: &str, stack: &[StackArgument]) -> Result<GetMethodResult, Error> {
        let (result, duration) = measure_duration!(log_if_error!(
            match &self.inner {
                #[cfg(feature = "testing")]
                Provider::Mock(x) => x.run_get_method(address, method, stack).await,

                Provider::Toncenter(x) => x.run_get_method(address, method, stack).await,
            },
            Error::is_remote
        ));

        metric!(histogram[ton_rpc] = duration.as_millis(), method = "run_get_method");
        metric!(on error result => counter [ ton_rpc_error ] = 1, method = "run_get_method");

        let result: RawGetMethodResult = result?;
        if result.exit_code != 0 {
            return Err(Error::ExitCode {
                method: method.to_string(),
                exit_code: result.exit_code,
            });
        }

        result.try_into()
    }

    /// Fetch the balance and status of the account at `address`
    #[instrument(name = "get_contract_state", skip(self))]
    pub async fn get_contract_state(&self, address: Address) -> Result<ContractState, Error> {
        let (result, duration) = measure_duration!(log_if_error!(
            match &self.inner {
                #[cfg(feature = "testing")]
                Provider::Mock(x) => x.get_address_information(address).await,

                Provider::Toncenter(x) => x.get_address_information(address).await,
            },
            Error::is_remote
        ));

        metric!(histogram[ton_rpc] = duration.as_millis(), method = "get_contract_state");
        metric!(on error result => counter [ ton_rpc_error ] = 1, method = "get_contract_state");

        result
    }

    /// Fetch the native balance of `address`, in nanotons
    pub async fn get_balance(&self, address: Address) -> Result<Coins, Error> {
        self.get_contract_state(address).await?.balance()
    }

    /// Fetch the seqno of the wallet at `address`, 0 when the wallet is not deployed yet
    #[instrument(name = "get_seqno", skip(self))]
    pub async fn get_seqno(&self, address: Address) -> Result<u32, Error> {
        if !self.get_contract_state(address).await?.is_active() {
            return Ok(0);
        }

        let result = self.run_get_method(address, "seqno", &[]).await?;
        let seqno = result.entry(0)?.as_number()?;

        u32::try_from(seqno).map_err(|_| Error::Format(format!("invalid seqno {}", seqno)))
    }

    /// Resolve the jetton wallet of `owner` for the jetton `master`
    #[instrument(name = "fetch_jetton_wallet_address", skip(self))]
    pub async fn fetch_jetton_wallet_address(&self, master: Address, owner: Address) -> Result<Address, Error> {
        let result = self
            .run_get_method(master, "get_wallet_address", &[StackArgument::address(owner)?])
            .await?;

        let cell = result.entry(0)?.as_cell()?;
        Address::load(&mut cell.parse())?.ok_or(Error::InvalidAddress("jetton master returned no address".to_string()))
    }

    /// Fetch the balance held by `jetton_wallet`, 0 when the wallet is not deployed yet
    #[instrument(name = "fetch_jetton_balance", skip(self))]
    pub async fn fetch_jetton_balance(&self, jetton_wallet: Address) -> Result<Coins, Error> {
        if !self.get_contract_state(jetton_wallet).await?.is_active() {
            return Ok(Coins::ZERO);
        }

        let result = self.run_get_method(jetton_wallet, "get_wallet_data", &[]).await?;
        let balance = result.entry(0)?.as_number()?;

        u128::try_from(balance)
            .map_err(|_| Error::InvalidAmount(format!("negative balance {}", balance)))
            .and_then(Coins::new)
    }

    /// Returns up to `limit` transactions of `address`, most recent first. When `from` is set the
    /// listing starts at that transaction, included, and goes back in time.
    #[instrument(name = "get_transactions", skip(self))]
    pub async fn get_transactions(&self, address: Address, limit: u32, from: Option<&TransactionId>) -> Result<Vec<Transaction>, Error> {
        let (result, duration) = measure_duration!(log_if_error!(
            match &self.inner {
                #[cfg(feature = "testing")]
                Provider::Mock(x) => x.get_transactions(address, limit, from).await,

                Provider::Toncenter(x) => x.get_transactions(address, limit, from).await,
            },
            Error::is_remote
        ));

        metric!(histogram[ton_rpc] = duration.as_millis(), method = "get_transactions");
        metric!(on error result => counter [ ton_rpc_error ] = 1, method = "get_transactions");

        result
    }

    /// Looks for the transaction designated by `hash` in the history of `address`, walking back
    /// `page_size` transactions at a time for at most `max_pages` pages. `hash` is either the
    /// transaction hash or the hash of the request it executed.
    #[instrument(name = "find_transaction", skip(self))]
    pub async fn find_transaction(&self, address: Address, hash: &str, page_size: u32, max_pages: u32) -> Result<Option<Transaction>, Error> {
        let mut cursor: Option<TransactionId> = None;

        for _ in 0..max_pages {
            let page = self.get_transactions(address, page_size, cursor.as_ref()).await?;
            let exhausted = page.len() < page_size as usize;

            let mut last = None;
            for transaction in page {
                // pages overlap on the transaction they start from
                if cursor.as_ref() == Some(&transaction.transaction_id) {
                    continue;
                }

                if transaction.matches(hash) {
                    return Ok(Some(transaction));
                }

                last = Some(transaction.transaction_id);
            }

            match last {
                Some(id) if !exhausted => cursor = Some(id),
                _ => return Ok(None),
            }
        }

        tracing::debug!(pages = max_pages, "transaction not found in the lookup window");
        Ok(None)
    }
}
