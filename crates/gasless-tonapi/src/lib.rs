use gasless_common::{log_if_error, measure_duration, metric};
use gasless_ton::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::tonapi::{TonApiClient, TonApiConfiguration};
use crate::types::{EstimateRequest, GaslessConfig, SendRequest, SignRawParams};

pub mod tonapi;
pub mod types;

#[cfg(feature = "testing")]
pub mod mock;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid url {0}")]
    URL(String),

    #[error(transparent)]
    HTTP(#[from] reqwest::Error),

    #[error("wrong format error {0}")]
    Format(String),

    #[error("relayer rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Ton(#[from] gasless_ton::Error),

    #[error("relayer error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the relayer answered and refused the request
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum Configuration {
    #[cfg(feature = "testing")]
    #[serde(skip)]
    Mock(std::sync::Arc<dyn mock::MockGaslessApi>),

    #[serde(rename = "tonapi")]
    TonApi(TonApiConfiguration),
}

impl Default for Configuration {
    fn default() -> Self {
        Self::TonApi(TonApiConfiguration::default())
    }
}

#[cfg(feature = "testing")]
impl Configuration {
    pub fn mock<T: mock::MockGaslessApi>() -> Self {
        Self::Mock(std::sync::Arc::new(T::new()))
    }
}

/// Client of the gasless relayer, which pays the network fees of a wallet in exchange
/// for a commission in jettons
#[derive(Clone)]
pub enum Client {
    #[cfg(feature = "testing")]
    Mock(std::sync::Arc<dyn mock::MockGaslessApi>),

    TonApi(TonApiClient),
}

impl Client {
    pub fn new(configuration: &Configuration) -> Result<Self, Error> {
        match configuration {
            #[cfg(feature = "testing")]
            Configuration::Mock(x) => Ok(Self::Mock(x.clone())),

            Configuration::TonApi(x) => Ok(Self::TonApi(TonApiClient::new(x)?)),
        }
    }

    #[cfg(feature = "testing")]
    pub fn mock<I: 'static + mock::MockGaslessApi>() -> Self {
        Self::Mock(std::sync::Arc::new(I::new()))
    }

    /// Fetch the relay address and the jettons accepted to pay the fees
    #[instrument(name = "gasless_config", skip(self))]
    pub async fn gasless_config(&self) -> Result<GaslessConfig, Error> {
        let (result, duration) = measure_duration!(log_if_error!(
            match self {
                #[cfg(feature = "testing")]
                Self::Mock(x) => x.gasless_config().await,

                Self::TonApi(x) => x.gasless_config().await,
            },
            Error::is_rejection
        ));

        metric!(counter[relayer_request] = 1, method = "gasless_config");
        metric!(histogram[relayer_request_duration_milliseconds] = duration.as_millis(), method = "gasless_config");
        metric!(on error result => counter [ relayer_request_error ] = 1, method = "gasless_config");

        result
    }

    /// Ask the relayer for the messages to sign in order to send `request` with its fees
    /// paid in the jetton `master`
    #[instrument(name = "gasless_estimate", skip(self, request))]
    pub async fn gasless_estimate(&self, master: Address, request: &EstimateRequest) -> Result<SignRawParams, Error> {
        let (result, duration) = measure_duration!(log_if_error!(
            match self {
                #[cfg(feature = "testing")]
                Self::Mock(x) => x.gasless_estimate(master, request).await,

                Self::TonApi(x) => x.gasless_estimate(master, request).await,
            },
            Error::is_rejection
        ));

        metric!(counter[relayer_request] = 1, method = "gasless_estimate");
        metric!(histogram[relayer_request_duration_milliseconds] = duration.as_millis(), method = "gasless_estimate");
        metric!(on error result => counter [ relayer_request_error ] = 1, method = "gasless_estimate");

        result
    }

    /// Hand the signed external message over to the relayer
    #[instrument(name = "gasless_send", skip(self, request))]
    pub async fn gasless_send(&self, request: &SendRequest) -> Result<(), Error> {
        let (result, duration) = measure_duration!(log_if_error!(
            match self {
                #[cfg(feature = "testing")]
                Self::Mock(x) => x.gasless_send(request).await,

                Self::TonApi(x) => x.gasless_send(request).await,
            },
            Error::is_rejection
        ));

        metric!(counter[relayer_request] = 1, method = "gasless_send");
        metric!(histogram[relayer_request_duration_milliseconds] = duration.as_millis(), method = "gasless_send");
        metric!(on error result => counter [ relayer_request_error ] = 1, method = "gasless_send");

        result
    }
}
