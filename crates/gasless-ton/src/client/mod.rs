use std::time::Duration;

use gasless_common::fallback::{self, FailurePredicate, WithFallback};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as HTTPClient, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::{Address, Error, ToncenterConfiguration};

mod types;
pub use types::{
    AccountStatus, ContractState, GetMethodResult, MessageData, RawGetMethodResult, RawMessage, StackArgument, StackEntry, Transaction, TransactionId,
};

macro_rules! call_with_fallback {
    ($self: ident . $method: ident ( $($arg: expr),* )) => {
        $self
            .0
            .call(|x| async move { x.$method( $($arg),* ).await })
            .await
            .map_err(|e| match e {
                fallback::Error::Inner(e) => e,
                fallback::Error::Rejected => {
                    tracing::warn!("every toncenter endpoint is unavailable");
                    Error::Internal("could not connect to endpoint".to_string())
                },
            })
    };
}

/// Envelope of every Toncenter v2 response
#[derive(Deserialize)]
struct Response {
    ok: bool,
    result: Option<Value>,
    error: Option<String>,
    code: Option<i64>,
}

#[derive(Clone)]
struct ToncenterRPCClient {
    url: Url,
    client: HTTPClient,
}

impl ToncenterRPCClient {
    fn new(endpoint: &str, api_key: Option<&str>, timeout: u64) -> Result<Self, Error> {
        let url = Url::parse(&format!("{}/jsonRPC", endpoint.trim_end_matches('/'))).map_err(|e| Error::URL(e.to_string()))?;

        let mut headers = HeaderMap::new();
        if let Some(api_key) = api_key {
            headers.insert("X-API-Key", HeaderValue::from_str(api_key).map_err(|_| Error::Internal("invalid api key".to_string()))?);
        }

        let client = HTTPClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .build()?;

        Ok(Self { url, client })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, Error> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&json!({ "id": 1, "jsonrpc": "2.0", "method": method, "params": params }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }

        let response = serde_json::from_str::<Response>(&text).map_err(|e| {
            if status.is_success() {
                Error::Format(e.to_string())
            } else {
                Error::Provider {
                    code: status.as_u16() as i64,
                    message: text.clone(),
                }
            }
        })?;

        if !response.ok {
            return Err(Error::Provider {
                code: response.code.unwrap_or(status.as_u16() as i64),
                message: response.error.unwrap_or_else(|| status.to_string()),
            });
        }

        let result = response.result.ok_or(Error::Format(format!("{} returned no result", method)))?;
        serde_json::from_value(result).map_err(|e| Error::Format(e.to_string()))
    }

    async fn run_get_method(&self, address: Address, method: &str, stack: &[StackArgument]) -> Result<RawGetMethodResult, Error> {
        let stack: Vec<Value> = stack.iter().map(StackArgument::to_json).collect();
        let params = json!({ "address": address.to_string(), "method": method, "stack": stack });

        self.request("runGetMethod", params).await
    }

    async fn get_address_information(&self, address: Address) -> Result<ContractState, Error> {
        self.request("getAddressInformation", json!({ "address": address.to_string() }))
            .await
    }

    async fn get_transactions(&self, address: Address, limit: u32, from: Option<&TransactionId>) -> Result<Vec<Transaction>, Error> {
        let mut params = json!({ "address": address.to_string(), "limit": limit, "archival": true });
        if let Some(from) = from {
            params["lt"] = json!(from.lt);
            params["hash"] = json!(from.hash);
        }

        self.request("getTransactions", params).await
    }
}

impl FailurePredicate<Error> for ToncenterRPCClient {
    fn is_err(&self, err: &Error) -> bool {
        match err {
            Error::HTTP(_) | Error::RateLimited => true,
            Error::Provider { code, .. } => *code >= 500,
            _ => false,
        }
    }
}

/// Toncenter v2 client. Requests go to the main endpoint and switch to the fallbacks
/// while its circuit is open.
#[derive(Clone)]
pub struct ToncenterClient(WithFallback<ToncenterRPCClient>);

impl ToncenterClient {
    pub fn new(configuration: &ToncenterConfiguration) -> Result<Self, Error> {
        let api_key = configuration.api_key.as_deref();
        let endpoint = configuration
            .endpoint
            .as_deref()
            .unwrap_or(configuration.network.default_endpoint());

        let mut endpoints = WithFallback::new().with(ToncenterRPCClient::new(endpoint, api_key, configuration.timeout)?);
        for fallback in &configuration.fallbacks {
            endpoints = endpoints.with(ToncenterRPCClient::new(fallback, api_key, configuration.timeout)?);
        }

        Ok(Self(endpoints))
    }

    #[instrument(name = "run_get_method", skip(self, stack))]
    pub async fn run_get_method(&self, address: Address, method: &str, stack: &[StackArgument]) -> Result<RawGetMethodResult, Error> {
        call_with_fallback!(self.run_get_method(address, method, stack))
    }

    #[instrument(name = "get_address_information", skip(self))]
    pub async fn get_address_information(&self, address: Address) -> Result<ContractState, Error> {
        call_with_fallback!(self.get_address_information(address))
    }

    #[instrument(name = "get_transactions", skip(self))]
    pub async fn get_transactions(&self, address: Address, limit: u32, from: Option<&TransactionId>) -> Result<Vec<Transaction>, Error> {
        call_with_fallback!(self.get_transactions(address, limit, from))
    }
}
