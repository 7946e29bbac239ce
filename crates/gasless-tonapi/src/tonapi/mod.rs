use std::time::Duration;

use gasless_ton::Address;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client as HTTPClient, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{EstimateRequest, GaslessConfig, SendRequest, SignRawParams};
use crate::Error;

pub const DEFAULT_TONAPI_ENDPOINT: &str = "https://tonapi.io";
pub const DEFAULT_TONAPI_TESTNET_ENDPOINT: &str = "https://testnet.tonapi.io";

fn default_endpoint() -> String {
    DEFAULT_TONAPI_ENDPOINT.to_string()
}

fn default_timeout() -> u64 {
    10
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TonApiConfiguration {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for TonApiConfiguration {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout: default_timeout(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client of the TonAPI gasless relayer
#[derive(Clone)]
pub struct TonApiClient {
    endpoint: Url,
    client: HTTPClient,
}

impl TonApiClient {
    pub fn new(configuration: &TonApiConfiguration) -> Result<Self, Error> {
        let endpoint = Url::parse(&configuration.endpoint).map_err(|e| Error::URL(e.to_string()))?;

        let mut headers = HeaderMap::new();
        if let Some(api_key) = &configuration.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| Error::Internal("invalid api key".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = HTTPClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(configuration.timeout))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { endpoint, client })
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.endpoint.join(path).map_err(|e| Error::URL(e.to_string()))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String, Error> {
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text).map(|x| x.error).unwrap_or(text);

            return Err(Error::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }

    async fn parse<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let text = self.execute(request).await?;

        serde_json::from_str(&text).map_err(|e| Error::Format(e.to_string()))
    }

    pub async fn gasless_config(&self) -> Result<GaslessConfig, Error> {
        let url = self.url("/v2/gasless/config")?;

        self.parse(self.client.get(url)).await
    }

    pub async fn gasless_estimate(&self, master: Address, request: &EstimateRequest) -> Result<SignRawParams, Error> {
        let url = self.url(&format!("/v2/gasless/estimate/{}", master.to_raw_string()))?;

        self.parse(self.client.post(url).json(request)).await
    }

    pub async fn gasless_send(&self, request: &SendRequest) -> Result<(), Error> {
        let url = self.url("/v2/gasless/send")?;

        self.execute(self.client.post(url).json(request)).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use gasless_ton::cell::Cell;
    use gasless_ton::keys::PublicKey;
    use gasless_ton::{Address, Coins};
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::tonapi::{TonApiClient, TonApiConfiguration};
    use crate::types::{EstimateMessage, EstimateRequest, SendRequest};
    use crate::Error;

    const RELAY: &str = "0:dfbd5be8497fdc0c9fcbdfc676864840ddf8ad6423d6d5657d9b0e8270d6c8e1";
    const USDT: &str = "0:b113a994b5024a16719f69139328eb759596c38a25f59028b146fecdc3621dfe";
    const PUBLIC_KEY: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn client(server: &MockServer) -> TonApiClient {
        TonApiClient::new(&TonApiConfiguration {
            endpoint: server.uri(),
            api_key: Some("secret".to_string()),
            timeout: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_config_with_bearer_token() {
        // Given
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/gasless/config"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "relay_address": RELAY, "gas_jettons": [{ "master_id": USDT }] })))
            .expect(1)
            .mount(&server)
            .await;

        // When
        let config = client(&server).gasless_config().await.unwrap();

        // Then
        assert_eq!(config.relay_address, Address::from_str(RELAY).unwrap());
        assert_eq!(config.gas_jettons.len(), 1);
    }

    #[tokio::test]
    async fn estimates_with_raw_master_in_path() {
        // Given
        let server = MockServer::start().await;
        let master = Address::from_str(USDT).unwrap();
        Mock::given(method("POST"))
            .and(path(format!("/v2/gasless/estimate/{}", USDT)))
            .and(body_partial_json(json!({ "wallet_public_key": PUBLIC_KEY, "messages": [{ "boc": Cell::empty().to_boc_hex() }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "relay_address": RELAY,
                "commission": "5000000",
                "valid_until": 1717397217,
                "messages": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = EstimateRequest {
            wallet_address: Address::from_str(RELAY).unwrap(),
            wallet_public_key: PublicKey::from_str(PUBLIC_KEY).unwrap(),
            messages: vec![EstimateMessage::new(&Cell::empty())],
        };

        // When
        let params = client(&server).gasless_estimate(master, &request).await.unwrap();

        // Then
        assert_eq!(params.commission, Coins::from_nano(5_000_000));
        assert!(params.messages.is_empty());
    }

    #[tokio::test]
    async fn send_posts_boc_and_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/gasless/send"))
            .and(body_json(json!({ "wallet_public_key": PUBLIC_KEY, "boc": "b5ee" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let request = SendRequest {
            wallet_public_key: PublicKey::from_str(PUBLIC_KEY).unwrap(),
            boc: "b5ee".to_string(),
        };

        client(&server).gasless_send(&request).await.unwrap();
    }

    #[tokio::test]
    async fn relayer_errors_are_reported() {
        // Given
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "not enough jettons" })))
            .mount(&server)
            .await;

        let request = SendRequest {
            wallet_public_key: PublicKey::from_str(PUBLIC_KEY).unwrap(),
            boc: "b5ee".to_string(),
        };

        // When
        let result = client(&server).gasless_send(&request).await;

        // Then
        match result {
            Err(Error::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "not enough jettons");
            },
            x => panic!("unexpected result {:?}", x),
        }
    }
}
