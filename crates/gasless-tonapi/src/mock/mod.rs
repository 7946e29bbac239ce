use std::fmt::Debug;

use async_trait::async_trait;
use gasless_ton::Address;

use crate::types::{EstimateRequest, GaslessConfig, SendRequest, SignRawParams};
use crate::Error;

#[async_trait]
pub trait MockGaslessApi: 'static + Send + Sync + Debug {
    fn new() -> Self
    where
        Self: Sized;

    async fn gasless_config(&self) -> Result<GaslessConfig, Error> {
        unimplemented!()
    }

    async fn gasless_estimate(&self, _master: Address, _request: &EstimateRequest) -> Result<SignRawParams, Error> {
        unimplemented!()
    }

    async fn gasless_send(&self, _request: &SendRequest) -> Result<(), Error> {
        unimplemented!()
    }
}
