use std::fmt::Debug;

use async_trait::async_trait;

use crate::client::{ContractState, RawGetMethodResult, StackArgument, Transaction, TransactionId};
use crate::{Address, Error, Network};

#[async_trait]
pub trait MockTonProvider: 'static + Send + Sync + Debug {
    fn new() -> Self
    where
        Self: Sized;

    fn network(&self) -> Network {
        Network::Mainnet
    }

    async fn run_get_method(&self, _address: Address, _method: &str, _stack: &[StackArgument]) -> Result<RawGetMethodResult, Error> {
        unimplemented!()
    }

    async fn get_address_information(&self, _address: Address) -> Result<ContractState, Error> {
        unimplemented!()
    }

    async fn get_transactions(&self, _address: Address, _limit: u32, _from: Option<&TransactionId>) -> Result<Vec<Transaction>, Error> {
        unimplemented!()
    }
}
