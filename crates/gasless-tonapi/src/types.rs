use gasless_ton::cell::Cell;
use gasless_ton::keys::PublicKey;
use gasless_ton::message::InternalMessage;
use gasless_ton::{Address, Coins};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Jetton accepted by the relayer to pay for the fees
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasJetton {
    pub master_id: Address,
}

/// Gasless settings published by the relayer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GaslessConfig {
    pub relay_address: Address,

    #[serde(default)]
    pub gas_jettons: Vec<GasJetton>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EstimateMessage {
    /// Hex encoded bag of cells of the message
    pub boc: String,
}

impl EstimateMessage {
    pub fn new(message: &Cell) -> Self {
        Self { boc: message.to_boc_hex() }
    }
}

/// Messages a wallet wants to send, submitted to the relayer for a fee estimation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EstimateRequest {
    pub wallet_address: Address,
    pub wallet_public_key: PublicKey,
    pub messages: Vec<EstimateMessage>,
}

/// Message the wallet must send on behalf of the relayer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignRawMessage {
    pub address: Address,
    pub amount: Coins,

    /// Hex encoded bag of cells of the body
    #[serde(default)]
    pub payload: Option<String>,

    /// Hex encoded bag of cells of the state init
    #[serde(default, rename = "stateInit", alias = "state_init")]
    pub state_init: Option<String>,
}

impl SignRawMessage {
    pub fn payload(&self) -> Result<Option<Cell>, Error> {
        decode_cell(self.payload.as_deref())
    }

    pub fn state_init(&self) -> Result<Option<Cell>, Error> {
        decode_cell(self.state_init.as_deref())
    }

    /// Bounceable internal message carrying this request
    pub fn to_internal_message(&self) -> Result<InternalMessage, Error> {
        Ok(InternalMessage {
            bounce: true,
            destination: self.address,
            value: self.amount,
            state_init: self.state_init()?,
            body: self.payload()?,
        })
    }
}

fn decode_cell(value: Option<&str>) -> Result<Option<Cell>, Error> {
    match value {
        Some(x) if !x.is_empty() => Ok(Some(Cell::from_boc_hex(x)?)),
        _ => Ok(None),
    }
}

/// Quote returned by the relayer: the messages to sign and the commission taken in jettons
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignRawParams {
    pub relay_address: Address,
    pub commission: Coins,

    #[serde(default)]
    pub from: Option<Address>,

    pub valid_until: u64,
    pub messages: Vec<SignRawMessage>,
}

/// Signed external message handed over to the relayer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub wallet_public_key: PublicKey,

    /// Hex encoded bag of cells of the external message
    pub boc: String,
}
