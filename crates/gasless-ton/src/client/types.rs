use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::cell::{Cell, CellBuilder};
use crate::{Address, Coins, Error};

/// Argument pushed on the stack of a get-method
#[derive(Debug, Clone, PartialEq)]
pub enum StackArgument {
    Number(i128),
    Slice(Cell),
}

impl StackArgument {
    /// Slice holding `address`
    pub fn address(address: Address) -> Result<Self, Error> {
        Ok(Self::Slice(CellBuilder::new().store(address).build()?))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(x) => json!(["num", x.to_string()]),
            Self::Slice(x) => json!(["tvm.Slice", x.to_boc_base64()]),
        }
    }
}

/// Value left on the stack by a get-method
#[derive(Debug, Clone, PartialEq)]
pub enum StackEntry {
    Number(i128),
    Cell(Cell),
    Other(Value),
}

impl StackEntry {
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        let kind = value.get(0).and_then(Value::as_str);
        let content = value.get(1);

        match (kind, content) {
            (Some("num"), Some(Value::String(x))) => parse_number(x).map(Self::Number),
            (Some("cell" | "slice"), Some(x)) => {
                let bytes = x
                    .get("bytes")
                    .and_then(Value::as_str)
                    .ok_or(Error::Format(format!("cell entry without bytes {}", value)))?;

                Ok(Self::Cell(Cell::from_boc_base64(bytes)?))
            },
            _ => Ok(Self::Other(value.clone())),
        }
    }

    pub fn as_number(&self) -> Result<i128, Error> {
        match self {
            Self::Number(x) => Ok(*x),
            x => Err(Error::Format(format!("expected a number, found {:?}", x))),
        }
    }

    pub fn as_cell(&self) -> Result<&Cell, Error> {
        match self {
            Self::Cell(x) => Ok(x),
            x => Err(Error::Format(format!("expected a cell, found {:?}", x))),
        }
    }
}

fn parse_number(value: &str) -> Result<i128, Error> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(x) => (true, x),
        None => (false, value),
    };

    let magnitude = match digits.strip_prefix("0x") {
        Some(x) => i128::from_str_radix(x, 16),
        None => digits.parse::<i128>(),
    }
    .map_err(|e| Error::Format(format!("invalid stack number {}: {}", value, e)))?;

    Ok(if negative { -magnitude } else { magnitude })
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGetMethodResult {
    pub exit_code: i32,

    #[serde(default)]
    pub gas_used: u64,

    #[serde(default)]
    pub stack: Vec<Value>,
}

/// Outcome of a successful get-method execution
#[derive(Debug, Clone, PartialEq)]
pub struct GetMethodResult {
    pub gas_used: u64,
    pub stack: Vec<StackEntry>,
}

impl GetMethodResult {
    pub fn entry(&self, index: usize) -> Result<&StackEntry, Error> {
        self.stack
            .get(index)
            .ok_or(Error::Format(format!("stack has no entry at index {}", index)))
    }
}

impl TryFrom<RawGetMethodResult> for GetMethodResult {
    type Error = Error;

    fn try_from(value: RawGetMethodResult) -> Result<Self, Self::Error> {
        Ok(Self {
            gas_used: value.gas_used,
            stack: value.stack.iter().map(StackEntry::from_json).collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,

    #[serde(alias = "uninit")]
    Uninitialized,

    Frozen,

    #[serde(other)]
    Nonexist,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractState {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub balance: u128,

    pub state: AccountStatus,
}

impl ContractState {
    pub fn is_active(&self) -> bool {
        self.state == AccountStatus::Active
    }

    pub fn balance(&self) -> Result<Coins, Error> {
        Coins::new(self.balance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionId {
    pub lt: String,

    /// Base64 encoded transaction hash
    pub hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageData {
    /// Base64 encoded bag of cells
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub destination: String,

    #[serde(default)]
    pub msg_data: Option<MessageData>,
}

/// Transaction as reported by the chain client
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub utime: u64,

    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub fee: u128,

    #[serde(default)]
    pub in_msg: Option<RawMessage>,

    #[serde(default)]
    pub out_msgs: Vec<RawMessage>,
}

impl Transaction {
    pub fn hash_hex(&self) -> Option<String> {
        STANDARD.decode(&self.transaction_id.hash).ok().map(hex::encode)
    }

    /// Representation hash of the inbound message body
    pub fn in_msg_body_hash(&self) -> Option<String> {
        let body = self.in_msg.as_ref()?.msg_data.as_ref()?.body.as_ref()?;

        Cell::from_boc_base64(body).ok().map(|x| x.hash_hex())
    }

    /// Whether `hash` designates this transaction or the request it executed
    pub fn matches(&self, hash: &str) -> bool {
        let hash = hash.trim_start_matches("0x").to_lowercase();

        self.hash_hex().as_deref() == Some(hash.as_str()) || self.in_msg_body_hash().as_deref() == Some(hash.as_str())
    }
}
