use serde::{Deserialize, Serialize};

pub const DEFAULT_MAINNET_ENDPOINT: &str = "https://toncenter.com/api/v2";
pub const DEFAULT_TESTNET_ENDPOINT: &str = "https://testnet.toncenter.com/api/v2";

/// TON network, either Mainnet or Testnet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// Global id of the network as found in the block headers
    pub fn global_id(&self) -> i32 {
        match self {
            Self::Mainnet => -239,
            Self::Testnet => -3,
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Mainnet => DEFAULT_MAINNET_ENDPOINT,
            Self::Testnet => DEFAULT_TESTNET_ENDPOINT,
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(self, Self::Testnet)
    }
}
