use std::str::FromStr;

use gasless_ton::message::InternalMessage;
use gasless_ton::{Address, Coins};
pub use gasless_tonapi::types::SignRawMessage as RelayMessage;
use gasless_tonapi::types::SignRawParams;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Chain transaction as reported by the read client
pub type TransactionReceipt = gasless_ton::client::Transaction;

/// Jetton transfer asked by the owner of the account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    /// Master contract of the transferred jetton
    pub token: Address,
    pub recipient: Address,

    /// Amount in the jetton base units
    pub amount: Coins,
}

impl TransferRequest {
    pub fn new(token: Address, recipient: Address, amount: Coins) -> Self {
        Self { token, recipient, amount }
    }

    /// Parses a request from user input, before anything is sent over the network
    pub fn parse(token: &str, recipient: &str, amount: &str) -> Result<Self, Error> {
        Ok(Self {
            token: Address::from_str(token)?,
            recipient: Address::from_str(recipient)?,
            amount: Coins::from_str(amount)?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymasterTokenConfiguration {
    pub address: Address,
}

/// Jetton used to pay the relayer and the maximum commission accepted for a transfer
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymasterConfiguration {
    pub paymaster_token: PaymasterTokenConfiguration,

    #[serde(default)]
    pub transfer_max_fee: Option<Coins>,
}

impl PaymasterConfiguration {
    /// Configuration of a single call, values of `options` taking precedence
    pub fn with_options(&self, options: &TransferOptions) -> Self {
        Self {
            paymaster_token: PaymasterTokenConfiguration {
                address: options.paymaster_token.unwrap_or(self.paymaster_token.address),
            },
            transfer_max_fee: options.transfer_max_fee.or(self.transfer_max_fee),
        }
    }
}

/// Per call overrides of the account paymaster configuration
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    #[serde(default)]
    pub paymaster_token: Option<Address>,

    #[serde(default)]
    pub transfer_max_fee: Option<Coins>,
}

/// Binding quote of the relayer for one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeQuote {
    /// Commission in the paymaster token base units
    pub commission: Coins,
    pub messages: Vec<RelayMessage>,
}

impl FeeQuote {
    /// Messages the wallet sends on behalf of the relayer
    pub fn internal_messages(&self) -> Result<Vec<InternalMessage>, gasless_tonapi::Error> {
        self.messages.iter().map(RelayMessage::to_internal_message).collect()
    }
}

impl From<SignRawParams> for FeeQuote {
    fn from(value: SignRawParams) -> Self {
        Self {
            commission: value.commission,
            messages: value.messages,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteResult {
    pub fee: Coins,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    /// Hex representation hash of the signed wallet request
    pub hash: String,

    /// Commission paid in the paymaster token base units
    pub fee: Coins,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use gasless_ton::constants::Jetton;
    use gasless_ton::{Address, Coins};

    use crate::types::{PaymasterConfiguration, PaymasterTokenConfiguration, TransferOptions, TransferRequest};
    use crate::Error;

    const RECIPIENT: &str = "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8";

    #[test]
    fn parses_user_input() {
        let request = TransferRequest::parse("EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs", RECIPIENT, "1000").unwrap();

        assert_eq!(request.token, Jetton::USDT);
        assert_eq!(request.recipient, Address::from_str(RECIPIENT).unwrap());
        assert_eq!(request.amount, Coins::from_nano(1000));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(TransferRequest::parse("EQCxE6mU", RECIPIENT, "1000"), Err(Error::InvalidAddress(_))));
        assert!(matches!(TransferRequest::parse(RECIPIENT, "not an address", "1000"), Err(Error::InvalidAddress(_))));
        assert!(matches!(TransferRequest::parse(RECIPIENT, RECIPIENT, "-1"), Err(Error::InvalidAmount(_))));
        assert!(matches!(TransferRequest::parse(RECIPIENT, RECIPIENT, "1.5"), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn call_options_take_precedence() {
        // Given
        let defaults = PaymasterConfiguration {
            paymaster_token: PaymasterTokenConfiguration { address: Jetton::USDT },
            transfer_max_fee: Some(Coins::from_nano(10)),
        };
        let other = Address::from_str(RECIPIENT).unwrap();

        // When
        let overridden = defaults.with_options(&TransferOptions {
            paymaster_token: Some(other),
            transfer_max_fee: Some(Coins::from_nano(20)),
        });
        let kept = defaults.with_options(&TransferOptions::default());

        // Then
        assert_eq!(overridden.paymaster_token.address, other);
        assert_eq!(overridden.transfer_max_fee, Some(Coins::from_nano(20)));
        assert_eq!(kept, defaults);
    }
}
