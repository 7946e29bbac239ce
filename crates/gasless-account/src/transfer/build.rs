use gasless_ton::cell::Cell;
use gasless_ton::constants::Amount;
use gasless_ton::jetton::JettonTransfer;
use gasless_ton::message::InternalMessage;
use gasless_ton::{Address, Coins};

use crate::types::TransferRequest;
use crate::Error;

/// Unsigned jetton transfer addressed to the jetton wallet of the sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInstruction {
    /// Jetton wallet of the sender
    pub destination: Address,

    /// Attached to cover the storage and forward fees of the jetton wallets, this is not the fee
    pub value: Coins,
    pub body: Cell,
}

impl TransferInstruction {
    /// Builds the transfer of `request` from `jetton_wallet`. The excess of attached value is
    /// refunded to `relay_address`.
    pub fn build(request: &TransferRequest, jetton_wallet: Address, relay_address: Address) -> Result<Self, Error> {
        let body = JettonTransfer::new(request.amount, request.recipient, relay_address).to_cell()?;

        Ok(Self {
            destination: jetton_wallet,
            value: Amount::JETTON_TRANSFER_VALUE,
            body,
        })
    }

    pub fn to_message(&self) -> InternalMessage {
        InternalMessage {
            bounce: true,
            destination: self.destination,
            value: self.value,
            state_init: None,
            body: Some(self.body.clone()),
        }
    }

    pub fn to_cell(&self) -> Result<Cell, Error> {
        Ok(self.to_message().to_cell()?)
    }
}
