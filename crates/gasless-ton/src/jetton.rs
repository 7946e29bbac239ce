use crate::cell::{Cell, CellBuilder, CellSlice, Store};
use crate::constants::{Amount, Opcode};
use crate::{Address, Coins, Error};

/// TEP-74 `transfer` request sent to the owner's jetton wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JettonTransfer {
    pub query_id: u64,
    pub amount: Coins,
    pub destination: Address,
    /// Receives the excess of attached TON once the transfer completes
    pub response_destination: Address,
    pub custom_payload: Option<Cell>,
    pub forward_ton_amount: Coins,
    pub forward_payload: Option<Cell>,
}

impl JettonTransfer {
    /// Transfer of `amount` to `destination` without notification payload, excesses going to
    /// `response_destination`
    pub fn new(amount: Coins, destination: Address, response_destination: Address) -> Self {
        Self {
            query_id: 0,
            amount,
            destination,
            response_destination,
            custom_payload: None,
            forward_ton_amount: Amount::FORWARD_TON_AMOUNT,
            forward_payload: None,
        }
    }

    pub fn to_cell(&self) -> Result<Cell, Error> {
        CellBuilder::new().store(self).build()
    }

    pub fn load(slice: &mut CellSlice) -> Result<Self, Error> {
        let op = slice.load_uint(32)? as u32;
        if op != Opcode::JETTON_TRANSFER {
            return Err(Error::Format(format!("unexpected op {:#010x}", op)));
        }

        let query_id = slice.load_uint(64)? as u64;
        let amount = Coins::load(slice)?;
        let destination = Address::load(slice)?.ok_or(Error::InvalidAddress("missing destination".to_string()))?;
        let response_destination = Address::load(slice)?.ok_or(Error::InvalidAddress("missing response destination".to_string()))?;
        let custom_payload = slice.load_maybe_ref()?;
        let forward_ton_amount = Coins::load(slice)?;
        let forward_payload = slice.load_maybe_ref()?;

        Ok(Self {
            query_id,
            amount,
            destination,
            response_destination,
            custom_payload,
            forward_ton_amount,
            forward_payload,
        })
    }
}

impl Store for JettonTransfer {
    fn store(&self, builder: CellBuilder) -> CellBuilder {
        builder
            .store_uint(32, Opcode::JETTON_TRANSFER as u128)
            .store_uint(64, self.query_id as u128)
            .store(self.amount)
            .store(self.destination)
            .store(self.response_destination)
            .store_maybe_ref(self.custom_payload.as_ref())
            .store(self.forward_ton_amount)
            // forward_payload:(Either Cell ^Cell), only the reference form is produced
            .store_maybe_ref(self.forward_payload.as_ref())
    }
}
