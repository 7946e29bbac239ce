use crate::cell::{Cell, CellBuilder, CellId, Store};
use crate::{Address, Coins, Error};

/// Code and data of a contract to deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInit {
    pub code: Option<Cell>,
    pub data: Option<Cell>,
}

impl StateInit {
    pub fn to_cell(&self) -> Result<Cell, Error> {
        CellBuilder::new().store(self).build()
    }

    /// Address of the contract deployed with this state in `workchain`
    pub fn address(&self, workchain: i8) -> Result<Address, Error> {
        Ok(Address::from_state_init(workchain, &self.to_cell()?))
    }

    /// Address of the contract whose code and data are only known by their identity
    pub fn address_of(workchain: i8, code: Option<CellId>, data: Option<CellId>) -> Result<Address, Error> {
        let header = CellBuilder::new()
            .store_bit(false)
            .store_bit(false)
            .store_bit(code.is_some())
            .store_bit(data.is_some())
            .store_bit(false)
            .build()?;
        let refs: Vec<CellId> = code.into_iter().chain(data).collect();

        Ok(Address::new(workchain, CellId::of(header.data(), header.bits(), &refs).hash))
    }
}

impl Store for StateInit {
    fn store(&self, builder: CellBuilder) -> CellBuilder {
        builder
            // split_depth, special
            .store_bit(false)
            .store_bit(false)
            .store_maybe_ref(self.code.as_ref())
            .store_maybe_ref(self.data.as_ref())
            // library
            .store_bit(false)
    }
}

/// `Maybe (Either StateInit ^StateInit)`, always written as a reference
fn store_state_init(builder: CellBuilder, state_init: Option<&Cell>) -> CellBuilder {
    match state_init {
        Some(state_init) => builder.store_bit(true).store_bit(true).store_ref(state_init.clone()),
        None => builder.store_bit(false),
    }
}

/// `Either X ^X`, inline when `body` fits in the remaining space of `builder`
fn store_body(builder: CellBuilder, body: &Cell) -> CellBuilder {
    let inline = builder.available_bits() > body.bits() && builder.available_refs() >= body.refs().len();

    if inline {
        builder.store_bit(false).store_cell(body)
    } else {
        builder.store_bit(true).store_ref(body.clone())
    }
}

/// Internal message whose source, fees and logical time are filled in by the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalMessage {
    pub bounce: bool,
    pub destination: Address,
    pub value: Coins,
    pub state_init: Option<Cell>,
    pub body: Option<Cell>,
}

impl InternalMessage {
    pub fn to_cell(&self) -> Result<Cell, Error> {
        CellBuilder::new().store(self).build()
    }
}

impl Store for InternalMessage {
    fn store(&self, builder: CellBuilder) -> CellBuilder {
        let builder = builder
            // int_msg_info$0 ihr_disabled bounce bounced
            .store_bit(false)
            .store_bit(true)
            .store_bit(self.bounce)
            .store_bit(false)
            .store(None::<Address>)
            .store(self.destination)
            .store(self.value)
            // no extra currencies
            .store_bit(false)
            // ihr_fee, fwd_fee
            .store(Coins::ZERO)
            .store(Coins::ZERO)
            // created_lt, created_at
            .store_uint(64, 0)
            .store_uint(32, 0);

        let builder = store_state_init(builder, self.state_init.as_ref());
        match &self.body {
            Some(body) => store_body(builder, body),
            None => store_body(builder, &Cell::empty()),
        }
    }
}

/// Inbound external message carrying a signed wallet request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalMessage {
    pub destination: Address,
    pub state_init: Option<Cell>,
    pub body: Cell,
}

impl ExternalMessage {
    pub fn to_cell(&self) -> Result<Cell, Error> {
        CellBuilder::new().store(self).build()
    }
}

impl Store for ExternalMessage {
    fn store(&self, builder: CellBuilder) -> CellBuilder {
        let builder = builder
            // ext_in_msg_info$10
            .store_uint(2, 0b10)
            .store(None::<Address>)
            .store(self.destination)
            // import_fee
            .store(Coins::ZERO);

        store_body(store_state_init(builder, self.state_init.as_ref()), &self.body)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::cell::{Cell, CellBuilder};
    use crate::message::{ExternalMessage, InternalMessage, StateInit};
    use crate::{Address, Coins};

    fn destination() -> Address {
        Address::from_str("0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8").unwrap()
    }

    #[test]
    fn internal_message_header_layout() {
        // Given
        let message = InternalMessage {
            bounce: true,
            destination: destination(),
            value: Coins::from_nano(50_000_000),
            state_init: None,
            body: None,
        };

        // When
        let cell = message.to_cell().unwrap();

        // Then
        let mut slice = cell.parse();
        assert_eq!(slice.load_uint(4).unwrap(), 0b0110);
        assert_eq!(Address::load(&mut slice).unwrap(), None);
        assert_eq!(Address::load(&mut slice).unwrap(), Some(destination()));
        assert_eq!(Coins::load(&mut slice).unwrap(), Coins::from_nano(50_000_000));
        assert!(!slice.load_bit().unwrap());
        assert_eq!(Coins::load(&mut slice).unwrap(), Coins::ZERO);
        assert_eq!(Coins::load(&mut slice).unwrap(), Coins::ZERO);
        assert_eq!(slice.load_uint(64).unwrap(), 0);
        assert_eq!(slice.load_uint(32).unwrap(), 0);
        // no state init, empty inline body
        assert!(!slice.load_bit().unwrap());
        assert!(!slice.load_bit().unwrap());
        assert_eq!(slice.remaining_bits(), 0);
    }

    #[test]
    fn small_body_is_inlined() {
        let body = CellBuilder::new().store_uint(32, 0xdeadbeef).build().unwrap();
        let message = InternalMessage {
            bounce: false,
            destination: destination(),
            value: Coins::ZERO,
            state_init: None,
            body: Some(body),
        };

        let cell = message.to_cell().unwrap();

        assert!(cell.refs().is_empty());
        let mut slice = cell.parse();
        slice.skip_bits(cell.bits() - 33).unwrap();
        assert!(!slice.load_bit().unwrap());
        assert_eq!(slice.load_uint(32).unwrap(), 0xdeadbeef);
    }

    #[test]
    fn large_body_is_stored_as_reference() {
        let body = CellBuilder::new().store_bits(&[0xaa; 128], 1000).build().unwrap();
        let message = InternalMessage {
            bounce: true,
            destination: destination(),
            value: Coins::ZERO,
            state_init: None,
            body: Some(body.clone()),
        };

        let cell = message.to_cell().unwrap();

        assert_eq!(cell.refs(), &[body]);
    }

    #[test]
    fn external_message_embeds_state_init_by_reference() {
        let state_init = StateInit {
            code: Some(Cell::empty()),
            data: Some(Cell::empty()),
        }
        .to_cell()
        .unwrap();

        let message = ExternalMessage {
            destination: destination(),
            state_init: Some(state_init.clone()),
            body: Cell::empty(),
        };

        let cell = message.to_cell().unwrap();

        let mut slice = cell.parse();
        assert_eq!(slice.load_uint(2).unwrap(), 0b10);
        assert_eq!(Address::load(&mut slice).unwrap(), None);
        assert_eq!(Address::load(&mut slice).unwrap(), Some(destination()));
        assert_eq!(Coins::load(&mut slice).unwrap(), Coins::ZERO);
        assert!(slice.load_bit().unwrap());
        assert!(slice.load_bit().unwrap());
        assert_eq!(slice.load_ref().unwrap(), state_init);
    }

    #[test]
    fn state_init_address_is_its_hash() {
        let state_init = StateInit {
            code: Some(Cell::empty()),
            data: None,
        };

        let address = state_init.address(0).unwrap();

        assert_eq!(address.workchain(), 0);
        assert_eq!(address.hash(), &state_init.to_cell().unwrap().hash());
    }

    #[test]
    fn address_only_needs_the_identity_of_code_and_data() {
        // Given
        let code = Cell::new(vec![0xff, 0x00], 16, vec![Cell::new(vec![0x2a], 8, vec![]).unwrap()]).unwrap();
        let data = Cell::new(vec![0x80], 1, vec![]).unwrap();
        let state_init = StateInit {
            code: Some(code.clone()),
            data: Some(data.clone()),
        };

        // When
        let address = StateInit::address_of(-1, Some(code.id()), Some(data.id())).unwrap();

        // Then
        assert_eq!(address, Address::from_state_init(-1, &state_init.to_cell().unwrap()));
    }
}
