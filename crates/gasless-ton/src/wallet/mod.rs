use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellBuilder};
use crate::constants::{Opcode, MAX_ACTIONS, WALLET_V5R1_CODE};
use crate::keys::{KeyPair, PublicKey};
use crate::message::{ExternalMessage, InternalMessage, StateInit};
use crate::{Address, Error, Network};

mod time;
pub use time::ValidUntil;

/// Flags of an `action_send_msg`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendMode(u8);

impl SendMode {
    pub const ORDINARY: Self = Self(0);
    pub const PAY_GAS_SEPARATELY: Self = Self(1);
    pub const IGNORE_ERRORS: Self = Self(2);

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for SendMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Identifier mixing the network with the wallet context, protecting signed requests
/// against replays on another network or wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletId(pub u32);

impl WalletId {
    pub fn new(network_global_id: i32, workchain: i8, subwallet_number: u16) -> Self {
        // client context: is_client:1 workchain:int8 wallet_version:uint8 subwallet_number:uint15
        let context = (1u32 << 31) | ((workchain as u8 as u32) << 23) | (subwallet_number as u32 & 0x7fff);

        Self(network_global_id as u32 ^ context)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WalletConfiguration {
    #[serde(default)]
    pub workchain: i8,

    #[serde(default, alias = "subwallet_id")]
    pub subwallet_number: u16,

    /// Overrides the global id of the configured network
    #[serde(default)]
    pub network_global_id: Option<i32>,

    /// Wallet v5r1 contract code as a base64 bag of cells. Addresses are derived from the
    /// canonical code without it, deploying an undeployed wallet requires it.
    #[serde(default)]
    pub code: Option<String>,
}

/// Wallet v5r1 contract of a key pair
#[derive(Debug, Clone)]
pub struct WalletV5R1 {
    workchain: i8,
    wallet_id: WalletId,
    public_key: PublicKey,
    code: Option<Cell>,

    address: Address,
}

impl WalletV5R1 {
    /// Wallet running `code`, the canonical v5r1 code when `None`
    pub fn new(workchain: i8, wallet_id: WalletId, public_key: PublicKey, code: Option<Cell>) -> Result<Self, Error> {
        let data = Self::data_of(wallet_id, public_key)?;

        let address = match &code {
            Some(code) => {
                if code.id() != WALLET_V5R1_CODE {
                    tracing::warn!(code = %code.hash_hex(), "wallet code differs from the canonical wallet v5r1 code");
                }

                StateInit {
                    code: Some(code.clone()),
                    data: Some(data),
                }
                .address(workchain)?
            },
            None => StateInit::address_of(workchain, Some(WALLET_V5R1_CODE), Some(data.id()))?,
        };

        Ok(Self {
            workchain,
            wallet_id,
            public_key,
            code,
            address,
        })
    }

    pub fn from_configuration(configuration: &WalletConfiguration, network: Network, public_key: PublicKey) -> Result<Self, Error> {
        let code = configuration.code.as_deref().map(Cell::from_boc_base64).transpose()?;
        let network_global_id = configuration.network_global_id.unwrap_or(network.global_id());

        Self::new(
            configuration.workchain,
            WalletId::new(network_global_id, configuration.workchain, configuration.subwallet_number),
            public_key,
            code,
        )
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn wallet_id(&self) -> WalletId {
        self.wallet_id
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    /// State deploying the wallet, only available when its code is known
    pub fn state_init(&self) -> Result<StateInit, Error> {
        let code = self.code.clone().ok_or(Error::MissingWalletCode)?;

        Ok(StateInit {
            code: Some(code),
            data: Some(Self::data_of(self.wallet_id, self.public_key)?),
        })
    }

    fn data_of(wallet_id: WalletId, public_key: PublicKey) -> Result<Cell, Error> {
        CellBuilder::new()
            // is_signature_allowed
            .store_bit(true)
            .store_uint(32, 0)
            .store_uint(32, wallet_id.0 as u128)
            .store_bytes(public_key.as_bytes())
            // no extensions
            .store_bit(false)
            .build()
    }

    /// Signed request asking the wallet to send `messages`, to be relayed through an internal
    /// message. Fails when `key_pair` does not own this wallet.
    pub fn create_transfer(&self, key_pair: &KeyPair, seqno: u32, valid_until: ValidUntil, messages: &[InternalMessage], mode: SendMode) -> Result<Cell, Error> {
        if key_pair.public_key() != self.public_key {
            return Err(Error::InvalidKey("key pair does not own this wallet".to_string()));
        }

        let actions = out_list(messages, mode)?;

        let request = CellBuilder::new()
            .store_uint(32, Opcode::SIGNED_INTERNAL as u128)
            .store_uint(32, self.wallet_id.0 as u128)
            .store_uint(32, valid_until.0 as u128)
            .store_uint(32, seqno as u128)
            .store_maybe_ref(actions.as_ref())
            // no extended actions
            .store_bit(false)
            .build()?;

        let signature = key_pair.sign(&request.hash());

        CellBuilder::new().store_cell(&request).store_bytes(&signature).build()
    }

    /// External message delivering `body` to the wallet, deploying it on its first request
    pub fn external_message(&self, seqno: u32, body: Cell) -> Result<ExternalMessage, Error> {
        let state_init = match seqno {
            0 => Some(self.state_init()?.to_cell()?),
            _ => None,
        };

        Ok(ExternalMessage {
            destination: self.address,
            state_init,
            body,
        })
    }
}

/// `OutList` of one `action_send_msg` per message, the first message at the head of the list.
/// `None` when there is nothing to send.
fn out_list(messages: &[InternalMessage], mode: SendMode) -> Result<Option<Cell>, Error> {
    if messages.len() > MAX_ACTIONS {
        return Err(Error::CellOverflow(format!("{} actions exceed the {} actions limit", messages.len(), MAX_ACTIONS)));
    }

    if messages.is_empty() {
        return Ok(None);
    }

    let mut list = Cell::empty();
    for message in messages.iter().rev() {
        list = CellBuilder::new()
            .store_ref(list)
            .store_uint(32, Opcode::ACTION_SEND_MSG as u128)
            .store_uint(8, mode.bits() as u128)
            .store_ref(message.to_cell()?)
            .build()?;
    }

    Ok(Some(list))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use zeroize::Zeroizing;

    use crate::cell::{Cell, CellBuilder};
    use crate::constants::{Opcode, WALLET_V5R1_CODE};
    use crate::keys::KeyPair;
    use crate::message::{InternalMessage, StateInit};
    use crate::wallet::{SendMode, ValidUntil, WalletConfiguration, WalletId, WalletV5R1};
    use crate::{Address, Coins, Error, Network};

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn wallet(key_pair: &KeyPair) -> WalletV5R1 {
        let code = CellBuilder::new().store_uint(8, 0xff).build().unwrap();
        WalletV5R1::new(0, WalletId::new(Network::Mainnet.global_id(), 0, 0), key_pair.public_key(), Some(code)).unwrap()
    }

    fn message(amount: u64) -> InternalMessage {
        InternalMessage {
            bounce: true,
            destination: Address::from_str("0:1111111111111111111111111111111111111111111111111111111111111111").unwrap(),
            value: Coins::from_nano(amount),
            state_init: None,
            body: None,
        }
    }

    #[test]
    fn default_mainnet_wallet_id() {
        assert_eq!(WalletId::new(-239, 0, 0).0, 2147483409);
    }

    #[test]
    fn testnet_wallet_id_differs() {
        assert_eq!(WalletId::new(-3, 0, 0).0, 0x7ffffffd);
        assert_ne!(WalletId::new(-3, 0, 0), WalletId::new(-239, 0, 0));
    }

    #[test]
    fn address_is_derived_from_state_init() {
        let key_pair = KeyPair::from_hex(SEED).unwrap();
        let wallet = wallet(&key_pair);

        let state_init = wallet.state_init().unwrap().to_cell().unwrap();

        assert_eq!(wallet.address(), Address::from_state_init(0, &state_init));
    }

    #[test]
    fn mainnet_address_of_known_key() {
        // Given
        let public_key = KeyPair::from_hex(SEED).unwrap().public_key();

        // When
        let wallet = WalletV5R1::from_configuration(&WalletConfiguration::default(), Network::Mainnet, public_key).unwrap();

        // Then
        assert_eq!(wallet.wallet_id().0, 2147483409);
        assert_eq!(wallet.address().to_raw_string(), "0:94a7ae12249e74e5d21d7201c31b5a03f0928c2d7a50ceee56ea52c57501ad03");
        assert_eq!(wallet.address().to_friendly(false, false), "UQCUp64SJJ505dIdcgHDG1oD8JKMLXpQzu5W6lLFdQGtA8kY");
    }

    #[test]
    fn canonical_code_is_referenced_by_identity() {
        let key_pair = KeyPair::from_hex(SEED).unwrap();
        let code = CellBuilder::new().store_uint(8, 0xff).build().unwrap();
        let wallet_id = WalletId::new(Network::Mainnet.global_id(), 0, 0);

        let full = WalletV5R1::new(0, wallet_id, key_pair.public_key(), Some(code.clone())).unwrap();
        let data = full.state_init().unwrap().data.unwrap();

        assert_eq!(full.address(), StateInit::address_of(0, Some(code.id()), Some(data.id())).unwrap());
        assert_eq!(
            WalletV5R1::new(0, wallet_id, key_pair.public_key(), None).unwrap().address(),
            StateInit::address_of(0, Some(WALLET_V5R1_CODE), Some(data.id())).unwrap()
        );
    }

    #[test]
    fn deployment_requires_the_code() {
        let public_key = KeyPair::from_hex(SEED).unwrap().public_key();
        let wallet = WalletV5R1::from_configuration(&WalletConfiguration::default(), Network::Mainnet, public_key).unwrap();

        assert!(matches!(wallet.external_message(0, Cell::empty()), Err(Error::MissingWalletCode)));
        assert_eq!(wallet.external_message(1, Cell::empty()).unwrap().destination, wallet.address());
    }

    #[test]
    fn transfer_is_signed_over_request_hash() {
        // Given
        let key_pair = KeyPair::from_hex(SEED).unwrap();
        let wallet = wallet(&key_pair);

        // When
        let body = wallet
            .create_transfer(&key_pair, 7, ValidUntil(1_700_000_000), &[message(1)], SendMode::PAY_GAS_SEPARATELY | SendMode::IGNORE_ERRORS)
            .unwrap();

        // Then
        let mut slice = body.parse();
        assert_eq!(slice.load_uint(32).unwrap() as u32, Opcode::SIGNED_INTERNAL);
        assert_eq!(slice.load_uint(32).unwrap(), 2147483409);
        assert_eq!(slice.load_uint(32).unwrap(), 1_700_000_000);
        assert_eq!(slice.load_uint(32).unwrap(), 7);
        let actions = slice.load_maybe_ref().unwrap().unwrap();
        assert!(!slice.load_bit().unwrap());
        let signature = slice.load_bits(512).unwrap();
        assert_eq!(slice.remaining_bits(), 0);

        let unsigned = CellBuilder::new()
            .store_bits(body.data(), body.bits() - 512)
            .store_ref(actions.clone())
            .build()
            .unwrap();
        assert!(key_pair.verify(&unsigned.hash(), &signature));

        let mut action = actions.parse();
        assert_eq!(action.load_ref().unwrap(), Cell::empty());
        assert_eq!(action.load_uint(32).unwrap() as u32, Opcode::ACTION_SEND_MSG);
        assert_eq!(action.load_uint(8).unwrap(), 3);
        assert_eq!(action.load_ref().unwrap(), message(1).to_cell().unwrap());
    }

    #[test]
    fn actions_keep_message_order() {
        let key_pair = KeyPair::from_hex(SEED).unwrap();
        let wallet = wallet(&key_pair);

        let body = wallet
            .create_transfer(&key_pair, 0, ValidUntil(1_700_000_000), &[message(1), message(2)], SendMode::PAY_GAS_SEPARATELY)
            .unwrap();

        let head = body.refs()[0].clone();
        let mut slice = head.parse();
        let next = slice.load_ref().unwrap();
        slice.skip_bits(40).unwrap();
        assert_eq!(slice.load_ref().unwrap(), message(1).to_cell().unwrap());

        let mut slice = next.parse();
        assert_eq!(slice.load_ref().unwrap(), Cell::empty());
        slice.skip_bits(40).unwrap();
        assert_eq!(slice.load_ref().unwrap(), message(2).to_cell().unwrap());
    }

    #[test]
    fn foreign_key_pair_is_rejected() {
        let owner = KeyPair::from_hex(SEED).unwrap();
        let other = KeyPair::from_seed(Zeroizing::new([7u8; 32]));

        let result = wallet(&owner).create_transfer(&other, 0, ValidUntil(1), &[], SendMode::ORDINARY);

        assert!(result.is_err());
    }

    #[test]
    fn state_init_is_only_attached_to_first_request() {
        let key_pair = KeyPair::from_hex(SEED).unwrap();
        let wallet = wallet(&key_pair);

        let first = wallet.external_message(0, Cell::empty()).unwrap();
        let next = wallet.external_message(1, Cell::empty()).unwrap();

        assert_eq!(first.state_init, Some(wallet.state_init().unwrap().to_cell().unwrap()));
        assert_eq!(next.state_init, None);
        assert_eq!(first.destination, wallet.address());
    }

    #[test]
    fn too_many_actions_are_rejected() {
        let key_pair = KeyPair::from_hex(SEED).unwrap();
        let messages = vec![message(1); 256];

        let result = wallet(&key_pair).create_transfer(&key_pair, 0, ValidUntil(1), &messages, SendMode::ORDINARY);

        assert!(result.is_err());
    }
}
