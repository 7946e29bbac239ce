use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use crc::{Crc, CRC_16_XMODEM};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::cell::{Cell, CellBuilder, CellSlice, Store};
use crate::Error;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TESTNET: u8 = 0x80;

/// Internal standard address (`addr_std` without anycast)
#[derive(Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Address {
    workchain: i8,
    hash: [u8; 32],
}

impl Address {
    pub const fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Address of the contract deployed with the given `state_init`
    pub fn from_state_init(workchain: i8, state_init: &Cell) -> Self {
        Self::new(workchain, state_init.hash())
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Raw form `workchain:hex`
    pub fn to_raw_string(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    /// User-friendly url-safe form
    pub fn to_friendly(&self, bounceable: bool, testnet: bool) -> String {
        let mut tag = if bounceable { TAG_BOUNCEABLE } else { TAG_NON_BOUNCEABLE };
        if testnet {
            tag |= TAG_TESTNET;
        }

        let mut bytes = Vec::with_capacity(36);
        bytes.push(tag);
        bytes.push(self.workchain as u8);
        bytes.extend(self.hash);
        bytes.extend(XMODEM.checksum(&bytes).to_be_bytes());

        URL_SAFE.encode(bytes)
    }

    /// Loads a `MsgAddress`, `addr_none` being returned as `None`
    pub fn load(slice: &mut CellSlice) -> Result<Option<Self>, Error> {
        match slice.load_uint(2)? {
            0b00 => Ok(None),
            0b10 => {
                if slice.load_bit()? {
                    return Err(Error::InvalidAddress("anycast addresses are not supported".to_string()));
                }

                let workchain = slice.load_int(8)? as i8;
                let hash = slice.load_bytes::<32>()?;
                Ok(Some(Self::new(workchain, hash)))
            },
            x => Err(Error::InvalidAddress(format!("unsupported address tag {:02b}", x))),
        }
    }

    fn parse_raw(s: &str) -> Result<Self, Error> {
        let (workchain, hash) = s
            .split_once(':')
            .ok_or(Error::InvalidAddress(format!("{} is not a raw address", s)))?;

        let workchain = workchain
            .parse::<i8>()
            .map_err(|_| Error::InvalidAddress(format!("invalid workchain {}", workchain)))?;

        let hash = hex::decode(hash)
            .ok()
            .and_then(|x| <[u8; 32]>::try_from(x).ok())
            .ok_or(Error::InvalidAddress(format!("invalid account id {}", hash)))?;

        Ok(Self::new(workchain, hash))
    }

    fn parse_friendly(s: &str) -> Result<Self, Error> {
        let bytes = if s.contains(['-', '_']) { URL_SAFE.decode(s) } else { STANDARD.decode(s) }
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", s, e)))?;

        if bytes.len() != 36 {
            return Err(Error::InvalidAddress(format!("{} has an invalid length", s)));
        }

        let tag = bytes[0] & !TAG_TESTNET;
        if tag != TAG_BOUNCEABLE && tag != TAG_NON_BOUNCEABLE {
            return Err(Error::InvalidAddress(format!("{} has an unknown tag {:#04x}", s, bytes[0])));
        }

        let checksum = u16::from_be_bytes([bytes[34], bytes[35]]);
        if XMODEM.checksum(&bytes[..34]) != checksum {
            return Err(Error::InvalidAddress(format!("{} has an invalid checksum", s)));
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);

        Ok(Self::new(bytes[1] as i8, hash))
    }
}

impl Store for Address {
    fn store(&self, builder: CellBuilder) -> CellBuilder {
        builder
            .store_uint(2, 0b10)
            .store_bit(false)
            .store_int(8, self.workchain as i128)
            .store_bytes(&self.hash)
    }
}

/// `addr_none` when absent
impl Store for Option<Address> {
    fn store(&self, builder: CellBuilder) -> CellBuilder {
        match self {
            Some(address) => address.store(builder),
            None => builder.store_uint(2, 0b00),
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains(':') {
            Self::parse_raw(s)
        } else if s.len() == 48 {
            Self::parse_friendly(s)
        } else {
            Err(Error::InvalidAddress(format!("{:?} is not an address", s)))
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_friendly(true, false))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_raw_string())
    }
}

/// Checksum of user-friendly addresses
const XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::cell::CellBuilder;
    use crate::constants::Jetton;
    use crate::{Address, Error};

    const RAW: &str = "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8";
    const BOUNCEABLE: &str = "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N";
    const NON_BOUNCEABLE: &str = "UQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqEBI";
    const TESTNET_BOUNCEABLE: &str = "kQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqKYH";

    #[test]
    fn every_form_designates_the_same_account() {
        let raw = Address::from_str(RAW).unwrap();

        assert_eq!(Address::from_str(BOUNCEABLE).unwrap(), raw);
        assert_eq!(Address::from_str(NON_BOUNCEABLE).unwrap(), raw);
        assert_eq!(Address::from_str(TESTNET_BOUNCEABLE).unwrap(), raw);
    }

    #[test]
    fn formats_friendly_forms() {
        let address = Address::from_str(RAW).unwrap();

        assert_eq!(address.to_string(), BOUNCEABLE);
        assert_eq!(address.to_friendly(false, false), NON_BOUNCEABLE);
        assert_eq!(address.to_friendly(true, true), TESTNET_BOUNCEABLE);
        assert_eq!(address.to_raw_string(), RAW);
    }

    #[test]
    fn url_safe_and_standard_alphabets_are_accepted() {
        let url_safe = Address::from_str("EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs").unwrap();
        let standard = Address::from_str("EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id/sDs").unwrap();

        assert_eq!(url_safe, standard);
        assert_eq!(url_safe, Jetton::USDT);
        assert_eq!(standard.to_string(), "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs");
    }

    #[test]
    fn masterchain_raw_address_is_parsed() {
        let address = Address::from_str("-1:3333333333333333333333333333333333333333333333333333333333333333").unwrap();

        assert_eq!(address.workchain(), -1);
        assert_eq!(address.hash(), &[0x33; 32]);
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        let inputs = [
            "",
            "not-an-address",
            "0:83dfd552",
            "zz:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8",
            // last checksum character altered
            "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2O",
        ];

        for input in inputs {
            assert!(matches!(Address::from_str(input), Err(Error::InvalidAddress(_))), "{} should be rejected", input);
        }
    }

    #[test]
    fn stored_address_takes_267_bits() {
        let address = Address::from_str(RAW).unwrap();

        let cell = CellBuilder::new().store(address).build().unwrap();
        assert_eq!(cell.bits(), 267);

        let mut slice = cell.parse();
        assert_eq!(Address::load(&mut slice).unwrap(), Some(address));
    }

    #[test]
    fn none_is_stored_as_addr_none() {
        let cell = CellBuilder::new().store(None::<Address>).build().unwrap();

        assert_eq!(cell.bits(), 2);
        assert_eq!(Address::load(&mut cell.parse()).unwrap(), None);
    }

    #[test]
    fn serializes_in_friendly_form() {
        let address = Address::from_str(RAW).unwrap();

        assert_eq!(serde_json::to_string(&address).unwrap(), format!("\"{}\"", BOUNCEABLE));
        assert_eq!(serde_json::from_str::<Address>(&format!("\"{}\"", RAW)).unwrap(), address);
    }
}
