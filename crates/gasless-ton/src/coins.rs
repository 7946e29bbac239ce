use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use serde_with::SerializeDisplay;

use crate::cell::{CellBuilder, CellSlice, Store};
use crate::Error;

/// Amount of nanotons or jetton base units, serialized as `VarUInteger 16`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay)]
pub struct Coins(u128);

impl Coins {
    pub const ZERO: Self = Self(0);

    /// Largest amount representable on 15 bytes
    pub const MAX: Self = Self((1u128 << 120) - 1);

    pub fn new(value: u128) -> Result<Self, Error> {
        if value > Self::MAX.0 {
            return Err(Error::InvalidAmount(format!("{} exceeds the maximum amount", value)));
        }

        Ok(Self(value))
    }

    pub const fn from_nano(value: u64) -> Self {
        Self(value as u128)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn load(slice: &mut CellSlice) -> Result<Self, Error> {
        let length = slice.load_uint(4)? as usize;
        Self::new(slice.load_uint(length * 8)?)
    }
}

impl Store for Coins {
    fn store(&self, builder: CellBuilder) -> CellBuilder {
        let length = (128 - self.0.leading_zeros() as usize).div_ceil(8);

        builder.store_uint(4, length as u128).store_uint(length * 8, self.0)
    }
}

impl Display for Coins {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Coins {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|x| x.is_ascii_digit()) {
            return Err(Error::InvalidAmount(format!("{:?} is not a non-negative integer", s)));
        }

        let value = s
            .parse::<u128>()
            .map_err(|_| Error::InvalidAmount(format!("{} exceeds the maximum amount", s)))?;

        Self::new(value)
    }
}

/// Accepts the decimal string written by `Serialize` as well as plain JSON numbers
impl<'de> Deserialize<'de> for Coins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoinsVisitor;

        impl Visitor<'_> for CoinsVisitor {
            type Value = Coins;

            fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
                f.write_str("a non-negative integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Coins::from_str(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Coins::from_nano(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(Coins::from_nano)
                    .map_err(|_| E::custom(format!("negative amount {}", v)))
            }
        }

        deserializer.deserialize_any(CoinsVisitor)
    }
}

impl From<u64> for Coins {
    fn from(value: u64) -> Self {
        Self::from_nano(value)
    }
}
