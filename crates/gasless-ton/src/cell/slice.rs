use crate::cell::Cell;
use crate::Error;

/// Sequential reader over the bits and references of a [`Cell`]
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,

    bit_cursor: usize,
    ref_cursor: usize,
}

impl<'a> CellSlice<'a> {
    pub fn new(cell: &'a Cell) -> Self {
        Self {
            cell,
            bit_cursor: 0,
            ref_cursor: 0,
        }
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bits() - self.bit_cursor
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs().len() - self.ref_cursor
    }

    pub fn load_bit(&mut self) -> Result<bool, Error> {
        self.ensure_bits(1)?;

        let position = self.bit_cursor;
        self.bit_cursor += 1;

        Ok(self.cell.data()[position / 8] & (0x80 >> (position % 8)) != 0)
    }

    pub fn load_uint(&mut self, bits: usize) -> Result<u128, Error> {
        if bits > 128 {
            return Err(Error::CellUnderflow(format!("cannot load {} bits in an integer", bits)));
        }
        self.ensure_bits(bits)?;

        let mut value = 0u128;
        for _ in 0..bits {
            value = (value << 1) | self.load_bit()? as u128;
        }

        Ok(value)
    }

    pub fn load_int(&mut self, bits: usize) -> Result<i128, Error> {
        let value = self.load_uint(bits)?;
        if bits == 0 || bits == 128 {
            return Ok(value as i128);
        }

        let sign = 1u128 << (bits - 1);
        Ok(if value & sign != 0 { value as i128 - (1i128 << bits) } else { value as i128 })
    }

    /// Loads `bits` bits packed MSB first, padding the last byte with zeroes
    pub fn load_bits(&mut self, bits: usize) -> Result<Vec<u8>, Error> {
        self.ensure_bits(bits)?;

        let mut data = vec![0u8; bits.div_ceil(8)];
        for i in 0..bits {
            if self.load_bit()? {
                data[i / 8] |= 0x80 >> (i % 8);
            }
        }

        Ok(data)
    }

    pub fn load_bytes<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let data = self.load_bits(N * 8)?;

        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&data);
        Ok(bytes)
    }

    pub fn load_ref(&mut self) -> Result<Cell, Error> {
        let reference = self
            .cell
            .refs()
            .get(self.ref_cursor)
            .cloned()
            .ok_or(Error::CellUnderflow("no reference left".to_string()))?;

        self.ref_cursor += 1;
        Ok(reference)
    }

    /// Loads a `Maybe ^Cell`
    pub fn load_maybe_ref(&mut self) -> Result<Option<Cell>, Error> {
        match self.load_bit()? {
            true => Ok(Some(self.load_ref()?)),
            false => Ok(None),
        }
    }

    pub fn skip_bits(&mut self, bits: usize) -> Result<(), Error> {
        self.ensure_bits(bits)?;
        self.bit_cursor += bits;

        Ok(())
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), Error> {
        if bits > self.remaining_bits() {
            return Err(Error::CellUnderflow(format!("cannot load {} bits, {} remaining", bits, self.remaining_bits())));
        }

        Ok(())
    }
}
