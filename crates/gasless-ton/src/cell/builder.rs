use crate::cell::{Cell, MAX_BITS, MAX_REFS};
use crate::Error;

/// Value which can be appended to a [`CellBuilder`]
pub trait Store {
    fn store(&self, builder: CellBuilder) -> CellBuilder;
}

impl Store for Cell {
    fn store(&self, builder: CellBuilder) -> CellBuilder {
        builder.store_ref(self.clone())
    }
}

impl<T: Store> Store for &T {
    fn store(&self, builder: CellBuilder) -> CellBuilder {
        (*self).store(builder)
    }
}

/// Chainable cell writer. The first failing write is remembered and reported by [`CellBuilder::build`],
/// every write after it is ignored.
#[derive(Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bits: usize,
    refs: Vec<Cell>,

    fault: Option<Error>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn available_bits(&self) -> usize {
        MAX_BITS - self.bits
    }

    pub fn available_refs(&self) -> usize {
        MAX_REFS - self.refs.len()
    }

    pub fn store_bit(mut self, bit: bool) -> Self {
        if self.fault.is_some() {
            return self;
        }

        if self.bits == MAX_BITS {
            return self.fail(Error::CellOverflow(format!("cannot store more than {} bits", MAX_BITS)));
        }

        self.push_bit(bit);
        self
    }

    /// Stores the `bits` lowest bits of `value`, most significant first
    pub fn store_uint(mut self, bits: usize, value: u128) -> Self {
        if self.fault.is_some() {
            return self;
        }

        if bits < 128 && value >> bits != 0 {
            return self.fail(Error::CellOverflow(format!("{} does not fit in {} bits", value, bits)));
        }

        if bits > self.available_bits() {
            return self.fail(Error::CellOverflow(format!("cannot store {} more bits", bits)));
        }

        for i in (0..bits).rev() {
            let bit = if i >= 128 { false } else { (value >> i) & 1 == 1 };
            self.push_bit(bit);
        }

        self
    }

    /// Stores `value` as a two's complement integer on `bits` bits
    pub fn store_int(self, bits: usize, value: i128) -> Self {
        if bits == 0 || bits > 128 {
            return self.fail(Error::CellOverflow(format!("unsupported integer width {}", bits)));
        }

        let min = if bits == 128 { i128::MIN } else { -(1i128 << (bits - 1)) };
        let max = if bits == 128 { i128::MAX } else { (1i128 << (bits - 1)) - 1 };
        if value < min || value > max {
            return self.fail(Error::CellOverflow(format!("{} does not fit in {} signed bits", value, bits)));
        }

        let mask = if bits == 128 { u128::MAX } else { (1u128 << bits) - 1 };
        self.store_uint(bits, (value as u128) & mask)
    }

    pub fn store_bytes(self, bytes: &[u8]) -> Self {
        self.store_bits(bytes, bytes.len() * 8)
    }

    /// Stores the first `bits` bits of `data`
    pub fn store_bits(mut self, data: &[u8], bits: usize) -> Self {
        if self.fault.is_some() {
            return self;
        }

        if data.len() * 8 < bits {
            return self.fail(Error::CellUnderflow(format!("{} bytes cannot hold {} bits", data.len(), bits)));
        }

        if bits > self.available_bits() {
            return self.fail(Error::CellOverflow(format!("cannot store {} more bits", bits)));
        }

        for i in 0..bits {
            self.push_bit(data[i / 8] & (0x80 >> (i % 8)) != 0);
        }

        self
    }

    pub fn store_ref(mut self, cell: Cell) -> Self {
        if self.fault.is_some() {
            return self;
        }

        if self.refs.len() == MAX_REFS {
            return self.fail(Error::CellOverflow(format!("cannot store more than {} references", MAX_REFS)));
        }

        self.refs.push(cell);
        self
    }

    /// Stores a `Maybe ^Cell`
    pub fn store_maybe_ref(self, cell: Option<&Cell>) -> Self {
        match cell {
            Some(cell) => self.store_bit(true).store_ref(cell.clone()),
            None => self.store_bit(false),
        }
    }

    /// Appends the data bits and references of `cell` in place
    pub fn store_cell(self, cell: &Cell) -> Self {
        let mut builder = self.store_bits(cell.data(), cell.bits());
        for reference in cell.refs() {
            builder = builder.store_ref(reference.clone());
        }

        builder
    }

    pub fn store<T: Store>(self, value: T) -> Self {
        value.store(self)
    }

    pub fn build(self) -> Result<Cell, Error> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }

        Cell::new(self.data, self.bits, self.refs)
    }

    fn fail(mut self, error: Error) -> Self {
        self.fault.get_or_insert(error);
        self
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bits % 8 == 0 {
            self.data.push(0);
        }

        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 0x80 >> (self.bits % 8);
        }

        self.bits += 1;
    }
}

#[cfg(test)]
mod tests {
    use crate::cell::{Cell, CellBuilder};
    use crate::Error;

    #[test]
    fn store_uint_packs_bits_msb_first() {
        let cell = CellBuilder::new().store_uint(4, 0b1010).store_uint(8, 0xff).build().unwrap();

        assert_eq!(cell.bits(), 12);
        assert_eq!(cell.data(), &[0xaf, 0xf0]);
    }

    #[test]
    fn store_uint_rejects_values_wider_than_requested() {
        let result = CellBuilder::new().store_uint(8, 256).build();
        assert!(matches!(result, Err(Error::CellOverflow(_))));
    }

    #[test]
    fn store_int_uses_twos_complement() {
        let cell = CellBuilder::new().store_int(8, -1).store_int(8, -2).build().unwrap();
        assert_eq!(cell.data(), &[0xff, 0xfe]);
    }

    #[test]
    fn store_int_rejects_out_of_range_values() {
        let result = CellBuilder::new().store_int(8, 128).build();
        assert!(matches!(result, Err(Error::CellOverflow(_))));
    }

    #[test]
    fn overflow_is_reported_on_build() {
        // Given a builder already holding 1020 bits
        let builder = CellBuilder::new().store_bits(&[0u8; 128], 1020);
        assert_eq!(builder.available_bits(), 3);

        // When storing 4 more bits
        let result = builder.store_uint(4, 0).store_bit(true).build();

        // Then
        assert!(matches!(result, Err(Error::CellOverflow(_))));
    }

    #[test]
    fn fifth_reference_is_rejected() {
        let mut builder = CellBuilder::new();
        for _ in 0..4 {
            builder = builder.store_ref(Cell::empty());
        }

        assert_eq!(builder.available_refs(), 0);
        assert!(builder.store_ref(Cell::empty()).build().is_err());
    }

    #[test]
    fn store_cell_appends_bits_and_refs() {
        let inner = CellBuilder::new().store_uint(3, 0b101).store_ref(Cell::empty()).build().unwrap();

        let cell = CellBuilder::new().store_bit(true).store_cell(&inner).build().unwrap();

        assert_eq!(cell.bits(), 4);
        assert_eq!(cell.data(), &[0b1101_0000]);
        assert_eq!(cell.refs().len(), 1);
    }

    #[test]
    fn store_maybe_ref_writes_flag() {
        let absent = CellBuilder::new().store_maybe_ref(None).build().unwrap();
        let present = CellBuilder::new().store_maybe_ref(Some(&Cell::empty())).build().unwrap();

        assert_eq!((absent.bits(), absent.refs().len()), (1, 0));
        assert_eq!((present.bits(), present.refs().len()), (1, 1));
        assert_eq!(present.data(), &[0x80]);
    }
}
