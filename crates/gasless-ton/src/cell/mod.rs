use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::Error;

mod boc;
mod builder;
mod slice;

pub use builder::{CellBuilder, Store};
pub use slice::CellSlice;

/// Maximum number of data bits held by a single cell
pub const MAX_BITS: usize = 1023;

/// Maximum number of references held by a single cell
pub const MAX_REFS: usize = 4;

struct Inner {
    data: Vec<u8>,
    bits: usize,
    refs: Vec<Cell>,

    hash: [u8; 32],
    depth: u16,
}

/// Representation hash and depth of a cell, all a parent needs to compute its own hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId {
    pub hash: [u8; 32],
    pub depth: u16,
}

impl CellId {
    /// Identity of the cell holding `bits` bits of `data` and referencing `refs`
    pub fn of(data: &[u8], bits: usize, refs: &[CellId]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(descriptors(bits, refs.len()));
        hasher.update(padded_data(data, bits));
        for reference in refs {
            hasher.update(reference.depth.to_be_bytes());
        }
        for reference in refs {
            hasher.update(reference.hash);
        }

        Self {
            hash: hasher.finalize().into(),
            depth: refs.iter().map(|x| x.depth + 1).max().unwrap_or(0),
        }
    }
}

/// Immutable ordinary TON cell. Cloning is cheap, the content is shared.
#[derive(Clone)]
pub struct Cell(Arc<Inner>);

impl Cell {
    /// Creates a cell from `bits` bits packed MSB first in `data`. Bits after `bits` in the
    /// last byte are ignored.
    pub fn new(mut data: Vec<u8>, bits: usize, refs: Vec<Cell>) -> Result<Self, Error> {
        if bits > MAX_BITS {
            return Err(Error::CellOverflow(format!("{} bits exceed the {} bits limit", bits, MAX_BITS)));
        }

        if refs.len() > MAX_REFS {
            return Err(Error::CellOverflow(format!("{} references exceed the {} references limit", refs.len(), MAX_REFS)));
        }

        if data.len() * 8 < bits {
            return Err(Error::CellUnderflow(format!("{} bytes cannot hold {} bits", data.len(), bits)));
        }

        data.truncate(bits.div_ceil(8));
        if bits % 8 != 0 {
            let last = data.len() - 1;
            data[last] &= 0xffu8 << (8 - bits % 8);
        }

        Ok(Self::from_parts(data, bits, refs))
    }

    /// Cell without data nor references
    pub fn empty() -> Self {
        Self::from_parts(vec![], 0, vec![])
    }

    fn from_parts(data: Vec<u8>, bits: usize, refs: Vec<Cell>) -> Self {
        let ids: Vec<CellId> = refs.iter().map(Cell::id).collect();
        let CellId { hash, depth } = CellId::of(&data, bits, &ids);

        Self(Arc::new(Inner { data, bits, refs, hash, depth }))
    }

    pub fn bits(&self) -> usize {
        self.0.bits
    }

    pub fn data(&self) -> &[u8] {
        &self.0.data
    }

    pub fn refs(&self) -> &[Cell] {
        &self.0.refs
    }

    /// Representation hash of the cell
    pub fn hash(&self) -> [u8; 32] {
        self.0.hash
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.0.hash)
    }

    pub fn depth(&self) -> u16 {
        self.0.depth
    }

    pub fn id(&self) -> CellId {
        CellId {
            hash: self.0.hash,
            depth: self.0.depth,
        }
    }

    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice::new(self)
    }

    /// Serializes the tree rooted at this cell as a bag of cells
    pub fn to_boc(&self) -> Vec<u8> {
        boc::serialize(self)
    }

    pub fn to_boc_hex(&self) -> String {
        hex::encode(self.to_boc())
    }

    pub fn to_boc_base64(&self) -> String {
        STANDARD.encode(self.to_boc())
    }

    /// Deserializes a bag of cells holding exactly one root
    pub fn from_boc(bytes: &[u8]) -> Result<Self, Error> {
        let mut roots = boc::deserialize(bytes)?;
        if roots.len() != 1 {
            return Err(Error::Boc(format!("expected a single root, found {}", roots.len())));
        }

        Ok(roots.remove(0))
    }

    pub fn from_boc_hex(value: &str) -> Result<Self, Error> {
        let bytes = hex::decode(value).map_err(|e| Error::Boc(e.to_string()))?;
        Self::from_boc(&bytes)
    }

    pub fn from_boc_base64(value: &str) -> Result<Self, Error> {
        let bytes = STANDARD.decode(value).map_err(|e| Error::Boc(e.to_string()))?;
        Self::from_boc(&bytes)
    }

    fn descriptors(&self) -> [u8; 2] {
        descriptors(self.bits(), self.refs().len())
    }

    fn padded_data(&self) -> Vec<u8> {
        padded_data(self.data(), self.bits())
    }
}

fn descriptors(bits: usize, refs: usize) -> [u8; 2] {
    [refs as u8, (bits / 8 + bits.div_ceil(8)) as u8]
}

/// Data bytes with the completion tag appended when the bit length is not byte aligned
fn padded_data(data: &[u8], bits: usize) -> Vec<u8> {
    let mut padded = data[..bits.div_ceil(8)].to_vec();
    if bits % 8 != 0 {
        let last = padded.len() - 1;
        padded[last] |= 0x80 >> (bits % 8);
    }

    padded
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash.hash(state)
    }
}

impl Debug for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bits())
            .field("data", &hex::encode(self.data()))
            .field("refs", &self.refs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cell_has_well_known_hash() {
        assert_eq!(Cell::empty().hash_hex(), "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7");
        assert_eq!(Cell::empty().depth(), 0);
    }

    #[test]
    fn new_ignores_bits_past_the_length() {
        let a = Cell::new(vec![0b1011_1111], 3, vec![]).unwrap();
        let b = Cell::new(vec![0b1010_0000], 3, vec![]).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.data(), &[0b1010_0000]);
    }

    #[test]
    fn new_rejects_too_many_bits() {
        let result = Cell::new(vec![0; 128], 1024, vec![]);
        assert!(matches!(result, Err(Error::CellOverflow(_))));
    }

    #[test]
    fn new_rejects_too_many_refs() {
        let refs = vec![Cell::empty(); 5];
        let result = Cell::new(vec![], 0, refs);
        assert!(matches!(result, Err(Error::CellOverflow(_))));
    }

    #[test]
    fn depth_follows_deepest_reference() {
        let leaf = Cell::empty();
        let middle = Cell::new(vec![], 0, vec![leaf.clone()]).unwrap();
        let root = Cell::new(vec![], 0, vec![leaf, middle]).unwrap();

        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn id_is_enough_to_hash_a_parent() {
        let leaf = Cell::new(vec![0xab, 0xc0], 10, vec![]).unwrap();
        let middle = Cell::new(vec![0x01], 8, vec![leaf.clone()]).unwrap();
        let root = Cell::new(vec![0xf0], 4, vec![middle.clone(), leaf.clone()]).unwrap();

        let id = CellId::of(root.data(), root.bits(), &[middle.id(), leaf.id()]);

        assert_eq!(id, root.id());
        assert_eq!(id.depth, 2);
    }

    #[test]
    fn completion_tag_is_part_of_the_hash() {
        let aligned = Cell::new(vec![0x80], 8, vec![]).unwrap();
        let unaligned = Cell::new(vec![0x80], 1, vec![]).unwrap();

        assert_ne!(aligned.hash(), unaligned.hash());
        assert_eq!(unaligned.padded_data(), vec![0xc0]);
        assert_eq!(unaligned.descriptors(), [0, 1]);
    }
}
