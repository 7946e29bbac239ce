use std::collections::{HashMap, HashSet};

use crc::{Crc, CRC_32_ISCSI};

use crate::cell::Cell;
use crate::Error;

const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;
const BOC_INDEXED_MAGIC: u32 = 0x68ff65f3;
const BOC_INDEXED_CRC32C_MAGIC: u32 = 0xacc3a728;

const FLAG_HAS_INDEX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;
const FLAG_HAS_CACHE_BITS: u8 = 0x20;

/// Cells of the tree ordered so that every cell comes before the cells it references,
/// with the root first. Identical subtrees are stored once.
fn topological_order(root: &Cell) -> Vec<Cell> {
    fn visit(cell: &Cell, seen: &mut HashSet<[u8; 32]>, order: &mut Vec<Cell>) {
        if !seen.insert(cell.hash()) {
            return;
        }

        for reference in cell.refs() {
            visit(reference, seen, order);
        }
        order.push(cell.clone());
    }

    let mut seen = HashSet::new();
    let mut order = vec![];
    visit(root, &mut seen, &mut order);

    order.reverse();
    order
}

fn bytes_needed(value: usize) -> usize {
    let mut bytes = 1;
    while bytes < 8 && value >> (bytes * 8) != 0 {
        bytes += 1;
    }

    bytes
}

fn write_uint(buffer: &mut Vec<u8>, value: usize, bytes: usize) {
    for i in (0..bytes).rev() {
        buffer.push((value >> (i * 8)) as u8);
    }
}

pub(crate) fn serialize(root: &Cell) -> Vec<u8> {
    let cells = topological_order(root);
    let index: HashMap<[u8; 32], usize> = cells.iter().enumerate().map(|(i, x)| (x.hash(), i)).collect();

    let size_bytes = bytes_needed(cells.len());

    let mut payload = vec![];
    for cell in &cells {
        payload.extend(cell.descriptors());
        payload.extend(cell.padded_data());
        for reference in cell.refs() {
            write_uint(&mut payload, index[&reference.hash()], size_bytes);
        }
    }

    let offset_bytes = bytes_needed(payload.len());

    let mut boc = Vec::with_capacity(payload.len() + 32);
    boc.extend(BOC_GENERIC_MAGIC.to_be_bytes());
    boc.push(FLAG_HAS_CRC32C | size_bytes as u8);
    boc.push(offset_bytes as u8);
    write_uint(&mut boc, cells.len(), size_bytes);
    write_uint(&mut boc, 1, size_bytes);
    write_uint(&mut boc, 0, size_bytes);
    write_uint(&mut boc, payload.len(), offset_bytes);
    write_uint(&mut boc, 0, size_bytes);
    boc.extend(payload);

    let checksum = CASTAGNOLI.checksum(&boc);
    boc.extend(checksum.to_le_bytes());

    boc
}

struct Reader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, count: usize) -> Result<&'a [u8], Error> {
        let end = self
            .cursor
            .checked_add(count)
            .filter(|x| *x <= self.bytes.len())
            .ok_or(Error::Boc("unexpected end of data".to_string()))?;

        let slice = &self.bytes[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    fn read_uint(&mut self, bytes: usize) -> Result<usize, Error> {
        Ok(self.take(bytes)?.iter().fold(0usize, |acc, x| (acc << 8) | *x as usize))
    }
}

struct RawCell {
    data: Vec<u8>,
    bits: usize,
    refs: Vec<usize>,
}

fn read_cell(reader: &mut Reader, size_bytes: usize) -> Result<RawCell, Error> {
    let d1 = reader.read_u8()?;
    let d2 = reader.read_u8()?;

    if d1 & 0x08 != 0 {
        return Err(Error::Boc("exotic cells are not supported".to_string()));
    }
    if d1 >> 5 != 0 {
        return Err(Error::Boc("cells with a non-zero level are not supported".to_string()));
    }
    if d1 & 0x10 != 0 {
        return Err(Error::Boc("cells with stored hashes are not supported".to_string()));
    }

    let refs_count = (d1 & 0x07) as usize;
    let length = d2.div_ceil(2) as usize;
    let mut data = reader.take(length)?.to_vec();

    let bits = if d2 % 2 == 0 {
        length * 8
    } else {
        let last = data.last().copied().unwrap_or(0);
        if last == 0 {
            return Err(Error::Boc("missing completion tag".to_string()));
        }

        let padding = last.trailing_zeros() as usize + 1;
        if let Some(x) = data.last_mut() {
            *x &= !(1u8 << (padding - 1));
        }
        length * 8 - padding
    };

    let mut refs = Vec::with_capacity(refs_count);
    for _ in 0..refs_count {
        refs.push(reader.read_uint(size_bytes)?);
    }

    Ok(RawCell { data, bits, refs })
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<Vec<Cell>, Error> {
    let mut reader = Reader { bytes, cursor: 0 };

    let magic = u32::from_be_bytes(
        reader
            .take(4)?
            .try_into()
            .map_err(|_| Error::Boc("invalid magic".to_string()))?,
    );

    let (has_index, has_crc32c, size_bytes) = match magic {
        BOC_GENERIC_MAGIC => {
            let flags = reader.read_u8()?;
            if flags & FLAG_HAS_CACHE_BITS != 0 && flags & FLAG_HAS_INDEX == 0 {
                return Err(Error::Boc("cache bits require an index".to_string()));
            }
            (flags & FLAG_HAS_INDEX != 0, flags & FLAG_HAS_CRC32C != 0, (flags & 0x07) as usize)
        },
        BOC_INDEXED_MAGIC => (true, false, reader.read_u8()? as usize),
        BOC_INDEXED_CRC32C_MAGIC => (true, true, reader.read_u8()? as usize),
        x => return Err(Error::Boc(format!("unknown magic {:08x}", x))),
    };

    if size_bytes == 0 || size_bytes > 4 {
        return Err(Error::Boc(format!("invalid size bytes {}", size_bytes)));
    }

    if has_crc32c {
        if bytes.len() < 4 {
            return Err(Error::Boc("unexpected end of data".to_string()));
        }

        let (content, checksum) = bytes.split_at(bytes.len() - 4);
        let expected = u32::from_le_bytes([checksum[0], checksum[1], checksum[2], checksum[3]]);
        if CASTAGNOLI.checksum(content) != expected {
            return Err(Error::Boc("checksum mismatch".to_string()));
        }
    }

    let offset_bytes = reader.read_u8()? as usize;
    if offset_bytes == 0 || offset_bytes > 8 {
        return Err(Error::Boc(format!("invalid offset bytes {}", offset_bytes)));
    }

    let cells_count = reader.read_uint(size_bytes)?;
    let roots_count = reader.read_uint(size_bytes)?;
    let _absent = reader.read_uint(size_bytes)?;
    let _total_size = reader.read_uint(offset_bytes)?;

    let roots = if magic == BOC_GENERIC_MAGIC {
        let mut roots = Vec::with_capacity(roots_count.min(cells_count));
        for _ in 0..roots_count {
            roots.push(reader.read_uint(size_bytes)?);
        }
        roots
    } else {
        vec![0]
    };

    if has_index {
        let index_size = cells_count
            .checked_mul(offset_bytes)
            .ok_or(Error::Boc("invalid cell count".to_string()))?;
        reader.take(index_size)?;
    }

    if cells_count > bytes.len() {
        return Err(Error::Boc(format!("{} cells cannot fit in {} bytes", cells_count, bytes.len())));
    }

    let mut raw = Vec::with_capacity(cells_count);
    for _ in 0..cells_count {
        raw.push(read_cell(&mut reader, size_bytes)?);
    }

    let mut cells: Vec<Option<Cell>> = vec![None; cells_count];
    for (i, cell) in raw.into_iter().enumerate().rev() {
        let mut refs = Vec::with_capacity(cell.refs.len());
        for reference in cell.refs {
            if reference <= i {
                return Err(Error::Boc(format!("cell {} references a previous cell {}", i, reference)));
            }
            let reference = cells
                .get(reference)
                .cloned()
                .flatten()
                .ok_or(Error::Boc(format!("cell {} references an unknown cell {}", i, reference)))?;
            refs.push(reference);
        }

        cells[i] = Some(Cell::new(cell.data, cell.bits, refs)?);
    }

    roots
        .into_iter()
        .map(|x| {
            cells
                .get(x)
                .cloned()
                .flatten()
                .ok_or(Error::Boc(format!("unknown root {}", x)))
        })
        .collect()
}

/// CRC-32C (Castagnoli) appended to serialized bags of cells
const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellBuilder;

    #[test]
    fn checksum_is_crc32c() {
        assert_eq!(CASTAGNOLI.checksum(b"123456789"), 0xe3069283);
    }

    #[test]
    fn empty_cell_serializes_to_known_boc() {
        assert_eq!(Cell::empty().to_boc_base64(), "te6cckEBAQEAAgAAAEysuc0=");
    }

    #[test]
    fn empty_cell_parses_from_known_boc() {
        let cell = Cell::from_boc_base64("te6cckEBAQEAAgAAAEysuc0=").unwrap();
        assert_eq!(cell, Cell::empty());
    }

    #[test]
    fn shared_subtrees_are_stored_once() {
        let leaf = CellBuilder::new().store_uint(8, 42).build().unwrap();
        let root = CellBuilder::new().store_ref(leaf.clone()).store_ref(leaf).build().unwrap();

        let boc = root.to_boc();
        // header: magic, flags, offset bytes, then the cell count
        assert_eq!(boc[6], 2);

        let parsed = Cell::from_boc(&boc).unwrap();
        assert_eq!(parsed, root);
        assert_eq!(parsed.refs()[0], parsed.refs()[1]);
    }

    #[test]
    fn unaligned_data_survives_serialization() {
        let root = CellBuilder::new()
            .store_uint(3, 0b101)
            .store_ref(CellBuilder::new().store_uint(13, 0x1abc).build().unwrap())
            .build()
            .unwrap();

        let parsed = Cell::from_boc_hex(&root.to_boc_hex()).unwrap();

        assert_eq!(parsed.bits(), 3);
        assert_eq!(parsed.refs()[0].bits(), 13);
        assert_eq!(parsed.hash(), root.hash());
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut boc = Cell::empty().to_boc();
        let last = boc.len() - 1;
        boc[last] ^= 0xff;

        assert!(matches!(Cell::from_boc(&boc), Err(Error::Boc(_))));
    }

    #[test]
    fn unknown_magic_is_rejected() {
        assert!(Cell::from_boc(&[0xde, 0xad, 0xbe, 0xef, 0x01]).is_err());
    }

    #[test]
    fn boc_without_checksum_is_accepted() {
        // Given the empty cell serialized without crc
        let boc = [0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00];

        // When
        let cell = Cell::from_boc(&boc).unwrap();

        // Then
        assert_eq!(cell, Cell::empty());
    }
}
