use std::io::{self, Write};

/// Size of one offset table record: u64 offset + u32 length, little-endian.
pub const OFFSET_RECORD_SIZE: usize = 12;

/// Longest valid encoding of a u64 varint.
const MAX_VARINT_LEN: usize = 10;

/// Encode a u64 as an unsigned LEB128 varint
pub fn encode_uvarint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a u64 varint from a slice
/// Returns (value, bytes_consumed), or None when truncated or overflowing
pub fn decode_uvarint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return None; // Overflow
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift += 7;
        if i + 1 >= MAX_VARINT_LEN {
            return None;
        }
    }

    None // Incomplete
}

/// Encode a postings record: doc count followed by delta-encoded ids.
/// `ids` must be sorted ascending and duplicate-free.
pub fn encode_postings(ids: &[u64], buf: &mut Vec<u8>) {
    encode_uvarint(ids.len() as u64, buf);
    let mut prev = 0u64;
    for &id in ids {
        encode_uvarint(id - prev, buf);
        prev = id;
    }
}

/// Decode a postings record, stopping after `cap` ids when given.
pub fn decode_postings(buf: &[u8], cap: Option<usize>) -> Result<Vec<u64>, &'static str> {
    let (doc_count, mut pos) = decode_uvarint(buf).ok_or("bad doc count")?;

    let mut max = usize::try_from(doc_count).map_err(|_| "doc count overflow")?;
    if let Some(cap) = cap.filter(|&c| c > 0) {
        max = max.min(cap);
    }

    // doc count comes from disk; never trust it for the allocation size
    let mut result = Vec::with_capacity(max.min(buf.len()));
    let mut prev = 0u64;

    while result.len() < max && pos < buf.len() {
        let (delta, consumed) = decode_uvarint(&buf[pos..]).ok_or("bad delta")?;
        prev = prev.checked_add(delta).ok_or("delta overflow")?;
        result.push(prev);
        pos += consumed;
    }

    Ok(result)
}

/// Write one offset table record
pub fn write_offset_record<W: Write>(writer: &mut W, offset: u64, length: u32) -> io::Result<()> {
    writer.write_all(&offset.to_le_bytes())?;
    writer.write_all(&length.to_le_bytes())
}

/// Read the offset record for a 1-based term id.
/// Returns None for term id 0 or when the record lies past the table end.
pub fn read_offset_record(table: &[u8], term_id: u32) -> Option<(u64, u32)> {
    if term_id == 0 {
        return None;
    }
    let start = (term_id as usize - 1) * OFFSET_RECORD_SIZE;
    let record = table.get(start..start + OFFSET_RECORD_SIZE)?;
    let offset = u64::from_le_bytes(record[0..8].try_into().ok()?);
    let length = u32::from_le_bytes(record[8..12].try_into().ok()?);
    Some((offset, length))
}
