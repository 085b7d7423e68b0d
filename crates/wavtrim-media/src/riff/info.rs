//! `LIST/INFO` metadata records.

use super::chunk::{read_chunk_bytes, read_tag, size_field, Chunk};
use super::ChunkId;
use crate::{Error, MalformedError, Result};
use bytes::{BufMut, BytesMut};
use std::io::{self, Read, Write};

/// One tagged text record inside an INFO list.
///
/// On disk the text is followed by a single NUL that is counted in the
/// declared length. The NUL is stripped on unpack and added back on pack,
/// so `text` never carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRecord {
    pub id: ChunkId,
    pub text: Vec<u8>,
}

impl InfoRecord {
    pub fn new(id: ChunkId, text: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    /// Length field written by `pack`: text plus terminator.
    ///
    /// Fails when the text does not fit a 32-bit length field.
    pub fn declared_len(&self) -> io::Result<u32> {
        size_field(self.text.len() as u64 + 1, Self::NAME)
    }

    /// Bytes `pack` writes: tag, length, text, NUL.
    pub fn raw_size(&self) -> u64 {
        8 + self.text.len() as u64 + 1
    }

    /// Text decoded as UTF-8, replacing invalid sequences.
    pub fn text_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }

    /// Unpack a record, also returning how many bytes it occupied.
    fn unpack_counted<R: Read>(reader: &mut R) -> Result<(Self, u64)> {
        let id = read_tag(reader, Self::NAME)?;
        let mut len = [0u8; 4];
        read_chunk_bytes(reader, &mut len, Self::NAME)?;
        let declared = u32::from_le_bytes(len);

        // Bounded read so a corrupt length cannot force a huge allocation.
        let mut text = Vec::new();
        reader
            .by_ref()
            .take(u64::from(declared))
            .read_to_end(&mut text)
            .map_err(|e| Error::from_read(Self::NAME, e))?;
        if text.len() as u64 != u64::from(declared) {
            return Err(MalformedError::Truncated { chunk: Self::NAME }.into());
        }

        if text.last() == Some(&0) {
            text.pop();
        }

        Ok((Self { id, text }, 8 + u64::from(declared)))
    }
}

impl Chunk for InfoRecord {
    const NAME: &'static str = "INFO record";

    fn unpack<R: Read>(reader: &mut R) -> Result<Self> {
        Self::unpack_counted(reader).map(|(record, _)| record)
    }

    fn pack<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = BytesMut::with_capacity(self.raw_size() as usize);
        buf.put_slice(&self.id.0);
        buf.put_u32_le(self.declared_len()?);
        buf.put_slice(&self.text);
        buf.put_u8(0);
        writer.write_all(&buf)
    }

    fn packed_len(&self) -> u64 {
        self.raw_size()
    }
}

/// The optional `LIST` chunk trailing the PCM data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListChunk {
    pub id: ChunkId,
    /// Declared payload size: list type plus all records.
    pub size: u32,
    pub list_type: ChunkId,
    records: Vec<InfoRecord>,
}

impl ListChunk {
    /// Empty `LIST/INFO` chunk.
    pub fn new() -> Self {
        Self {
            id: ChunkId::LIST,
            size: 4,
            list_type: ChunkId::INFO,
            records: Vec::new(),
        }
    }

    /// Records in file order.
    pub fn records(&self) -> &[InfoRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InfoRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record. The size field is refreshed on the next pack.
    pub fn push(&mut self, record: InfoRecord) {
        self.records.push(record);
    }

    /// Text of the first record carrying `id`.
    pub fn get(&self, id: ChunkId) -> Option<&[u8]> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.text.as_slice())
    }

    /// Payload size computed from the current records.
    pub fn payload_size(&self) -> u64 {
        4 + self.records.iter().map(InfoRecord::raw_size).sum::<u64>()
    }

    /// Bytes `pack` writes, header included.
    pub fn raw_size(&self) -> u64 {
        8 + self.payload_size()
    }

    /// Overwrite the declared size with the one computed from the records.
    pub fn sync_size(&mut self) -> io::Result<()> {
        self.size = size_field(self.payload_size(), Self::NAME)?;
        Ok(())
    }
}

impl Default for ListChunk {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a ListChunk {
    type Item = &'a InfoRecord;
    type IntoIter = std::slice::Iter<'a, InfoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Chunk for ListChunk {
    const NAME: &'static str = "LIST";

    fn unpack<R: Read>(reader: &mut R) -> Result<Self> {
        let id = read_tag(reader, Self::NAME)?;
        let mut len = [0u8; 4];
        read_chunk_bytes(reader, &mut len, Self::NAME)?;
        let size = u32::from_le_bytes(len);
        let list_type = read_tag(reader, Self::NAME)?;

        if list_type != ChunkId::INFO {
            return Err(MalformedError::UnsupportedListType(list_type).into());
        }

        // The list type already consumed 4 of the declared bytes.
        let total = u64::from(size.saturating_sub(4));
        let mut consumed = 0u64;
        let mut records = Vec::new();
        while consumed < total {
            let (record, used) = InfoRecord::unpack_counted(reader)?;
            tracing::trace!(tag = %record.id, len = record.text.len(), "INFO record");
            records.push(record);
            consumed += used;
        }

        Ok(Self {
            id,
            size,
            list_type,
            records,
        })
    }

    fn pack<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let size = size_field(self.payload_size(), Self::NAME)?;
        let mut buf = BytesMut::with_capacity(self.raw_size() as usize);
        buf.put_slice(&self.id.0);
        buf.put_u32_le(size);
        buf.put_slice(&self.list_type.0);
        let mut out = buf.writer();
        for record in &self.records {
            record.pack(&mut out)?;
        }
        writer.write_all(out.get_ref())
    }

    fn packed_len(&self) -> u64 {
        self.raw_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    fn list_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(b"INFO");
        bytes.extend_from_slice(b"INAM\x06\0\0\0intro\0");
        bytes.extend_from_slice(b"ISFT\x0e\0\0\0Lavf58.76.100\0");
        bytes
    }

    #[test]
    fn test_record_strips_nul() {
        let mut cur = Cursor::new(&b"IENG\x0b\0\0\0engineer X\0"[..]);
        let record = InfoRecord::unpack(&mut cur).unwrap();
        assert_eq!(record.id, ChunkId::IENG);
        assert_eq!(record.text, b"engineer X");
        assert_eq!(record.declared_len().unwrap(), 11);
    }

    #[test]
    fn test_record_without_nul_keeps_text() {
        let mut cur = Cursor::new(&b"INAM\x04\0\0\0song"[..]);
        let record = InfoRecord::unpack(&mut cur).unwrap();
        assert_eq!(record.text, b"song");

        // Re-encoding always terminates, so the record grows by one byte.
        let mut out = Vec::new();
        record.pack(&mut out).unwrap();
        assert_eq!(out, b"INAM\x05\0\0\0song\0");
    }

    #[test]
    fn test_record_pack_then_unpack() {
        for text in ["", "a", "engineer X", "merry christmas"] {
            let record = InfoRecord::new(ChunkId::ICMT, text);
            let mut out = Vec::new();
            record.pack(&mut out).unwrap();
            assert_eq!(out.len(), 8 + text.len() + 1);
            assert_eq!(out.len() as u64, record.packed_len());

            let back = InfoRecord::unpack(&mut Cursor::new(out)).unwrap();
            assert_eq!(back.text, text.as_bytes());
        }
    }

    #[test]
    fn test_record_pack_does_not_mutate() {
        let record = InfoRecord::new(ChunkId::ICMT, "x");
        let mut out = Vec::new();
        record.pack(&mut out).unwrap();
        record.pack(&mut out).unwrap();
        assert_eq!(record.text, b"x");
        assert_eq!(out.len(), 2 * 10);
    }

    #[test]
    fn test_record_truncated_text() {
        let mut cur = Cursor::new(&b"INAM\x20\0\0\0short\0"[..]);
        let err = InfoRecord::unpack(&mut cur).unwrap_err();
        assert_matches!(
            err,
            Error::Malformed(MalformedError::Truncated { chunk: "INFO record" })
        );
    }

    #[test]
    fn test_list_unpack() {
        let list = ListChunk::unpack(&mut Cursor::new(list_bytes())).unwrap();
        assert_eq!(list.size, 40);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(ChunkId::INAM), Some(&b"intro"[..]));
        assert_eq!(list.get(ChunkId::ISFT), Some(&b"Lavf58.76.100"[..]));
        assert_eq!(list.get(ChunkId::IART), None);
    }

    #[test]
    fn test_list_round_trip() {
        let bytes = list_bytes();
        let list = ListChunk::unpack(&mut Cursor::new(&bytes)).unwrap();
        let mut out = Vec::new();
        list.pack(&mut out).unwrap();
        assert_eq!(out, bytes);
        assert_eq!(list.raw_size(), bytes.len() as u64);
    }

    #[test]
    fn test_list_unsupported_type() {
        let mut bytes = list_bytes();
        bytes[8..12].copy_from_slice(b"adtl");
        let err = ListChunk::unpack(&mut Cursor::new(bytes)).unwrap_err();
        assert_matches!(
            err,
            Error::Malformed(MalformedError::UnsupportedListType(id)) if id == ChunkId(*b"adtl")
        );
    }

    #[test]
    fn test_list_push_updates_size_on_pack() {
        let mut list = ListChunk::new();
        assert_eq!(list.size, 4);
        list.push(InfoRecord::new(ChunkId::IENG, "engineer X"));

        let mut out = Vec::new();
        list.pack(&mut out).unwrap();
        assert_eq!(&out[4..8], &23u32.to_le_bytes());

        list.sync_size().unwrap();
        assert_eq!(list.size, 23);
    }

    #[test]
    fn test_empty_list_round_trip() {
        let bytes = b"LIST\x04\0\0\0INFO";
        let list = ListChunk::unpack(&mut Cursor::new(&bytes[..])).unwrap();
        assert!(list.is_empty());
    }
}
