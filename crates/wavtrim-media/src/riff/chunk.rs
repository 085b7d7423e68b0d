//! Fixed-layout chunk definitions and their byte codecs.

use super::ChunkId;
use crate::{Error, Result};
use bytes::{Buf, BufMut, BytesMut};
use std::io::{self, Read, Write};

/// Size of the RIFF header (`RIFF`, size, `WAVE`).
pub const RIFF_HEADER_SIZE: u64 = 12;
/// Size of the `fmt ` chunk including its 8-byte header.
pub const FORMAT_CHUNK_SIZE: u64 = 24;
/// Size of the `data` chunk header, not counting PCM samples.
pub const DATA_HEADER_SIZE: u64 = 8;
/// Offset of the first PCM byte in files laid out by this crate.
pub const PCM_OFFSET: u64 = RIFF_HEADER_SIZE + FORMAT_CHUNK_SIZE + DATA_HEADER_SIZE;

/// Payload size of a plain PCM `fmt ` chunk.
const FORMAT_PAYLOAD_SIZE: u32 = 16;
/// `wFormatTag` for uncompressed linear PCM.
pub const WAVE_FORMAT_PCM: u16 = 1;

/// A unit of the container that can be unpacked from and packed to a stream.
pub trait Chunk: Sized {
    /// Chunk name used in error messages.
    const NAME: &'static str;

    /// Read the chunk from the current position of `reader`.
    fn unpack<R: Read>(reader: &mut R) -> Result<Self>;

    /// Write the chunk at the current position of `writer`.
    fn pack<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    /// Number of bytes `pack` writes.
    fn packed_len(&self) -> u64;
}

/// Fill `buf` from `reader`, reporting a short read as a truncated `chunk`.
pub(crate) fn read_chunk_bytes<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    chunk: &'static str,
) -> Result<()> {
    reader
        .read_exact(buf)
        .map_err(|e| Error::from_read(chunk, e))
}

/// Read a 4-byte tag.
pub(crate) fn read_tag<R: Read>(reader: &mut R, chunk: &'static str) -> Result<ChunkId> {
    let mut tag = [0u8; 4];
    read_chunk_bytes(reader, &mut tag, chunk)?;
    Ok(ChunkId::from_bytes(tag))
}

/// Convert a chunk length to its 32-bit size field.
pub(crate) fn size_field(len: u64, chunk: &'static str) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} chunk of {} bytes exceeds the 4 GiB RIFF limit", chunk, len),
        )
    })
}

fn get_tag(buf: &mut &[u8]) -> ChunkId {
    let mut tag = [0u8; 4];
    buf.copy_to_slice(&mut tag);
    ChunkId::from_bytes(tag)
}

/// The 12-byte file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiffHeader {
    /// Always `RIFF`.
    pub id: ChunkId,
    /// Total file size minus 8.
    pub size: u32,
    /// Always `WAVE`.
    pub form: ChunkId,
}

impl RiffHeader {
    /// Header for a file of `total_len` bytes.
    pub fn for_total_len(total_len: u32) -> Self {
        Self {
            id: ChunkId::RIFF,
            size: total_len.saturating_sub(8),
            form: ChunkId::WAVE,
        }
    }
}

impl Chunk for RiffHeader {
    const NAME: &'static str = "RIFF";

    fn unpack<R: Read>(reader: &mut R) -> Result<Self> {
        let id = read_tag(reader, Self::NAME)?;
        if id != ChunkId::RIFF {
            return Err(Error::bad_magic(ChunkId::RIFF, id));
        }

        let mut rest = [0u8; 8];
        read_chunk_bytes(reader, &mut rest, Self::NAME)?;
        let mut buf = &rest[..];
        let size = buf.get_u32_le();
        let form = get_tag(&mut buf);
        if form != ChunkId::WAVE {
            return Err(Error::bad_magic(ChunkId::WAVE, form));
        }

        Ok(Self { id, size, form })
    }

    fn pack<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = BytesMut::with_capacity(RIFF_HEADER_SIZE as usize);
        buf.put_slice(&self.id.0);
        buf.put_u32_le(self.size);
        buf.put_slice(&self.form.0);
        writer.write_all(&buf)
    }

    fn packed_len(&self) -> u64 {
        RIFF_HEADER_SIZE
    }
}

/// The `fmt ` chunk describing the PCM encoding.
///
/// Byte rate and block alignment are derived from the other fields when the
/// chunk is built with [`FormatChunk::pcm`]; a decoded chunk keeps whatever
/// values the file stored so it packs back byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct FormatChunk {
    #[cfg_attr(feature = "serialize", serde(skip))]
    id: ChunkId,
    #[cfg_attr(feature = "serialize", serde(skip))]
    size: u32,
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl FormatChunk {
    /// Build a linear PCM format description.
    pub fn pcm(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        let block_align = (u32::from(channels) * u32::from(bits_per_sample) / 8) as u16;
        Self {
            id: ChunkId::FMT,
            size: FORMAT_PAYLOAD_SIZE,
            audio_format: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(u32::from(block_align)),
            block_align,
            bits_per_sample,
        }
    }

    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// Encoding tag, 1 for PCM.
    pub fn audio_format(&self) -> u16 {
        self.audio_format
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bytes of PCM per second of playback.
    pub fn byte_rate(&self) -> u32 {
        self.byte_rate
    }

    /// Bytes per multi-channel sample frame.
    pub fn block_align(&self) -> u16 {
        self.block_align
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }
}

impl Chunk for FormatChunk {
    const NAME: &'static str = "fmt ";

    fn unpack<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; FORMAT_CHUNK_SIZE as usize];
        read_chunk_bytes(reader, &mut raw, Self::NAME)?;

        let mut buf = &raw[..];
        Ok(Self {
            id: get_tag(&mut buf),
            size: buf.get_u32_le(),
            audio_format: buf.get_u16_le(),
            channels: buf.get_u16_le(),
            sample_rate: buf.get_u32_le(),
            byte_rate: buf.get_u32_le(),
            block_align: buf.get_u16_le(),
            bits_per_sample: buf.get_u16_le(),
        })
    }

    fn pack<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = BytesMut::with_capacity(FORMAT_CHUNK_SIZE as usize);
        buf.put_slice(&self.id.0);
        buf.put_u32_le(self.size);
        buf.put_u16_le(self.audio_format);
        buf.put_u16_le(self.channels);
        buf.put_u32_le(self.sample_rate);
        buf.put_u32_le(self.byte_rate);
        buf.put_u16_le(self.block_align);
        buf.put_u16_le(self.bits_per_sample);
        writer.write_all(&buf)
    }

    fn packed_len(&self) -> u64 {
        FORMAT_CHUNK_SIZE
    }
}

/// Header of the `data` chunk. The samples themselves are not part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub id: ChunkId,
    /// Declared PCM length in bytes.
    pub size: u32,
}

impl DataChunk {
    /// Empty `data` header, grown as PCM is written.
    pub fn new() -> Self {
        Self {
            id: ChunkId::DATA,
            size: 0,
        }
    }

    /// Header plus samples.
    pub fn raw_size(&self) -> u64 {
        DATA_HEADER_SIZE + u64::from(self.size)
    }
}

impl Default for DataChunk {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunk for DataChunk {
    const NAME: &'static str = "data";

    fn unpack<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; DATA_HEADER_SIZE as usize];
        read_chunk_bytes(reader, &mut raw, Self::NAME)?;

        let mut buf = &raw[..];
        Ok(Self {
            id: get_tag(&mut buf),
            size: buf.get_u32_le(),
        })
    }

    fn pack<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = BytesMut::with_capacity(DATA_HEADER_SIZE as usize);
        buf.put_slice(&self.id.0);
        buf.put_u32_le(self.size);
        writer.write_all(&buf)
    }

    fn packed_len(&self) -> u64 {
        DATA_HEADER_SIZE
    }
}
