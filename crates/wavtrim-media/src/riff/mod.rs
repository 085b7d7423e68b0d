//! RIFF/WAVE container parsing and writing.
//!
//! Files handled here use the canonical 44-byte layout: `RIFF` header,
//! a 16-byte PCM `fmt ` chunk, the `data` chunk, and optionally a trailing
//! `LIST/INFO` chunk with text metadata.

mod chunk;
mod info;
mod reader;
mod tag;
mod writer;

pub use chunk::{
    Chunk, DataChunk, FormatChunk, RiffHeader, DATA_HEADER_SIZE, FORMAT_CHUNK_SIZE, PCM_OFFSET,
    RIFF_HEADER_SIZE, WAVE_FORMAT_PCM,
};
pub use info::{InfoRecord, ListChunk};
pub use reader::PcmReader;
pub use tag::ChunkId;
pub use writer::PcmWriter;

use std::time::Duration;

/// A WAV container bound to the stream it was decoded from or is being
/// written to.
///
/// The container owns the stream. PCM access goes through
/// [`WavFile::pcm_reader`] or [`WavFile::pcm_writer`], which borrow it.
#[derive(Debug)]
pub struct WavFile<S> {
    stream: S,
    header: RiffHeader,
    format: FormatChunk,
    data: DataChunk,
    list: Option<ListChunk>,
    /// Stream offset of the `RIFF` tag.
    origin: u64,
}

impl<S> WavFile<S> {
    pub fn header(&self) -> &RiffHeader {
        &self.header
    }

    pub fn format(&self) -> &FormatChunk {
        &self.format
    }

    pub fn data(&self) -> &DataChunk {
        &self.data
    }

    /// Declared PCM length in bytes.
    pub fn pcm_len(&self) -> u64 {
        u64::from(self.data.size)
    }

    /// Stream offset of the first PCM byte.
    pub fn pcm_offset(&self) -> u64 {
        self.origin + PCM_OFFSET
    }

    /// INFO metadata, if the file has any.
    pub fn list(&self) -> Option<&ListChunk> {
        self.list.as_ref()
    }

    pub fn list_mut(&mut self) -> Option<&mut ListChunk> {
        self.list.as_mut()
    }

    /// Replace the metadata list. `None` drops it on the next encode.
    pub fn set_list(&mut self, list: Option<ListChunk>) {
        self.list = list;
    }

    /// Append an INFO record, creating the list if needed.
    pub fn push_info(&mut self, record: InfoRecord) {
        self.list.get_or_insert_with(ListChunk::new).push(record);
    }

    /// Playback duration of the declared PCM data.
    pub fn duration(&self) -> Duration {
        pcm_duration(self.pcm_len(), self.format.byte_rate())
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Release the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Duration of `len` PCM bytes at `byte_rate`, truncated to whole nanoseconds.
pub fn pcm_duration(len: u64, byte_rate: u32) -> Duration {
    if byte_rate == 0 {
        return Duration::ZERO;
    }
    let rate = u64::from(byte_rate);
    let secs = len / rate;
    let nanos = (u128::from(len % rate) * 1_000_000_000 / u128::from(rate)) as u32;
    Duration::new(secs, nanos)
}
