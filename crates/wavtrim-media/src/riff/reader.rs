//! Sequential container decoding and the random-access PCM window.

use super::{Chunk, DataChunk, FormatChunk, ListChunk, RiffHeader, WavFile};
use crate::Result;
use std::io::{self, Read, Seek, SeekFrom};

impl<S: Read + Seek> WavFile<S> {
    /// Decode a container starting at the current position of `stream`.
    ///
    /// Chunks are consumed in order: RIFF header, `fmt `, `data` header.
    /// The PCM bytes are not read; they stay reachable through
    /// [`WavFile::pcm_reader`]. Any bytes after the PCM extent are parsed
    /// as a `LIST/INFO` chunk.
    pub fn decode(mut stream: S) -> Result<Self> {
        let origin = stream.stream_position()?;

        let header = RiffHeader::unpack(&mut stream)?;
        let format = FormatChunk::unpack(&mut stream)?;
        let data = DataChunk::unpack(&mut stream)?;

        let pcm_start = stream.stream_position()?;
        let pcm_end = pcm_start + u64::from(data.size);
        let stream_len = stream.seek(SeekFrom::End(0))?;

        tracing::debug!(
            channels = format.channels(),
            sample_rate = format.sample_rate(),
            bits_per_sample = format.bits_per_sample(),
            pcm_len = data.size,
            stream_len,
            "Decoded WAV header"
        );

        let list = if pcm_end >= stream_len {
            None
        } else {
            stream.seek(SeekFrom::Start(pcm_end))?;
            let list = ListChunk::unpack(&mut stream)?;
            tracing::debug!(records = list.len(), "Decoded INFO list");
            Some(list)
        };

        Ok(Self {
            stream,
            header,
            format,
            data,
            list,
            origin,
        })
    }

    /// Random-access view over the declared PCM bytes.
    ///
    /// The view keeps its own cursor, starting at zero, and repositions the
    /// shared stream before every read.
    pub fn pcm_reader(&mut self) -> PcmReader<'_, S> {
        PcmReader {
            start: self.pcm_offset(),
            len: self.pcm_len(),
            pos: 0,
            stream: &mut self.stream,
        }
    }
}

/// Bounded reader over the `data` chunk of a decoded [`WavFile`].
///
/// Offsets are relative to the first PCM byte. Reads stop at the declared
/// PCM length; seeking past it is allowed and reads return EOF there.
#[derive(Debug)]
pub struct PcmReader<'a, S> {
    stream: &'a mut S,
    start: u64,
    len: u64,
    pos: u64,
}

impl<S> PcmReader<'_, S> {
    /// Declared PCM length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left before the end of the window.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }
}

impl<S: Read + Seek> Read for PcmReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let max = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        self.stream.seek(SeekFrom::Start(self.start + self.pos))?;
        let n = self.stream.read(&mut buf[..max])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<S> Seek for PcmReader<'_, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };

        match target {
            Some(offset) => {
                self.pos = offset;
                Ok(offset)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
