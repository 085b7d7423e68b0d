//! Container encoding with deferred headers.
//!
//! The header fields that depend on the PCM length cannot be written up
//! front. [`WavFile::create`] reserves their byte ranges, PCM is streamed
//! straight to its final offset, and [`WavFile::encode`] backpatches the
//! reserved ranges once every length is known.

use super::chunk::{
    Chunk, DataChunk, FormatChunk, RiffHeader, DATA_HEADER_SIZE, FORMAT_CHUNK_SIZE, PCM_OFFSET,
    RIFF_HEADER_SIZE,
};
use super::WavFile;
use crate::Result;
use std::io::{self, Seek, SeekFrom, Write};

/// A reserved byte range of the output, relative to the `RIFF` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeferredRegion {
    offset: u64,
    len: u64,
}

impl DeferredRegion {
    const RIFF_HEADER: Self = Self {
        offset: 0,
        len: RIFF_HEADER_SIZE,
    };
    const FORMAT: Self = Self {
        offset: RIFF_HEADER_SIZE,
        len: FORMAT_CHUNK_SIZE,
    };
    const DATA_HEADER: Self = Self {
        offset: RIFF_HEADER_SIZE + FORMAT_CHUNK_SIZE,
        len: DATA_HEADER_SIZE,
    };

    /// Stage `chunk` in memory, then seek to the region and write it.
    fn commit<W, C>(&self, writer: &mut W, origin: u64, chunk: &C) -> io::Result<()>
    where
        W: Write + Seek,
        C: Chunk,
    {
        let mut staged = Vec::with_capacity(self.len as usize);
        chunk.pack(&mut staged)?;
        if staged.len() as u64 != self.len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} chunk packed to {} bytes, region holds {}",
                    C::NAME,
                    staged.len(),
                    self.len
                ),
            ));
        }

        writer.seek(SeekFrom::Start(origin + self.offset))?;
        writer.write_all(&staged)
    }
}

impl<S: Write + Seek> WavFile<S> {
    /// Start a new linear PCM container on `stream`.
    ///
    /// Nothing is written yet: header bytes 0..44 are reserved and the
    /// stream is positioned at the first PCM byte. Call [`WavFile::encode`]
    /// once all samples are written.
    pub fn create(
        mut stream: S,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    ) -> Result<Self> {
        let format = FormatChunk::pcm(sample_rate, channels, bits_per_sample);
        stream.seek(SeekFrom::Start(PCM_OFFSET))?;

        tracing::debug!(
            sample_rate,
            channels,
            bits_per_sample,
            byte_rate = format.byte_rate(),
            "Created WAV container"
        );

        Ok(Self {
            stream,
            header: RiffHeader::for_total_len(PCM_OFFSET as u32),
            format,
            data: DataChunk::new(),
            list: None,
            origin: 0,
        })
    }

    /// Writer appending PCM after the samples already declared.
    ///
    /// Every byte accepted by the stream grows the `data` length.
    pub fn pcm_writer(&mut self) -> io::Result<PcmWriter<'_, S>> {
        let end = self.pcm_offset() + self.pcm_len();
        self.stream.seek(SeekFrom::Start(end))?;
        Ok(PcmWriter {
            stream: &mut self.stream,
            data: &mut self.data,
        })
    }

    /// Backpatch every header and write the metadata list.
    ///
    /// Returns the total container length in bytes. The stream may hold a
    /// longer, stale tail from earlier content; callers writing to a reused
    /// file should truncate it to this length.
    pub fn encode(&mut self) -> Result<u64> {
        let origin = self.origin;

        DeferredRegion::FORMAT.commit(&mut self.stream, origin, &self.format)?;
        DeferredRegion::DATA_HEADER.commit(&mut self.stream, origin, &self.data)?;

        let mut total = PCM_OFFSET + u64::from(self.data.size);
        if let Some(list) = self.list.as_mut() {
            list.sync_size()?;
            self.stream.seek(SeekFrom::Start(origin + total))?;
            list.pack(&mut self.stream)?;
            total += list.raw_size();
        }

        let total_u32 = u32::try_from(total).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("container of {} bytes exceeds the RIFF size limit", total),
            )
        })?;
        self.header = RiffHeader::for_total_len(total_u32);
        DeferredRegion::RIFF_HEADER.commit(&mut self.stream, origin, &self.header)?;
        self.stream.flush()?;

        tracing::debug!(
            total,
            pcm_len = self.data.size,
            records = self.list.as_ref().map(|l| l.len()).unwrap_or(0),
            "Encoded WAV container"
        );

        Ok(total)
    }
}

/// Write accumulator for the `data` chunk of a [`WavFile`].
#[derive(Debug)]
pub struct PcmWriter<'a, S> {
    stream: &'a mut S,
    data: &'a mut DataChunk,
}

impl<S> PcmWriter<'_, S> {
    /// PCM bytes declared so far.
    pub fn written(&self) -> u64 {
        u64::from(self.data.size)
    }
}

impl<S: Write> Write for PcmWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = (u32::MAX - self.data.size) as usize;
        if room == 0 && !buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "PCM data exceeds the 4 GiB RIFF limit",
            ));
        }

        let n = self.stream.write(&buf[..buf.len().min(room)])?;
        self.data.size += n as u32;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riff::{ChunkId, InfoRecord};
    use std::io::{Cursor, Read};

    fn create_with_pcm(pcm: &[u8]) -> WavFile<Cursor<Vec<u8>>> {
        let mut wav = WavFile::create(Cursor::new(Vec::new()), 16_000, 1, 16).unwrap();
        wav.pcm_writer().unwrap().write_all(pcm).unwrap();
        wav
    }

    #[test]
    fn test_encode_layout() {
        let mut wav = create_with_pcm(&[1, 2, 3, 4]);
        let total = wav.encode().unwrap();
        assert_eq!(total, 48);

        let bytes = wav.into_inner().into_inner();
        assert_eq!(bytes.len(), 48);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[4..8], &40u32.to_le_bytes());
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(&bytes[16..20], &16u32.to_le_bytes());
        assert_eq!(&bytes[24..28], &16_000u32.to_le_bytes());
        assert_eq!(&bytes[28..32], &32_000u32.to_le_bytes());
        assert_eq!(&bytes[32..34], &2u16.to_le_bytes());
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(&bytes[40..44], &4u32.to_le_bytes());
        assert_eq!(&bytes[44..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_pcm_writer_counts_bytes() {
        let mut wav = WavFile::create(Cursor::new(Vec::new()), 8_000, 2, 8).unwrap();
        {
            let mut writer = wav.pcm_writer().unwrap();
            writer.write_all(&[0; 10]).unwrap();
            writer.write_all(&[0; 6]).unwrap();
            assert_eq!(writer.written(), 16);
        }
        assert_eq!(wav.pcm_len(), 16);

        // A second writer appends after the existing samples.
        wav.pcm_writer().unwrap().write_all(&[9; 2]).unwrap();
        assert_eq!(wav.pcm_len(), 18);
        wav.encode().unwrap();
        let bytes = wav.into_inner().into_inner();
        assert_eq!(&bytes[60..62], &[9, 9]);
    }

    #[test]
    fn test_encode_with_list() {
        let mut wav = create_with_pcm(&[0; 8]);
        wav.push_info(InfoRecord::new(ChunkId::IENG, "merry christmas"));
        let total = wav.encode().unwrap();

        // 44 + 8 PCM + LIST(8) + INFO(4) + record(8 + 16)
        assert_eq!(total, 88);
        let decoded = WavFile::decode(Cursor::new(wav.into_inner().into_inner())).unwrap();
        assert_eq!(decoded.header().size, 80);
        assert_eq!(
            decoded.list().unwrap().get(ChunkId::IENG),
            Some(&b"merry christmas"[..])
        );
    }

    #[test]
    fn test_encode_twice_is_stable() {
        let mut wav = create_with_pcm(&[5; 6]);
        let first = wav.encode().unwrap();
        let snapshot = wav.get_ref().get_ref().clone();
        let second = wav.encode().unwrap();
        assert_eq!(first, second);
        assert_eq!(wav.get_ref().get_ref(), &snapshot);
    }

    #[test]
    fn test_encode_reports_length_for_truncation() {
        // Destination previously held a longer file.
        let stale = vec![0xaa; 200];
        let mut wav = WavFile::create(Cursor::new(stale), 8_000, 1, 8).unwrap();
        wav.pcm_writer().unwrap().write_all(&[1, 2]).unwrap();
        let total = wav.encode().unwrap();
        assert_eq!(total, 46);

        let mut bytes = wav.into_inner().into_inner();
        assert_eq!(bytes.len(), 200);
        bytes.truncate(total as usize);

        let mut wav = WavFile::decode(Cursor::new(bytes)).unwrap();
        assert!(wav.list().is_none());
        let mut pcm = Vec::new();
        wav.pcm_reader().read_to_end(&mut pcm).unwrap();
        assert_eq!(pcm, [1, 2]);
    }

    #[test]
    fn test_region_rejects_wrong_length() {
        let list = crate::riff::ListChunk::new();
        let mut out = Cursor::new(Vec::new());
        let err = DeferredRegion::DATA_HEADER
            .commit(&mut out, 0, &list)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(out.get_ref().is_empty());
    }
}
