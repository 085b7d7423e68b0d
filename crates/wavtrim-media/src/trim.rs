//! Time-range extraction.
//!
//! A trim decodes the source container, maps the requested playback
//! interval onto a byte range of its PCM data, and streams that range into
//! a freshly created container on the sink.

use crate::riff::{FormatChunk, WavFile};
use crate::{Error, Result, TrimError};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::Duration;

/// Default size of the intermediate copy buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Cut `[start, end)` out of `source` into a new container on `sink`.
///
/// `None` for `start` means the beginning, `None` for `end` the full
/// duration. Returns the length of the encoded output so callers writing to
/// a reused file can truncate it.
pub fn trim<R, W>(source: R, start: Option<Duration>, end: Option<Duration>, sink: W) -> Result<u64>
where
    R: Read + Seek,
    W: Write + Seek,
{
    trim_with_buffer(source, start, end, sink, DEFAULT_BUFFER_SIZE)
}

/// Like [`trim`], copying through a buffer of `buffer_size` bytes.
pub fn trim_with_buffer<R, W>(
    source: R,
    start: Option<Duration>,
    end: Option<Duration>,
    sink: W,
    buffer_size: usize,
) -> Result<u64>
where
    R: Read + Seek,
    W: Write + Seek,
{
    Trimmer::new()
        .start(start)
        .end(end)
        .buffer_size(buffer_size)
        .run(source, sink)
}

/// Configurable trim operation.
#[derive(Debug, Clone)]
pub struct Trimmer {
    start: Option<Duration>,
    end: Option<Duration>,
    buffer_size: usize,
    keep_metadata: bool,
}

impl Trimmer {
    /// Trim covering the whole file, copying metadata.
    pub fn new() -> Self {
        Self {
            start: None,
            end: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            keep_metadata: true,
        }
    }

    /// Set the start of the range.
    pub fn start(mut self, start: Option<Duration>) -> Self {
        self.start = start;
        self
    }

    /// Set the end of the range.
    pub fn end(mut self, end: Option<Duration>) -> Self {
        self.end = end;
        self
    }

    /// Set the copy buffer size in bytes.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Whether INFO records of the source are written to the output.
    pub fn keep_metadata(mut self, keep: bool) -> Self {
        self.keep_metadata = keep;
        self
    }

    /// Run the trim. The sink is left untouched if the range is rejected.
    pub fn run<R, W>(&self, source: R, sink: W) -> Result<u64>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        if self.buffer_size == 0 {
            return Err(Error::InvalidBufferSize);
        }

        let mut src = WavFile::decode(source)?;
        let total = src.duration();
        let start = self.start.unwrap_or(Duration::ZERO);
        let end = self.end.unwrap_or(total);

        if start > total || end > total {
            return Err(TrimError::OutOfRange { start, end, total }.into());
        }
        if start >= end {
            return Err(TrimError::InvalidOrder { start, end }.into());
        }

        let range = ByteRange::for_interval(src.format(), src.pcm_len(), start, end);
        tracing::debug!(
            ?start,
            ?end,
            ?total,
            offset = range.offset,
            len = range.len,
            "Resolved trim range"
        );

        let format = src.format().clone();
        let list = if self.keep_metadata {
            src.list().cloned()
        } else {
            None
        };

        let mut dst = WavFile::create(
            sink,
            format.sample_rate(),
            format.channels(),
            format.bits_per_sample(),
        )?;
        dst.set_list(list);

        let mut window = src.pcm_reader();
        window.seek(SeekFrom::Start(range.offset))?;
        let mut bounded = window.take(range.len);

        let copied = {
            let mut writer = dst.pcm_writer()?;
            copy_buffered(&mut bounded, &mut writer, self.buffer_size)?
        };
        if copied < range.len {
            tracing::warn!(
                expected = range.len,
                copied,
                "Source ended before its declared PCM length"
            );
        }

        dst.encode()
    }
}

impl Default for Trimmer {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte range of the PCM data covering a playback interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Offset from the first PCM byte.
    pub offset: u64,
    /// Number of bytes.
    pub len: u64,
}

impl ByteRange {
    /// Map `[start, end)` onto the PCM bytes of a file with `format`.
    ///
    /// The offset rounds up and the length rounds down to an even number of
    /// bytes, each moving by at most one byte. The range is clamped so it
    /// never extends past `pcm_len`.
    pub fn for_interval(
        format: &FormatChunk,
        pcm_len: u64,
        start: Duration,
        end: Duration,
    ) -> Self {
        let rate = format.byte_rate();
        let limit = round_down_even(pcm_len);

        let offset = round_up_even(byte_offset(rate, start)).min(limit);
        let len = round_down_even(byte_offset(rate, end.saturating_sub(start))).min(limit - offset);
        Self { offset, len }
    }
}

/// Byte position reached after `at` of playback, rounded to nearest.
fn byte_offset(byte_rate: u32, at: Duration) -> u64 {
    let bytes = (u128::from(byte_rate) * at.as_nanos() + NANOS_PER_SEC / 2) / NANOS_PER_SEC;
    u64::try_from(bytes).unwrap_or(u64::MAX)
}

fn round_up_even(value: u64) -> u64 {
    value.saturating_add(value & 1)
}

fn round_down_even(value: u64) -> u64 {
    value & !1
}

/// Copy everything from `reader` to `writer` through a `size`-byte buffer.
fn copy_buffered<R: Read, W: Write>(reader: &mut R, writer: &mut W, size: usize) -> io::Result<u64> {
    let mut buf = vec![0u8; size];
    let mut copied = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        copied += n as u64;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_rounding() {
        assert_eq!(round_up_even(0), 0);
        assert_eq!(round_up_even(3), 4);
        assert_eq!(round_up_even(4), 4);
        assert_eq!(round_down_even(7), 6);
        assert_eq!(round_down_even(8), 8);
        assert_eq!(round_up_even(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_byte_offset() {
        assert_eq!(byte_offset(32_000, Duration::from_secs(1)), 32_000);
        assert_eq!(byte_offset(32_000, Duration::from_millis(3500)), 112_000);
        assert_eq!(byte_offset(3, Duration::new(3, 333_333_333)), 10);
    }

    #[test]
    fn test_range_for_whole_seconds() {
        let fmt = FormatChunk::pcm(16_000, 1, 16);
        let range = ByteRange::for_interval(
            &fmt,
            1_000_000,
            Duration::from_secs(1),
            Duration::from_millis(3500),
        );
        assert_eq!(range, ByteRange { offset: 32_000, len: 80_000 });
    }

    #[test]
    fn test_range_rounds_start_up_and_len_down() {
        // 8-bit mono: one byte per frame, so odd offsets are possible.
        let fmt = FormatChunk::pcm(1_000, 1, 8);
        let range = ByteRange::for_interval(
            &fmt,
            10_000,
            Duration::from_millis(3),
            Duration::from_millis(10),
        );
        assert_eq!(range, ByteRange { offset: 4, len: 6 });
    }

    #[test]
    fn test_range_stereo_16_bit_is_even() {
        let fmt = FormatChunk::pcm(44_100, 2, 16);
        let pcm_len = 44_100 * 4 * 10;
        for ms in [0u64, 1, 7, 333, 1001, 4999] {
            let range = ByteRange::for_interval(
                &fmt,
                pcm_len,
                Duration::from_millis(ms),
                Duration::from_millis(ms + 2_345),
            );
            assert_eq!(range.offset % 2, 0, "offset at {}ms", ms);
            assert_eq!(range.len % 2, 0, "len at {}ms", ms);
            assert!(range.offset + range.len <= pcm_len);
        }
    }

    #[test]
    fn test_range_rounding_moves_at_most_one_byte() {
        // 16-bit stereo at 1 kHz: 4000 bytes per second, so every quarter
        // millisecond lands on a whole byte.
        let fmt = FormatChunk::pcm(1_000, 2, 16);
        let range = ByteRange::for_interval(
            &fmt,
            40_000,
            Duration::from_micros(500),
            Duration::from_secs(1),
        );
        assert_eq!(range, ByteRange { offset: 2, len: 3_998 });

        for quarter_ms in 0u64..40 {
            let start = Duration::from_micros(quarter_ms * 250);
            let end = start + Duration::from_micros(1_250);
            let exact_start = quarter_ms;
            let exact_len = 5;

            let range = ByteRange::for_interval(&fmt, 40_000, start, end);
            assert!(range.offset >= exact_start && range.offset - exact_start <= 1);
            assert!(range.len <= exact_len && exact_len - range.len <= 1);
            assert_eq!(range.offset % 2, 0);
            assert_eq!(range.len % 2, 0);
        }
    }

    #[test]
    fn test_range_never_past_pcm_end() {
        let fmt = FormatChunk::pcm(1_000, 1, 8);
        let range =
            ByteRange::for_interval(&fmt, 9, Duration::from_millis(1), Duration::from_millis(9));
        assert_eq!(range, ByteRange { offset: 2, len: 6 });
        assert!(range.offset + range.len <= 9);
    }

    #[test]
    fn test_copy_buffered_any_size() {
        let data: Vec<u8> = (0..=255).collect();
        for size in [1, 3, 64, 4096] {
            let mut out = Vec::new();
            let n = copy_buffered(&mut &data[..], &mut out, size).unwrap();
            assert_eq!(n, 256);
            assert_eq!(out, data);
        }
    }
}
