//! Wavtrim-Media: RIFF/WAVE chunk codec and time-range trimming
//!
//! This crate reads and writes uncompressed PCM WAV files and cuts playback
//! intervals out of them without decoding samples.
//!
//! # Modules
//!
//! - `riff` - Chunk codec, INFO metadata, container decoder and encoder
//! - `trim` - Time-range extraction into a new container
//!
//! # Architecture
//!
//! Decoding walks the header chunks in order and leaves the samples on the
//! stream, exposing them through a bounded random-access window. Encoding
//! works the other way round: samples are streamed to their final offset
//! first and the size fields that depend on them are backpatched by an
//! explicit `encode` step.

pub mod error;
pub mod riff;
pub mod trim;

pub use error::{Error, MalformedError, Result, TrimError};
pub use riff::{ChunkId, FormatChunk, InfoRecord, ListChunk, WavFile};
pub use trim::{trim, trim_with_buffer, ByteRange, Trimmer, DEFAULT_BUFFER_SIZE};
