//! Wavtrim - cut time ranges out of WAV files
//!
//! This library crate exposes the application layer for integration testing.
//! The container codec lives in `wavtrim-media`.

pub mod config;
