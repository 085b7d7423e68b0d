use serde::{Deserialize, Serialize};
use wavtrim_media::DEFAULT_BUFFER_SIZE;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Log filter directives used when RUST_LOG is unset and --verbose is off
    #[serde(default)]
    pub log_filter: Option<String>,

    #[serde(default)]
    pub trim: TrimConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrimConfig {
    /// Copy buffer size in bytes (default: 32 KiB)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Copy INFO tags of the source into the trimmed file
    #[serde(default = "default_keep_metadata")]
    pub keep_metadata: bool,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_keep_metadata() -> bool {
    true
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            keep_metadata: default_keep_metadata(),
        }
    }
}
