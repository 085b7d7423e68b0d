//! Four-character chunk identifiers.

/// Four-character chunk or record tag.
///
/// Tags are compared byte for byte; `ICMT` and `icmt` are different tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    pub const RIFF: Self = Self(*b"RIFF");
    pub const WAVE: Self = Self(*b"WAVE");
    pub const FMT: Self = Self(*b"fmt ");
    pub const DATA: Self = Self(*b"data");
    pub const LIST: Self = Self(*b"LIST");
    pub const INFO: Self = Self(*b"INFO");

    // INFO record tags, see http://bwfmetaedit.sourceforge.net/listinfo.html
    pub const IART: Self = Self(*b"IART");
    pub const ICMT: Self = Self(*b"ICMT");
    pub const ICOP: Self = Self(*b"ICOP");
    pub const ICRD: Self = Self(*b"ICRD");
    pub const IENG: Self = Self(*b"IENG");
    pub const ITCH: Self = Self(*b"ITCH");
    pub const IGNR: Self = Self(*b"IGNR");
    pub const IKEY: Self = Self(*b"IKEY");
    pub const IMED: Self = Self(*b"IMED");
    pub const INAM: Self = Self(*b"INAM");
    pub const IPRD: Self = Self(*b"IPRD");
    pub const ISBJ: Self = Self(*b"ISBJ");
    pub const ISFT: Self = Self(*b"ISFT");
    pub const ISRC: Self = Self(*b"ISRC");
    pub const IARL: Self = Self(*b"IARL");
    pub const ITRK: Self = Self(*b"ITRK");
    /// Lowercase track number tag written by some encoders.
    pub const ITRK_LOWER: Self = Self(*b"itrk");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// Human readable name of a known INFO record tag.
    pub fn label(&self) -> Option<&'static str> {
        let label = match *self {
            Self::IART => "artist",
            Self::ICMT => "comments",
            Self::ICOP => "copyright",
            Self::ICRD => "creation date",
            Self::IENG => "engineer",
            Self::ITCH => "technician",
            Self::IGNR => "genre",
            Self::IKEY => "keywords",
            Self::IMED => "medium",
            Self::INAM => "title",
            Self::IPRD => "product",
            Self::ISBJ => "subject",
            Self::ISFT => "software",
            Self::ISRC => "source",
            Self::IARL => "location",
            Self::ITRK | Self::ITRK_LOWER => "track number",
            _ => return None,
        };
        Some(label)
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses a tag given on the command line or in code.
///
/// The input must be exactly four bytes; shorter tags are not padded.
impl std::str::FromStr for ChunkId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| format!("tag must be exactly 4 bytes, got {:?}", s))?;
        Ok(Self(bytes))
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for ChunkId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
