/// Errors returned by the packet codecs and the settings model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A value is outside what the keyboard accepts.
    #[error("invalid value: {0}")]
    Validation(String),

    /// A received packet does not carry the checksum its contents imply.
    #[error("checksum mismatch in packet {packet}: expected 0x{expected:02x}, found 0x{found:02x}")]
    Checksum { packet: usize, expected: u8, found: u8 },

    /// Wrong packet count, wrong packet size, or packets out of order.
    #[error("bad packet sequence: {0}")]
    Sequence(String),

    /// A textual key, color or remap expression could not be parsed.
    #[error("cannot parse '{input}': {reason}")]
    Parse { input: String, reason: String },
}

impl CodecError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn sequence(msg: impl Into<String>) -> Self {
        Self::Sequence(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
