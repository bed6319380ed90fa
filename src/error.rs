// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types shared by every codec.

use thiserror::Error;

use crate::convert::Format;

/// Result alias for codec operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors returned by the codec layer.
///
/// Codecs never retry and never return partial output: a call either
/// produces a complete buffer or one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Buffer too short, bad magic, or malformed frame
    #[error("format error: {0}")]
    Format(String),

    /// Frame is well formed but the manufacturer signature is unknown
    #[error("unrecognized format: {0}")]
    UnrecognizedFormat(String),

    /// Encode was called without a pattern
    #[error("nil pattern")]
    NilPattern,

    /// The MIDI container could not be parsed
    #[error("failed to parse MIDI: {0}")]
    Parse(String),

    /// The format pair is not part of the conversion matrix
    #[error("unsupported conversion: {from} to {to}")]
    UnsupportedConversion { from: Format, to: Format },
}

impl ConvertError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        ConvertError::Format(message.into())
    }
}

impl From<midly::Error> for ConvertError {
    fn from(e: midly::Error) -> Self {
        ConvertError::Parse(e.to_string())
    }
}
