// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Device codec abstraction.
//!
//! A device is a capability set: it can read and write the binary pattern
//! dump (`.seq`) and the System-Exclusive dump (`.syx`) of one hardware
//! family. [`DeviceKind`] selects the implementation by value so the
//! converter never needs a boxed trait object.

pub mod nibble;
pub mod td3;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};
use crate::pattern::Pattern;

pub use td3::Td3;

/// Trait for device-specific dump formats.
pub trait Device {
    /// Human-readable device name
    fn name(&self) -> &'static str;

    /// Device identifier written into SysEx frames
    fn id(&self) -> u8;

    /// Decode a binary pattern dump
    fn decode_seq(&self, data: &[u8]) -> Result<Pattern>;

    /// Encode a pattern as a binary pattern dump
    fn encode_seq(&self, pattern: &Pattern) -> Result<Vec<u8>>;

    /// Decode a SysEx pattern dump
    fn decode_syx(&self, data: &[u8]) -> Result<Pattern>;

    /// Encode a pattern as a SysEx pattern dump
    fn encode_syx(&self, pattern: &Pattern) -> Result<Vec<u8>>;
}

/// Supported hardware families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Behringer TD-3
    #[default]
    Td3,
}

impl DeviceKind {
    /// All supported devices
    pub const ALL: [DeviceKind; 1] = [DeviceKind::Td3];

    /// Short name used on the command line and in config files
    pub fn key(self) -> &'static str {
        match self {
            DeviceKind::Td3 => "td3",
        }
    }
}

impl Device for DeviceKind {
    fn name(&self) -> &'static str {
        match self {
            DeviceKind::Td3 => Td3.name(),
        }
    }

    fn id(&self) -> u8 {
        match self {
            DeviceKind::Td3 => Td3.id(),
        }
    }

    fn decode_seq(&self, data: &[u8]) -> Result<Pattern> {
        match self {
            DeviceKind::Td3 => Td3.decode_seq(data),
        }
    }

    fn encode_seq(&self, pattern: &Pattern) -> Result<Vec<u8>> {
        match self {
            DeviceKind::Td3 => Td3.encode_seq(pattern),
        }
    }

    fn decode_syx(&self, data: &[u8]) -> Result<Pattern> {
        match self {
            DeviceKind::Td3 => Td3.decode_syx(data),
        }
    }

    fn encode_syx(&self, pattern: &Pattern) -> Result<Vec<u8>> {
        match self {
            DeviceKind::Td3 => Td3.encode_syx(pattern),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DeviceKind {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "td3" | "td-3" => Ok(DeviceKind::Td3),
            other => {
                let known: Vec<&str> = DeviceKind::ALL.iter().map(|d| d.key()).collect();
                Err(ConvertError::UnrecognizedFormat(format!(
                    "unknown device: {} (expected one of: {})",
                    other,
                    known.join(", ")
                )))
            }
        }
    }
}
