// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Conversion between pattern formats.
//!
//! This module provides:
//! - Format detection from file names and from content
//! - The conversion matrix between MIDI, `.seq` and `.syx`
//! - A [`Converter`] bound to one device and one set of MIDI options

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::device::{Device, DeviceKind};
use crate::error::{ConvertError, Result};
use crate::midi::{self, MidiOptions};
use crate::pattern::Pattern;

/// A pattern file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Standard MIDI File
    Midi,
    /// Binary pattern dump
    Seq,
    /// System-Exclusive pattern dump
    Syx,
    /// Not recognized
    Unknown,
}

impl Format {
    /// All known formats
    pub const KNOWN: [Format; 3] = [Format::Midi, Format::Seq, Format::Syx];

    /// Preferred file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Format::Midi => "mid",
            Format::Seq => "seq",
            Format::Syx => "syx",
            Format::Unknown => "",
        }
    }

    /// Format for a file extension, case-insensitive
    pub fn from_extension(ext: &str) -> Format {
        match ext.to_ascii_lowercase().as_str() {
            "mid" | "midi" => Format::Midi,
            "seq" => Format::Seq,
            "syx" => Format::Syx,
            _ => Format::Unknown,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Midi => "midi",
            Format::Seq => "seq",
            Format::Syx => "syx",
            Format::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Detect a format from a file name
pub fn detect_format(path: impl AsRef<Path>) -> Format {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(Format::from_extension)
        .unwrap_or(Format::Unknown)
}

/// Detect a format by sniffing the first bytes.
///
/// Anything that is neither a MIDI header nor a SysEx frame is assumed to
/// be a binary pattern dump.
pub fn detect_format_from_content(data: &[u8]) -> Format {
    if data.len() < 4 {
        return Format::Unknown;
    }
    if &data[..4] == midi::messages::HEADER_CHUNK {
        Format::Midi
    } else if data[0] == midi::messages::SYSEX_START {
        Format::Syx
    } else {
        Format::Seq
    }
}

/// An ordered pair of formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conversion {
    /// Source format
    pub from: Format,
    /// Target format
    pub to: Format,
}

impl Conversion {
    /// Create a conversion from `from` to `to`
    pub fn new(from: Format, to: Format) -> Self {
        Self { from, to }
    }

    /// Whether the pair is part of the conversion matrix
    pub fn is_supported(&self) -> bool {
        self.from != self.to && Format::KNOWN.contains(&self.from) && Format::KNOWN.contains(&self.to)
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// The six supported conversions
pub fn supported_conversions() -> Vec<Conversion> {
    Format::KNOWN
        .iter()
        .flat_map(|&from| Format::KNOWN.iter().map(move |&to| Conversion::new(from, to)))
        .filter(Conversion::is_supported)
        .collect()
}

/// Converts patterns between formats for one device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Converter {
    device: DeviceKind,
    midi: MidiOptions,
}

impl Converter {
    /// Create a converter for a device with default MIDI options
    pub fn new(device: DeviceKind) -> Self {
        Self {
            device,
            midi: MidiOptions::default(),
        }
    }

    /// Replace the MIDI export options
    pub fn with_midi_options(mut self, options: MidiOptions) -> Self {
        self.midi = options;
        self
    }

    /// Active device
    pub fn device(&self) -> DeviceKind {
        self.device
    }

    /// Switch the active device
    pub fn set_device(&mut self, device: DeviceKind) {
        self.device = device;
    }

    /// MIDI export options
    pub fn midi_options(&self) -> MidiOptions {
        self.midi
    }

    /// Decode bytes in a known format
    pub fn decode(&self, data: &[u8], format: Format) -> Result<Pattern> {
        match format {
            Format::Midi => midi::parse_pattern(data),
            Format::Seq => self.device.decode_seq(data),
            Format::Syx => self.device.decode_syx(data),
            Format::Unknown => Err(ConvertError::UnrecognizedFormat(
                "cannot decode unknown format".to_string(),
            )),
        }
    }

    /// Encode a pattern in a known format
    pub fn encode(&self, pattern: Option<&Pattern>, format: Format) -> Result<Vec<u8>> {
        let pattern = pattern.ok_or(ConvertError::NilPattern)?;
        match format {
            Format::Midi => Ok(midi::render_pattern(pattern, self.midi)),
            Format::Seq => self.device.encode_seq(pattern),
            Format::Syx => self.device.encode_syx(pattern),
            Format::Unknown => Err(ConvertError::UnrecognizedFormat(
                "cannot encode unknown format".to_string(),
            )),
        }
    }

    /// Decode `data` as `from` and re-encode it as `to`
    pub fn convert(&self, data: &[u8], from: Format, to: Format) -> Result<Vec<u8>> {
        let conversion = Conversion::new(from, to);
        if !conversion.is_supported() {
            return Err(ConvertError::UnsupportedConversion { from, to });
        }

        let pattern = self.decode(data, from)?;
        let output = self.encode(Some(&pattern), to)?;
        debug!(
            %conversion,
            device = self.device.key(),
            input = data.len(),
            output = output.len(),
            "converted"
        );
        Ok(output)
    }

    /// Convert, detecting the source format from its file name and then its content
    pub fn convert_detected(
        &self,
        data: &[u8],
        source: impl AsRef<Path>,
        to: Format,
    ) -> Result<Vec<u8>> {
        let from = match detect_format(source) {
            Format::Unknown => detect_format_from_content(data),
            format => format,
        };
        self.convert(data, from, to)
    }

    pub fn midi_to_seq(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.convert(data, Format::Midi, Format::Seq)
    }

    pub fn midi_to_syx(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.convert(data, Format::Midi, Format::Syx)
    }

    pub fn seq_to_midi(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.convert(data, Format::Seq, Format::Midi)
    }

    pub fn seq_to_syx(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.convert(data, Format::Seq, Format::Syx)
    }

    pub fn syx_to_midi(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.convert(data, Format::Syx, Format::Midi)
    }

    pub fn syx_to_seq(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.convert(data, Format::Syx, Format::Seq)
    }
}

/// Decode a binary pattern dump for the default device
pub fn decode_binary_pattern(data: &[u8]) -> Result<Pattern> {
    Converter::default().decode(data, Format::Seq)
}

/// Encode a binary pattern dump for the default device
pub fn encode_binary_pattern(pattern: Option<&Pattern>) -> Result<Vec<u8>> {
    Converter::default().encode(pattern, Format::Seq)
}

/// Decode a SysEx pattern dump for the default device
pub fn decode_sysex(data: &[u8]) -> Result<Pattern> {
    Converter::default().decode(data, Format::Syx)
}

/// Encode a SysEx pattern dump for the default device
pub fn encode_sysex(pattern: Option<&Pattern>) -> Result<Vec<u8>> {
    Converter::default().encode(pattern, Format::Syx)
}

/// Decode a Standard MIDI File
pub fn decode_midi(data: &[u8]) -> Result<Pattern> {
    Converter::default().decode(data, Format::Midi)
}

/// Encode a Standard MIDI File with default options
pub fn encode_midi(pattern: Option<&Pattern>) -> Result<Vec<u8>> {
    Converter::default().encode(pattern, Format::Midi)
}

/// Convert with the default device and MIDI options
pub fn convert(data: &[u8], from: Format, to: Format) -> Result<Vec<u8>> {
    Converter::default().convert(data, from, to)
}
