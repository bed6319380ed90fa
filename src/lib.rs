// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! SEQCONV - TD-3 pattern converter
//!
//! Converts 16-step bass-sequencer patterns between Standard MIDI Files,
//! the 146-byte `.seq` pattern dump and the `.syx` System-Exclusive dump.

pub mod config;
pub mod convert;
pub mod device;
pub mod error;
pub mod midi;
pub mod pattern;

pub use convert::{
    convert, decode_binary_pattern, decode_midi, decode_sysex, detect_format,
    detect_format_from_content, encode_binary_pattern, encode_midi, encode_sysex,
    supported_conversions, Conversion, Converter, Format,
};
pub use device::{Device, DeviceKind};
pub use error::{ConvertError, Result};
pub use midi::MidiOptions;
pub use pattern::{Pattern, Step};
