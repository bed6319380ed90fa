// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI File side of the converter.
//!
//! This module provides:
//! - Quantizing a MIDI note stream onto the 16-step grid ([`import`])
//! - Rendering a pattern as a Type 0 MIDI file ([`export`])

pub mod export;
pub mod import;

use serde::{Deserialize, Serialize};

pub use export::{render_pattern, ExportNote, MidiExporter};
pub use import::{parse_pattern, NoteEvent};

/// Default resolution for exported files
pub const DEFAULT_PPQN: u16 = 480;

/// Largest resolution a metrical MThd division can hold; bit 15 marks SMPTE timing
pub const MAX_PPQN: u16 = 0x7FFF;

/// Steps per quarter note (sixteenth-note grid)
pub const STEPS_PER_QUARTER: u16 = 4;

/// Ticks per grid step for a resolution, never zero
pub fn ticks_per_step(ppqn: u16) -> u32 {
    (ppqn / STEPS_PER_QUARTER).max(1) as u32
}

/// Options for MIDI rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiOptions {
    /// Ticks per quarter note
    pub ppqn: u16,
    /// MIDI channel (0-15)
    pub channel: u8,
}

impl Default for MidiOptions {
    fn default() -> Self {
        Self {
            ppqn: DEFAULT_PPQN,
            channel: 0,
        }
    }
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;

    // System Common Messages
    pub const SYSEX_START: u8 = 0xF0;
    pub const SYSEX_END: u8 = 0xF7;

    // Meta events
    pub const META: u8 = 0xFF;
    pub const META_TRACK_NAME: u8 = 0x03;
    pub const META_MARKER: u8 = 0x06;
    pub const META_END_OF_TRACK: u8 = 0x2F;
    pub const META_TEMPO: u8 = 0x51;
    pub const META_TIME_SIGNATURE: u8 = 0x58;

    /// Standard MIDI File header chunk ID
    pub const HEADER_CHUNK: &[u8; 4] = b"MThd";
    /// Standard MIDI File track chunk ID
    pub const TRACK_CHUNK: &[u8; 4] = b"MTrk";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_per_step() {
        assert_eq!(ticks_per_step(480), 120);
        assert_eq!(ticks_per_step(96), 24);
        assert_eq!(ticks_per_step(2), 1);
        assert_eq!(ticks_per_step(0), 1);
    }

    #[test]
    fn test_midi_message_constants() {
        assert_eq!(messages::NOTE_ON, 0x90);
        assert_eq!(messages::NOTE_OFF, 0x80);
        assert_eq!(messages::SYSEX_START, 0xF0);
        assert_eq!(messages::SYSEX_END, 0xF7);
        assert_eq!(messages::HEADER_CHUNK, b"MThd");
    }

    #[test]
    fn test_default_options() {
        let options = MidiOptions::default();
        assert_eq!(options.ppqn, 480);
        assert_eq!(options.channel, 0);
    }

    #[test]
    fn test_max_ppqn_leaves_timecode_bit_clear() {
        assert_eq!(MAX_PPQN & 0x8000, 0);
        assert_eq!(ticks_per_step(MAX_PPQN), 8191);
    }
}
