// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! TD-3 System-Exclusive pattern dump.
//!
//! ```text
//! F0 00 20 32 <device> <model> <command> [16 x (note attr)] <checksum> F7
//! ```
//!
//! Attribute bits: 0 gate, 1 accent, 2 slide, 3 tie. The checksum is the
//! XOR of the 32 payload bytes masked to 7 bits.

use tracing::{debug, warn};

use crate::error::{ConvertError, Result};
use crate::midi::messages::{SYSEX_END, SYSEX_START};
use crate::pattern::{Pattern, Step, DEFAULT_TEMPO, MAX_STEPS, MIDI_MAX};

use super::{MODEL_ID, NOTE_OFFSET};

/// Behringer extended manufacturer ID
pub const BEHRINGER_ID: [u8; 3] = [0x00, 0x20, 0x32];

/// Pattern dump command
pub const PATTERN_DUMP: u8 = 0x40;

/// Bytes before the payload: start, manufacturer, device, model, command
pub const HEADER_LEN: usize = 8;

/// Payload bytes (two per step)
pub const PAYLOAD_LEN: usize = MAX_STEPS * 2;

/// Full frame length
pub const FRAME_LEN: usize = HEADER_LEN + PAYLOAD_LEN + 2;

/// Shortest buffer that can be a frame at all
pub const MIN_FRAME_LEN: usize = 10;

const ATTR_GATE: u8 = 0x01;
const ATTR_ACCENT: u8 = 0x02;
const ATTR_SLIDE: u8 = 0x04;
const ATTR_TIE: u8 = 0x08;

/// Decode a SysEx pattern dump
pub fn decode(data: &[u8]) -> Result<Pattern> {
    validate_frame(data)?;

    if !is_behringer(data) {
        return Err(ConvertError::UnrecognizedFormat(format!(
            "unrecognized SysEx manufacturer {:02X?}",
            manufacturer_id(data).unwrap_or_default()
        )));
    }

    // Payload plus the closing F7
    if data.len() < HEADER_LEN + PAYLOAD_LEN + 1 {
        return Err(ConvertError::format(format!(
            "syx data too short: got {}, need at least {}",
            data.len(),
            HEADER_LEN + PAYLOAD_LEN + 1
        )));
    }

    let payload = &data[HEADER_LEN..HEADER_LEN + PAYLOAD_LEN];
    if data.len() >= FRAME_LEN {
        let stored = data[HEADER_LEN + PAYLOAD_LEN];
        let expected = checksum(payload);
        if stored != expected {
            warn!(stored, expected, "SysEx checksum mismatch");
        }
    }

    let steps = payload
        .chunks_exact(2)
        .map(|pair| decode_step(pair[0], pair[1]))
        .collect();

    debug!(bytes = data.len(), "decoded syx");

    let mut pattern = Pattern {
        name: "TD-3 SysEx Pattern".to_string(),
        steps,
        length: MAX_STEPS,
        tempo: DEFAULT_TEMPO,
        device_id: data[4],
        triplet: false,
    };
    pattern.normalize();
    Ok(pattern)
}

/// Encode a pattern as a SysEx pattern dump for `device_id`
pub fn encode(pattern: &Pattern, device_id: u8) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];

    frame[0] = SYSEX_START;
    frame[1..4].copy_from_slice(&BEHRINGER_ID);
    frame[4] = device_id & 0x7F;
    frame[5] = MODEL_ID;
    frame[6] = PATTERN_DUMP;
    // frame[7] is the reserved zero byte ahead of the payload

    for i in 0..MAX_STEPS {
        let step = pattern.step_or_rest(i);
        let offset = HEADER_LEN + i * 2;
        frame[offset] = note_byte(step.note);
        frame[offset + 1] = attr_byte(&step, pattern.is_tied(i));
    }

    frame[HEADER_LEN + PAYLOAD_LEN] = checksum(&frame[HEADER_LEN..HEADER_LEN + PAYLOAD_LEN]);
    frame[FRAME_LEN - 1] = SYSEX_END;

    debug!(steps = pattern.step_count(), "encoded syx");
    frame
}

/// XOR of the payload bytes, masked to 7 bits
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc ^ b) & 0x7F
}

/// Whether the buffer carries the Behringer manufacturer ID
pub fn is_behringer(data: &[u8]) -> bool {
    data.len() > 4 && data[0] == SYSEX_START && data[1..4] == BEHRINGER_ID
}

/// Extract the manufacturer ID: three bytes for extended IDs, else one
pub fn manufacturer_id(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 4 {
        return Err(ConvertError::format("syx data too short for manufacturer ID"));
    }
    if data[0] != SYSEX_START {
        return Err(ConvertError::format("invalid SysEx start"));
    }

    if data[1] == 0x00 {
        if data.len() < 5 {
            return Err(ConvertError::format(
                "syx data too short for extended manufacturer ID",
            ));
        }
        Ok(data[1..4].to_vec())
    } else {
        Ok(data[1..2].to_vec())
    }
}

/// Check delimiters and that every data byte is 7-bit
pub fn validate_frame(data: &[u8]) -> Result<()> {
    if data.len() < MIN_FRAME_LEN {
        return Err(ConvertError::format(format!(
            "syx data too short: got {} bytes",
            data.len()
        )));
    }
    if data[0] != SYSEX_START {
        return Err(ConvertError::format(format!(
            "invalid SysEx: expected start byte 0x{:02X}, got 0x{:02X}",
            SYSEX_START, data[0]
        )));
    }
    let last = data[data.len() - 1];
    if last != SYSEX_END {
        return Err(ConvertError::format(format!(
            "invalid SysEx: expected end byte 0x{:02X}, got 0x{:02X}",
            SYSEX_END, last
        )));
    }
    if let Some(pos) = data[1..data.len() - 1].iter().position(|&b| b > 0x7F) {
        return Err(ConvertError::format(format!(
            "invalid SysEx: byte at position {} is > 127 (0x{:02X})",
            pos + 1,
            data[pos + 1]
        )));
    }
    Ok(())
}

fn note_byte(note: u8) -> u8 {
    if note >= NOTE_OFFSET {
        (note - NOTE_OFFSET) & 0x7F
    } else {
        note & 0x7F
    }
}

fn attr_byte(step: &Step, tied: bool) -> u8 {
    [
        (step.gate, ATTR_GATE),
        (step.accent, ATTR_ACCENT),
        (step.slide, ATTR_SLIDE),
        (tied, ATTR_TIE),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .fold(0, |attr, (_, bit)| attr | bit)
}

fn decode_step(note: u8, attr: u8) -> Step {
    let accent = attr & ATTR_ACCENT != 0;
    Step {
        note: ((note & 0x7F) + NOTE_OFFSET).min(MIDI_MAX),
        gate: attr & ATTR_GATE != 0,
        accent,
        slide: attr & ATTR_SLIDE != 0,
        tie: attr & ATTR_TIE != 0,
        velocity: Step::device_velocity(accent),
    }
}
