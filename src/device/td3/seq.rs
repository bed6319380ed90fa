// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! TD-3 `.seq` pattern file.
//!
//! Fixed 146-byte layout, offset addressed:
//!
//! | Field            | Offset | Size | Encoding                            |
//! |------------------|--------|------|-------------------------------------|
//! | Magic            | 0x00   | 4    | `23 98 54 76`                       |
//! | Device name      | 0x04   | 12   | length-prefixed UTF-16 string       |
//! | Version          | 0x10   | 16   | length-prefixed UTF-16 string       |
//! | Fill             | 0x20   | 4    | `00 70 00 00`                       |
//! | Notes            | 0x24   | 32   | 16 x (high nibble, low nibble)      |
//! | Accents          | 0x44   | 32   | 16 x 2, bit 0 of second byte        |
//! | Slides           | 0x64   | 32   | 16 x 2, bit 0 of second byte        |
//! | Triplet          | 0x84   | 2    | bit 0 of second byte                |
//! | Sequence length  | 0x86   | 2    | high x 16 + low                     |
//! | Reserved         | 0x88   | 2    | zero                                |
//! | Tie mask         | 0x8A   | 4    | nibble-swapped, 1 = new note        |
//! | Rest mask        | 0x8E   | 4    | nibble-swapped, 1 = rest            |

use tracing::{debug, warn};

use crate::device::nibble::{
    bit, join_nibbles, mask_from_flags, pack_mask, split_nibbles, unpack_mask,
};
use crate::error::{ConvertError, Result};
use crate::pattern::{Pattern, Step, DEFAULT_TEMPO, MAX_STEPS, MIDI_MAX};

use super::{DEVICE_ID, NOTE_OFFSET};

/// File magic
pub const MAGIC: [u8; 4] = [0x23, 0x98, 0x54, 0x76];

pub const DEVICE_NAME_OFFSET: usize = 0x04;
pub const DEVICE_NAME_SIZE: usize = 12;
pub const VERSION_OFFSET: usize = 0x10;
pub const VERSION_SIZE: usize = 16;
pub const HEADER_SIZE: usize = 32;
pub const FILL_OFFSET: usize = HEADER_SIZE;
pub const FILL_SIZE: usize = 4;
pub const NOTES_OFFSET: usize = FILL_OFFSET + FILL_SIZE; // 0x24
pub const ACCENTS_OFFSET: usize = NOTES_OFFSET + MAX_STEPS * 2; // 0x44
pub const SLIDES_OFFSET: usize = ACCENTS_OFFSET + MAX_STEPS * 2; // 0x64
pub const TRIPLET_OFFSET: usize = SLIDES_OFFSET + MAX_STEPS * 2; // 0x84
pub const LENGTH_OFFSET: usize = TRIPLET_OFFSET + 2; // 0x86
pub const RESERVED_OFFSET: usize = LENGTH_OFFSET + 2; // 0x88
pub const TIE_OFFSET: usize = RESERVED_OFFSET + 2; // 0x8A
pub const REST_OFFSET: usize = TIE_OFFSET + 4; // 0x8E

/// Total file size
pub const SEQ_SIZE: usize = REST_OFFSET + 4; // 146

/// Device name written into new files
pub const DEVICE_NAME: &str = "TD-3";

/// Firmware version string written into new files
pub const VERSION: &str = "1.3.7";

/// Fill field written into new files
const FILL: [u8; FILL_SIZE] = [0x00, 0x70, 0x00, 0x00];

/// Strings stored in the file header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeqHeader {
    /// Device name (e.g. "TD-3")
    pub device: String,
    /// Editor/firmware version (e.g. "1.3.7")
    pub version: String,
}

/// Decode a `.seq` file into a pattern.
///
/// The pattern holds exactly as many steps as the stored sequence length.
pub fn decode(data: &[u8]) -> Result<Pattern> {
    check_frame(data)?;

    let length = sequence_length(data[LENGTH_OFFSET], data[LENGTH_OFFSET + 1]);
    let ties = unpack_mask(read_mask(data, TIE_OFFSET));
    let rests = unpack_mask(read_mask(data, REST_OFFSET));

    let steps = (0..length)
        .map(|i| decode_step(data, i, ties, rests))
        .collect();

    debug!(length, ties, rests, "decoded seq");

    let mut pattern = Pattern {
        name: "TD-3 Pattern".to_string(),
        steps,
        length,
        tempo: DEFAULT_TEMPO,
        device_id: DEVICE_ID,
        triplet: flag(data, TRIPLET_OFFSET),
    };
    pattern.normalize();
    Ok(pattern)
}

/// Encode a pattern as a `.seq` file.
///
/// Always produces a full file; steps past the end of the pattern are
/// written as rests on note value 0.
pub fn encode(pattern: &Pattern) -> [u8; SEQ_SIZE] {
    let mut data = [0u8; SEQ_SIZE];

    data[..4].copy_from_slice(&MAGIC);
    write_string_block(
        &mut data[DEVICE_NAME_OFFSET..DEVICE_NAME_OFFSET + DEVICE_NAME_SIZE],
        DEVICE_NAME,
    );
    write_string_block(&mut data[VERSION_OFFSET..VERSION_OFFSET + VERSION_SIZE], VERSION);
    data[FILL_OFFSET..FILL_OFFSET + FILL_SIZE].copy_from_slice(&FILL);

    for i in 0..MAX_STEPS {
        let step = pattern.step_or_rest(i);
        let note_value = step.note.saturating_sub(NOTE_OFFSET);

        let offset = NOTES_OFFSET + i * 2;
        data[offset..offset + 2].copy_from_slice(&split_nibbles(note_value));
        data[ACCENTS_OFFSET + i * 2 + 1] = step.accent as u8;
        data[SLIDES_OFFSET + i * 2 + 1] = step.slide as u8;
    }

    data[TRIPLET_OFFSET + 1] = pattern.triplet as u8;

    let length = pattern.step_count();
    data[LENGTH_OFFSET] = (length / 16) as u8;
    data[LENGTH_OFFSET + 1] = (length % 16) as u8;

    let ties = mask_from_flags((0..MAX_STEPS).map(|i| !pattern.is_tied(i)));
    let rests = mask_from_flags((0..MAX_STEPS).map(|i| !pattern.step_or_rest(i).gate));
    data[TIE_OFFSET..TIE_OFFSET + 4].copy_from_slice(&pack_mask(ties));
    data[REST_OFFSET..REST_OFFSET + 4].copy_from_slice(&pack_mask(rests));

    debug!(length, "encoded seq");
    data
}

/// Read the device name and version strings from a `.seq` header.
///
/// Malformed string blocks decode as empty strings.
pub fn read_header(data: &[u8]) -> Result<SeqHeader> {
    check_frame(data)?;
    Ok(SeqHeader {
        device: read_string_block(&data[DEVICE_NAME_OFFSET..DEVICE_NAME_OFFSET + DEVICE_NAME_SIZE]),
        version: read_string_block(&data[VERSION_OFFSET..VERSION_OFFSET + VERSION_SIZE]),
    })
}

fn check_frame(data: &[u8]) -> Result<()> {
    if data.len() < SEQ_SIZE {
        return Err(ConvertError::format(format!(
            "seq data too short: got {} bytes, need at least {}",
            data.len(),
            SEQ_SIZE
        )));
    }
    if data[..4] != MAGIC {
        return Err(ConvertError::format("invalid TD-3 seq file: wrong magic bytes"));
    }
    Ok(())
}

/// Stored sequence length, falling back to a full pattern when out of range
fn sequence_length(high: u8, low: u8) -> usize {
    let length = join_nibbles(high, low) as usize;
    if length == 0 || length > MAX_STEPS {
        warn!(length, "sequence length out of range, using {}", MAX_STEPS);
        MAX_STEPS
    } else {
        length
    }
}

fn decode_step(data: &[u8], index: usize, ties: u16, rests: u16) -> Step {
    let offset = NOTES_OFFSET + index * 2;
    let note_value = join_nibbles(data[offset], data[offset + 1]) + NOTE_OFFSET as u16;
    let accent = flag(data, ACCENTS_OFFSET + index * 2);

    Step {
        note: note_value.min(MIDI_MAX as u16) as u8,
        gate: !bit(rests, index),
        accent,
        slide: flag(data, SLIDES_OFFSET + index * 2),
        // A cleared tie bit means "sustain"
        tie: index > 0 && !bit(ties, index),
        velocity: Step::device_velocity(accent),
    }
}

/// Bit 0 of the second byte of a two-byte flag field
fn flag(data: &[u8], offset: usize) -> bool {
    data[offset + 1] & 0x01 != 0
}

fn read_mask(data: &[u8], offset: usize) -> [u8; 4] {
    [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
}

/// Write a string block: u32 byte length, then UTF-16 code units stored
/// high byte first, zero padded to the block size.
fn write_string_block(block: &mut [u8], text: &str) {
    let capacity = (block.len() - 4) / 2;
    let units: Vec<u16> = text.encode_utf16().take(capacity).collect();

    block[..4].copy_from_slice(&((units.len() * 2) as u32).to_be_bytes());
    for (i, unit) in units.iter().enumerate() {
        block[4 + i * 2..6 + i * 2].copy_from_slice(&unit.to_be_bytes());
    }
}

fn read_string_block(block: &[u8]) -> String {
    let declared = u32::from_be_bytes([block[0], block[1], block[2], block[3]]) as usize;
    let byte_len = declared.min(block.len() - 4) & !1;

    let units: Vec<u16> = block[4..4 + byte_len]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference dump: notes 60, 62, 64, 65 on steps 0-3, accent on step 1,
    /// slide on step 2, every step a new note, steps 4-15 resting.
    const CANONICAL_DUMP: &str = "
        23 98 54 76
        00 00 00 08 00 54 00 44 00 2d 00 33
        00 00 00 0a 00 31 00 2e 00 33 00 2e 00 37 00 00
        00 70 00 00
        02 04 02 06 02 08 02 09 00 00 00 00 00 00 00 00
        00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00
        00 00 00 01 00 00 00 00 00 00 00 00 00 00 00 00
        00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00
        00 00 00 00 00 01 00 00 00 00 00 00 00 00 00 00
        00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00
        00 00
        01 00
        00 00
        0f 0f 0f 0f
        0f 00 0f 0f
    ";

    fn hex(text: &str) -> Vec<u8> {
        text.split_whitespace()
            .map(|b| u8::from_str_radix(b, 16).unwrap())
            .collect()
    }

    fn test_pattern() -> Pattern {
        Pattern::with_steps(
            "Test",
            vec![
                Step::note(60, 100),
                Step::note(62, 127).with_accent(),
                Step::note(64, 100).with_slide(),
                Step::note(65, 100).with_tie(),
            ],
        )
    }

    #[test]
    fn test_layout_offsets() {
        assert_eq!(NOTES_OFFSET, 0x24);
        assert_eq!(ACCENTS_OFFSET, 0x44);
        assert_eq!(SLIDES_OFFSET, 0x64);
        assert_eq!(TRIPLET_OFFSET, 0x84);
        assert_eq!(LENGTH_OFFSET, 0x86);
        assert_eq!(RESERVED_OFFSET, 0x88);
        assert_eq!(TIE_OFFSET, 0x8A);
        assert_eq!(REST_OFFSET, 0x8E);
        assert_eq!(SEQ_SIZE, 146);
        assert_eq!(hex(CANONICAL_DUMP).len(), SEQ_SIZE);
    }

    #[test]
    fn test_decode_canonical_dump() {
        let data = hex(CANONICAL_DUMP);

        // Raw note values before the octave shift
        let raw: Vec<u16> = (0..4)
            .map(|i| join_nibbles(data[NOTES_OFFSET + i * 2], data[NOTES_OFFSET + i * 2 + 1]))
            .collect();
        assert_eq!(raw, vec![36, 38, 40, 41]);

        let pattern = decode(&data).unwrap();
        assert_eq!(pattern.length, 16);
        assert_eq!(pattern.steps.len(), 16);

        let notes: Vec<u8> = pattern.steps[..4].iter().map(|s| s.note).collect();
        assert_eq!(notes, vec![60, 62, 64, 65]);
        assert!(pattern.steps[..4].iter().all(|s| s.gate && !s.tie));
        assert!(pattern.steps[4..].iter().all(|s| !s.gate));

        assert!(pattern.steps[1].accent);
        assert_eq!(pattern.steps[1].velocity, 127);
        assert_eq!(pattern.steps[0].velocity, 100);
        assert!(pattern.steps[2].slide);
        assert!(!pattern.steps[0].slide);
        assert!(!pattern.triplet);
    }

    #[test]
    fn test_encode_reproduces_canonical_dump() {
        let data = hex(CANONICAL_DUMP);
        let pattern = decode(&data).unwrap();
        assert_eq!(encode(&pattern).to_vec(), data);
    }

    #[test]
    fn test_encode_size_and_header() {
        let data = encode(&test_pattern());

        assert_eq!(data.len(), SEQ_SIZE);
        assert_eq!(&data[..4], &MAGIC);
        assert_eq!(&data[4..8], &[0x00, 0x00, 0x00, 0x08]);
        assert_eq!(&data[8..16], &[0x00, 0x54, 0x00, 0x44, 0x00, 0x2d, 0x00, 0x33]);
        assert_eq!(&data[16..20], &[0x00, 0x00, 0x00, 0x0a]);
        assert_eq!(&data[FILL_OFFSET..FILL_OFFSET + 4], &FILL);
        assert_eq!(&data[RESERVED_OFFSET..RESERVED_OFFSET + 2], &[0, 0]);
    }

    #[test]
    fn test_encode_fields() {
        let data = encode(&test_pattern());

        // 60 - 24 = 36 = 0x24
        assert_eq!(&data[NOTES_OFFSET..NOTES_OFFSET + 2], &[2, 4]);
        assert_eq!(&data[NOTES_OFFSET + 6..NOTES_OFFSET + 8], &[2, 9]);
        assert_eq!(data[ACCENTS_OFFSET + 3], 1);
        assert_eq!(data[ACCENTS_OFFSET + 1], 0);
        assert_eq!(data[SLIDES_OFFSET + 5], 1);

        // Four steps
        assert_eq!(&data[LENGTH_OFFSET..LENGTH_OFFSET + 2], &[0, 4]);

        // Step 3 tied: bit 3 cleared, everything else a new note
        assert_eq!(unpack_mask(read_mask(&data, TIE_OFFSET)), 0xFFF7);
        // Steps 4-15 rest
        assert_eq!(unpack_mask(read_mask(&data, REST_OFFSET)), 0xFFF0);
    }

    #[test]
    fn test_encode_low_notes_clamp_to_zero() {
        let pattern = Pattern::with_steps("Low", vec![Step::note(10, 100)]);
        let data = encode(&pattern);
        assert_eq!(&data[NOTES_OFFSET..NOTES_OFFSET + 2], &[0, 0]);
    }

    #[test]
    fn test_encode_ignores_tie_on_first_step() {
        let mut pattern = test_pattern();
        pattern.steps[0].tie = true;
        let data = encode(&pattern);
        assert!(bit(unpack_mask(read_mask(&data, TIE_OFFSET)), 0));
    }

    #[test]
    fn test_round_trip_preserves_step_fields() {
        let original = test_pattern();
        let decoded = decode(&encode(&original)).unwrap();

        assert_eq!(decoded.length, 4);
        for (a, b) in original.steps.iter().zip(&decoded.steps) {
            assert_eq!(a.note, b.note);
            assert_eq!(a.gate, b.gate);
            assert_eq!(a.accent, b.accent);
            assert_eq!(a.slide, b.slide);
            assert_eq!(a.tie, b.tie);
        }
    }

    #[test]
    fn test_decode_rejects_short_data() {
        let data = encode(&test_pattern());
        let err = decode(&data[..SEQ_SIZE - 1]).unwrap_err();
        assert!(matches!(err, ConvertError::Format(_)));
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut data = encode(&test_pattern());
        data[3] = 0x77;
        assert!(matches!(decode(&data), Err(ConvertError::Format(_))));
    }

    #[test]
    fn test_decode_rejects_legacy_32_byte_layout() {
        let mut legacy = vec![0u8; 32];
        legacy[0] = 60;
        legacy[1] = 0x01;
        assert!(decode(&legacy).is_err());
    }

    #[test]
    fn test_decode_accepts_trailing_bytes() {
        let mut data = encode(&test_pattern()).to_vec();
        data.extend_from_slice(&[0xAA; 8]);
        assert_eq!(decode(&data).unwrap().steps.len(), 4);
    }

    #[test]
    fn test_sequence_length_out_of_range_defaults_to_full() {
        let mut data = encode(&test_pattern());
        data[LENGTH_OFFSET] = 0;
        data[LENGTH_OFFSET + 1] = 0;
        assert_eq!(decode(&data).unwrap().length, 16);

        data[LENGTH_OFFSET] = 1;
        data[LENGTH_OFFSET + 1] = 1;
        assert_eq!(decode(&data).unwrap().length, 16);

        data[LENGTH_OFFSET] = 0;
        data[LENGTH_OFFSET + 1] = 7;
        assert_eq!(decode(&data).unwrap().steps.len(), 7);
    }

    #[test]
    fn test_decode_clamps_high_notes() {
        let mut data = encode(&test_pattern());
        data[NOTES_OFFSET] = 0x0F;
        data[NOTES_OFFSET + 1] = 0x0F;
        assert_eq!(decode(&data).unwrap().steps[0].note, 127);
    }

    #[test]
    fn test_decode_never_ties_first_step() {
        let mut data = encode(&test_pattern());
        data[TIE_OFFSET..TIE_OFFSET + 4].copy_from_slice(&pack_mask(0));
        let pattern = decode(&data).unwrap();
        assert!(!pattern.steps[0].tie);
        assert!(pattern.steps[1..].iter().all(|s| s.tie));
    }

    #[test]
    fn test_triplet_flag_round_trip() {
        let mut pattern = test_pattern();
        pattern.triplet = true;
        let data = encode(&pattern);
        assert_eq!(&data[TRIPLET_OFFSET..TRIPLET_OFFSET + 2], &[0, 1]);
        assert!(decode(&data).unwrap().triplet);
    }

    #[test]
    fn test_read_header() {
        let header = read_header(&encode(&test_pattern())).unwrap();
        assert_eq!(header.device, "TD-3");
        assert_eq!(header.version, "1.3.7");
    }

    #[test]
    fn test_read_header_tolerates_bad_length_prefix() {
        let mut data = encode(&test_pattern());
        data[DEVICE_NAME_OFFSET..DEVICE_NAME_OFFSET + 4].copy_from_slice(&[0xFF; 4]);
        let header = read_header(&data).unwrap();
        assert_eq!(header.device, "TD-3");
    }
}
