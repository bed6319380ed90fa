// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file export.
//!
//! Renders a pattern as a Type 0 MIDI file: one bar of sixteenth-note steps
//! with staccato gates, slides overlapping into the next step and ties
//! extending the note they follow.

use tracing::debug;

use crate::pattern::{Pattern, Step, ACCENT_VELOCITY, DEFAULT_VELOCITY, MAX_STEPS, MIDI_MAX};

use super::messages::{
    HEADER_CHUNK, META, META_END_OF_TRACK, META_MARKER, META_TEMPO, META_TIME_SIGNATURE,
    META_TRACK_NAME, NOTE_OFF, NOTE_ON, TRACK_CHUNK,
};
use super::{ticks_per_step, MidiOptions, MAX_PPQN};

/// A note for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNote {
    /// Start tick
    pub tick: u64,
    /// Note number (0-127)
    pub note: u8,
    /// Velocity (1-127)
    pub velocity: u8,
    /// Duration in ticks
    pub duration: u64,
}

impl ExportNote {
    /// Create a new export note
    pub fn new(tick: u64, note: u8, velocity: u8, duration: u64) -> Self {
        Self {
            tick,
            note,
            velocity,
            duration,
        }
    }

    /// End tick
    pub fn end_tick(&self) -> u64 {
        self.tick + self.duration
    }
}

/// Ordering of events sharing a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventRank {
    Meta,
    NoteOff,
    NoteOn,
    Padding,
}

/// MIDI event for export
#[derive(Debug, Clone)]
struct MidiExportEvent {
    /// Absolute tick
    tick: u64,
    rank: EventRank,
    /// Event data
    data: Vec<u8>,
}

impl MidiExportEvent {
    fn note_on(tick: u64, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            tick,
            rank: EventRank::NoteOn,
            data: vec![NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
        }
    }

    fn note_off(tick: u64, channel: u8, note: u8) -> Self {
        Self {
            tick,
            rank: EventRank::NoteOff,
            data: vec![NOTE_OFF | (channel & 0x0F), note & 0x7F, 0],
        }
    }

    fn tempo(tick: u64, bpm: f64) -> Self {
        let microseconds = (60_000_000.0 / bpm).min(0xFF_FFFF as f64) as u32;
        Self {
            tick,
            rank: EventRank::Meta,
            data: vec![
                META,
                META_TEMPO,
                0x03,
                ((microseconds >> 16) & 0xFF) as u8,
                ((microseconds >> 8) & 0xFF) as u8,
                (microseconds & 0xFF) as u8,
            ],
        }
    }

    fn time_signature(tick: u64, numerator: u8, denominator: u8) -> Self {
        // Denominator is expressed as power of 2
        let denom_power = denominator.max(1).trailing_zeros() as u8;
        Self {
            tick,
            rank: EventRank::Meta,
            data: vec![
                META,
                META_TIME_SIGNATURE,
                0x04,
                numerator,
                denom_power,
                24, // MIDI clocks per metronome click
                8,  // 32nd notes per MIDI quarter note
            ],
        }
    }

    fn track_name(tick: u64, name: &str) -> Self {
        let bytes = &name.as_bytes()[..name.len().min(127)];
        let mut data = vec![META, META_TRACK_NAME, bytes.len() as u8];
        data.extend_from_slice(bytes);
        Self {
            tick,
            rank: EventRank::Meta,
            data,
        }
    }

    /// Empty marker used to stretch the track to a full loop
    fn padding(tick: u64) -> Self {
        Self {
            tick,
            rank: EventRank::Padding,
            data: vec![META, META_MARKER, 0x00],
        }
    }

    fn end_of_track() -> Self {
        Self {
            tick: 0, // Will be set correctly during writing
            rank: EventRank::Padding,
            data: vec![META, META_END_OF_TRACK, 0x00],
        }
    }
}

/// MIDI file exporter for a single pattern
pub struct MidiExporter {
    /// PPQN (ticks per quarter note)
    ppqn: u16,
    /// MIDI channel (0-15)
    channel: u8,
    /// Tempo in BPM
    tempo: f64,
    /// Time signature
    time_sig: (u8, u8),
    /// Track name
    name: String,
    /// Notes to export
    notes: Vec<ExportNote>,
    /// Minimum track length in ticks
    length_ticks: u64,
}

impl MidiExporter {
    /// Create a new exporter
    pub fn new(options: MidiOptions) -> Self {
        Self {
            ppqn: options.ppqn.clamp(1, MAX_PPQN),
            channel: options.channel & 0x0F,
            tempo: 120.0,
            time_sig: (4, 4),
            name: String::new(),
            notes: Vec::new(),
            length_ticks: 0,
        }
    }

    /// Create an exporter holding the notes of `pattern`
    pub fn from_pattern(pattern: &Pattern, options: MidiOptions) -> Self {
        let mut exporter = Self::new(options);
        let ticks_per_step = ticks_per_step(exporter.ppqn) as u64;
        let steps = match pattern.step_count() {
            0 => MAX_STEPS,
            n => n,
        };

        exporter.set_tempo(pattern.effective_tempo());
        exporter.name = pattern.name.clone();
        exporter.notes = pattern_notes(pattern, exporter.ppqn);
        exporter.length_ticks = steps as u64 * ticks_per_step;
        exporter
    }

    /// Get PPQN
    pub fn ppqn(&self) -> u16 {
        self.ppqn
    }

    /// Set tempo, falling back to 120 BPM for unset values
    pub fn set_tempo(&mut self, bpm: f64) {
        self.tempo = if bpm > 0.0 { bpm } else { 120.0 };
    }

    /// Get tempo
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Get notes
    pub fn notes(&self) -> &[ExportNote] {
        &self.notes
    }

    /// Minimum track length in ticks
    pub fn length_ticks(&self) -> u64 {
        self.length_ticks
    }

    /// Export to bytes
    pub fn export_to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.write_header(&mut buffer);
        self.write_track(&mut buffer, &self.events());
        buffer
    }

    /// All events of the single track, sorted by tick
    fn events(&self) -> Vec<MidiExportEvent> {
        let mut events = Vec::with_capacity(self.notes.len() * 2 + 4);

        if !self.name.is_empty() {
            events.push(MidiExportEvent::track_name(0, &self.name));
        }
        events.push(MidiExportEvent::tempo(0, self.tempo));
        events.push(MidiExportEvent::time_signature(0, self.time_sig.0, self.time_sig.1));

        for note in &self.notes {
            events.push(MidiExportEvent::note_on(
                note.tick,
                self.channel,
                note.note,
                note.velocity,
            ));
            events.push(MidiExportEvent::note_off(note.end_tick(), self.channel, note.note));
        }

        let last_tick = events.iter().map(|e| e.tick).max().unwrap_or(0);
        if last_tick < self.length_ticks {
            events.push(MidiExportEvent::padding(self.length_ticks));
        }

        events.sort_by_key(|e| (e.tick, e.rank));
        events
    }

    /// Write MIDI file header chunk
    fn write_header(&self, buffer: &mut Vec<u8>) {
        // MThd
        buffer.extend_from_slice(HEADER_CHUNK);
        // Chunk length (always 6)
        buffer.extend_from_slice(&[0, 0, 0, 6]);
        // Format 0, one track
        buffer.extend_from_slice(&0u16.to_be_bytes());
        buffer.extend_from_slice(&1u16.to_be_bytes());
        // PPQN
        buffer.extend_from_slice(&self.ppqn.to_be_bytes());
    }

    /// Write a track chunk
    fn write_track(&self, buffer: &mut Vec<u8>, events: &[MidiExportEvent]) {
        // Build track data
        let mut track_data = Vec::new();
        let mut last_tick = 0u64;

        for event in events {
            let delta = event.tick.saturating_sub(last_tick);
            write_variable_length(&mut track_data, delta as u32);
            track_data.extend_from_slice(&event.data);
            last_tick = event.tick;
        }

        // End of track
        let end_event = MidiExportEvent::end_of_track();
        write_variable_length(&mut track_data, 0);
        track_data.extend_from_slice(&end_event.data);

        // MTrk
        buffer.extend_from_slice(TRACK_CHUNK);
        // Track length
        buffer.extend_from_slice(&(track_data.len() as u32).to_be_bytes());
        // Track data
        buffer.extend_from_slice(&track_data);
    }
}

/// Render a pattern as a Type 0 MIDI file
pub fn render_pattern(pattern: &Pattern, options: MidiOptions) -> Vec<u8> {
    let exporter = MidiExporter::from_pattern(pattern, options);
    let bytes = exporter.export_to_bytes();
    debug!(
        notes = exporter.notes().len(),
        ticks = exporter.length_ticks(),
        bytes = bytes.len(),
        "encoded midi"
    );
    bytes
}

/// Notes sounded by a pattern.
///
/// Tied steps never start a note of their own; they lengthen the note
/// before them.
pub fn pattern_notes(pattern: &Pattern, ppqn: u16) -> Vec<ExportNote> {
    let ticks_per_step = ticks_per_step(ppqn) as u64;
    let steps = &pattern.steps[..pattern.step_count()];

    steps
        .iter()
        .enumerate()
        .filter(|&(i, step)| step.gate && !pattern.is_tied(i))
        .map(|(i, step)| {
            let following = &steps[i + 1..];
            let tied = tie_run(following);
            let mut duration = note_duration(step.slide, tied, ticks_per_step);

            // A slide must not outlast a retrigger of the same key
            if let Some(next) = following.first() {
                if tied == 0 && next.gate && next.note == step.note {
                    duration = duration.min(ticks_per_step);
                }
            }

            ExportNote::new(
                i as u64 * ticks_per_step,
                step.note,
                note_velocity(step),
                duration,
            )
        })
        .collect()
}

/// Number of gated, tied steps directly following a note
fn tie_run(following: &[Step]) -> u64 {
    following
        .iter()
        .take_while(|step| step.tie && step.gate)
        .count() as u64
}

fn note_velocity(step: &Step) -> u8 {
    if step.accent {
        ACCENT_VELOCITY
    } else if step.velocity == 0 {
        DEFAULT_VELOCITY
    } else {
        step.velocity.min(MIDI_MAX)
    }
}

/// Gate length in ticks.
///
/// A slide overlaps the next step by a quarter step. The caller shortens it
/// when the next step retriggers the same pitch.
fn note_duration(slide: bool, tied: u64, ticks_per_step: u64) -> u64 {
    if tied > 0 {
        let duration = ticks_per_step * (tied + 1);
        if slide {
            duration
        } else {
            // Short gap before the next note
            duration - ticks_per_step / 8
        }
    } else if slide {
        ticks_per_step + ticks_per_step / 4
    } else {
        default_note_length(ticks_per_step)
    }
}

/// Three quarters of a step
fn default_note_length(ticks_per_step: u64) -> u64 {
    match ticks_per_step * 3 / 4 {
        0 => ticks_per_step.saturating_sub(1).max(1),
        length => length,
    }
}

/// Write variable-length quantity
fn write_variable_length(buffer: &mut Vec<u8>, mut value: u32) {
    let mut bytes = Vec::with_capacity(4);

    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    buffer.extend_from_slice(&bytes);
}
