// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI file import.
//!
//! Quantizes the note-ons of a Standard MIDI File onto the 16-step grid and
//! guesses slides and ties from neighbouring pitches. The guess is
//! best-effort: a MIDI file carries no slide or tie information, so the
//! result is a plausible reconstruction rather than the original intent.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use tracing::debug;

use crate::error::Result;
use crate::pattern::{Pattern, Step, DEFAULT_TEMPO, MAX_STEPS};

use super::{ticks_per_step, DEFAULT_PPQN};

/// Velocities above this are treated as accented
pub const ACCENT_THRESHOLD: u8 = 100;

/// Largest pitch distance (semitones) read as a slide
pub const SLIDE_RANGE: u8 = 2;

/// Name given to imported patterns without a track name
pub const DEFAULT_NAME: &str = "MIDI Pattern";

/// A note event at an absolute tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// Absolute tick within its track
    pub tick: u64,
    /// MIDI note number
    pub note: u8,
    /// Velocity (0 for note-off)
    pub velocity: u8,
    /// Note-on (true) or note-off (false)
    pub on: bool,
}

/// Everything collected from one pass over the file
#[derive(Debug, Clone)]
struct Scan {
    events: Vec<NoteEvent>,
    tempo: f64,
    name: Option<String>,
}

impl Default for Scan {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            tempo: DEFAULT_TEMPO,
            name: None,
        }
    }
}

/// Decode a Standard MIDI File into a 16-step pattern
pub fn parse_pattern(data: &[u8]) -> Result<Pattern> {
    let smf = Smf::parse(data)?;

    let ppqn = match smf.header.timing {
        Timing::Metrical(ticks) if ticks.as_int() > 0 => ticks.as_int(),
        _ => DEFAULT_PPQN,
    };

    let scan = smf
        .tracks
        .iter()
        .fold(Scan::default(), |scan, track| scan_track(scan, track));

    let mut steps = quantize(&scan.events, ticks_per_step(ppqn));
    infer_articulation(&mut steps);

    debug!(
        ppqn,
        tracks = smf.tracks.len(),
        events = scan.events.len(),
        tempo = scan.tempo,
        "decoded midi"
    );

    let mut pattern = Pattern {
        name: scan.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        steps: steps.to_vec(),
        length: MAX_STEPS,
        tempo: scan.tempo,
        device_id: 0,
        triplet: false,
    };
    pattern.normalize();
    Ok(pattern)
}

/// Accumulate one track's delta times into absolute ticks
fn scan_track(scan: Scan, track: &[TrackEvent<'_>]) -> Scan {
    let (scan, _) = track.iter().fold((scan, 0u64), |(mut scan, tick), event| {
        let tick = tick + event.delta.as_int() as u64;

        match event.kind {
            TrackEventKind::Midi { message, .. } => match message {
                MidiMessage::NoteOn { key, vel } => scan.events.push(NoteEvent {
                    tick,
                    note: key.as_int(),
                    velocity: vel.as_int(),
                    on: vel.as_int() > 0,
                }),
                MidiMessage::NoteOff { key, .. } => scan.events.push(NoteEvent {
                    tick,
                    note: key.as_int(),
                    velocity: 0,
                    on: false,
                }),
                _ => {}
            },
            TrackEventKind::Meta(MetaMessage::Tempo(micros)) if micros.as_int() > 0 => {
                scan.tempo = 60_000_000.0 / micros.as_int() as f64;
            }
            TrackEventKind::Meta(MetaMessage::TrackName(name)) if scan.name.is_none() => {
                let cleaned = String::from_utf8_lossy(name)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string();
                if !cleaned.is_empty() {
                    scan.name = Some(cleaned);
                }
            }
            _ => {}
        }

        (scan, tick)
    });
    scan
}

/// Place note-ons on the grid; later events overwrite earlier ones
pub fn quantize(events: &[NoteEvent], ticks_per_step: u32) -> [Step; MAX_STEPS] {
    let ticks_per_step = ticks_per_step.max(1) as u64;

    events
        .iter()
        .filter(|event| event.on)
        .fold([Step::default(); MAX_STEPS], |mut steps, event| {
            let index = ((event.tick / ticks_per_step) % MAX_STEPS as u64) as usize;
            steps[index] = Step {
                note: event.note,
                gate: true,
                accent: event.velocity > ACCENT_THRESHOLD,
                velocity: event.velocity,
                ..Default::default()
            };
            steps
        })
}

/// Mark slides and ties by comparing each step with the next one.
///
/// When both steps sound, a pitch change of one or two semitones marks the
/// earlier step as a slide and a repeated pitch marks it as a tie.
pub fn infer_articulation(steps: &mut [Step]) {
    for i in 1..steps.len() {
        let (prev, next) = (steps[i - 1], steps[i]);
        if !(prev.gate && next.gate) {
            continue;
        }

        let distance = prev.note.abs_diff(next.note);
        if (1..=SLIDE_RANGE).contains(&distance) {
            steps[i - 1].slide = true;
        }
        if distance == 0 {
            steps[i - 1].tie = true;
        }
    }
}
