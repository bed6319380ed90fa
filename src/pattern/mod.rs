// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Canonical pattern model.
//!
//! Every codec decodes into a [`Pattern`] and encodes from one. A pattern is
//! a transient value: it is built by a decode call and consumed by the
//! paired encode call.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maximum number of steps in a pattern
pub const MAX_STEPS: usize = 16;

/// Highest valid MIDI value for notes and velocities
pub const MIDI_MAX: u8 = 127;

/// Velocity assigned by device decoders to unaccented steps
pub const DEFAULT_VELOCITY: u8 = 100;

/// Velocity forced on accented steps
pub const ACCENT_VELOCITY: u8 = 127;

/// Tempo used when a pattern carries none
pub const DEFAULT_TEMPO: f64 = 120.0;

/// A single step of a monophonic pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Step {
    /// MIDI note number (0-127)
    pub note: u8,
    /// Whether the step sounds (false = rest)
    #[serde(default)]
    pub gate: bool,
    /// Accent flag
    #[serde(default)]
    pub accent: bool,
    /// Glide into the following step
    #[serde(default)]
    pub slide: bool,
    /// Sustain the previous step instead of re-triggering
    #[serde(default)]
    pub tie: bool,
    /// Velocity (0-127)
    #[serde(default)]
    pub velocity: u8,
}

impl Step {
    /// Create a gated step
    pub fn note(note: u8, velocity: u8) -> Self {
        Self {
            note,
            gate: true,
            velocity,
            ..Default::default()
        }
    }

    /// Create a rest
    pub fn rest() -> Self {
        Self::default()
    }

    /// Set the accent flag, forcing the accent velocity
    pub fn with_accent(mut self) -> Self {
        self.accent = true;
        self.velocity = ACCENT_VELOCITY;
        self
    }

    /// Set the slide flag
    pub fn with_slide(mut self) -> Self {
        self.slide = true;
        self
    }

    /// Set the tie flag
    pub fn with_tie(mut self) -> Self {
        self.tie = true;
        self
    }

    /// Velocity a device decoder assigns for the given accent flag
    pub fn device_velocity(accent: bool) -> u8 {
        if accent {
            ACCENT_VELOCITY
        } else {
            DEFAULT_VELOCITY
        }
    }
}

/// A sequence of up to [`MAX_STEPS`] steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Display label
    #[serde(default)]
    pub name: String,
    /// Steps in playback order
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Number of active steps (1-16)
    #[serde(default = "default_length")]
    pub length: usize,
    /// Tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Target hardware family identifier
    #[serde(default)]
    pub device_id: u8,
    /// Triplet flag from the device dump (not interpreted)
    #[serde(default)]
    pub triplet: bool,
}

fn default_length() -> usize {
    MAX_STEPS
}

fn default_tempo() -> f64 {
    DEFAULT_TEMPO
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            name: String::new(),
            steps: Vec::new(),
            length: default_length(),
            tempo: default_tempo(),
            device_id: 0,
            triplet: false,
        }
    }
}

impl Pattern {
    /// Create an empty pattern
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a pattern from a list of steps
    pub fn with_steps(name: impl Into<String>, steps: Vec<Step>) -> Self {
        let length = steps.len().clamp(1, MAX_STEPS);
        let mut pattern = Self {
            name: name.into(),
            steps,
            length,
            ..Default::default()
        };
        pattern.normalize();
        pattern
    }

    /// Number of steps an encoder writes (never more than [`MAX_STEPS`])
    pub fn step_count(&self) -> usize {
        self.steps.len().min(MAX_STEPS)
    }

    /// Step at `index`, or a rest beyond the end of the pattern
    pub fn step_or_rest(&self, index: usize) -> Step {
        self.steps.get(index).copied().unwrap_or_default()
    }

    /// Whether the step at `index` is tied, honouring the no-tie-at-zero rule
    pub fn is_tied(&self, index: usize) -> bool {
        index > 0 && self.steps.get(index).is_some_and(|s| s.tie)
    }

    /// Tempo with the default substituted for unset or invalid values
    pub fn effective_tempo(&self) -> f64 {
        if self.tempo > 0.0 {
            self.tempo
        } else {
            DEFAULT_TEMPO
        }
    }

    /// Number of gated steps
    pub fn active_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.gate).count()
    }

    /// Enforce the model invariants in place.
    ///
    /// Truncates to [`MAX_STEPS`], clamps notes and velocities to 0-127,
    /// clears a tie on the first step and clamps `length` to 1-16.
    pub fn normalize(&mut self) {
        if self.steps.len() > MAX_STEPS {
            warn!(steps = self.steps.len(), "truncating pattern to {} steps", MAX_STEPS);
            self.steps.truncate(MAX_STEPS);
        }

        for step in &mut self.steps {
            step.note = step.note.min(MIDI_MAX);
            step.velocity = step.velocity.min(MIDI_MAX);
        }

        if let Some(first) = self.steps.first_mut() {
            first.tie = false;
        }

        self.length = self.length.clamp(1, MAX_STEPS);
    }
}
