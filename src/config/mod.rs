// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the command-line converter.
//!
//! Settings are read from a small YAML file selecting the device and the
//! MIDI export options. Every field has a default, so an empty file is a
//! valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::device::DeviceKind;
use crate::midi::{MidiOptions, DEFAULT_PPQN, MAX_PPQN, STEPS_PER_QUARTER};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "seqconv.yaml";

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Device name ("td3")
    #[serde(default = "default_device")]
    pub device: String,
    /// MIDI export settings
    #[serde(default)]
    pub midi: MidiSettings,
}

fn default_device() -> String {
    DeviceKind::default().key().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: default_device(),
            midi: MidiSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save settings to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Settings for a run: the explicit file if given, else
    /// [`DEFAULT_CONFIG_FILE`] inside `dir` when present, else defaults.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback: PathBuf = dir.join(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };
        debug!(path = %path.display(), "loading config");
        Self::load(&path)
    }

    /// The configured device
    pub fn device_kind(&self) -> Result<DeviceKind> {
        self.device
            .parse::<DeviceKind>()
            .with_context(|| format!("Invalid device in config: {:?}", self.device))
    }

    /// MIDI options with out-of-range values clamped
    pub fn midi_options(&self) -> MidiOptions {
        let ppqn = self.midi.ppqn.clamp(STEPS_PER_QUARTER, MAX_PPQN);
        let channel = self.midi.channel.clamp(1, 16);
        if ppqn != self.midi.ppqn || channel != self.midi.channel {
            warn!(
                ppqn = self.midi.ppqn,
                channel = self.midi.channel,
                "midi settings out of range, clamped"
            );
        }
        MidiOptions {
            ppqn,
            channel: channel - 1,
        }
    }
}

/// MIDI export settings as written in the file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MidiSettings {
    /// Ticks per quarter note
    #[serde(default = "default_ppqn")]
    pub ppqn: u16,
    /// MIDI channel (1-16)
    #[serde(default = "default_channel")]
    pub channel: u8,
}

fn default_ppqn() -> u16 {
    DEFAULT_PPQN
}
fn default_channel() -> u8 {
    1
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            ppqn: default_ppqn(),
            channel: default_channel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let yaml = r#"
device: td3
midi:
  ppqn: 96
  channel: 10
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.device, "td3");
        assert_eq!(settings.device_kind().unwrap(), DeviceKind::Td3);

        let options = settings.midi_options();
        assert_eq!(options.ppqn, 96);
        assert_eq!(options.channel, 9);
    }

    #[test]
    fn test_default_values() {
        let settings = Settings::from_yaml("midi:\n  ppqn: 240\n").unwrap();
        assert_eq!(settings.device, "td3");
        assert_eq!(settings.midi.channel, 1);
        assert_eq!(settings.midi_options(), MidiOptions { ppqn: 240, channel: 0 });

        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
        assert_eq!(Settings::default().midi_options(), MidiOptions::default());
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let settings = Settings::from_yaml("midi:\n  ppqn: 1\n  channel: 0\n").unwrap();
        assert_eq!(settings.midi_options(), MidiOptions { ppqn: 4, channel: 0 });

        let settings = Settings::from_yaml("midi:\n  channel: 99\n").unwrap();
        assert_eq!(settings.midi_options().channel, 15);

        let settings = Settings::from_yaml("midi:\n  ppqn: 40000\n").unwrap();
        assert_eq!(settings.midi_options().ppqn, MAX_PPQN);
    }

    #[test]
    fn test_unknown_device() {
        let settings = Settings::from_yaml("device: tb303\n").unwrap();
        let err = settings.device_kind().unwrap_err();
        assert!(err.to_string().contains("tb303"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(Settings::from_yaml("midi: [1, 2").is_err());
        assert!(Settings::from_yaml("midi:\n  ppqn: lots\n").is_err());
    }

    #[test]
    fn test_round_trip() {
        let mut settings = Settings::default();
        settings.midi.ppqn = 192;
        let yaml = settings.to_yaml().unwrap();
        assert_eq!(Settings::from_yaml(&yaml).unwrap(), settings);
    }

    #[test]
    fn test_resolve() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::resolve(None, dir.path()).unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.midi.channel = 3;
        settings.save(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(Settings::resolve(None, dir.path()).unwrap(), settings);

        let missing = dir.path().join("missing.yaml");
        assert!(Settings::resolve(Some(&missing), dir.path()).is_err());
    }
}
