use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

use crate::formats::AnnotationFormat;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Options threaded through every decode/encode call
    #[serde(default)]
    pub conversion: ConversionOptions,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Options that change how annotations are decoded and encoded
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Export intervals with empty text to EAF/ANTX
    #[serde(default)]
    pub include_empty: bool,

    /// Extend point tiers into spans for EAF/ANTX instead of dropping them
    #[serde(default)]
    pub include_point: bool,

    /// Lower bound for EAF durations taken from the time-slot table (seconds)
    #[serde(default = "default_eaf_min_duration")]
    pub eaf_min_duration: f64,

    /// Lower bound for ANTX durations taken from segment ends (seconds)
    #[serde(default = "default_antx_min_duration")]
    pub antx_min_duration: f64,

    /// Tier names and placeholders used when reading Transcriber files
    #[serde(default)]
    pub transcriber: TranscriberLabels,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            include_empty: false,
            include_point: false,
            eaf_min_duration: default_eaf_min_duration(),
            antx_min_duration: default_antx_min_duration(),
            transcriber: TranscriberLabels::default(),
        }
    }
}

/// Tier names produced by the Transcriber decoder
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranscriberLabels {
    #[serde(default = "default_topics_tier")]
    pub topics_tier: String,

    #[serde(default = "default_speakers_tier")]
    pub speakers_tier: String,

    #[serde(default = "default_transcription_tier")]
    pub transcription_tier: String,

    #[serde(default = "default_background_tier")]
    pub background_tier: String,

    /// Text of turns that have no speaker
    #[serde(default = "default_no_speaker")]
    pub no_speaker: String,
}

impl Default for TranscriberLabels {
    fn default() -> Self {
        Self {
            topics_tier: default_topics_tier(),
            speakers_tier: default_speakers_tier(),
            transcription_tier: default_transcription_tier(),
            background_tier: default_background_tier(),
            no_speaker: default_no_speaker(),
        }
    }
}

/// Output settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Indent XML output
    #[serde(default = "default_true")]
    pub pretty_print: bool,

    /// Target format used when none is given on the command line
    #[serde(default = "default_target")]
    pub default_target: AnnotationFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty_print: true,
            default_target: default_target(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_eaf_min_duration() -> f64 {
    300.0
}

fn default_antx_min_duration() -> f64 {
    15.0
}

fn default_topics_tier() -> String {
    "Topics".to_string()
}

fn default_speakers_tier() -> String {
    "Speakers".to_string()
}

fn default_transcription_tier() -> String {
    "Transcription".to_string()
}

fn default_background_tier() -> String {
    "Background".to_string()
}

fn default_no_speaker() -> String {
    "(no speaker)".to_string()
}

fn default_true() -> bool {
    true
}

fn default_target() -> AnnotationFormat {
    AnnotationFormat::TextGrid
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let conversion = &self.conversion;

        for (name, value) in [
            ("eaf_min_duration", conversion.eaf_min_duration),
            ("antx_min_duration", conversion.antx_min_duration),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!("{} must be a non-negative number, got {}", name, value));
            }
        }

        let labels = &conversion.transcriber;
        for (name, value) in [
            ("topics_tier", &labels.topics_tier),
            ("speakers_tier", &labels.speakers_tier),
            ("transcription_tier", &labels.transcription_tier),
            ("background_tier", &labels.background_tier),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("Transcriber tier label '{}' must not be empty", name));
            }
        }

        if !self.output.default_target.can_encode() {
            return Err(anyhow!(
                "Default target format '{}' cannot be written",
                self.output.default_target
            ));
        }

        Ok(())
    }
}
