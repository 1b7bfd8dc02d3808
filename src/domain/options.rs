use crate::error::{PipelineError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_SEGMENT_DURATION: u32 = 50;

/// Quality tier, i.e. the base resolution class before aspect reshaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
}

impl Quality {
    /// Unknown tags fall back to 1080p.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "720p" => Quality::P720,
            "480p" => Quality::P480,
            _ => Quality::P1080,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for Quality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map(Quality::from_tag).unwrap_or_default())
    }
}

/// Named target shape of the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// Unknown tags fall back to 9:16.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "16:9" => AspectRatio::Landscape,
            "1:1" => AspectRatio::Square,
            _ => AspectRatio::Portrait,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .map(AspectRatio::from_tag)
            .unwrap_or_default())
    }
}

/// Options of one processing run. Never mutated once the run has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOptions {
    #[serde(default)]
    pub quality: Quality,
    #[serde(default = "default_segment_duration")]
    pub segment_duration: u32,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

fn default_segment_duration() -> u32 {
    DEFAULT_SEGMENT_DURATION
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            segment_duration: DEFAULT_SEGMENT_DURATION,
            aspect_ratio: AspectRatio::default(),
        }
    }
}

impl ProcessingOptions {
    /// Parses the JSON `options` payload of an upload. An absent or blank
    /// payload means all defaults.
    pub fn from_json(raw: Option<&str>) -> Result<Self> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(raw) => raw,
        };

        let options: ProcessingOptions = serde_json::from_str(raw)
            .map_err(|e| PipelineError::InvalidInput(format!("malformed options: {}", e)))?;

        if options.segment_duration == 0 {
            return Err(PipelineError::InvalidInput(
                "segmentDuration must be at least 1 second".to_string(),
            ));
        }
        Ok(options)
    }
}
