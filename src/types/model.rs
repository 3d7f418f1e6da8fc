//! Video model catalog entry types.

use serde::{Deserialize, Serialize};

use super::parameter::ParameterDef;

/// A capability that a video model may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Generate video from a text prompt.
    TextToVideo,
    /// Generate video from an input image.
    ImageToVideo,
    /// Audio input or output.
    Audio,
    /// Timestamp-based control.
    TimestampControl,
}

/// Capability flags of a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    #[serde(default)]
    pub text_to_video: bool,
    #[serde(default)]
    pub image_to_video: bool,
    #[serde(default)]
    pub audio: bool,
    #[serde(default)]
    pub timestamp_control: bool,
}

impl ModelCapabilities {
    /// Whether the flag for `capability` is set.
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::TextToVideo => self.text_to_video,
            Capability::ImageToVideo => self.image_to_video,
            Capability::Audio => self.audio,
            Capability::TimestampControl => self.timestamp_control,
        }
    }
}

/// How a model's price is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingUnit {
    /// Charged per second of generated video.
    PerSecond,
    /// Flat charge per generated video.
    PerVideo,
}

/// Pricing information in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub amount: f64,
    pub unit: PricingUnit,
}

/// Performance hints for a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Average generation time in seconds.
    pub avg_generation_time: u32,
    /// Maximum video duration in seconds.
    pub max_duration: u32,
    #[serde(default)]
    pub resolutions: Vec<String>,
    #[serde(default)]
    pub frame_rates: Vec<u32>,
}

/// An immutable catalog entry describing a video generation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoModel {
    /// Model identifier in `owner/name` form (e.g. "google/veo-3").
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    pub owner: String,
    /// Version label ("latest" resolves at the boundary).
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: ModelCapabilities,
    /// Parameters in display order.
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    pub pricing: Pricing,
    #[serde(default)]
    pub performance: Performance,
}

fn default_version() -> String {
    "latest".to_string()
}

impl VideoModel {
    /// Look up a parameter definition by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check the entry's invariants: `owner/name` id, unique parameter
    /// names, and valid select parameters.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        match self.id.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {}
            _ => return Err(format!("model id '{}' is not in owner/name form", self.id)),
        }
        for (i, param) in self.parameters.iter().enumerate() {
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(format!(
                    "model '{}' declares parameter '{}' twice",
                    self.id, param.name
                ));
            }
            param.check()?;
        }
        Ok(())
    }
}
