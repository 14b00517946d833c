//! VHS intensity presets.
//!
//! Four named profiles, each a fixed bundle of [`EffectParams`]. Switching
//! is an atomic swap of the whole bundle; nothing interpolates.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Named overlay preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityProfile {
    Soft,
    #[default]
    Normal,
    Strong,
    Extreme,
}

/// Numeric knobs of the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Darkening of each scanline row.
    pub scanline_opacity: f64,
    /// Rows between scanlines.
    pub scanline_gap: u8,
    pub noise_opacity: f64,
    /// Probability of a flicker per flicker trial.
    pub flicker_intensity: f64,
    /// Probability of a glitch burst per glitch trial.
    pub glitch_frequency: f64,
    /// Edge darkening at the corners.
    pub vignette: f64,
    pub phosphor_glow: f64,
    pub curvature: f64,
    pub screen_dirt: f64,
    /// Time for the tracking bar to sweep top to bottom.
    pub tracking_period_ms: u64,
    /// Occasional vertical roll; extreme only.
    pub vertical_roll: bool,
}

const SOFT: EffectParams = EffectParams {
    scanline_opacity: 0.03,
    scanline_gap: 3,
    noise_opacity: 0.01,
    flicker_intensity: 0.01,
    glitch_frequency: 0.001,
    vignette: 0.35,
    phosphor_glow: 0.02,
    curvature: 0.015,
    screen_dirt: 0.02,
    tracking_period_ms: 12_000,
    vertical_roll: false,
};

const NORMAL: EffectParams = EffectParams {
    scanline_opacity: 0.05,
    scanline_gap: 2,
    noise_opacity: 0.02,
    flicker_intensity: 0.02,
    glitch_frequency: 0.005,
    vignette: 0.5,
    phosphor_glow: 0.03,
    curvature: 0.02,
    screen_dirt: 0.03,
    tracking_period_ms: 12_000,
    vertical_roll: false,
};

const STRONG: EffectParams = EffectParams {
    scanline_opacity: 0.08,
    scanline_gap: 2,
    noise_opacity: 0.04,
    flicker_intensity: 0.04,
    glitch_frequency: 0.015,
    vignette: 0.65,
    phosphor_glow: 0.05,
    curvature: 0.025,
    screen_dirt: 0.05,
    tracking_period_ms: 12_000,
    vertical_roll: false,
};

const EXTREME: EffectParams = EffectParams {
    scanline_opacity: 0.12,
    scanline_gap: 2,
    noise_opacity: 0.08,
    flicker_intensity: 0.08,
    glitch_frequency: 0.04,
    vignette: 0.8,
    phosphor_glow: 0.08,
    curvature: 0.03,
    screen_dirt: 0.08,
    tracking_period_ms: 12_000,
    vertical_roll: true,
};

impl IntensityProfile {
    pub const ALL: [Self; 4] = [Self::Soft, Self::Normal, Self::Strong, Self::Extreme];

    pub fn params(self) -> EffectParams {
        match self {
            Self::Soft => SOFT,
            Self::Normal => NORMAL,
            Self::Strong => STRONG,
            Self::Extreme => EXTREME,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Soft => "Soft",
            Self::Normal => "Normal",
            Self::Strong => "Strong",
            Self::Extreme => "EXTREME",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Soft => "Subtle effects",
            Self::Normal => "The right balance",
            Self::Strong => "Authentic VHS",
            Self::Extreme => "Damaged TV",
        }
    }

    /// Meter level (1..=4) shown for scanlines, noise, glitch and vignette.
    pub fn level(self) -> u8 {
        match self {
            Self::Soft => 1,
            Self::Normal => 2,
            Self::Strong => 3,
            Self::Extreme => 4,
        }
    }

    /// Next profile, wrapping.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous profile, wrapping.
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        self.level() as usize - 1
    }
}

impl std::fmt::Display for IntensityProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Soft => write!(f, "soft"),
            Self::Normal => write!(f, "normal"),
            Self::Strong => write!(f, "strong"),
            Self::Extreme => write!(f, "extreme"),
        }
    }
}

impl FromStr for IntensityProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(Self::Soft),
            "normal" => Ok(Self::Normal),
            "strong" => Ok(Self::Strong),
            "extreme" => Ok(Self::Extreme),
            _ => Err(Error::UnknownProfile(s.to_string())),
        }
    }
}
