//! Boot script: the fixed, timestamped transcript replayed at startup.
//!
//! A script is an ordered list of [`ScriptLine`]s. It is authored data,
//! loaded once and never mutated. Scripts can come from [`default_script`] or
//! from a JSON file:
//!
//! ```json
//! [
//!   { "text": "[SYSTEM] Warming up...", "offset_ms": 0 },
//!   { "text": "C:\\> launch", "offset_ms": 400, "typed": true },
//!   { "text": "", "offset_ms": 900, "category": "plain" }
//! ]
//! ```
//!
//! When `category` is omitted it is derived from the text with
//! [`LineCategory::classify`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::Cue;
use crate::error::{Error, Result};

/// Display/sound tag of a line. Has no effect on timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCategory {
    System,
    Success,
    Network,
    Progress,
    File,
    Divider,
    Title,
    Final,
    #[default]
    Plain,
}

impl LineCategory {
    /// Derive a category from the line's text.
    pub fn classify(text: &str) -> Self {
        if text.contains("ALL SYSTEMS") || text.contains("READY") || text.contains(">>") {
            Self::Final
        } else if text.contains("[OK]") {
            Self::Success
        } else if text.contains('█') {
            Self::Progress
        } else if text.contains("[NETWORK]") {
            Self::Network
        } else if text.contains("[SYSTEM]")
            || text.contains("[DISPLAY]")
            || text.contains("[AUDIO]")
        {
            Self::System
        } else if text.contains("[FILE]")
            || text.trim_start().starts_with("Loading")
            || text.contains(".pak")
        {
            Self::File
        } else if text.contains('╔') || text.contains('╚') || is_rule(text) {
            Self::Divider
        } else if text.contains('║') {
            Self::Title
        } else {
            Self::Plain
        }
    }

    /// Sound played when a line of this category is revealed.
    pub fn cue(self) -> Option<Cue> {
        match self {
            Self::System | Self::Network => Some(Cue::SystemBeep),
            Self::Success => Some(Cue::Success),
            Self::Progress => Some(Cue::ProgressTick),
            Self::File => Some(Cue::DiskActivity),
            Self::Final => Some(Cue::ReadyChime),
            Self::Divider | Self::Title | Self::Plain => None,
        }
    }
}

impl std::fmt::Display for LineCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Success => write!(f, "success"),
            Self::Network => write!(f, "network"),
            Self::Progress => write!(f, "progress"),
            Self::File => write!(f, "file"),
            Self::Divider => write!(f, "divider"),
            Self::Title => write!(f, "title"),
            Self::Final => write!(f, "final"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

fn is_rule(text: &str) -> bool {
    let t = text.trim();
    !t.is_empty() && t.chars().all(|c| c == '═' || c == '─')
}

/// One entry of the boot script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLine")]
pub struct ScriptLine {
    pub text: String,
    /// Milliseconds after the player starts at which the line reveals.
    pub offset_ms: u64,
    pub category: LineCategory,
    /// Reveal character by character instead of all at once.
    pub typed: bool,
}

impl ScriptLine {
    /// Plain line with a classified category.
    pub fn new(text: impl Into<String>, offset_ms: u64) -> Self {
        let text = text.into();
        let category = LineCategory::classify(&text);
        Self {
            text,
            offset_ms,
            category,
            typed: false,
        }
    }

    pub fn typed(mut self) -> Self {
        self.typed = true;
        self
    }

    pub fn with_category(mut self, category: LineCategory) -> Self {
        self.category = category;
        self
    }

    /// Characters revealed by typing (the caret counts none).
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Deserialize)]
struct RawLine {
    text: String,
    offset_ms: u64,
    #[serde(default)]
    category: Option<LineCategory>,
    #[serde(default)]
    typed: bool,
}

impl From<RawLine> for ScriptLine {
    fn from(raw: RawLine) -> Self {
        let category = raw
            .category
            .unwrap_or_else(|| LineCategory::classify(&raw.text));
        Self {
            text: raw.text,
            offset_ms: raw.offset_ms,
            category,
            typed: raw.typed,
        }
    }
}

const BAR: &str = "[████████████████████████████████████████] 100%";

/// The launcher's built-in boot transcript.
pub fn default_script() -> Vec<ScriptLine> {
    let progress = |name: &str, at: u64| ScriptLine::new(format!("  {BAR}  {name}"), at);
    vec![
        ScriptLine::new("PHOSPHOR SYSTEMS BIOS v4.12  (C) 1987-1994", 0),
        ScriptLine::new("Memory test: 640K OK", 150),
        ScriptLine::new("", 300),
        ScriptLine::new("C:\\> cd RIVALS", 500).typed(),
        ScriptLine::new("C:\\RIVALS> launcher --init", 1000).typed(),
        ScriptLine::new("", 1900),
        ScriptLine::new("╔══════════════════════════════════════════════╗", 2000),
        ScriptLine::new("║     PROJECT RIVALS - BEDROCK LAUNCHER        ║", 2150),
        ScriptLine::new("║                Version 2.1.4                 ║", 2300),
        ScriptLine::new("╚══════════════════════════════════════════════╝", 2450),
        ScriptLine::new("", 2600),
        ScriptLine::new("[SYSTEM] Initializing launcher components...", 2800),
        ScriptLine::new("[OK] Core modules loaded successfully", 3300),
        ScriptLine::new("[SYSTEM] Checking for updates...", 3700),
        ScriptLine::new("[OK] Launcher is up to date", 4100),
        ScriptLine::new("", 4300),
        ScriptLine::new("[NETWORK] Establishing secure connection...", 4500),
        ScriptLine::new("[OK] Connected to game servers", 5200),
        ScriptLine::new("[NETWORK] Verifying server status...", 5800),
        ScriptLine::new("[OK] Server online", 6400),
        ScriptLine::new("", 6700),
        ScriptLine::new("Loading resources:", 7000),
        progress("textures.pak", 7500),
        progress("sounds.pak", 8000),
        progress("scripts.pak", 8500),
        progress("shaders.pak", 9000),
        ScriptLine::new("", 9300),
        ScriptLine::new("[DISPLAY] Initializing VHS display driver...", 9600),
        ScriptLine::new("[OK] CRT emulation active", 10_100),
        ScriptLine::new("[OK] Scanline overlay enabled", 10_400),
        ScriptLine::new("[OK] Retro filters applied", 10_700),
        ScriptLine::new("", 11_000),
        ScriptLine::new("[AUDIO] Loading ambient soundtrack...", 11_300),
        ScriptLine::new("[OK] Audio subsystem ready", 11_700),
        ScriptLine::new("", 12_000),
        ScriptLine::new("══════════════════════════════════════════════════", 12_300),
        ScriptLine::new("  ALL SYSTEMS OPERATIONAL - READY TO LAUNCH", 12_600),
        ScriptLine::new("══════════════════════════════════════════════════", 12_900),
        ScriptLine::new("", 13_200),
        ScriptLine::new(">> POWERING ON DISPLAY...", 13_500),
    ]
}

/// Parse a script from JSON.
pub fn parse_script(json: &str) -> Result<Vec<ScriptLine>> {
    let lines: Vec<ScriptLine> = serde_json::from_str(json)?;
    Ok(lines)
}

/// Read and parse a script file.
pub fn load_script(path: &Path) -> Result<Vec<ScriptLine>> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_script(&raw)
}

/// Check a script against the player's total duration.
///
/// Lines must be single rows and must come due before the player completes.
/// Out-of-order offsets are allowed (they reveal in offset order) but logged.
pub fn validate_script(lines: &[ScriptLine], total_ms: u64) -> Result<()> {
    for (i, line) in lines.iter().enumerate() {
        if line.text.contains('\n') {
            return Err(Error::InvalidScript(format!(
                "line {i} spans several rows; split it into separate lines"
            )));
        }
        if line.offset_ms >= total_ms {
            return Err(Error::InvalidScript(format!(
                "line {i} is scheduled at {}ms, at or after completion ({total_ms}ms)",
                line.offset_ms
            )));
        }
    }
    if lines.windows(2).any(|w| w[1].offset_ms < w[0].offset_ms) {
        log::warn!("boot script offsets are not non-decreasing; lines will reveal in offset order");
    }
    Ok(())
}
