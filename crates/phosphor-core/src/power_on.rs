//! CRT "power-on" transition between the boot transcript and the main view.
//!
//! A strictly time-indexed phase counter: `phase` goes from 0 to
//! [`PHASE_COUNT`] as fixed offsets from activation pass. Nothing but time
//! moves it. Sound cues ride along on their own offsets and never gate a
//! phase.

use crate::audio::{AudioContext, Cue};
use crate::timeline::Timeline;

/// Offsets (ms from activation) at which phases 1..=12 begin.
pub const PHASE_OFFSETS_MS: [u64; 12] = [
    50, 200, 400, 600, 900, 1200, 1500, 1800, 2100, 2400, 2600, 2800,
];

pub const PHASE_COUNT: u8 = PHASE_OFFSETS_MS.len() as u8;

/// Sound cues and when they fire.
pub const CUE_OFFSETS_MS: [(u64, Cue); 5] = [
    (50, Cue::Click),
    (200, Cue::HighVoltageWhine),
    (900, Cue::DegaussSweep),
    (1200, Cue::StaticBurst),
    (2600, Cue::SyncFlash),
];

/// Hold after the terminal phase before the parent swaps in the main view.
pub const SETTLE_MS: u64 = 500;

/// What a phase looks like. Sizes are relative to the screen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseVisual {
    /// Centre dot diameter in pixels, 0 when absent.
    pub dot_px: u8,
    /// Horizontal line width as % of screen width, 0 when absent.
    pub line_width_pct: u8,
    /// Vertical band height as % of screen height, 0 when absent.
    pub band_height_pct: u8,
    /// Random flicker lines before the vertical expansion.
    pub flicker_lines: u8,
    /// Horizontal interference inside the band.
    pub interference: bool,
    /// Wave distortion rows inside the band.
    pub wave_rows: u8,
    pub flash: bool,
    pub fade_out: bool,
    /// Tube border vignette.
    pub crt_border: bool,
    /// Static noise over the band.
    pub static_noise: bool,
}

impl PhaseVisual {
    /// Visual description of `phase` (0 = black, 12 = fading out).
    pub fn for_phase(phase: u8) -> Self {
        let mut v = Self::default();
        if (1..=4).contains(&phase) {
            v.dot_px = match phase {
                1 => 3,
                2 => 6,
                _ => 4,
            };
        }
        if (3..=6).contains(&phase) {
            v.line_width_pct = match phase {
                3 => 15,
                4 => 45,
                5 => 80,
                _ => 100,
            };
        }
        if phase == 6 {
            v.flicker_lines = 8;
        }
        if (7..=10).contains(&phase) {
            v.band_height_pct = match phase {
                7 => 8,
                8 => 30,
                9 => 70,
                _ => 100,
            };
            v.interference = phase >= 8;
        }
        if phase == 9 {
            v.wave_rows = 5;
        }
        v.flash = phase == 11;
        v.fade_out = phase == 12;
        v.crt_border = (3..=11).contains(&phase);
        v.static_noise = (6..=10).contains(&phase);
        v
    }

    /// Whether anything is drawn at all.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Beat {
    Phase(u8),
    Sound(Cue),
    Done,
}

/// The power-on animation.
#[derive(Debug)]
pub struct PowerOn {
    beats: Timeline<Beat>,
    phase: u8,
    activated_at: Option<u64>,
    done: bool,
    torn_down: bool,
}

impl Default for PowerOn {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerOn {
    pub fn new() -> Self {
        Self {
            beats: Timeline::new(),
            phase: 0,
            activated_at: None,
            done: false,
            torn_down: false,
        }
    }

    /// Start the animation at `now_ms`. A second call is ignored.
    pub fn activate(&mut self, now_ms: u64) {
        if self.activated_at.is_some() || self.torn_down {
            return;
        }
        self.activated_at = Some(now_ms);
        for (i, offset) in PHASE_OFFSETS_MS.iter().enumerate() {
            self.beats.schedule(now_ms + offset, Beat::Phase(i as u8 + 1));
        }
        for (offset, cue) in CUE_OFFSETS_MS {
            self.beats.schedule(now_ms + offset, Beat::Sound(cue));
        }
        let last = PHASE_OFFSETS_MS[PHASE_OFFSETS_MS.len() - 1];
        self.beats.schedule(now_ms + last + SETTLE_MS, Beat::Done);
    }

    /// Advance to `now_ms`. Returns the new phase if it changed.
    pub fn tick(&mut self, now_ms: u64, audio: &mut AudioContext) -> Option<u8> {
        if self.torn_down {
            return None;
        }
        let before = self.phase;
        for beat in self.beats.drain_due(now_ms) {
            match beat {
                Beat::Phase(p) => self.phase = p,
                Beat::Sound(cue) => {
                    audio.play(cue);
                }
                Beat::Done => {
                    self.done = true;
                    log::info!("power-on animation finished");
                }
            }
        }
        (self.phase != before).then_some(self.phase)
    }

    pub fn phase(&self) -> u8 {
        self.phase
    }

    pub fn visual(&self) -> PhaseVisual {
        PhaseVisual::for_phase(self.phase)
    }

    /// Opacity of the whole animation layer. Fades to 0 through the last
    /// phase.
    pub fn opacity(&self, now_ms: u64) -> f64 {
        match (self.phase, self.activated_at) {
            (p, Some(t0)) if p == PHASE_COUNT => {
                let start = t0 + PHASE_OFFSETS_MS[PHASE_OFFSETS_MS.len() - 1];
                let t = now_ms.saturating_sub(start) as f64 / 400.0;
                (0.9 * (1.0 - t)).max(0.0)
            }
            _ => 1.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.activated_at.is_some() && !self.done && !self.torn_down
    }

    /// The terminal phase has been held long enough; swap in the main view.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.beats.clear();
    }

    pub fn pending(&self) -> usize {
        self.beats.pending()
    }
}
