//! Best-effort sound cues.
//!
//! Components never own a sound engine. They are handed an [`AudioContext`]
//! by whoever owns it (the app) and call [`AudioContext::play`]. A cue that
//! cannot be played (muted, disposed, sink error) is dropped and the visual
//! state machine carries on regardless.
//!
//! Each [`Cue`] describes its synthesized timbre as a list of [`Tone`]s; a
//! [`SoundSink`] decides how much of that it can render. With the
//! `device-audio` feature the speaker sink renders every tone through
//! [`crate::synth::Synth`]; otherwise [`BellSink`] maps the loudest cues to
//! the terminal bell.
//!
//! The ambient loop is the one long-running sound. The app asks for it once
//! the tube is on; mute silences it along with the cues.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Oscillator shape for a [`Tone`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Noise,
}

/// One synthesized voice: a frequency glide with a fixed gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub start_hz: f64,
    pub end_hz: f64,
    /// Offset from the cue trigger.
    pub delay_ms: u64,
    pub duration_ms: u64,
    pub gain: f64,
}

impl Tone {
    pub const fn new(waveform: Waveform, start_hz: f64, end_hz: f64, duration_ms: u64, gain: f64) -> Self {
        Self {
            waveform,
            start_hz,
            end_hz,
            delay_ms: 0,
            duration_ms,
            gain,
        }
    }

    pub const fn after(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn end_ms(&self) -> u64 {
        self.delay_ms + self.duration_ms
    }
}

/// Every sound the launcher can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// `[OK]` lines.
    Success,
    /// Resource progress bars.
    ProgressTick,
    /// `[SYSTEM]`-style status lines.
    SystemBeep,
    /// File and disk activity.
    DiskActivity,
    /// The final "ready" line.
    ReadyChime,
    /// Power switch.
    Click,
    /// Flyback transformer whine as the tube warms up.
    HighVoltageWhine,
    DegaussSweep,
    StaticBurst,
    SyncFlash,
}

const SUCCESS: &[Tone] = &[Tone::new(Waveform::Square, 880.0, 1320.0, 60, 0.05)];
const PROGRESS_TICK: &[Tone] = &[Tone::new(Waveform::Square, 1200.0, 1200.0, 15, 0.03)];
const SYSTEM_BEEP: &[Tone] = &[Tone::new(Waveform::Sine, 660.0, 660.0, 80, 0.06)];
const DISK_ACTIVITY: &[Tone] = &[
    Tone::new(Waveform::Noise, 0.0, 0.0, 25, 0.04),
    Tone::new(Waveform::Noise, 0.0, 0.0, 25, 0.04).after(45),
];
const READY_CHIME: &[Tone] = &[
    Tone::new(Waveform::Sine, 523.25, 523.25, 120, 0.08),
    Tone::new(Waveform::Sine, 659.25, 659.25, 120, 0.08).after(120),
    Tone::new(Waveform::Sine, 783.99, 783.99, 240, 0.08).after(240),
];
const CLICK: &[Tone] = &[Tone::new(Waveform::Square, 120.0, 60.0, 20, 0.1)];
const HIGH_VOLTAGE_WHINE: &[Tone] = &[Tone::new(Waveform::Sine, 15_000.0, 15_750.0, 600, 0.02)];
const DEGAUSS_SWEEP: &[Tone] = &[Tone::new(Waveform::Sawtooth, 60.0, 30.0, 400, 0.07)];
const STATIC_BURST: &[Tone] = &[Tone::new(Waveform::Noise, 0.0, 0.0, 250, 0.05)];
const SYNC_FLASH: &[Tone] = &[Tone::new(Waveform::Sine, 2000.0, 200.0, 150, 0.06)];

/// Length of one pass of the ambient loop.
pub const AMBIENT_LOOP_MS: u64 = 8_000;

/// Lo-fi pad behind the main view: two slow chords, looped.
pub const AMBIENT_LOOP: &[Tone] = &[
    Tone::new(Waveform::Sine, 110.0, 110.0, 4_000, 0.3),
    Tone::new(Waveform::Sine, 130.81, 130.81, 4_000, 0.25),
    Tone::new(Waveform::Sine, 164.81, 164.81, 4_000, 0.25),
    Tone::new(Waveform::Sine, 98.0, 98.0, 4_000, 0.3).after(4_000),
    Tone::new(Waveform::Sine, 123.47, 123.47, 4_000, 0.25).after(4_000),
    Tone::new(Waveform::Sine, 146.83, 146.83, 4_000, 0.25).after(4_000),
];

impl Cue {
    /// Synthesis recipe for this cue.
    pub fn voice(self) -> &'static [Tone] {
        match self {
            Self::Success => SUCCESS,
            Self::ProgressTick => PROGRESS_TICK,
            Self::SystemBeep => SYSTEM_BEEP,
            Self::DiskActivity => DISK_ACTIVITY,
            Self::ReadyChime => READY_CHIME,
            Self::Click => CLICK,
            Self::HighVoltageWhine => HIGH_VOLTAGE_WHINE,
            Self::DegaussSweep => DEGAUSS_SWEEP,
            Self::StaticBurst => STATIC_BURST,
            Self::SyncFlash => SYNC_FLASH,
        }
    }

    /// Total length of the cue, longest voice included.
    pub fn duration_ms(self) -> u64 {
        self.voice().iter().map(Tone::end_ms).max().unwrap_or(0)
    }

    /// Whether a bell-only sink should ring for this cue.
    pub fn rings_bell(self) -> bool {
        matches!(self, Self::ReadyChime | Self::Click)
    }
}

impl std::fmt::Display for Cue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::ProgressTick => write!(f, "progress_tick"),
            Self::SystemBeep => write!(f, "system_beep"),
            Self::DiskActivity => write!(f, "disk_activity"),
            Self::ReadyChime => write!(f, "ready_chime"),
            Self::Click => write!(f, "click"),
            Self::HighVoltageWhine => write!(f, "high_voltage_whine"),
            Self::DegaussSweep => write!(f, "degauss_sweep"),
            Self::StaticBurst => write!(f, "static_burst"),
            Self::SyncFlash => write!(f, "sync_flash"),
        }
    }
}

/// Something that can render cues.
pub trait SoundSink {
    fn play(&mut self, cue: Cue, tones: &[Tone]) -> Result<()>;

    /// Start or stop the ambient loop. Sinks that cannot loop ignore it.
    fn set_ambient(&mut self, _playing: bool) -> Result<()> {
        Ok(())
    }

    /// Short name of the output, for the settings panel.
    fn describe(&self) -> &'static str;
}

/// Swallows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl SoundSink for SilentSink {
    fn play(&mut self, _cue: Cue, _tones: &[Tone]) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> &'static str {
        "none"
    }
}

/// Rings the terminal bell (BEL) for the cues that warrant it.
pub struct BellSink<W: Write> {
    out: W,
}

impl<W: Write> BellSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SoundSink for BellSink<W> {
    fn play(&mut self, cue: Cue, _tones: &[Tone]) -> Result<()> {
        if !cue.rings_bell() {
            return Ok(());
        }
        self.out
            .write_all(b"\x07")
            .and_then(|_| self.out.flush())
            .map_err(|e| Error::Audio(e.to_string()))
    }

    fn describe(&self) -> &'static str {
        "terminal bell"
    }
}

/// Keeps every cue it is asked to play. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    played: Rc<RefCell<Vec<Cue>>>,
    ambient: Rc<Cell<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Cue> {
        self.played.borrow().clone()
    }

    pub fn ambient_playing(&self) -> bool {
        self.ambient.get()
    }
}

impl SoundSink for RecordingSink {
    fn play(&mut self, cue: Cue, _tones: &[Tone]) -> Result<()> {
        self.played.borrow_mut().push(cue);
        Ok(())
    }

    fn set_ambient(&mut self, playing: bool) -> Result<()> {
        self.ambient.set(playing);
        Ok(())
    }

    fn describe(&self) -> &'static str {
        "recording"
    }
}

/// Owned sound context, passed by `&mut` to whoever wants to make noise.
pub struct AudioContext {
    sink: Option<Box<dyn SoundSink>>,
    muted: bool,
    ambient: bool,
    played: u64,
    dropped: u64,
}

impl AudioContext {
    pub fn new(sink: Box<dyn SoundSink>) -> Self {
        Self {
            sink: Some(sink),
            muted: false,
            ambient: false,
            played: 0,
            dropped: 0,
        }
    }

    /// A context that plays nothing.
    pub fn silent() -> Self {
        Self::new(Box::new(SilentSink))
    }

    /// Play `cue` if possible. Returns whether the sink accepted it; callers
    /// are free to ignore the answer.
    pub fn play(&mut self, cue: Cue) -> bool {
        if self.muted {
            self.dropped += 1;
            return false;
        }
        let Some(sink) = self.sink.as_mut() else {
            self.dropped += 1;
            return false;
        };
        match sink.play(cue, cue.voice()) {
            Ok(()) => {
                self.played += 1;
                true
            }
            Err(e) => {
                log::debug!("dropping cue {cue}: {e}");
                self.dropped += 1;
                false
            }
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sync_ambient();
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    /// Ask for the ambient loop. It sounds whenever the context is unmuted.
    pub fn start_ambient(&mut self) {
        if !self.ambient {
            self.ambient = true;
            self.sync_ambient();
        }
    }

    pub fn stop_ambient(&mut self) {
        if self.ambient {
            self.ambient = false;
            self.sync_ambient();
        }
    }

    /// Whether the ambient loop should be audible right now.
    pub fn ambient_audible(&self) -> bool {
        self.ambient && !self.muted && self.sink.is_some()
    }

    fn sync_ambient(&mut self) {
        let audible = self.ambient_audible();
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.set_ambient(audible) {
                log::debug!("ambient loop unavailable: {e}");
            }
        }
    }

    /// Name of the current output, `"none"` once disposed.
    pub fn output(&self) -> &'static str {
        self.sink.as_ref().map_or("none", |s| s.describe())
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Release the sink. Every later cue is dropped.
    pub fn dispose(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.set_ambient(false) {
                log::debug!("ambient loop did not stop cleanly: {e}");
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.sink.is_none()
    }

    pub fn played_count(&self) -> u64 {
        self.played
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

impl Default for AudioContext {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioContext")
            .field("disposed", &self.is_disposed())
            .field("muted", &self.muted)
            .field("ambient", &self.ambient)
            .field("played", &self.played)
            .field("dropped", &self.dropped)
            .finish()
    }
}
