//! # phosphor-core
//!
//! **A retro CRT launcher, minus the browser.**
//!
//! `phosphor-core` holds the time-driven pieces of a retro boot screen: a
//! scripted MS-DOS style boot transcript, the CRT power-on animation that
//! follows it, a layered VHS noise and glitch overlay, and a launch control
//! that hands a game client a server deep link.
//!
//! ## Quick Start
//!
//! ```no_run
//! use phosphor_core::{AudioContext, BootPlayer, BootTiming, Clock, SystemClock, default_script};
//!
//! let clock = SystemClock::new();
//! let mut audio = AudioContext::silent();
//! let mut boot = BootPlayer::new(default_script(), BootTiming::default(), || {
//!     println!("boot complete");
//! });
//!
//! boot.start(clock.now_ms());
//! while !boot.is_complete() {
//!     boot.tick(clock.now_ms(), &mut audio);
//!     std::thread::sleep(std::time::Duration::from_millis(16));
//! }
//! println!("{} lines", boot.transcript().len());
//! ```
//!
//! ## Architecture
//!
//! Clock → `tick(now_ms)` → component state → renderer
//!
//! Nothing here spawns threads or sleeps. Every component is handed the
//! current time by its owner, keeps its future work in a [`Timeline`], and
//! exposes a snapshot for drawing. Tests drive the same code with synthetic
//! times and a seeded RNG.
//!
//! - [`BootPlayer`]: timed transcript with typing, caret and one completion.
//! - [`PowerOn`]: twelve fixed visual phases plus sound cues.
//! - [`GlitchGenerator`]: noise texture, glitch bars, flicker, tracking bar,
//!   vertical roll, parameterized by an [`IntensityProfile`].
//! - [`Launcher`]: optimistic deep-link launch with a copyable fallback.
//! - [`AudioContext`]: best-effort cues and the ambient loop, rendered by
//!   [`Synth`] on the speakers when the `device-audio` feature is on.

pub mod audio;
pub mod boot;
pub mod clock;
pub mod config;
#[cfg(feature = "device-audio")]
pub mod device;
pub mod error;
pub mod glitch;
pub mod intensity;
pub mod launch;
pub mod power_on;
pub mod script;
pub mod synth;
pub mod timeline;
pub mod viewport;

pub use audio::{
    AMBIENT_LOOP, AMBIENT_LOOP_MS, AudioContext, BellSink, Cue, RecordingSink, SilentSink,
    SoundSink, Tone, Waveform,
};
pub use boot::{BootEvent, BootPlayer, BootTiming};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use glitch::{GlitchEvent, GlitchGenerator, NOISE_SIZE, NoiseBuffer, Overlay, TrialStats};
pub use intensity::{EffectParams, IntensityProfile};
pub use launch::{
    ClipboardSink, Launcher, ServerTarget, SystemClipboard, SystemOpener, UrlOpener,
};
pub use power_on::{PHASE_COUNT, PhaseVisual, PowerOn};
pub use script::{
    LineCategory, ScriptLine, default_script, load_script, parse_script, validate_script,
};
pub use synth::{AMBIENT_VOLUME, Synth};
pub use timeline::{Interval, TimerId, Timeline};
pub use viewport::Viewport;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
