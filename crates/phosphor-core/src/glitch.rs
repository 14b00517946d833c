//! Layered visual noise and glitch generator.
//!
//! Runs for as long as the main view is mounted and produces a purely
//! decorative overlay. Every [`GlitchGenerator::tick`] is one display frame:
//!
//! - the [`NoiseBuffer`] is refilled with fresh grayscale static,
//! - expired glitch bars and flicker dips are undone,
//! - the periodic Bernoulli trials that fell due since the last frame run:
//!   glitch bursts every [`GLITCH_TRIAL_MS`], flicker every
//!   [`FLICKER_TRIAL_MS`], and on the extreme profile the vertical roll every
//!   [`ROLL_TRIAL_MS`],
//! - the tracking bar position is derived from elapsed time alone.
//!
//! Randomness comes from an injected [`RngCore`] so tests can seed it.

use rand::{Rng, RngCore};

use crate::intensity::{EffectParams, IntensityProfile};
use crate::timeline::{Interval, TimerId, Timeline};

/// Side of the square noise texture.
pub const NOISE_SIZE: usize = 128;

pub const GLITCH_TRIAL_MS: u64 = 200;
pub const FLICKER_TRIAL_MS: u64 = 100;
pub const ROLL_TRIAL_MS: u64 = 500;
pub const ROLL_PROBABILITY: f64 = 0.05;
/// Peak roll displacement, % of screen height.
pub const ROLL_MAGNITUDE_PCT: f64 = 4.0;
/// Roll displacement per frame, as a fraction of the magnitude.
pub const ROLL_RAMP: [f64; 6] = [0.25, 0.6, 1.0, 1.0, 0.6, 0.25];
/// Most glitch bars a single burst can produce.
pub const MAX_BURST: usize = 3;

/// Small grayscale static texture, scaled up by the renderer.
#[derive(Debug, Clone)]
pub struct NoiseBuffer {
    pixels: Vec<u8>,
    frame: u64,
}

impl Default for NoiseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![128; NOISE_SIZE * NOISE_SIZE],
            frame: 0,
        }
    }

    /// Refill every pixel with an independent value in `128 ± 30`.
    pub fn refresh(&mut self, rng: &mut dyn RngCore) {
        for px in &mut self.pixels {
            let u: f64 = rng.random();
            *px = (128.0 + (u - 0.5) * 60.0) as u8;
        }
        self.frame += 1;
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[(y % NOISE_SIZE) * NOISE_SIZE + (x % NOISE_SIZE)]
    }

    /// Nearest-neighbour sample at normalized coordinates.
    pub fn sample(&self, u: f64, v: f64) -> u8 {
        let x = (u.clamp(0.0, 1.0) * (NOISE_SIZE - 1) as f64) as usize;
        let y = (v.clamp(0.0, 1.0) * (NOISE_SIZE - 1) as f64) as usize;
        self.get(x, y)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// How many times the buffer has been refreshed.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// A transient bright horizontal bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchEvent {
    pub id: u64,
    /// Top edge, % of screen height, in [0, 100).
    pub position_pct: f64,
    pub height_pct: f64,
    pub opacity: f64,
    pub blur: f64,
    pub lifetime_ms: u64,
    pub born_ms: u64,
}

impl GlitchEvent {
    pub fn expires_at(&self) -> u64 {
        self.born_ms + self.lifetime_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    Glitch(u64),
    FlickerRestore,
}

#[derive(Debug, Clone, Copy)]
struct Trials {
    glitch: Interval,
    flicker: Interval,
    roll: Interval,
}

/// Counters of trial outcomes, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialStats {
    pub glitch_trials: u64,
    pub glitch_bursts: u64,
    pub flicker_trials: u64,
    pub flickers: u64,
    pub rolls: u64,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    pub profile: IntensityProfile,
    pub params: EffectParams,
    /// Whole-overlay opacity, dips below 1.0 during a flicker.
    pub opacity: f64,
    /// Tracking bar top edge, % of screen height, in [-10, 110).
    pub tracking_pct: f64,
    /// Vertical roll displacement, % of screen height.
    pub roll_offset_pct: f64,
    pub glitches: &'a [GlitchEvent],
    pub noise: &'a NoiseBuffer,
}

/// The overlay generator.
pub struct GlitchGenerator {
    profile: IntensityProfile,
    params: EffectParams,
    rng: Box<dyn RngCore>,
    noise: NoiseBuffer,
    glitches: Vec<GlitchEvent>,
    expiries: Timeline<Expiry>,
    flicker_restore: Option<TimerId>,
    opacity: f64,
    roll_step: Option<usize>,
    trials: Option<Trials>,
    started_at: u64,
    now_ms: u64,
    next_id: u64,
    stats: TrialStats,
}

impl GlitchGenerator {
    pub fn new(profile: IntensityProfile, rng: Box<dyn RngCore>) -> Self {
        Self {
            profile,
            params: profile.params(),
            rng,
            noise: NoiseBuffer::new(),
            glitches: Vec::new(),
            expiries: Timeline::new(),
            flicker_restore: None,
            opacity: 1.0,
            roll_step: None,
            trials: None,
            started_at: 0,
            now_ms: 0,
            next_id: 0,
            stats: TrialStats::default(),
        }
    }

    /// Begin the periodic processes. Ignored if already running.
    pub fn start(&mut self, now_ms: u64) {
        if self.trials.is_some() {
            return;
        }
        self.started_at = now_ms;
        self.now_ms = now_ms;
        self.trials = Some(Trials {
            glitch: Interval::new(GLITCH_TRIAL_MS, now_ms),
            flicker: Interval::new(FLICKER_TRIAL_MS, now_ms),
            roll: Interval::new(ROLL_TRIAL_MS, now_ms),
        });
        log::debug!("glitch generator started ({})", self.profile);
    }

    /// One display frame.
    pub fn tick(&mut self, now_ms: u64) {
        let Some(mut trials) = self.trials else {
            return;
        };
        self.now_ms = now_ms.max(self.now_ms);
        let now = self.now_ms;

        self.noise.refresh(self.rng.as_mut());

        for expiry in self.expiries.drain_due(now) {
            match expiry {
                Expiry::Glitch(id) => self.glitches.retain(|g| g.id != id),
                Expiry::FlickerRestore => {
                    self.opacity = 1.0;
                    self.flicker_restore = None;
                }
            }
        }

        for _ in 0..trials.glitch.fire_count(now) {
            self.stats.glitch_trials += 1;
            if self.rng.random::<f64>() < self.params.glitch_frequency {
                self.burst(now);
            }
        }

        for _ in 0..trials.flicker.fire_count(now) {
            self.stats.flicker_trials += 1;
            if self.rng.random::<f64>() < self.params.flicker_intensity {
                self.flicker(now);
            }
        }

        self.roll_step = match self.roll_step {
            Some(s) if s + 1 < ROLL_RAMP.len() => Some(s + 1),
            _ => None,
        };
        let roll_trials = trials.roll.fire_count(now);
        if self.params.vertical_roll && self.roll_step.is_none() {
            for _ in 0..roll_trials {
                if self.rng.random::<f64>() < ROLL_PROBABILITY {
                    self.roll_step = Some(0);
                    self.stats.rolls += 1;
                    break;
                }
            }
        }

        self.trials = Some(trials);
    }

    fn burst(&mut self, now: u64) {
        self.stats.glitch_bursts += 1;
        let count = (1 + (self.rng.random::<f64>() * MAX_BURST as f64) as usize).min(MAX_BURST);
        for _ in 0..count {
            let event = GlitchEvent {
                id: self.next_id,
                position_pct: self.rng.random::<f64>() * 100.0,
                height_pct: 0.3 + self.rng.random::<f64>() * 1.5,
                opacity: 0.03 + self.rng.random::<f64>() * 0.06,
                blur: 1.0 + self.rng.random::<f64>() * 2.0,
                lifetime_ms: 60 + (self.rng.random::<f64>() * 100.0) as u64,
                born_ms: now,
            };
            self.next_id += 1;
            self.expiries
                .schedule(event.expires_at(), Expiry::Glitch(event.id));
            self.glitches.push(event);
        }
        log::debug!("glitch burst of {count} at {now}ms");
    }

    fn flicker(&mut self, now: u64) {
        self.stats.flickers += 1;
        self.opacity = 0.97 + self.rng.random::<f64>() * 0.03;
        let hold = 30 + (self.rng.random::<f64>() * 50.0) as u64;
        if let Some(prev) = self.flicker_restore.take() {
            self.expiries.cancel(prev);
        }
        self.flicker_restore = Some(self.expiries.schedule(now + hold, Expiry::FlickerRestore));
    }

    /// Swap the active profile. Running processes, the noise loop and
    /// scheduled removals are untouched.
    pub fn set_profile(&mut self, profile: IntensityProfile) {
        if profile == self.profile {
            return;
        }
        log::info!("intensity {} -> {}", self.profile, profile);
        self.profile = profile;
        self.params = profile.params();
        if !self.params.vertical_roll {
            self.roll_step = None;
        }
    }

    /// Stop every process and drop everything in flight.
    pub fn teardown(&mut self) {
        self.trials = None;
        self.expiries.clear();
        self.flicker_restore = None;
        self.glitches.clear();
        self.roll_step = None;
        self.opacity = 1.0;
        log::debug!("glitch generator torn down");
    }

    pub fn is_running(&self) -> bool {
        self.trials.is_some()
    }

    pub fn profile(&self) -> IntensityProfile {
        self.profile
    }

    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    pub fn glitches(&self) -> &[GlitchEvent] {
        &self.glitches
    }

    pub fn noise(&self) -> &NoiseBuffer {
        &self.noise
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Tracking bar top edge at the last tick: sweeps -10% to 110%.
    pub fn tracking_pct(&self) -> f64 {
        let period = self.params.tracking_period_ms.max(1);
        let t = (self.now_ms.saturating_sub(self.started_at) % period) as f64 / period as f64;
        -10.0 + 120.0 * t
    }

    pub fn roll_offset_pct(&self) -> f64 {
        self.roll_step
            .map(|s| ROLL_RAMP[s] * ROLL_MAGNITUDE_PCT)
            .unwrap_or(0.0)
    }

    /// Removals and flicker restores still scheduled.
    pub fn pending_expiries(&self) -> usize {
        self.expiries.pending()
    }

    pub fn stats(&self) -> TrialStats {
        self.stats
    }

    pub fn overlay(&self) -> Overlay<'_> {
        Overlay {
            profile: self.profile,
            params: self.params,
            opacity: self.opacity,
            tracking_pct: self.tracking_pct(),
            roll_offset_pct: self.roll_offset_pct(),
            glitches: &self.glitches,
            noise: &self.noise,
        }
    }
}

impl std::fmt::Debug for GlitchGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlitchGenerator")
            .field("profile", &self.profile)
            .field("running", &self.is_running())
            .field("glitches", &self.glitches.len())
            .field("opacity", &self.opacity)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    /// Every draw is 0.0, so every trial succeeds.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    fn seeded(profile: IntensityProfile, seed: u64) -> GlitchGenerator {
        GlitchGenerator::new(profile, Box::new(StdRng::seed_from_u64(seed)))
    }

    #[test]
    fn noise_refreshes_every_tick_within_range() {
        let mut g = seeded(IntensityProfile::Normal, 1);
        g.start(0);
        for t in 1..=5 {
            g.tick(t * 16);
        }
        assert_eq!(g.noise().frame(), 5);
        assert!(g.noise().pixels().iter().all(|&p| (98..=158).contains(&p)));
        let distinct: std::collections::HashSet<u8> = g.noise().pixels().iter().copied().collect();
        assert!(distinct.len() > 20);
    }

    #[test]
    fn nothing_runs_before_start_or_after_teardown() {
        let mut g = seeded(IntensityProfile::Extreme, 2);
        g.tick(1_000);
        assert_eq!(g.noise().frame(), 0);
        g.start(1_000);
        g.tick(1_016);
        g.teardown();
        g.tick(5_000);
        assert_eq!(g.noise().frame(), 1);
        assert_eq!(g.stats().glitch_trials, 0);
        assert!(!g.is_running());
    }

    #[test]
    fn certain_trial_bursts_and_flickers() {
        let mut g = GlitchGenerator::new(IntensityProfile::Soft, Box::new(ZeroRng));
        g.start(0);
        g.tick(200);
        // zero draws: one bar, 60ms life, opacity dip to 0.97 for 30ms
        assert_eq!(g.glitches().len(), 1);
        let bar = g.glitches()[0];
        assert_eq!(bar.lifetime_ms, 60);
        assert_eq!(bar.position_pct, 0.0);
        assert!((bar.height_pct - 0.3).abs() < 1e-12);
        assert!((g.opacity() - 0.97).abs() < 1e-12);
        g.tick(230);
        assert_eq!(g.opacity(), 1.0);
        assert_eq!(g.glitches().len(), 1);
        g.tick(260);
        assert!(g.glitches().is_empty());
    }

    #[test]
    fn missed_frames_still_run_every_trial() {
        let mut g = seeded(IntensityProfile::Normal, 3);
        g.start(0);
        g.tick(1_000);
        let s = g.stats();
        assert_eq!(s.glitch_trials, 5);
        assert_eq!(s.flicker_trials, 10);
    }

    #[test]
    fn glitch_events_stay_in_bounds() {
        let mut g = seeded(IntensityProfile::Extreme, 4);
        g.start(0);
        let mut seen = 0;
        for t in 1..=20_000u64 {
            g.tick(t * 16);
            for e in g.glitches() {
                assert!((0.0..100.0).contains(&e.position_pct));
                assert!(e.height_pct > 0.0 && e.height_pct < 2.0);
                assert!(e.opacity > 0.0 && e.opacity < 1.0);
                assert!((60..=160).contains(&e.lifetime_ms));
                seen += 1;
            }
            assert!(g.glitches().len() <= 2 * MAX_BURST);
        }
        assert!(seen > 0);
    }

    #[test]
    fn glitches_never_outlive_their_lifetime() {
        let mut g = seeded(IntensityProfile::Extreme, 5);
        g.start(0);
        for t in 1..=30_000u64 {
            let now = t * 7;
            g.tick(now);
            for e in g.glitches() {
                assert!(now < e.expires_at(), "glitch {} stuck at {now}", e.id);
            }
        }
        assert!(g.stats().glitch_bursts > 0);
    }

    #[test]
    fn profile_switch_keeps_noise_loop_and_removals() {
        let mut g = GlitchGenerator::new(IntensityProfile::Extreme, Box::new(ZeroRng));
        g.start(0);
        g.tick(200);
        let frames = g.noise().frame();
        let pending = g.pending_expiries();
        assert!(pending >= 1);

        g.set_profile(IntensityProfile::Soft);
        assert_eq!(g.noise().frame(), frames);
        assert_eq!(g.pending_expiries(), pending);
        assert_eq!(g.params().scanline_gap, 3);
        assert_eq!(g.params().scanline_opacity, 0.03);

        g.tick(216);
        assert_eq!(g.noise().frame(), frames + 1);
        g.tick(260);
        assert!(g.glitches().is_empty());
    }

    #[test]
    fn profile_switch_changes_trial_odds() {
        let mut g = seeded(IntensityProfile::Extreme, 6);
        g.start(0);
        g.tick(2_000_000);
        let extreme = g.stats();
        g.set_profile(IntensityProfile::Soft);
        g.tick(4_000_000);
        let soft_bursts = g.stats().glitch_bursts - extreme.glitch_bursts;
        // 10k trials each: ~400 at 0.04, ~10 at 0.001.
        assert_eq!(extreme.glitch_trials, 10_000);
        assert!(extreme.glitch_bursts > 250, "{}", extreme.glitch_bursts);
        assert!(soft_bursts < 40, "{soft_bursts}");
    }

    #[test]
    fn tracking_bar_sweeps_over_period() {
        let mut g = seeded(IntensityProfile::Normal, 7);
        g.start(1_000);
        g.tick(1_000);
        assert!((g.tracking_pct() + 10.0).abs() < 1e-9);
        g.tick(7_000);
        assert!((g.tracking_pct() - 50.0).abs() < 1e-9);
        g.tick(13_000);
        assert!((g.tracking_pct() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn roll_only_on_extreme() {
        let mut g = GlitchGenerator::new(IntensityProfile::Strong, Box::new(ZeroRng));
        g.start(0);
        g.tick(500);
        assert_eq!(g.roll_offset_pct(), 0.0);
        assert_eq!(g.stats().rolls, 0);

        let mut g = GlitchGenerator::new(IntensityProfile::Extreme, Box::new(ZeroRng));
        g.start(0);
        g.tick(500);
        assert_eq!(g.stats().rolls, 1);
        let mut offsets = vec![g.roll_offset_pct()];
        for i in 1..ROLL_RAMP.len() as u64 {
            g.tick(500 + i * 16);
            offsets.push(g.roll_offset_pct());
        }
        let want: Vec<f64> = ROLL_RAMP.iter().map(|r| r * ROLL_MAGNITUDE_PCT).collect();
        assert_eq!(offsets, want);
        g.tick(500 + 6 * 16);
        assert_eq!(g.roll_offset_pct(), 0.0);
    }

    #[test]
    fn leaving_extreme_cancels_roll() {
        let mut g = GlitchGenerator::new(IntensityProfile::Extreme, Box::new(ZeroRng));
        g.start(0);
        g.tick(500);
        assert!(g.roll_offset_pct() > 0.0);
        g.set_profile(IntensityProfile::Normal);
        assert_eq!(g.roll_offset_pct(), 0.0);
    }

    #[test]
    fn teardown_drops_in_flight_removals() {
        let mut g = GlitchGenerator::new(IntensityProfile::Extreme, Box::new(ZeroRng));
        g.start(0);
        g.tick(200);
        assert!(g.pending_expiries() > 0);
        g.teardown();
        assert_eq!(g.pending_expiries(), 0);
        assert!(g.glitches().is_empty());
        assert_eq!(g.opacity(), 1.0);
    }

    #[test]
    fn noise_sample_clamps() {
        let n = NoiseBuffer::new();
        assert_eq!(n.sample(-1.0, 2.0), 128);
        assert_eq!(n.get(NOISE_SIZE + 1, 0), n.get(1, 0));
    }
}
