//! Software rendering of [`Tone`]s into a mono `f32` stream.
//!
//! [`Synth`] keeps a sample clock. [`Synth::trigger`] starts a cue's voices
//! relative to that clock, and [`Synth::fill`] renders the next block. The
//! ambient loop is re-triggered every [`AMBIENT_LOOP_MS`] while it is on.
//! Nothing here touches a device, so the output is checked in plain tests.

use crate::audio::{AMBIENT_LOOP, AMBIENT_LOOP_MS, Tone, Waveform};

/// Level of the ambient loop relative to the cues.
pub const AMBIENT_VOLUME: f32 = 0.15;

/// Fade-in length, so voices start without a click.
const ATTACK_MS: u64 = 5;

#[derive(Debug, Clone, Copy)]
struct Voice {
    tone: Tone,
    start: u64,
    len: u64,
    phase: f64,
    scale: f32,
    ambient: bool,
}

/// Mixes active voices, one sample clock for all of them.
#[derive(Debug)]
pub struct Synth {
    sample_rate: u32,
    clock: u64,
    voices: Vec<Voice>,
    next_loop_at: Option<u64>,
    noise: u32,
}

impl Synth {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            clock: 0,
            voices: Vec::new(),
            next_loop_at: None,
            noise: 0x9E37_79B9,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn samples(&self, ms: u64) -> u64 {
        ms.saturating_mul(self.sample_rate as u64) / 1000
    }

    /// Start `tones` now; each voice waits out its own delay.
    pub fn trigger(&mut self, tones: &[Tone]) {
        self.push(tones, self.clock, 1.0, false);
    }

    fn push(&mut self, tones: &[Tone], at: u64, scale: f32, ambient: bool) {
        for tone in tones {
            let len = self.samples(tone.duration_ms);
            if len == 0 {
                continue;
            }
            self.voices.push(Voice {
                tone: *tone,
                start: at + self.samples(tone.delay_ms),
                len,
                phase: 0.0,
                scale,
                ambient,
            });
        }
    }

    /// Turn the ambient loop on or off. Turning it off silences it at once.
    pub fn set_ambient(&mut self, on: bool) {
        match (on, self.next_loop_at.is_some()) {
            (true, false) => self.next_loop_at = Some(self.clock),
            (false, true) => {
                self.next_loop_at = None;
                self.voices.retain(|v| !v.ambient);
            }
            _ => {}
        }
    }

    pub fn ambient_on(&self) -> bool {
        self.next_loop_at.is_some()
    }

    /// Voices still sounding or waiting for their delay.
    pub fn voices(&self) -> usize {
        self.voices.len()
    }

    /// Render the next `out.len()` samples.
    pub fn fill(&mut self, out: &mut [f32]) {
        let attack = self.samples(ATTACK_MS).max(1);
        let rate = self.sample_rate as f64;
        for sample in out.iter_mut() {
            if let Some(at) = self.next_loop_at.filter(|at| self.clock >= *at) {
                self.push(AMBIENT_LOOP, at, AMBIENT_VOLUME, true);
                let loop_len = self.samples(AMBIENT_LOOP_MS).max(1);
                self.next_loop_at = Some(at + loop_len);
            }

            let mut mix = 0.0f32;
            for v in &mut self.voices {
                if self.clock < v.start {
                    continue;
                }
                let n = self.clock - v.start;
                if n >= v.len {
                    continue;
                }
                let t = n as f64 / v.len as f64;
                let osc = match v.tone.waveform {
                    Waveform::Sine => (v.phase * std::f64::consts::TAU).sin() as f32,
                    Waveform::Square => {
                        if v.phase < 0.5 {
                            1.0
                        } else {
                            -1.0
                        }
                    }
                    Waveform::Sawtooth => (2.0 * v.phase - 1.0) as f32,
                    Waveform::Noise => {
                        // xorshift32
                        self.noise ^= self.noise << 13;
                        self.noise ^= self.noise >> 17;
                        self.noise ^= self.noise << 5;
                        (self.noise as f32 / u32::MAX as f32) * 2.0 - 1.0
                    }
                };
                let hz = v.tone.start_hz + (v.tone.end_hz - v.tone.start_hz) * t;
                v.phase = (v.phase + hz / rate).fract();

                let release = (v.len / 3).max(1);
                let env = (n as f32 / attack as f32)
                    .min((v.len - n) as f32 / release as f32)
                    .min(1.0);
                mix += osc * v.tone.gain as f32 * env * v.scale;
            }
            *sample = mix.clamp(-1.0, 1.0);

            self.clock += 1;
        }
        let clock = self.clock;
        self.voices.retain(|v| clock < v.start + v.len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Cue;

    const RATE: u32 = 8_000;

    fn render(synth: &mut Synth, ms: u64) -> Vec<f32> {
        let mut out = vec![0.0; (ms * RATE as u64 / 1000) as usize];
        synth.fill(&mut out);
        out
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0, |m, s| m.max(s.abs()))
    }

    #[test]
    fn idle_synth_is_silent() {
        let mut s = Synth::new(RATE);
        assert_eq!(peak(&render(&mut s, 100)), 0.0);
    }

    #[test]
    fn every_cue_sounds_and_then_ends() {
        for cue in [
            Cue::Success,
            Cue::ProgressTick,
            Cue::SystemBeep,
            Cue::DiskActivity,
            Cue::ReadyChime,
            Cue::Click,
            Cue::DegaussSweep,
            Cue::StaticBurst,
            Cue::SyncFlash,
        ] {
            let mut s = Synth::new(RATE);
            s.trigger(cue.voice());
            let loudest = cue.voice().iter().map(|t| t.gain).fold(0.0, f64::max) as f32;
            let out = render(&mut s, cue.duration_ms());
            assert!(peak(&out) > 0.0, "{cue} made no sound");
            assert!(peak(&out) <= loudest * cue.voice().len() as f32 + 1e-6, "{cue}");
            assert_eq!(s.voices(), 0, "{cue} left voices behind");
            assert_eq!(peak(&render(&mut s, 50)), 0.0);
        }
    }

    #[test]
    fn delayed_voice_waits_for_its_offset() {
        let mut s = Synth::new(RATE);
        s.trigger(&[Tone::new(Waveform::Square, 440.0, 440.0, 50, 0.5).after(100)]);
        assert_eq!(peak(&render(&mut s, 100)), 0.0);
        assert!(peak(&render(&mut s, 50)) > 0.0);
    }

    #[test]
    fn square_wave_alternates_sign() {
        let mut s = Synth::new(RATE);
        s.trigger(&[Tone::new(Waveform::Square, 100.0, 100.0, 200, 0.5)]);
        let out = render(&mut s, 100);
        assert!(out.iter().any(|v| *v > 0.1));
        assert!(out.iter().any(|v| *v < -0.1));
    }

    #[test]
    fn ambient_loops_quietly_until_stopped() {
        let mut s = Synth::new(RATE);
        s.set_ambient(true);
        s.set_ambient(true);
        assert!(s.ambient_on());
        let first = render(&mut s, AMBIENT_LOOP_MS);
        let second = render(&mut s, AMBIENT_LOOP_MS);
        assert!(peak(&first) > 0.0);
        assert!(peak(&second) > 0.0);
        assert!(peak(&first) < AMBIENT_VOLUME);

        s.set_ambient(false);
        assert_eq!(s.voices(), 0);
        assert_eq!(peak(&render(&mut s, 100)), 0.0);
    }

    #[test]
    fn stopping_ambient_keeps_cues() {
        let mut s = Synth::new(RATE);
        s.set_ambient(true);
        render(&mut s, 10);
        s.trigger(Cue::SystemBeep.voice());
        s.set_ambient(false);
        assert_eq!(s.voices(), 1);
    }
}
