//! Boot Sequence Player.
//!
//! Replays a [`ScriptLine`] script against one start instant `T0`:
//!
//! ```text
//! T0 ── line 0 ── line 1 ── typed line 2 (c c c c … settle) ── … ── complete
//!        offset    offset    offset + 30ms per char        + 60ms   T0 + total
//! ```
//!
//! Every reveal, typing step and the completion live in one [`Timeline`]
//! keyed by absolute time, so [`BootPlayer::tick`] can be fed synthetic
//! times in tests and [`BootPlayer::teardown`] is a single `clear()`.
//!
//! The transcript is append-only and only ever holds complete lines. A typed
//! line exists as partial text in [`BootPlayer::typing`] until its last
//! character has shown and the settle delay passed. Typing is serialized: a
//! typed line that comes due while another is typing waits its turn.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::audio::AudioContext;
use crate::script::ScriptLine;
use crate::timeline::Timeline;

/// Timing constants of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootTiming {
    /// Delay between two typed characters.
    pub char_interval_ms: u64,
    /// Pause between the last typed character and the line being committed.
    pub settle_ms: u64,
    /// Caret on/off half-period.
    pub caret_period_ms: u64,
    /// Completion fires this long after `T0`, whatever the script holds.
    pub total_ms: u64,
}

impl Default for BootTiming {
    fn default() -> Self {
        Self {
            char_interval_ms: 30,
            settle_ms: 60,
            caret_period_ms: 530,
            total_ms: 14_500,
        }
    }
}

/// Something observable that happened during a [`BootPlayer::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootEvent {
    /// Line `index` of the script was appended to the transcript.
    LineRevealed { index: usize },
    /// Typed line `index` began showing characters.
    TypingStarted { index: usize },
    /// Typed line `index` settled and was committed.
    TypingFinished { index: usize },
    /// The total duration elapsed.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Reveal(usize),
    ShowChars { index: usize, shown: usize },
    Commit(usize),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Typing {
    index: usize,
    shown: usize,
}

/// Plays a boot script once.
pub struct BootPlayer {
    script: Vec<ScriptLine>,
    timing: BootTiming,
    steps: Timeline<Step>,
    waiting_to_type: VecDeque<usize>,
    typing: Option<Typing>,
    transcript: Vec<ScriptLine>,
    t0: Option<u64>,
    last_tick_ms: u64,
    on_complete: Option<Box<dyn FnOnce()>>,
    completed: bool,
    torn_down: bool,
}

impl BootPlayer {
    pub fn new(
        script: Vec<ScriptLine>,
        timing: BootTiming,
        on_complete: impl FnOnce() + 'static,
    ) -> Self {
        Self {
            script,
            timing,
            steps: Timeline::new(),
            waiting_to_type: VecDeque::new(),
            typing: None,
            transcript: Vec::new(),
            t0: None,
            last_tick_ms: 0,
            on_complete: Some(Box::new(on_complete)),
            completed: false,
            torn_down: false,
        }
    }

    /// Capture `T0` and schedule the whole script. A second call is ignored.
    pub fn start(&mut self, now_ms: u64) {
        if self.t0.is_some() || self.torn_down {
            return;
        }
        self.t0 = Some(now_ms);
        self.last_tick_ms = now_ms;
        for (i, line) in self.script.iter().enumerate() {
            self.steps
                .schedule(now_ms.saturating_add(line.offset_ms), Step::Reveal(i));
        }
        self.steps
            .schedule(now_ms.saturating_add(self.timing.total_ms), Step::Complete);
        log::debug!(
            "boot player started: {} lines over {}ms",
            self.script.len(),
            self.timing.total_ms
        );
    }

    /// Run everything due at `now_ms`.
    pub fn tick(&mut self, now_ms: u64, audio: &mut AudioContext) -> Vec<BootEvent> {
        let mut events = Vec::new();
        if self.torn_down || self.t0.is_none() {
            return events;
        }
        self.last_tick_ms = self.last_tick_ms.max(now_ms);

        while let Some((at, step)) = self.steps.pop_due(now_ms) {
            match step {
                Step::Reveal(index) => {
                    if self.script[index].typed {
                        if self.typing.is_some() {
                            self.waiting_to_type.push_back(index);
                        } else {
                            self.begin_typing(index, at, &mut events);
                        }
                    } else {
                        self.commit(index, audio, &mut events);
                    }
                }
                Step::ShowChars { index, shown } => {
                    self.typing = Some(Typing { index, shown });
                    if shown >= self.script[index].char_count() {
                        self.steps.schedule(
                            at.saturating_add(self.timing.settle_ms),
                            Step::Commit(index),
                        );
                    } else {
                        self.steps.schedule(
                            at.saturating_add(self.timing.char_interval_ms),
                            Step::ShowChars {
                                index,
                                shown: shown + 1,
                            },
                        );
                    }
                }
                Step::Commit(index) => {
                    self.typing = None;
                    self.commit(index, audio, &mut events);
                    events.push(BootEvent::TypingFinished { index });
                    if let Some(next) = self.waiting_to_type.pop_front() {
                        self.begin_typing(next, at, &mut events);
                    }
                }
                Step::Complete => {
                    self.completed = true;
                    log::info!("boot sequence complete");
                    if let Some(done) = self.on_complete.take() {
                        done();
                    }
                    events.push(BootEvent::Completed);
                }
            }
        }
        events
    }

    fn begin_typing(&mut self, index: usize, at: u64, events: &mut Vec<BootEvent>) {
        events.push(BootEvent::TypingStarted { index });
        self.typing = Some(Typing { index, shown: 0 });
        if self.script[index].char_count() == 0 {
            self.steps
                .schedule(at.saturating_add(self.timing.settle_ms), Step::Commit(index));
        } else {
            self.steps
                .schedule(at, Step::ShowChars { index, shown: 1 });
        }
    }

    fn commit(&mut self, index: usize, audio: &mut AudioContext, events: &mut Vec<BootEvent>) {
        let line = self.script[index].clone();
        log::debug!("reveal [{}] {:?}", line.category, line.text);
        if let Some(cue) = line.category.cue() {
            audio.play(cue);
        }
        self.transcript.push(line);
        events.push(BootEvent::LineRevealed { index });
    }

    /// Cancel everything still pending. Nothing changes after this, and the
    /// completion callback is dropped unfired if it has not run yet.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.steps.clear();
        self.waiting_to_type.clear();
        self.on_complete = None;
        log::debug!("boot player torn down after {} lines", self.transcript.len());
    }

    /// Committed lines, in reveal order.
    pub fn transcript(&self) -> &[ScriptLine] {
        &self.transcript
    }

    /// The line currently being typed and the part of it shown so far.
    pub fn typing(&self) -> Option<(&ScriptLine, &str)> {
        let t = self.typing?;
        let line = &self.script[t.index];
        let end = line
            .text
            .char_indices()
            .nth(t.shown)
            .map(|(i, _)| i)
            .unwrap_or(line.text.len());
        Some((line, &line.text[..end]))
    }

    /// Blink state of the caret at the last tick. While a line is typing the
    /// caret sits on the typed text instead of the transcript tail.
    pub fn caret_visible(&self) -> bool {
        let Some(t0) = self.t0 else {
            return true;
        };
        let period = self.timing.caret_period_ms.max(1);
        ((self.last_tick_ms - t0) / period) % 2 == 0
    }

    pub fn caret_on_typing(&self) -> bool {
        self.typing.is_some()
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.t0.map(|t0| now_ms.saturating_sub(t0)).unwrap_or(0)
    }

    /// Fraction of the total duration elapsed at the last tick, in [0, 1].
    pub fn progress(&self) -> f64 {
        let Some(t0) = self.t0 else {
            return 0.0;
        };
        if self.timing.total_ms == 0 {
            return 1.0;
        }
        ((self.last_tick_ms - t0) as f64 / self.timing.total_ms as f64).min(1.0)
    }

    pub fn timing(&self) -> &BootTiming {
        &self.timing
    }

    pub fn script(&self) -> &[ScriptLine] {
        &self.script
    }

    pub fn is_started(&self) -> bool {
        self.t0.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Scheduled steps not yet run (0 after teardown).
    pub fn pending(&self) -> usize {
        self.steps.pending()
    }
}

impl std::fmt::Debug for BootPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootPlayer")
            .field("lines", &self.script.len())
            .field("revealed", &self.transcript.len())
            .field("typing", &self.typing)
            .field("t0", &self.t0)
            .field("completed", &self.completed)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::audio::{Cue, RecordingSink};
    use crate::script::LineCategory;

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, move || c.set(c.get() + 1))
    }

    fn timing(total_ms: u64) -> BootTiming {
        BootTiming {
            total_ms,
            ..BootTiming::default()
        }
    }

    fn texts(p: &BootPlayer) -> Vec<&str> {
        p.transcript().iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn nothing_happens_before_start() {
        let (count, done) = counter();
        let mut p = BootPlayer::new(vec![ScriptLine::new("a", 0)], timing(100), done);
        let mut audio = AudioContext::silent();
        assert!(p.tick(1_000, &mut audio).is_empty());
        assert!(p.transcript().is_empty());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn lines_reveal_at_their_offsets() {
        let (_, done) = counter();
        let script = vec![
            ScriptLine::new("a", 0),
            ScriptLine::new("b", 100),
            ScriptLine::new("c", 250),
        ];
        let mut p = BootPlayer::new(script, timing(1000), done);
        let mut audio = AudioContext::silent();
        p.start(1_000);
        p.tick(1_000, &mut audio);
        assert_eq!(texts(&p), ["a"]);
        p.tick(1_099, &mut audio);
        assert_eq!(texts(&p), ["a"]);
        p.tick(1_100, &mut audio);
        assert_eq!(texts(&p), ["a", "b"]);
        p.tick(1_300, &mut audio);
        assert_eq!(texts(&p), ["a", "b", "c"]);
    }

    #[test]
    fn out_of_order_offsets_reveal_by_expiry() {
        let (_, done) = counter();
        let script = vec![
            ScriptLine::new("late", 300),
            ScriptLine::new("early", 100),
            ScriptLine::new("middle", 200),
        ];
        let mut p = BootPlayer::new(script, timing(1000), done);
        let mut audio = AudioContext::silent();
        p.start(0);
        p.tick(500, &mut audio);
        assert_eq!(texts(&p), ["early", "middle", "late"]);
    }

    #[test]
    fn start_twice_does_not_duplicate_playback() {
        let (count, done) = counter();
        let mut p = BootPlayer::new(vec![ScriptLine::new("a", 0)], timing(100), done);
        let mut audio = AudioContext::silent();
        p.start(0);
        p.start(50);
        p.tick(1_000, &mut audio);
        assert_eq!(p.transcript().len(), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn completion_fires_once_at_total() {
        let (count, done) = counter();
        let mut p = BootPlayer::new(vec![], timing(500), done);
        let mut audio = AudioContext::silent();
        p.start(0);
        p.tick(499, &mut audio);
        assert_eq!(count.get(), 0);
        let events = p.tick(500, &mut audio);
        assert_eq!(events, vec![BootEvent::Completed]);
        p.tick(10_000, &mut audio);
        assert_eq!(count.get(), 1);
        assert!(p.is_complete());
    }

    #[test]
    fn typed_line_commits_after_last_char_and_settle() {
        let (_, done) = counter();
        let script = vec![ScriptLine::new("abcd", 100).typed()];
        let mut p = BootPlayer::new(script, timing(2000), done);
        let mut audio = AudioContext::silent();
        p.start(0);

        p.tick(100, &mut audio);
        assert_eq!(p.typing().map(|(_, s)| s), Some("a"));
        assert!(p.caret_on_typing());
        p.tick(159, &mut audio);
        assert_eq!(p.typing().map(|(_, s)| s), Some("ab"));
        p.tick(190, &mut audio);
        assert_eq!(p.typing().map(|(_, s)| s), Some("abcd"));
        assert!(p.transcript().is_empty());

        // last char at 100 + 30*3 = 190, commit at 190 + 60
        p.tick(249, &mut audio);
        assert!(p.transcript().is_empty());
        let events = p.tick(250, &mut audio);
        assert!(events.contains(&BootEvent::TypingFinished { index: 0 }));
        assert_eq!(texts(&p), ["abcd"]);
        assert!(p.typing().is_none());
    }

    #[test]
    fn typing_handles_multibyte_text() {
        let (_, done) = counter();
        let script = vec![ScriptLine::new("█═█", 0).typed()];
        let mut p = BootPlayer::new(script, timing(2000), done);
        let mut audio = AudioContext::silent();
        p.start(0);
        p.tick(30, &mut audio);
        assert_eq!(p.typing().map(|(_, s)| s), Some("█═"));
    }

    #[test]
    fn overlapping_typed_lines_are_serialized() {
        let (_, done) = counter();
        let script = vec![
            ScriptLine::new("xyz", 0).typed(),
            ScriptLine::new("uv", 10).typed(),
        ];
        let mut p = BootPlayer::new(script, timing(2000), done);
        let mut audio = AudioContext::silent();
        p.start(0);
        p.tick(20, &mut audio);
        assert_eq!(p.typing().map(|(l, _)| l.text.as_str()), Some("xyz"));
        // xyz commits at 60 + 60 = 120, then uv starts typing at 120.
        p.tick(120, &mut audio);
        assert_eq!(texts(&p), ["xyz"]);
        assert_eq!(p.typing().map(|(_, s)| s), Some("u"));
        // uv: last char at 150, commit at 210.
        p.tick(210, &mut audio);
        assert_eq!(texts(&p), ["xyz", "uv"]);
    }

    #[test]
    fn empty_typed_line_commits_after_settle() {
        let (_, done) = counter();
        let mut p = BootPlayer::new(vec![ScriptLine::new("", 0).typed()], timing(1000), done);
        let mut audio = AudioContext::silent();
        p.start(0);
        p.tick(59, &mut audio);
        assert!(p.transcript().is_empty());
        p.tick(60, &mut audio);
        assert_eq!(p.transcript().len(), 1);
    }

    #[test]
    fn typed_line_at_the_end_of_time_saturates() {
        let (count, done) = counter();
        let offset = u64::MAX - 15;
        let script = vec![ScriptLine::new("ab", offset).typed()];
        let t = timing(u64::MAX);
        crate::script::validate_script(&script, t.total_ms).unwrap();
        let mut p = BootPlayer::new(script, t, done);
        let mut audio = AudioContext::silent();
        p.start(0);
        p.tick(u64::MAX, &mut audio);
        assert_eq!(texts(&p), ["ab"]);
        assert!(p.typing().is_none());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn caret_blinks_at_its_period() {
        let (_, done) = counter();
        let mut p = BootPlayer::new(vec![], timing(10_000), done);
        let mut audio = AudioContext::silent();
        p.start(0);
        p.tick(0, &mut audio);
        assert!(p.caret_visible());
        p.tick(529, &mut audio);
        assert!(p.caret_visible());
        p.tick(530, &mut audio);
        assert!(!p.caret_visible());
        p.tick(1_060, &mut audio);
        assert!(p.caret_visible());
    }

    #[test]
    fn teardown_freezes_state_and_drops_completion() {
        let (count, done) = counter();
        let script = vec![
            ScriptLine::new("a", 0),
            ScriptLine::new("b", 100),
            ScriptLine::new("c", 200).typed(),
        ];
        let mut p = BootPlayer::new(script, timing(1000), done);
        let mut audio = AudioContext::silent();
        p.start(0);
        p.tick(210, &mut audio);
        let typing_before = p.typing().map(|(_, s)| s.to_string());
        p.teardown();
        assert_eq!(p.pending(), 0);
        assert!(p.tick(5_000, &mut audio).is_empty());
        assert_eq!(texts(&p), ["a", "b"]);
        assert_eq!(p.typing().map(|(_, s)| s.to_string()), typing_before);
        assert_eq!(count.get(), 0);
        assert!(!p.is_complete());
    }

    #[test]
    fn teardown_before_start_prevents_start() {
        let (count, done) = counter();
        let mut p = BootPlayer::new(vec![ScriptLine::new("a", 0)], timing(10), done);
        let mut audio = AudioContext::silent();
        p.teardown();
        p.start(0);
        p.tick(100, &mut audio);
        assert!(p.transcript().is_empty());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn reveals_play_category_cues() {
        let (_, done) = counter();
        let rec = RecordingSink::new();
        let mut audio = AudioContext::new(Box::new(rec.clone()));
        let script = vec![
            ScriptLine::new("[OK] ready to go", 0),
            ScriptLine::new("plain words", 10),
            ScriptLine::new("x", 20).with_category(LineCategory::File),
        ];
        let mut p = BootPlayer::new(script, timing(100), done);
        p.start(0);
        p.tick(100, &mut audio);
        assert_eq!(rec.played(), vec![Cue::Success, Cue::DiskActivity]);
    }

    #[test]
    fn muted_audio_does_not_block_reveal() {
        let (count, done) = counter();
        let mut audio = AudioContext::silent();
        audio.set_muted(true);
        audio.dispose();
        let mut p = BootPlayer::new(
            vec![ScriptLine::new(">> GO", 0)],
            timing(10),
            done,
        );
        p.start(0);
        p.tick(10, &mut audio);
        assert_eq!(p.transcript().len(), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let (_, done) = counter();
        let mut p = BootPlayer::new(vec![], timing(1000), done);
        let mut audio = AudioContext::silent();
        assert_eq!(p.progress(), 0.0);
        p.start(0);
        p.tick(250, &mut audio);
        assert!((p.progress() - 0.25).abs() < 1e-9);
        p.tick(5_000, &mut audio);
        assert_eq!(p.progress(), 1.0);
        assert_eq!(p.elapsed_ms(700), 700);
    }

    #[test]
    fn timing_deserializes_with_defaults() {
        let t: BootTiming = serde_json::from_str(r#"{"total_ms": 3000}"#).unwrap();
        assert_eq!(t.total_ms, 3000);
        assert_eq!(t.char_interval_ms, 30);
        assert_eq!(t.caret_period_ms, 530);
    }
}
