//! Integration tests for phosphor-core.
//!
//! These tests drive the full screen flow with a manual clock:
//! boot transcript → power-on → main view with overlay and launch control.

use std::cell::Cell;
use std::rc::Rc;

use phosphor_core::{
    AudioContext, BootEvent, BootPlayer, BootTiming, Clock, Cue, GlitchGenerator,
    IntensityProfile, Launcher, ManualClock, PHASE_COUNT, PowerOn, RecordingSink, Result,
    ScriptLine, ServerTarget, UrlOpener, default_script, parse_script, validate_script,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn completion_counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    (count, move || c.set(c.get() + 1))
}

#[test]
fn three_line_script_scenario() {
    let script = vec![
        ScriptLine::new("A", 0),
        ScriptLine::new("B", 100),
        ScriptLine::new("C", 5_000),
    ];
    let timing = BootTiming {
        total_ms: 5_500,
        ..BootTiming::default()
    };
    let (fired, done) = completion_counter();
    let clock = ManualClock::new();
    let mut audio = AudioContext::silent();
    let mut player = BootPlayer::new(script, timing, done);

    player.start(clock.now_ms());
    clock.set(4_000);
    player.tick(clock.now_ms(), &mut audio);
    assert_eq!(player.transcript().len(), 2);
    assert_eq!(fired.get(), 0);

    clock.set(5_500);
    player.tick(clock.now_ms(), &mut audio);
    let texts: Vec<&str> = player.transcript().iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, ["A", "B", "C"]);
    assert_eq!(fired.get(), 1);

    clock.advance(10_000);
    player.tick(clock.now_ms(), &mut audio);
    assert_eq!(fired.get(), 1);
}

#[test]
fn default_script_plays_in_authoring_order() {
    let script = default_script();
    validate_script(&script, BootTiming::default().total_ms).unwrap();
    let (fired, done) = completion_counter();
    let clock = ManualClock::new();
    let mut audio = AudioContext::silent();
    let mut player = BootPlayer::new(script.clone(), BootTiming::default(), done);

    player.start(clock.now_ms());
    let mut max_events_per_tick = 0;
    while !player.is_complete() {
        clock.advance(16);
        let events = player.tick(clock.now_ms(), &mut audio);
        max_events_per_tick = max_events_per_tick.max(events.len());
        // A partial typed line never reaches the transcript.
        if let Some((line, shown)) = player.typing() {
            assert!(line.text.starts_with(shown));
            assert!(!player.transcript().iter().any(|l| l.text == line.text));
        }
    }
    assert_eq!(fired.get(), 1);
    assert!(clock.now_ms() >= BootTiming::default().total_ms);
    let shown: Vec<&str> = player.transcript().iter().map(|l| l.text.as_str()).collect();
    let authored: Vec<&str> = script.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(shown, authored);
    assert!(max_events_per_tick >= 1);
}

#[test]
fn teardown_mid_boot_freezes_transcript() {
    let (fired, done) = completion_counter();
    let mut audio = AudioContext::silent();
    let mut player = BootPlayer::new(default_script(), BootTiming::default(), done);
    player.start(0);
    player.tick(3_000, &mut audio);
    let before = player.transcript().len();
    player.teardown();
    assert!(player.tick(20_000, &mut audio).is_empty());
    assert_eq!(player.transcript().len(), before);
    assert_eq!(fired.get(), 0);
}

#[test]
fn typed_line_appears_only_after_last_char() {
    let script = parse_script(r#"[{"text":"C:\\> dir","offset_ms":200,"typed":true}]"#).unwrap();
    let timing = BootTiming {
        total_ms: 2_000,
        ..BootTiming::default()
    };
    let n = script[0].char_count() as u64;
    let mut audio = AudioContext::silent();
    let mut player = BootPlayer::new(script, timing, || {});
    player.start(0);

    let last_char = 200 + 30 * (n - 1);
    player.tick(last_char - 1, &mut audio);
    assert!(player.transcript().is_empty());
    let (_, partial) = player.typing().unwrap();
    assert_eq!(partial.chars().count() as u64, n - 1);

    player.tick(last_char, &mut audio);
    assert_eq!(player.typing().unwrap().1, "C:\\> dir");
    assert!(player.transcript().is_empty());

    let events = player.tick(last_char + 60, &mut audio);
    assert!(events.contains(&BootEvent::TypingFinished { index: 0 }));
    assert_eq!(player.transcript().len(), 1);
}

#[test]
fn boot_then_power_on_then_main_view() {
    let rec = RecordingSink::new();
    let mut audio = AudioContext::new(Box::new(rec.clone()));
    let clock = ManualClock::new();
    let timing = BootTiming {
        total_ms: 1_000,
        ..BootTiming::default()
    };
    let mut boot = BootPlayer::new(
        vec![ScriptLine::new("[OK] ready", 0), ScriptLine::new("READY", 500)],
        timing,
        || {},
    );
    boot.start(clock.now_ms());
    while !boot.is_complete() {
        clock.advance(16);
        boot.tick(clock.now_ms(), &mut audio);
    }
    boot.teardown();

    let mut power = PowerOn::new();
    power.activate(clock.now_ms());
    while !power.is_done() {
        clock.advance(16);
        power.tick(clock.now_ms(), &mut audio);
    }
    assert_eq!(power.phase(), PHASE_COUNT);
    power.teardown();

    let played = rec.played();
    assert_eq!(&played[..2], &[Cue::Success, Cue::ReadyChime]);
    assert!(played.contains(&Cue::SyncFlash));

    let mut glitch =
        GlitchGenerator::new(IntensityProfile::Extreme, Box::new(StdRng::seed_from_u64(9)));
    glitch.start(clock.now_ms());
    for _ in 0..600 {
        clock.advance(16);
        glitch.tick(clock.now_ms());
        let now = clock.now_ms();
        assert!(glitch.glitches().iter().all(|g| now < g.expires_at()));
    }
    assert_eq!(glitch.noise().frame(), 600);
    glitch.teardown();
    assert_eq!(glitch.pending_expiries(), 0);
}

#[test]
fn launch_scenario() {
    struct Capture(Vec<String>);
    impl UrlOpener for Capture {
        fn open_url(&mut self, url: &str) -> Result<()> {
            self.0.push(url.to_string());
            Ok(())
        }
    }

    let target = ServerTarget::new("My Server", "example.net", 25565);
    let mut launcher = Launcher::new(target);
    let mut opener = Capture(Vec::new());
    assert!(launcher.launch(0, &mut opener));
    let url = &opener.0[0];
    assert!(url.starts_with("minecraft://"));
    assert!(url.contains("My%20Server"));
    assert!(url.contains("example.net"));
    assert!(url.contains("25565"));
    assert_eq!(launcher.target().address(), "example.net:25565");
}
