//! Replay the boot transcript without a terminal UI.
//!
//! Drives the boot player from a manual clock so the whole script prints
//! instantly, then shows where the launch control would send you.
//!
//! Run: `cargo run --example headless`

use phosphor_core::{
    AudioContext, BootEvent, BootPlayer, BootTiming, Clock, ManualClock, ServerTarget,
    default_script,
};

fn main() {
    let clock = ManualClock::new();
    let mut audio = AudioContext::silent();
    let mut boot = BootPlayer::new(default_script(), BootTiming::default(), || {
        println!("-- boot complete --");
    });

    boot.start(clock.now_ms());
    while !boot.is_complete() {
        clock.advance(16);
        for event in boot.tick(clock.now_ms(), &mut audio) {
            if let BootEvent::LineRevealed { index } = event {
                let line = &boot.script()[index];
                println!("{:>6}ms  {:<8} {}", clock.now_ms(), line.category.to_string(), line.text);
            }
        }
    }

    let target = ServerTarget::default();
    println!("\nDeep link: {}", target.deep_link());
    println!("Address:   {}", target.address());
}
