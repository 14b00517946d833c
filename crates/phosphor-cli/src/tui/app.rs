//! TUI application state and event loop.
//!
//! Design: one screen flow driven by one clock. The boot transcript plays,
//! its completion hands over to the power-on animation, and once the tube has
//! settled the main view appears under the VHS overlay. Every component is
//! ticked from the same `now_ms` on each pass of the loop.

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use phosphor_core::{
    AppConfig, AudioContext, BellSink, BootPlayer, ClipboardSink, Clock, GlitchGenerator,
    IntensityProfile, Launcher, PowerOn, ScriptLine, SystemClipboard, SystemClock, SystemOpener,
    UrlOpener, Viewport,
};

/// One display frame.
const FRAME: Duration = Duration::from_millis(16);

/// How long a status message stays on screen.
const STATUS_MS: u64 = 3_000;

/// Speakers when the `device-audio` feature is on and a device opens,
/// the terminal bell otherwise.
#[cfg(feature = "device-audio")]
fn speaker() -> AudioContext {
    match phosphor_core::device::DeviceSink::open() {
        Ok(sink) => AudioContext::new(Box::new(sink)),
        Err(e) => {
            log::warn!("falling back to the terminal bell: {e}");
            bell()
        }
    }
}

#[cfg(not(feature = "device-audio"))]
fn speaker() -> AudioContext {
    bell()
}

fn bell() -> AudioContext {
    AudioContext::new(Box::new(BellSink::new(io::stdout())))
}

/// Leave raw mode and the alternate screen. Both steps are attempted even
/// when the first one fails; the first error is reported.
fn restore_terminal(out: &mut impl io::Write) -> io::Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(out, LeaveAlternateScreen, crossterm::cursor::Show);
    raw.and(screen)
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Boot,
    PowerOn,
    Main,
}

/// Pane shown in the settings popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTab {
    Effects,
    Audio,
    Credits,
}

impl SettingsTab {
    pub const ALL: [SettingsTab; 3] = [Self::Effects, Self::Audio, Self::Credits];

    pub fn label(self) -> &'static str {
        match self {
            Self::Effects => "CRT Effects",
            Self::Audio => "Audio",
            Self::Credits => "Credits",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Effects => Self::Audio,
            Self::Audio => Self::Credits,
            Self::Credits => Self::Effects,
        }
    }

    pub fn prev(self) -> Self {
        self.next().next()
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    clock: Box<dyn Clock>,
    audio: AudioContext,
    boot: BootPlayer,
    boot_done: Rc<Cell<bool>>,
    power_on: PowerOn,
    glitch: GlitchGenerator,
    launcher: Launcher,
    opener: Box<dyn UrlOpener>,
    clipboard: Box<dyn ClipboardSink>,
    stage: Stage,
    now_ms: u64,
    settings_open: bool,
    settings_tab: SettingsTab,
    status: Option<(String, u64)>,
    viewport: Viewport,
    running: bool,
}

impl App {
    pub fn new(config: AppConfig, script: Vec<ScriptLine>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self::with_ports(
            config,
            script,
            Box::new(SystemClock::new()),
            speaker(),
            Box::new(rng),
            Box::new(SystemOpener),
            Box::new(SystemClipboard),
        )
    }

    /// Build an app around explicit clock, sound, randomness and platform
    /// handlers.
    pub fn with_ports(
        config: AppConfig,
        script: Vec<ScriptLine>,
        clock: Box<dyn Clock>,
        mut audio: AudioContext,
        rng: Box<dyn rand::RngCore>,
        opener: Box<dyn UrlOpener>,
        clipboard: Box<dyn ClipboardSink>,
    ) -> Self {
        audio.set_muted(config.muted);
        let boot_done = Rc::new(Cell::new(false));
        let done = Rc::clone(&boot_done);
        let boot = BootPlayer::new(script, config.boot, move || done.set(true));

        Self {
            clock,
            audio,
            boot,
            boot_done,
            power_on: PowerOn::new(),
            glitch: GlitchGenerator::new(config.intensity, rng),
            launcher: Launcher::new(config.server),
            opener,
            clipboard,
            stage: Stage::Boot,
            now_ms: 0,
            settings_open: false,
            settings_tab: SettingsTab::Effects,
            status: None,
            viewport: Viewport::new(120, 40),
            running: true,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let size = terminal.size()?;
        self.viewport = Viewport::new(size.width, size.height);

        let result = self.run_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error.
        let _ = std::panic::take_hook(); // remove our hook
        self.finish(result, || restore_terminal(terminal.backend_mut()))
    }

    /// Unmount everything, then hand the terminal back. Teardown does not
    /// depend on the restore succeeding.
    fn finish(
        &mut self,
        result: io::Result<()>,
        restore: impl FnOnce() -> io::Result<()>,
    ) -> io::Result<()> {
        self.shutdown();
        let restored = restore();
        result.and(restored)
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        self.start();

        while self.running {
            self.tick();
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(FRAME)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code)
                    }
                    Event::Resize(cols, rows) => self.viewport = Viewport::new(cols, rows),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    pub fn start(&mut self) {
        self.now_ms = self.clock.now_ms();
        self.boot.start(self.now_ms);
    }

    /// Advance whatever stage is mounted to the current time.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        self.now_ms = now;

        match self.stage {
            Stage::Boot => {
                self.boot.tick(now, &mut self.audio);
                if self.boot_done.get() {
                    self.boot.teardown();
                    self.power_on.activate(now);
                    self.stage = Stage::PowerOn;
                    log::info!("boot finished at {now}ms, powering on");
                }
            }
            Stage::PowerOn => {
                self.power_on.tick(now, &mut self.audio);
                if self.power_on.is_done() {
                    self.power_on.teardown();
                    self.glitch.start(now);
                    self.audio.start_ambient();
                    self.stage = Stage::Main;
                }
            }
            Stage::Main => {
                self.glitch.tick(now);
                self.launcher.tick(now);
            }
        }

        if self.status.as_ref().is_some_and(|(_, until)| now >= *until) {
            self.status = None;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.settings_open {
            self.handle_settings_key(key);
            return;
        }
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('m') => {
                let muted = self.audio.toggle_mute();
                self.set_status(if muted { "Sound off" } else { "Sound on" });
            }
            _ if self.stage != Stage::Main => {}
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.launcher.launch(self.now_ms, self.opener.as_mut()) {
                    let msg = format!(
                        "Opening the game client. Not opening? Add {} manually.",
                        self.launcher.target().address()
                    );
                    self.set_status(&msg);
                }
            }
            KeyCode::Char('c') => match self.launcher.copy_address(self.clipboard.as_mut()) {
                Ok(()) => self.set_status("Address copied"),
                Err(_) => {
                    let msg = format!("Clipboard unavailable: {}", self.launcher.target().address());
                    self.set_status(&msg);
                }
            },
            KeyCode::Char('s') => {
                self.settings_open = true;
                self.settings_tab = SettingsTab::Effects;
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyCode) {
        let current = self.glitch.profile();
        match key {
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Enter => self.settings_open = false,
            KeyCode::Char('q') => self.running = false,
            KeyCode::Tab => self.settings_tab = self.settings_tab.next(),
            KeyCode::BackTab => self.settings_tab = self.settings_tab.prev(),
            KeyCode::Char('m') => {
                self.audio.toggle_mute();
            }
            _ if self.settings_tab != SettingsTab::Effects => {}
            KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                self.glitch.set_profile(current.prev())
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                self.glitch.set_profile(current.next())
            }
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.glitch.set_profile(IntensityProfile::ALL[idx]);
            }
            _ => {}
        }
    }

    fn set_status(&mut self, msg: &str) {
        self.status = Some((msg.to_string(), self.now_ms + STATUS_MS));
    }

    /// Tear down whatever is still mounted and release the sound sink.
    fn shutdown(&mut self) {
        self.boot.teardown();
        self.power_on.teardown();
        self.glitch.teardown();
        self.audio.dispose();
    }

    // -- accessors for the renderer --

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn boot(&self) -> &BootPlayer {
        &self.boot
    }

    pub fn power_on(&self) -> &PowerOn {
        &self.power_on
    }

    pub fn glitch(&self) -> &GlitchGenerator {
        &self.glitch
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn settings_tab(&self) -> SettingsTab {
        self.settings_tab
    }

    pub fn ambient_audible(&self) -> bool {
        self.audio.ambient_audible()
    }

    pub fn audio_output(&self) -> &'static str {
        self.audio.output()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|(s, _)| s.as_str())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}
