//! TUI rendering: boot transcript, tube warm-up, launcher under the VHS overlay.
//!
//! ┌ C:\Users\Player\ProjectRivals\launcher.exe ─────────── ─ □ × ┐
//! │ [SYSTEM] Initializing launcher components...                 │
//! │ [OK] Core modules loaded successfully                        │
//! │ C:\RIVALS> launcher --in█                                    │
//! └──────────────────────────────────────────────────────────────┘
//!
//!                        · ━━━━━━━━ ·          (power-on)
//!
//! ┌──────────────────────────────────────── m: sound  s: VHS ───┐
//! │░░▒░░░░░░░░░░░░░░▒░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░│
//! │                        ▸ ENTER ◂                             │
//! │                   ╭────────────────╮                         │
//! │                   │ PROJECT RIVALS │                         │
//! │                   ╰────────────────╯                         │
//! │  enter: play   c: copy address   s: settings   q: quit       │
//! └──────────────────────────────────────────────────────────────┘

use super::app::{App, SettingsTab, Stage};
use phosphor_core::{IntensityProfile, LineCategory, Overlay, PhaseVisual};
use ratatui::{prelude::*, widgets::*};

const SCREEN: Color = Color::Rgb(12, 12, 12);
const GREEN: Color = Color::Rgb(74, 222, 128);
const CYAN: Color = Color::Rgb(103, 232, 249);
const YELLOW: Color = Color::Rgb(253, 224, 71);
const GRAY: Color = Color::Rgb(209, 213, 219);
const DIM: Color = Color::Rgb(110, 110, 110);
const WHITE: Color = Color::Rgb(250, 250, 250);

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), area);

    if app.viewport().needs_rotation() {
        draw_rotate(f, area);
        return;
    }

    match app.stage() {
        Stage::Boot => draw_boot(f, area, app),
        Stage::PowerOn => draw_power_on(f, area, app),
        Stage::Main => {
            draw_main(f, area, app);
            apply_overlay(f.buffer_mut(), area, &app.glitch().overlay());
            if app.settings_open() {
                draw_settings(f, area, app);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Boot
// ---------------------------------------------------------------------------

fn line_style(category: LineCategory) -> Style {
    let base = Style::default().bg(SCREEN);
    match category {
        LineCategory::Final => base.fg(GREEN).bold(),
        LineCategory::Success => base.fg(GREEN),
        LineCategory::Progress => base.fg(YELLOW),
        LineCategory::System | LineCategory::Network => base.fg(CYAN),
        LineCategory::Divider | LineCategory::Title => base.fg(WHITE).bold(),
        LineCategory::File | LineCategory::Plain => base.fg(GRAY),
    }
}

fn draw_boot(f: &mut Frame, area: Rect, app: &App) {
    let boot = app.boot();
    let caret = Span::styled(
        if boot.caret_visible() { "█" } else { " " },
        Style::default().fg(GRAY),
    );

    let mut lines: Vec<Line> = boot
        .transcript()
        .iter()
        .map(|l| Line::styled(l.text.clone(), line_style(l.category)))
        .collect();
    match boot.typing() {
        Some((line, shown)) => lines.push(Line::from(vec![
            Span::styled(shown.to_string(), line_style(line.category)),
            caret,
        ])),
        None => lines.push(Line::from(caret)),
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(51, 51, 51)))
        .style(Style::default().bg(SCREEN))
        .title(Line::from(vec![
            Span::styled(" ■ ", Style::default().fg(DIM)),
            Span::styled(
                "C:\\Users\\Player\\ProjectRivals\\launcher.exe ",
                Style::default().fg(GRAY),
            ),
        ]))
        .title(Line::from(Span::styled(" ─  □  × ", Style::default().fg(DIM))).right_aligned());
    let inner = block.inner(area);
    f.render_widget(block, area);

    // Keep the tail in view, like a console scrolled to the bottom.
    let skip = lines.len().saturating_sub(inner.height as usize);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
    f.render_widget(
        Paragraph::new(visible).style(Style::default().bg(SCREEN)),
        inner.inner(Margin::new(1, 0)),
    );

    scanlines(f.buffer_mut(), inner, 2, 0.15);
}

// ---------------------------------------------------------------------------
// Power-on
// ---------------------------------------------------------------------------

fn draw_power_on(f: &mut Frame, area: Rect, app: &App) {
    let power = app.power_on();
    let visual = power.visual();
    let now = app.now_ms();
    let buf = f.buffer_mut();
    let white = gray(1.0);
    let cx = area.x + area.width / 2;
    let cy = area.y + area.height / 2;

    if visual.is_blank() {
        return;
    }

    if visual.dot_px > 0 {
        let dot = if visual.dot_px >= 6 { "●" } else { "•" };
        set(buf, cx, cy, dot, white, Color::Black);
        for dx in [-2i32, -1, 1, 2] {
            let x = cx as i32 + dx;
            if x >= area.x as i32 && x < area.right() as i32 {
                set(buf, x as u16, cy, "·", Color::Rgb(150, 180, 255), Color::Black);
            }
        }
    }

    if visual.line_width_pct > 0 {
        let w = pct_of(area.width, visual.line_width_pct);
        let x0 = cx.saturating_sub(w / 2).max(area.x);
        for x in x0..(x0 + w).min(area.right()) {
            set(buf, x, cy, "━", white, Color::Black);
            if visual.line_width_pct >= 80 {
                for y in [cy.saturating_sub(1), cy + 1] {
                    if y >= area.y && y < area.bottom() {
                        set(buf, x, y, "─", Color::Rgb(120, 140, 200), Color::Black);
                    }
                }
            }
        }
    }

    if visual.flicker_lines > 0 {
        for i in 0..u64::from(visual.flicker_lines) {
            let y = area.y + (hash(now / 50, i) % u64::from(area.height.max(1))) as u16;
            for x in area.left()..area.right() {
                set(buf, x, y, "─", gray(0.2), Color::Black);
            }
        }
    }

    if visual.band_height_pct > 0 {
        draw_band(buf, area, &visual, now);
    }

    if visual.flash {
        fill(buf, area, white);
    }

    if visual.fade_out {
        fill(buf, area, gray(power.opacity(now)));
    }

    if visual.crt_border {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(40, 40, 40)))
            .render(area, buf);
    }
}

fn draw_band(buf: &mut Buffer, area: Rect, visual: &PhaseVisual, now: u64) {
    let h = pct_of(area.height, visual.band_height_pct).max(1);
    let y0 = (area.y + area.height / 2).saturating_sub(h / 2).max(area.y);
    let y1 = (y0 + h).min(area.bottom());
    for y in y0..y1 {
        // Interference darkens every other row.
        let level = if visual.interference && y % 2 == 1 { 0.9 } else { 1.0 };
        let wave = visual.wave_rows > 0 && (y - y0) % (h / u16::from(visual.wave_rows)).max(1) == 0;
        for x in area.left()..area.right() {
            let noise = visual.static_noise && hash(now / 50, u64::from(x) << 16 | u64::from(y)) % 6 == 0;
            let symbol = match (wave, noise) {
                (true, _) => "≈",
                (false, true) => "░",
                _ => " ",
            };
            set(buf, x, y, symbol, gray(0.7), gray(level));
        }
    }
}

// ---------------------------------------------------------------------------
// Main view
// ---------------------------------------------------------------------------

fn draw_main(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // top bar
            Constraint::Min(0),    // screen
            Constraint::Length(1), // caption
            Constraint::Length(3), // button
            Constraint::Length(1), // rule
            Constraint::Length(1), // address
            Constraint::Length(1), // status
            Constraint::Length(1), // spacer
            Constraint::Length(1), // keys
        ])
        .split(area);

    draw_top_bar(f, rows[0], app);

    f.render_widget(
        Paragraph::new("▸ ENTER ◂")
            .alignment(Alignment::Center)
            .style(Style::default().fg(gray(0.4))),
        rows[2],
    );
    draw_button(f, rows[3], app);
    f.render_widget(
        Paragraph::new("─".repeat(area.width as usize)).style(Style::default().fg(gray(0.3))),
        rows[4],
    );

    let target = app.launcher().target();
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("address ", Style::default().fg(DIM)),
            Span::styled(target.address(), Style::default().fg(GRAY)),
        ]))
        .alignment(Alignment::Center),
        rows[5],
    );
    if let Some(status) = app.status() {
        f.render_widget(
            Paragraph::new(status)
                .alignment(Alignment::Center)
                .style(Style::default().fg(YELLOW)),
            rows[6],
        );
    }
    draw_keys(f, rows[8]);
}

fn draw_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let sound = if app.is_muted() { "off" } else { "on" };
    let line = Line::from(vec![
        Span::styled("m ", Style::default().fg(DIM)),
        Span::styled(format!("sound {sound}"), Style::default().fg(GRAY)),
        Span::raw("   "),
        Span::styled("s ", Style::default().fg(DIM)),
        Span::styled(
            format!("VHS {}", app.glitch().profile().label()),
            Style::default().fg(GRAY),
        ),
        Span::raw(" "),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Right), area);
}

fn draw_button(f: &mut Frame, area: Rect, app: &App) {
    let launcher = app.launcher();
    let (label, border, fg) = if launcher.is_connecting() {
        // Spinner frame from the clock.
        let spin = ["◐", "◓", "◑", "◒"][(app.now_ms() / 120 % 4) as usize];
        (
            format!("{spin} CONNECTING..."),
            Color::Rgb(34, 197, 94),
            GREEN,
        )
    } else {
        (launcher.target().name.to_uppercase(), gray(0.3), WHITE)
    };
    let width = (label.chars().count() as u16 + 6).min(area.width);
    let rect = Rect::new(area.x + (area.width - width) / 2, area.y, width, area.height);
    f.render_widget(
        Paragraph::new(label)
            .alignment(Alignment::Center)
            .style(Style::default().fg(fg).bold())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(border)),
            ),
        rect,
    );
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let keys = [
        ("enter", "play"),
        ("c", "copy address"),
        ("s", "settings"),
        ("m", "mute"),
        ("q", "quit"),
    ];
    let mut spans = Vec::new();
    for (key, what) in keys {
        spans.push(Span::styled(format!(" {key}"), Style::default().fg(CYAN)));
        spans.push(Span::styled(format!(": {what}  "), Style::default().fg(DIM)));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn draw_settings(f: &mut Frame, area: Rect, app: &App) {
    let tab = app.settings_tab();
    let rect = centered(area, 52, 16);
    f.render_widget(Clear, rect);

    let mut header = vec![Span::raw(" ")];
    for t in SettingsTab::ALL {
        let style = if t == tab {
            Style::default().fg(WHITE).bold().underlined()
        } else {
            Style::default().fg(DIM)
        };
        header.push(Span::styled(format!(" {} ", t.label()), style));
        header.push(Span::raw(" "));
    }

    let mut lines = vec![Line::from(header), Line::raw("")];
    lines.extend(match tab {
        SettingsTab::Effects => effects_pane(app.glitch().profile()),
        SettingsTab::Audio => audio_pane(app.is_muted(), app.ambient_audible(), app.audio_output()),
        SettingsTab::Credits => credits_pane(&app.launcher().target().name),
    });
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        match tab {
            SettingsTab::Effects => "   tab pane   ←/→ or 1-4 select   esc close",
            SettingsTab::Audio => "   tab pane   m mute   esc close",
            SettingsTab::Credits => "   tab pane   esc close",
        },
        Style::default().fg(DIM),
    ));

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(gray(0.4)))
                .style(Style::default().bg(Color::Rgb(10, 10, 10)))
                .title(Span::styled(" SETTINGS ", Style::default().fg(WHITE).bold())),
        ),
        rect,
    );
}

fn effects_pane(current: IntensityProfile) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, p) in IntensityProfile::ALL.iter().enumerate() {
        let selected = *p == current;
        let style = if selected {
            Style::default().fg(WHITE).bold()
        } else {
            Style::default().fg(DIM)
        };
        lines.push(Line::from(vec![
            Span::styled(if selected { " ▸ " } else { "   " }, style),
            Span::styled(format!("{} {:<8}", i + 1, p.label()), style),
            Span::styled(p.description(), Style::default().fg(DIM)),
        ]));
    }
    lines.push(Line::raw(""));
    let level = current.level();
    for name in ["Scanlines", "Noise", "Glitch", "Vignette"] {
        let meter: String = (1..=4).map(|i| if i <= level { '■' } else { '□' }).collect();
        lines.push(Line::from(vec![
            Span::styled(format!("   {name:<10}"), Style::default().fg(DIM)),
            Span::styled(meter, Style::default().fg(GREEN)),
        ]));
    }
    lines
}

fn audio_pane(muted: bool, ambient: bool, output: &str) -> Vec<Line<'static>> {
    let state = |on: bool| {
        if on {
            Span::styled("on", Style::default().fg(GREEN).bold())
        } else {
            Span::styled("off", Style::default().fg(DIM).bold())
        }
    };
    vec![
        Line::from(vec![
            Span::styled("   Ambient music    ", Style::default().fg(WHITE)),
            state(ambient),
        ]),
        Line::styled("   Lo-fi loop behind the launcher", Style::default().fg(DIM)),
        Line::raw(""),
        Line::from(vec![
            Span::styled("   Sound effects    ", Style::default().fg(WHITE)),
            state(!muted),
        ]),
        Line::styled("   CRT interface cues", Style::default().fg(DIM)),
        Line::raw(""),
        Line::from(vec![
            Span::styled("   Output           ", Style::default().fg(WHITE)),
            Span::styled(output.to_string(), Style::default().fg(GRAY)),
        ]),
    ]
}

fn credits_pane(server: &str) -> Vec<Line<'static>> {
    vec![
        Line::styled(format!("   {server}"), Style::default().fg(WHITE).bold()),
        Line::styled("   MINECRAFT BEDROCK LAUNCHER", Style::default().fg(DIM)),
        Line::raw(""),
        Line::styled("   Built with", Style::default().fg(DIM)),
        Line::styled("   Rust  ratatui  crossterm", Style::default().fg(GRAY)),
        Line::raw(""),
        Line::styled(
            format!("   Version {} · made with ♥ for the community", phosphor_core::VERSION),
            Style::default().fg(DIM),
        ),
    ]
}

fn draw_rotate(f: &mut Frame, area: Rect) {
    let rect = centered(area, area.width.min(40), 5);
    f.render_widget(
        Paragraph::new(vec![
            Line::styled("↻", Style::default().fg(WHITE).bold()),
            Line::raw(""),
            Line::styled("Rotate your device", Style::default().fg(WHITE)),
            Line::styled("or widen the terminal", Style::default().fg(DIM)),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true }),
        rect,
    );
}

// ---------------------------------------------------------------------------
// VHS overlay
// ---------------------------------------------------------------------------

/// Post-process the rendered frame: roll, noise grain, scanlines, glitch
/// bars, tracking bar, vignette, flicker.
fn apply_overlay(buf: &mut Buffer, area: Rect, ov: &Overlay<'_>) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let rows = pct_of(area.height, ov.roll_offset_pct.round() as u8);
    if rows > 0 {
        roll(buf, area, rows);
    }

    let p = &ov.params;
    let h = f64::from(area.height);
    let w = f64::from(area.width);
    let gap = u16::from(p.scanline_gap);
    let tracking_row = (ov.tracking_pct / 100.0 * h).floor();

    for y in area.top()..area.bottom() {
        let ry = f64::from(y - area.y);
        let v_pct = ry / h * 100.0;
        let bar = ov
            .glitches
            .iter()
            .filter(|g| v_pct + 100.0 / h > g.position_pct && v_pct <= g.position_pct + g.height_pct)
            .map(|g| g.opacity)
            .fold(0.0, f64::max);
        let scan = gap > 0 && (y - area.y) % (gap + 1) == gap;
        let tracking = ry == tracking_row;

        for x in area.left()..area.right() {
            let rx = f64::from(x - area.x);
            let grain = f64::from(ov.noise.sample(rx / w, ry / h)) - 128.0;
            let dx = rx / w * 2.0 - 1.0;
            let dy = ry / h * 2.0 - 1.0;
            let edge = ((dx * dx + dy * dy).sqrt() / std::f64::consts::SQRT_2 - 0.5).max(0.0) * 2.0;

            let mut k = ov.opacity * (1.0 - p.vignette * edge * 0.8);
            if scan {
                k *= 1.0 - p.scanline_opacity * 3.0;
            }
            let mut lift = grain.max(0.0) / 30.0 * p.noise_opacity * 500.0 + bar * 700.0;
            if tracking {
                lift += 18.0;
            }

            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.fg = shade(cell.fg, k, 0.0);
                cell.bg = shade(cell.bg, k, lift * ov.opacity);
            }
        }
    }
}

/// Shift the frame down by `rows`, wrapping the bottom back to the top.
fn roll(buf: &mut Buffer, area: Rect, rows: u16) {
    let h = area.height;
    let snapshot: Vec<Vec<Option<ratatui::buffer::Cell>>> = (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .map(|x| buf.cell((x, y)).cloned())
                .collect()
        })
        .collect();
    for (ry, row) in snapshot.into_iter().enumerate() {
        let y = area.y + (ry as u16 + rows) % h;
        for (rx, cell) in row.into_iter().enumerate() {
            if let (Some(cell), Some(dst)) = (cell, buf.cell_mut((area.x + rx as u16, y))) {
                *dst = cell;
            }
        }
    }
}

/// Darken every `gap + 1`th row by `amount`.
fn scanlines(buf: &mut Buffer, area: Rect, gap: u16, amount: f64) {
    for y in area.top()..area.bottom() {
        if (y - area.y) % (gap + 1) != gap {
            continue;
        }
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.fg = shade(cell.fg, 1.0 - amount, 0.0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Scale an RGB colour by `k` and add `lift` to every channel. Reset reads as
/// black; other named colours are left alone.
fn shade(c: Color, k: f64, lift: f64) -> Color {
    let (r, g, b) = match c {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Reset | Color::Black => (0, 0, 0),
        other => return other,
    };
    let ch = |v: u8| (f64::from(v) * k.clamp(0.0, 1.0) + lift).clamp(0.0, 255.0) as u8;
    Color::Rgb(ch(r), ch(g), ch(b))
}

fn gray(level: f64) -> Color {
    let v = (level.clamp(0.0, 1.0) * 255.0) as u8;
    Color::Rgb(v, v, v)
}

fn pct_of(total: u16, pct: u8) -> u16 {
    (u32::from(total) * u32::from(pct.min(100)) / 100) as u16
}

fn set(buf: &mut Buffer, x: u16, y: u16, symbol: &str, fg: Color, bg: Color) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_symbol(symbol).set_fg(fg).set_bg(bg);
    }
}

fn fill(buf: &mut Buffer, area: Rect, bg: Color) {
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_bg(bg);
            }
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

/// Cheap stable hash for per-frame static.
fn hash(a: u64, b: u64) -> u64 {
    let mut z = a.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ b;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
