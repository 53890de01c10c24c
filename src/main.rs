use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify_rust::{Notification, Urgency};
use ratatui::{prelude::*, widgets::*};
use std::{
    io,
    path::Path,
    process::{Child, Command, Stdio},
    time::{Duration, Instant},
};

// ============================================================================
// Type Aliases & Constants
// ============================================================================

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const TICK_INTERVAL: Duration = Duration::from_secs(1);
const MIN_PHASE_SECS: u32 = 60;
const MAX_PHASE_SECS: u32 = 3600;
const DEFAULT_WORK_SECS: u32 = 25 * 60;
const DEFAULT_BREAK_SECS: u32 = 5 * 60;

const ALERT_SOUNDS: &[(&str, &str)] = &[
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
    ("aplay", "/usr/share/sounds/generic.wav"),
];

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Clone)]
#[command(author, version, about = "🍅 tomat - A Minimal Terminal Pomodoro Timer")]
struct Args {
    #[arg(short, long, value_parser = parse_minutes)]
    work: Option<u32>,
    #[arg(short, long, value_parser = parse_minutes)]
    rest: Option<u32>,
    #[arg(short = 't', long)]
    theme: Option<String>,
    #[arg(long)]
    no_sound: bool,
}

fn parse_minutes(s: &str) -> std::result::Result<u32, String> {
    let minutes = s.trim().parse::<u32>().map_err(|_| "Invalid minutes")?;
    if (1..=60).contains(&minutes) {
        Ok(minutes)
    } else {
        Err("Length must be between 1 and 60 minutes".into())
    }
}

// ============================================================================
// Data Models
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Work,
    Break,
}

impl Phase {
    fn name(&self) -> &str {
        match self {
            Self::Work => "🎯 SESSION",
            Self::Break => "☕ BREAK",
        }
    }

    fn other(&self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }

    fn entry_message(&self) -> &'static str {
        match self {
            Self::Work => "Back to work!",
            Self::Break => "Time for a break!",
        }
    }
}

#[derive(Clone, Copy)]
struct TimerConfig {
    work_secs: u32,
    break_secs: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_secs: DEFAULT_WORK_SECS,
            break_secs: DEFAULT_BREAK_SECS,
        }
    }
}

impl TimerConfig {
    fn length_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_secs,
            Phase::Break => self.break_secs,
        }
    }

    fn set_length(&mut self, phase: Phase, secs: u32) {
        match phase {
            Phase::Work => self.work_secs = secs,
            Phase::Break => self.break_secs = secs,
        }
    }
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum View {
    Timer,
    Help,
}

#[derive(Clone, Copy)]
struct Theme {
    work_color: Color,
    break_color: Color,
    border_color: Color,
    accent_color: Color,
}

// ============================================================================
// Timer Engine
// ============================================================================

// The one recurring tick registration. Holding it in an Option makes
// "at most one active tick source" structural: start() arms it only when
// empty, pause() and reset() drop it.
struct Ticker {
    next_due: Instant,
}

struct PomodoroTimer {
    config: TimerConfig,
    remaining_secs: u32,
    phase: Phase,
    ticker: Option<Ticker>,
}

impl PomodoroTimer {
    fn new(config: TimerConfig) -> Self {
        Self {
            config,
            remaining_secs: config.work_secs,
            phase: Phase::Work,
            ticker: None,
        }
    }

    fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    // Idempotent: a second start while running must not re-arm the cadence.
    fn start(&mut self, now: Instant) {
        if self.ticker.is_some() {
            return;
        }
        self.ticker = Some(Ticker {
            next_due: now + TICK_INTERVAL,
        });
    }

    fn pause(&mut self) {
        self.ticker = None;
    }

    fn reset(&mut self) {
        self.ticker = None;
        self.phase = Phase::Work;
        self.remaining_secs = self.config.work_secs;
    }

    // Applies every tick due at `now` and returns the phases entered along
    // the way. The render loop feeds this wall-clock instants; tests feed
    // synthetic ones.
    fn advance(&mut self, now: Instant) -> Vec<Phase> {
        let mut entered = Vec::new();
        while let Some(ticker) = self.ticker.as_mut() {
            if now < ticker.next_due {
                break;
            }
            ticker.next_due += TICK_INTERVAL;
            if let Some(phase) = self.tick() {
                entered.push(phase);
            }
        }
        entered
    }

    // One 1-second step. The zero state occupies a full tick before the
    // flip, so a phase cycle spans length + 1 ticks.
    fn tick(&mut self) -> Option<Phase> {
        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
            None
        } else {
            self.phase = self.phase.other();
            self.remaining_secs = self.config.length_of(self.phase);
            Some(self.phase)
        }
    }

    // Configuration is frozen while running; out-of-range adjustments are
    // rejected silently rather than raised.
    fn adjust_length(&mut self, target: Phase, delta_minutes: i32) {
        if self.is_running() {
            return;
        }
        let new_secs = self.config.length_of(target) as i64 + delta_minutes as i64 * 60;
        if !(MIN_PHASE_SECS as i64..=MAX_PHASE_SECS as i64).contains(&new_secs) {
            return;
        }
        let new_secs = new_secs as u32;
        self.config.set_length(target, new_secs);
        // Keep the idle countdown in sync when the active phase is adjusted.
        if target == self.phase {
            self.remaining_secs = new_secs;
        }
    }

    fn progress_ratio(&self) -> f64 {
        let total = self.config.length_of(self.phase) as f64;
        let remaining = self.remaining_secs as f64;
        (1.0 - remaining / total).clamp(0.0, 1.0)
    }
}

fn format_display(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

// ============================================================================
// Alerts
// ============================================================================

trait NotificationSink {
    fn notify(&mut self, message: &str);
}

trait AudioCue {
    fn play(&mut self);
    fn stop(&mut self);
}

struct DesktopNotifier;

impl NotificationSink for DesktopNotifier {
    fn notify(&mut self, message: &str) {
        let _ = Notification::new()
            .summary(message)
            .appname("tomat")
            .icon("alarm-clock")
            .urgency(Urgency::Normal)
            .show();
    }
}

// Plays the alert through the first available system player. The child
// handle is retained so reset() can cut a cue short.
struct AlertSound {
    child: Option<Child>,
}

impl AlertSound {
    fn new() -> Self {
        Self { child: None }
    }
}

impl AudioCue for AlertSound {
    fn play(&mut self) {
        self.stop();
        for (cmd, file) in ALERT_SOUNDS {
            if Path::new(file).exists() {
                if let Ok(child) = Command::new(cmd)
                    .arg(file)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                {
                    self.child = Some(child);
                }
                break;
            }
        }
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for AlertSound {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Application State
// ============================================================================

struct App {
    timer: PomodoroTimer,
    current_view: View,
    theme: Theme,
    sound_enabled: bool,
    animation_frame: u8,
    notifier: Box<dyn NotificationSink>,
    audio: Box<dyn AudioCue>,
}

impl App {
    fn new(
        config: TimerConfig,
        theme_name: &str,
        sound_enabled: bool,
        notifier: Box<dyn NotificationSink>,
        audio: Box<dyn AudioCue>,
    ) -> Self {
        Self {
            timer: PomodoroTimer::new(config),
            current_view: View::Timer,
            theme: get_theme(theme_name),
            sound_enabled,
            animation_frame: 0,
            notifier,
            audio,
        }
    }

    fn phase_color(&self) -> Color {
        match self.timer.phase {
            Phase::Work => self.theme.work_color,
            Phase::Break => self.theme.break_color,
        }
    }

    // Both sinks are fire-and-forget, so a slow notification daemon or
    // audio player never stalls the tick cadence.
    fn update(&mut self, now: Instant) {
        for phase in self.timer.advance(now) {
            if self.sound_enabled {
                self.audio.play();
            }
            self.notifier.notify(phase.entry_message());
        }
        self.animation_frame = self.animation_frame.wrapping_add(1) % 20;
    }

    fn toggle_running(&mut self, now: Instant) {
        if self.timer.is_running() {
            self.timer.pause();
        } else {
            self.timer.start(now);
        }
    }

    fn reset(&mut self) {
        self.timer.reset();
        self.audio.stop();
    }
}

// ============================================================================
// Event Handlers
// ============================================================================

fn handle_input(key: event::KeyEvent, app: &mut App, now: Instant) -> bool {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        return true;
    }

    if app.current_view == View::Help {
        if key.code == KeyCode::Char('?') {
            app.current_view = View::Timer;
        }
        return false;
    }

    match key.code {
        KeyCode::Char(' ') => app.toggle_running(now),
        KeyCode::Char('r') => app.reset(),
        KeyCode::Up | KeyCode::Char('k') => app.timer.adjust_length(Phase::Work, 1),
        KeyCode::Down | KeyCode::Char('j') => app.timer.adjust_length(Phase::Work, -1),
        KeyCode::Right | KeyCode::Char('l') => app.timer.adjust_length(Phase::Break, 1),
        KeyCode::Left | KeyCode::Char('h') => app.timer.adjust_length(Phase::Break, -1),
        KeyCode::Char('?') => app.current_view = View::Help,
        _ => {}
    }

    false
}

// ============================================================================
// UI Rendering
// ============================================================================

fn render_ui(f: &mut Frame, app: &App) {
    match app.current_view {
        View::Timer => render_timer(f, app),
        View::Help => render_help(f, app),
    }
}

fn render_timer(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    // Header
    let header = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme.border_color))
        .title(Span::styled(" 🍅 TOMAT ", Style::default()
            .fg(app.theme.accent_color).add_modifier(Modifier::BOLD)));
    f.render_widget(header, chunks[0]);

    // Main content
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(10),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(5), Constraint::Length(1),
            Constraint::Length(2), Constraint::Length(1),
            Constraint::Length(2), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Percentage(10),
        ])
        .split(chunks[1]);

    // Phase
    f.render_widget(
        Paragraph::new(app.timer.phase.name())
            .style(Style::default().fg(app.phase_color()).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[1]
    );

    // Countdown
    f.render_widget(
        Paragraph::new(format_display(app.timer.remaining_secs))
            .style(Style::default().fg(app.phase_color()).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[3]
    );

    // Date/time
    let now = chrono::Local::now();
    let date_lines = vec![
        Line::from(Span::styled(now.format("%A, %B %d, %Y").to_string(), Style::default().fg(Color::Gray))),
        Line::from(Span::styled(now.format("%I:%M %p").to_string(), Style::default().fg(Color::DarkGray))),
    ];
    f.render_widget(Paragraph::new(date_lines).alignment(Alignment::Center), sections[5]);

    // Status
    let status = if app.timer.is_running() {
        format!("{} RUNNING", if app.animation_frame < 10 { "●" } else { "○" })
    } else {
        format!("⏸  PAUSED{}", ".".repeat((app.animation_frame / 5) as usize % 4))
    };
    f.render_widget(
        Paragraph::new(status)
            .style(Style::default()
                .fg(if app.timer.is_running() { Color::Green } else { Color::Yellow })
                .add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[7]
    );

    // Progress
    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(app.phase_color()).bg(Color::Black))
            .percent((app.timer.progress_ratio() * 100.0) as u16),
        sections[9]
    );

    // Configured lengths; adjustable only while paused
    let value_color = if app.timer.is_running() { Color::DarkGray } else { Color::White };
    let mut length_spans = vec![
        Span::raw("🎯 Session "),
        Span::styled(
            format!("{} min", app.timer.config.work_secs / 60),
            Style::default().fg(value_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  •  ☕ Break "),
        Span::styled(
            format!("{} min", app.timer.config.break_secs / 60),
            Style::default().fg(value_color).add_modifier(Modifier::BOLD),
        ),
    ];
    if app.timer.is_running() {
        length_spans.push(Span::styled("  (pause to adjust)", Style::default()
            .fg(Color::DarkGray).add_modifier(Modifier::ITALIC)));
    }
    f.render_widget(
        Paragraph::new(Line::from(length_spans))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center),
        sections[11]
    );

    // Controls
    let controls = vec![
        Line::from(vec![
            span_key("Space", app), Span::raw(" Start/Pause  •  "),
            span_key("R", app), Span::raw(" Reset  •  "),
            span_key("?", app), Span::raw(" Help  •  "),
            span_key("Q", app), Span::raw(" Quit"),
        ]),
        Line::from(vec![
            span_key("↑↓/kj", app), Span::raw(" Session ±1 min  •  "),
            span_key("←→/hl", app), Span::raw(" Break ±1 min"),
        ]),
    ];
    f.render_widget(
        Paragraph::new(controls).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        chunks[2]
    );
}

fn span_key<'a>(text: &'a str, app: &App) -> Span<'a> {
    Span::styled(text, Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD))
}

fn render_help(f: &mut Frame, app: &App) {
    let area = centered_rect(70, 80, f.size());

    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("⌨️  KEYBOARD SHORTCUTS", Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("  Timer Controls:"),
        help_line("Space", "Start or pause the countdown"),
        help_line("R", "Reset to the session countdown"),
        Line::from(""),
        Line::from("  Lengths (while paused):"),
        help_line("↑ / K", "Session length +1 minute"),
        help_line("↓ / J", "Session length -1 minute"),
        help_line("→ / L", "Break length +1 minute"),
        help_line("← / H", "Break length -1 minute"),
        Line::from(""),
        Line::from("  General:"),
        help_line("?", "Toggle this help"),
        help_line("Q / Esc", "Quit"),
        help_line("Ctrl+C", "Force quit"),
        Line::from(""),
        Line::from(Span::styled("💡 Lengths stay between 1 and 60 minutes",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))),
    ];

    f.render_widget(
        Paragraph::new(help_text)
            .alignment(Alignment::Left)
            .block(Block::default()
                .title(" Help ")
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(app.theme.border_color))),
        area
    );
}

fn help_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("    "),
        Span::styled(key, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}", desc)),
    ])
}

fn centered_rect(w: u16, h: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h) / 2),
            Constraint::Percentage(h),
            Constraint::Percentage((100 - h) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w) / 2),
            Constraint::Percentage(w),
            Constraint::Percentage((100 - w) / 2),
        ])
        .split(v[1])[1]
}

// ============================================================================
// Utilities
// ============================================================================

fn get_theme(name: &str) -> Theme {
    match name {
        "nord" => Theme {
            work_color: Color::Rgb(136, 192, 255),
            break_color: Color::Rgb(0, 255, 100),
            border_color: Color::Rgb(100, 200, 255),
            accent_color: Color::Rgb(255, 100, 255),
        },
        "dracula" => Theme {
            work_color: Color::Rgb(189, 147, 249),
            break_color: Color::Rgb(0, 255, 0),
            border_color: Color::Rgb(200, 100, 255),
            accent_color: Color::Rgb(255, 0, 255),
        },
        "gruvbox" => Theme {
            work_color: Color::Rgb(254, 128, 25),
            break_color: Color::Rgb(255, 255, 0),
            border_color: Color::Rgb(255, 200, 100),
            accent_color: Color::Rgb(255, 150, 0),
        },
        "solarized" => Theme {
            work_color: Color::Rgb(42, 161, 152),
            break_color: Color::Rgb(150, 255, 0),
            border_color: Color::Rgb(100, 200, 255),
            accent_color: Color::Rgb(255, 200, 0),
        },
        _ => Theme {
            work_color: Color::Rgb(100, 181, 246),
            break_color: Color::Rgb(0, 255, 150),
            border_color: Color::Rgb(0, 200, 255),
            accent_color: Color::Rgb(255, 100, 0),
        },
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = TimerConfig::default();

    // CLI overrides
    if let Some(w) = args.work { config.work_secs = w * 60; }
    if let Some(r) = args.rest { config.break_secs = r * 60; }
    let theme = args.theme.as_deref().unwrap_or("default");

    let mut app = App::new(
        config,
        theme,
        !args.no_sound,
        Box::new(DesktopNotifier),
        Box::new(AlertSound::new()),
    );
    // The countdown begins immediately; Space pauses it.
    app.timer.start(Instant::now());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|f| render_ui(f, app))?;

        let timeout = POLL_INTERVAL.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if handle_input(key, app, Instant::now()) {
                    return Ok(());
                }
            }
        }

        if last_frame.elapsed() >= POLL_INTERVAL {
            app.update(Instant::now());
            last_frame = Instant::now();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn timer() -> PomodoroTimer {
        PomodoroTimer::new(TimerConfig::default())
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[derive(Clone, Default)]
    struct SinkLog {
        messages: Rc<RefCell<Vec<String>>>,
    }

    impl NotificationSink for SinkLog {
        fn notify(&mut self, message: &str) {
            self.messages.borrow_mut().push(message.to_string());
        }
    }

    #[derive(Clone, Default)]
    struct CueLog {
        plays: Rc<Cell<u32>>,
        stops: Rc<Cell<u32>>,
    }

    impl AudioCue for CueLog {
        fn play(&mut self) {
            self.plays.set(self.plays.get() + 1);
        }
        fn stop(&mut self) {
            self.stops.set(self.stops.get() + 1);
        }
    }

    fn test_app(config: TimerConfig, sound: bool) -> (App, SinkLog, CueLog) {
        let sink = SinkLog::default();
        let cue = CueLog::default();
        let app = App::new(config, "default", sound, Box::new(sink.clone()), Box::new(cue.clone()));
        (app, sink, cue)
    }

    #[test]
    fn format_display_pads_both_fields() {
        assert_eq!(format_display(0), "00:00");
        assert_eq!(format_display(90), "01:30");
        assert_eq!(format_display(1500), "25:00");
        assert_eq!(format_display(3600), "60:00");
    }

    #[test]
    fn tick_decrements_without_phase_change() {
        let mut t = timer();
        assert_eq!(t.tick(), None);
        assert_eq!(t.remaining_secs, 1499);
        assert_eq!(t.phase, Phase::Work);
    }

    #[test]
    fn tick_at_zero_flips_work_to_break() {
        let mut t = timer();
        t.remaining_secs = 0;
        assert_eq!(t.tick(), Some(Phase::Break));
        assert_eq!(t.phase, Phase::Break);
        assert_eq!(t.remaining_secs, DEFAULT_BREAK_SECS);
    }

    #[test]
    fn tick_at_zero_flips_break_to_work() {
        let mut t = timer();
        t.phase = Phase::Break;
        t.remaining_secs = 0;
        assert_eq!(t.tick(), Some(Phase::Work));
        assert_eq!(t.phase, Phase::Work);
        assert_eq!(t.remaining_secs, DEFAULT_WORK_SECS);
    }

    #[test]
    fn default_config_runs_a_full_cycle() {
        let t0 = Instant::now();
        let mut t = timer();
        t.start(t0);

        // 1500 due ticks drain the session; the zero state holds for a tick.
        assert!(t.advance(t0 + secs(1500)).is_empty());
        assert_eq!(t.remaining_secs, 0);
        assert_eq!(t.phase, Phase::Work);

        assert_eq!(t.advance(t0 + secs(1501)), vec![Phase::Break]);
        assert_eq!(t.remaining_secs, DEFAULT_BREAK_SECS);

        assert!(t.advance(t0 + secs(1801)).is_empty());
        assert_eq!(t.remaining_secs, 0);
        assert_eq!(t.phase, Phase::Break);

        assert_eq!(t.advance(t0 + secs(1802)), vec![Phase::Work]);
        assert_eq!(t.remaining_secs, DEFAULT_WORK_SECS);
    }

    #[test]
    fn start_is_idempotent_single_tick_source() {
        let t0 = Instant::now();
        let mut t = timer();
        t.start(t0);
        // A second start mid-interval must neither double-tick nor re-arm.
        t.start(t0 + Duration::from_millis(700));

        t.advance(t0 + secs(1));
        assert_eq!(t.remaining_secs, 1499);

        // Nothing else becomes due until the original cadence says so.
        t.advance(t0 + Duration::from_millis(1999));
        assert_eq!(t.remaining_secs, 1499);
        t.advance(t0 + secs(2));
        assert_eq!(t.remaining_secs, 1498);
    }

    #[test]
    fn pause_preserves_remaining_time() {
        let t0 = Instant::now();
        let mut t = timer();
        t.start(t0);
        t.advance(t0 + secs(3));
        assert_eq!(t.remaining_secs, 1497);

        t.pause();
        assert!(!t.is_running());
        t.advance(t0 + secs(500));
        assert_eq!(t.remaining_secs, 1497);

        // Resuming restarts the 1-second period from the resume instant.
        let t1 = t0 + secs(500);
        t.start(t1);
        t.advance(t1 + secs(1));
        assert_eq!(t.remaining_secs, 1496);
    }

    #[test]
    fn adjust_changes_length_by_exactly_one_minute() {
        let mut t = timer();
        t.adjust_length(Phase::Work, 1);
        assert_eq!(t.config.work_secs, 1560);
        t.adjust_length(Phase::Break, -1);
        assert_eq!(t.config.break_secs, 240);
    }

    #[test]
    fn adjust_is_rejected_outside_bounds() {
        let mut t = timer();
        // 24 decrements reach the floor; the 25th is silently ignored.
        for _ in 0..24 {
            t.adjust_length(Phase::Work, -1);
        }
        assert_eq!(t.config.work_secs, MIN_PHASE_SECS);
        t.adjust_length(Phase::Work, -1);
        assert_eq!(t.config.work_secs, MIN_PHASE_SECS);

        let mut t = timer();
        for _ in 0..35 {
            t.adjust_length(Phase::Work, 1);
        }
        assert_eq!(t.config.work_secs, MAX_PHASE_SECS);
        t.adjust_length(Phase::Work, 1);
        assert_eq!(t.config.work_secs, MAX_PHASE_SECS);
    }

    #[test]
    fn adjust_is_a_noop_while_running() {
        let t0 = Instant::now();
        let mut t = timer();
        t.start(t0);
        t.adjust_length(Phase::Work, 1);
        t.adjust_length(Phase::Break, -1);
        assert_eq!(t.config.work_secs, DEFAULT_WORK_SECS);
        assert_eq!(t.config.break_secs, DEFAULT_BREAK_SECS);
        assert_eq!(t.remaining_secs, DEFAULT_WORK_SECS);
    }

    #[test]
    fn adjusting_work_syncs_idle_work_countdown() {
        let mut t = timer();
        t.adjust_length(Phase::Work, -1);
        assert_eq!(t.config.work_secs, 1440);
        assert_eq!(t.remaining_secs, 1440);
    }

    #[test]
    fn adjusting_inactive_phase_leaves_countdown_alone() {
        let mut t = timer();
        t.adjust_length(Phase::Break, 1);
        assert_eq!(t.config.break_secs, 360);
        assert_eq!(t.remaining_secs, DEFAULT_WORK_SECS);
    }

    #[test]
    fn adjusting_break_syncs_countdown_only_in_break_phase() {
        let mut t = timer();
        t.phase = Phase::Break;
        t.remaining_secs = t.config.break_secs;
        t.adjust_length(Phase::Break, 1);
        assert_eq!(t.config.break_secs, 360);
        assert_eq!(t.remaining_secs, 360);
    }

    #[test]
    fn reset_restores_work_phase_from_any_state() {
        let t0 = Instant::now();
        let mut t = timer();
        t.start(t0);
        t.advance(t0 + secs(1501));
        assert_eq!(t.phase, Phase::Break);

        t.reset();
        assert_eq!(t.phase, Phase::Work);
        assert_eq!(t.remaining_secs, DEFAULT_WORK_SECS);
        assert!(!t.is_running());
    }

    #[test]
    fn reset_keeps_adjusted_lengths() {
        let mut t = timer();
        t.adjust_length(Phase::Work, -5);
        t.adjust_length(Phase::Break, 2);
        t.reset();
        assert_eq!(t.remaining_secs, 1200);
        assert_eq!(t.config.work_secs, 1200);
        assert_eq!(t.config.break_secs, 420);
    }

    #[test]
    fn transition_plays_cue_and_notifies() {
        let t0 = Instant::now();
        let config = TimerConfig { work_secs: 60, break_secs: 60 };
        let (mut app, sink, cue) = test_app(config, true);

        app.timer.start(t0);
        app.update(t0 + secs(61));

        assert_eq!(cue.plays.get(), 1);
        assert_eq!(*sink.messages.borrow(), vec!["Time for a break!".to_string()]);

        app.update(t0 + secs(122));
        assert_eq!(cue.plays.get(), 2);
        assert_eq!(sink.messages.borrow().last().map(String::as_str), Some("Back to work!"));
    }

    #[test]
    fn no_sound_suppresses_cue_but_not_notification() {
        let t0 = Instant::now();
        let config = TimerConfig { work_secs: 60, break_secs: 60 };
        let (mut app, sink, cue) = test_app(config, false);

        app.timer.start(t0);
        app.update(t0 + secs(61));

        assert_eq!(cue.plays.get(), 0);
        assert_eq!(sink.messages.borrow().len(), 1);
    }

    #[test]
    fn reset_stops_the_cue() {
        let (mut app, _sink, cue) = test_app(TimerConfig::default(), true);
        app.reset();
        assert_eq!(cue.stops.get(), 1);
        assert!(!app.timer.is_running());
    }

    #[test]
    fn space_toggles_and_r_resets() {
        let t0 = Instant::now();
        let (mut app, _sink, _cue) = test_app(TimerConfig::default(), true);
        let space = event::KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);

        assert!(!handle_input(space, &mut app, t0));
        assert!(app.timer.is_running());
        assert!(!handle_input(space, &mut app, t0));
        assert!(!app.timer.is_running());

        app.timer.start(t0);
        app.timer.advance(t0 + secs(5));
        let reset = event::KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);
        handle_input(reset, &mut app, t0);
        assert!(!app.timer.is_running());
        assert_eq!(app.timer.remaining_secs, DEFAULT_WORK_SECS);
    }

    #[test]
    fn adjustment_keys_map_to_phases() {
        let t0 = Instant::now();
        let (mut app, _sink, _cue) = test_app(TimerConfig::default(), true);

        handle_input(event::KeyEvent::new(KeyCode::Up, KeyModifiers::NONE), &mut app, t0);
        assert_eq!(app.timer.config.work_secs, 1560);
        handle_input(event::KeyEvent::new(KeyCode::Down, KeyModifiers::NONE), &mut app, t0);
        assert_eq!(app.timer.config.work_secs, 1500);
        handle_input(event::KeyEvent::new(KeyCode::Right, KeyModifiers::NONE), &mut app, t0);
        assert_eq!(app.timer.config.break_secs, 360);
        handle_input(event::KeyEvent::new(KeyCode::Left, KeyModifiers::NONE), &mut app, t0);
        assert_eq!(app.timer.config.break_secs, 300);
    }

    #[test]
    fn quit_keys_exit_from_any_view() {
        let t0 = Instant::now();
        let (mut app, _sink, _cue) = test_app(TimerConfig::default(), true);

        let help = event::KeyEvent::new(KeyCode::Char('?'), KeyModifiers::NONE);
        handle_input(help, &mut app, t0);
        assert_eq!(app.current_view, View::Help);

        let quit = event::KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(handle_input(quit, &mut app, t0));

        let ctrl_c = event::KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(handle_input(ctrl_c, &mut app, t0));
    }

    #[test]
    fn parse_minutes_validates_range() {
        assert_eq!(parse_minutes("25"), Ok(25));
        assert_eq!(parse_minutes(" 1 "), Ok(1));
        assert_eq!(parse_minutes("60"), Ok(60));
        assert!(parse_minutes("0").is_err());
        assert!(parse_minutes("61").is_err());
        assert!(parse_minutes("abc").is_err());
    }
}
