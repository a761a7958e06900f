use anyhow::{Context, Result};
use clap::Parser;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::debug;
use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use memory_maze::audio::{ambience_gain, AudioSink};
use memory_maze::config::{Args, Settings};
use memory_maze::{
    Choice, Dir, Ending, GameSession, Heading, Interaction, NarrativeState, Pos, Resolution, Tile,
};

const CELL_W: usize = 2;
/// HUD line above the maze plus two message lines below it. Hints share the
/// first message line.
const RESERVED_ROWS: usize = 3;
const INPUT_HOLD_MS: u64 = 160;
const HINT_MS: u64 = 2600;
const VOLUME_STEP: u8 = 10;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Wall,
    Empty,
    Exit,
    Fragment,
    Resolved,
}

impl Glyph {
    fn text(self) -> &'static str {
        match self {
            Glyph::Player => "◉",
            Glyph::Wall => "██",
            Glyph::Empty => "  ",
            Glyph::Exit => "▒▒",
            Glyph::Fragment => "◆",
            Glyph::Resolved => "◇",
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    last_footer: [String; 2],
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            last_footer: [String::new(), String::new()],
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

enum Command {
    Move(Dir),
    Interact,
    Decide(Choice),
    Replay,
    VolumeUp,
    VolumeDown,
    Quit,
}

/// Terminals rarely report key releases, so a direction counts as held for
/// a short window after its last press or repeat.
#[derive(Default)]
struct InputState {
    last: Option<(Dir, Instant)>,
}

impl InputState {
    fn press(&mut self, dir: Dir) {
        self.last = Some((dir, Instant::now()));
    }

    fn clear(&mut self) {
        self.last = None;
    }

    fn heading(&self) -> Heading {
        self.heading_at(Instant::now())
    }

    fn heading_at(&self, now: Instant) -> Heading {
        match self.last {
            Some((dir, at))
                if now.saturating_duration_since(at) <= Duration::from_millis(INPUT_HOLD_MS) =>
            {
                Heading::from(dir)
            }
            _ => Heading::STILL,
        }
    }
}

struct Hint {
    text: String,
    shown_at: Instant,
}

impl Hint {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shown_at: Instant::now(),
        }
    }

    fn is_visible(&self) -> bool {
        self.shown_at.elapsed() <= Duration::from_millis(HINT_MS)
    }
}

/// Audio sink for a plain terminal: the bell for strikes, and the ambience
/// level reported on the HUD.
struct TerminalBell {
    volume: u8,
    gain: f32,
    ring: bool,
}

impl TerminalBell {
    fn new(volume: u8) -> Self {
        Self {
            volume,
            gain: ambience_gain(0, 0),
            ring: false,
        }
    }

    fn take_ring(&mut self) -> bool {
        std::mem::take(&mut self.ring)
    }

    fn hum(&self) -> f32 {
        self.gain * f32::from(self.volume) / 100.0
    }
}

impl AudioSink for TerminalBell {
    fn adjust_ambience(&mut self, truth: u32, doubt: u32) {
        self.gain = ambience_gain(truth, doubt);
        debug!("ambience gain {:.3}", self.hum());
    }

    fn fragment_struck(&mut self) {
        if self.volume > 0 {
            self.ring = true;
        }
    }

    fn set_volume(&mut self, percent: u8) {
        self.volume = percent.min(100);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
    let args = Args::parse();
    let settings = Settings::from_env();

    let mut stdout = io::stdout();
    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    stdout
        .execute(EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &args, settings);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(stdout: &mut Stdout, args: &Args, settings: Settings) -> Result<()> {
    let (term_w, term_h) = terminal::size().context("failed to read terminal size")?;
    let dims = args.dims(
        term_w as usize / CELL_W,
        (term_h as usize).saturating_sub(RESERVED_ROWS),
    );
    let mut session = match args.seed {
        Some(seed) => GameSession::new(dims, seed),
        None => GameSession::from_entropy(dims),
    };
    let mut audio = TerminalBell::new(settings.volume);
    audio.adjust_ambience(0, 0);
    let mut renderer = Renderer::new(dims.cols(), dims.rows());
    let mut input = InputState::default();
    let mut hint: Option<Hint> = None;
    let frame_time = Duration::from_micros(1_000_000 / settings.render_fps.max(1));
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => {
                    if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                        continue;
                    }
                    let Some(command) = command_for(key.code) else {
                        continue;
                    };
                    match command {
                        Command::Quit => return Ok(()),
                        Command::Move(dir) => input.press(dir),
                        Command::Interact => {
                            if let Some(text) = interact(&mut session) {
                                hint = Some(Hint::new(text));
                            }
                        }
                        Command::Decide(choice) => {
                            if let Some(text) = decide(&mut session, choice, &mut audio) {
                                hint = Some(Hint::new(text));
                            }
                            input.clear();
                        }
                        Command::Replay => {
                            if session.ending().is_some() {
                                session.reset();
                                audio.adjust_ambience(0, 0);
                                input.clear();
                                hint = None;
                                renderer.needs_full = true;
                            }
                        }
                        Command::VolumeUp => {
                            audio.set_volume(audio.volume.saturating_add(VOLUME_STEP));
                        }
                        Command::VolumeDown => {
                            audio.set_volume(audio.volume.saturating_sub(VOLUME_STEP));
                        }
                    }
                }
                Event::Resize(_, _) => renderer.needs_full = true,
                _ => {}
            }
        }

        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();
        let report = session.update(dt, input.heading());
        if report.struck_fragment.is_some() {
            audio.fragment_struck();
        }

        if hint.as_ref().is_some_and(|h| !h.is_visible()) {
            hint = None;
        }
        render(stdout, &session, &mut renderer, &mut audio, hint.as_ref())?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn command_for(code: KeyCode) -> Option<Command> {
    let command = match code {
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Command::Move(Dir::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Command::Move(Dir::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Command::Move(Dir::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => Command::Move(Dir::Right),
        KeyCode::Char(' ') | KeyCode::Char('e') => Command::Interact,
        KeyCode::Char('f') => Command::Decide(Choice::Face),
        KeyCode::Char('i') => Command::Decide(Choice::Ignore),
        KeyCode::Char('r') => Command::Replay,
        KeyCode::Char('+') | KeyCode::Char('=') => Command::VolumeUp,
        KeyCode::Char('-') => Command::VolumeDown,
        _ => return None,
    };
    Some(command)
}

fn interact(session: &mut GameSession) -> Option<&'static str> {
    match session.interact() {
        Ok(Interaction::NothingHere) => Some("Nothing here."),
        Ok(Interaction::AlreadyResolved) => Some("Already resolved."),
        Ok(Interaction::Decision(_)) => None,
        Err(err) => {
            debug!("interact ignored: {err}");
            None
        }
    }
}

fn decide(session: &mut GameSession, choice: Choice, audio: &mut impl AudioSink) -> Option<String> {
    if session.pending().is_none() {
        return None;
    }
    match session.decide(choice) {
        Ok(Resolution::Resolved(outcome)) => {
            let narrative = session.narrative();
            audio.adjust_ambience(narrative.truth, narrative.doubt);
            if outcome.exit_unlocked {
                Some(format!("{} A hidden exit opens...", outcome.hint))
            } else {
                Some(outcome.hint.to_string())
            }
        }
        Ok(_) => None,
        Err(err) => {
            debug!("decision ignored: {err}");
            None
        }
    }
}

fn epilogue(ending: Ending, truth: u32, doubt: u32) -> String {
    match ending {
        Ending::True => format!(
            "You faced what you hid. Light pours through cracks. Truth: {truth}"
        ),
        Ending::Dark => format!("You let doubt steer you. The maze settles. Doubt: {doubt}"),
        Ending::Escape => format!(
            "You found an exit. The maze remains a lesson. Truth: {truth} Doubt: {doubt}"
        ),
    }
}

/// Cut `text` so it spans at most `max` terminal columns. Anything wider
/// would wrap onto the maze rows below.
fn fit_width(text: &str, max: usize) -> String {
    let mut used = 0;
    let mut out = String::with_capacity(text.len().min(max * 4));
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

fn hud_line(narrative: &NarrativeState, audio: &TerminalBell, max: usize) -> String {
    let exit_state = if narrative.exit_locked { "hidden" } else { "open" };
    let hud = format!(
        "Truth: {}  Doubt: {}  Exit: {}  Vol: {}% hum {:.2}  (space interact, q quit)",
        narrative.truth,
        narrative.doubt,
        exit_state,
        audio.volume,
        audio.hum()
    );
    fit_width(&hud, max)
}

/// The two message lines under the maze. The ending screen and a pending
/// decision take priority over a transient hint.
fn footer_lines(session: &GameSession, hint: Option<&str>, max: usize) -> [String; 2] {
    let narrative = session.narrative();
    let lines = if let Some(ending) = session.ending() {
        [
            format!("{}  {}", ending.title(), epilogue(ending, narrative.truth, narrative.doubt)),
            "[r] Play again   [q] Quit".to_string(),
        ]
    } else if let Some(pending) = session.pending() {
        [
            format!("Memory Fragment: {}", pending.text()),
            "[f] Face it   [i] Ignore".to_string(),
        ]
    } else {
        [hint.unwrap_or_default().to_string(), String::new()]
    };
    lines.map(|line| fit_width(&line, max))
}

fn render(
    stdout: &mut Stdout,
    session: &GameSession,
    renderer: &mut Renderer,
    audio: &mut TerminalBell,
    hint: Option<&Hint>,
) -> io::Result<()> {
    let grid = session.grid();
    let needed_h = (grid.height() + RESERVED_ROWS) as u16;
    let needed_w = (grid.width() * CELL_W) as u16;

    stdout.queue(MoveTo(0, 0))?;

    if audio.take_ring() {
        stdout.queue(Print('\x07'))?;
    }

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }
    if renderer.needs_full {
        stdout.queue(Clear(ClearType::All))?;
    }

    let line_w = usize::from(term_w - origin_x);
    let hud = hud_line(session.narrative(), audio, line_w);
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let cell = cell_for(session, Pos::new(x, y));
            let idx = y * grid.width() + x;
            if renderer.needs_full || cell != renderer.last[idx] {
                renderer.last[idx] = cell;
                draw_cell(stdout, renderer, x, y, cell)?;
            }
        }
    }

    let footer = footer_lines(session, hint.map(|h| h.text.as_str()), line_w);
    for (i, line) in footer.iter().enumerate() {
        if renderer.needs_full || *line != renderer.last_footer[i] {
            let y_pos = renderer.origin_y + (grid.height() + i) as u16;
            stdout.queue(MoveTo(renderer.origin_x, y_pos))?;
            stdout.queue(Clear(ClearType::CurrentLine))?;
            stdout.queue(SetForegroundColor(Color::Cyan))?;
            stdout.queue(Print(line))?;
            stdout.queue(ResetColor)?;
            renderer.last_footer[i] = line.clone();
        }
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn cell_for(session: &GameSession, pos: Pos) -> Cell {
    if session.player_cell() == Some(pos) {
        return Cell {
            glyph: Glyph::Player,
            color: Color::White,
        };
    }
    let narrative = session.narrative();
    match session.grid().tile(pos) {
        Some(Tile::Wall) => Cell {
            glyph: Glyph::Wall,
            color: Color::DarkCyan,
        },
        Some(Tile::Exit) if !narrative.exit_locked => Cell {
            glyph: Glyph::Exit,
            color: Color::Yellow,
        },
        Some(Tile::FragmentNode) if narrative.is_visited(pos) => Cell {
            glyph: Glyph::Resolved,
            color: Color::DarkGreen,
        },
        Some(Tile::FragmentNode) => Cell {
            glyph: Glyph::Fragment,
            color: Color::Green,
        },
        _ => Cell {
            glyph: Glyph::Empty,
            color: Color::Reset,
        },
    }
}

fn draw_cell(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = cell.glyph.text();
    let pad = CELL_W.saturating_sub(text.width());
    stdout.queue(MoveTo(
        renderer.origin_x + (x * CELL_W) as u16,
        renderer.origin_y + y as u16,
    ))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(format!("{text}{:pad$}", "")))?;
    stdout.queue(ResetColor)?;
    Ok(())
}
