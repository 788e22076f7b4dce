//! Operator interaction: selectors, text input and status lines.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{MoveTo, MoveToColumn, MoveUp};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};

pub trait Prompter
{
    /// Index of the chosen item, `None` when the operator backs out.
    fn select(&mut self, label: &str, items: &[String]) -> io::Result<Option<usize>>;

    /// A line of text, `None` when the operator backs out.
    fn input(&mut self, label: &str) -> io::Result<Option<String>>;

    /// Like `input` without echoing the typed characters.
    fn password(&mut self, label: &str) -> io::Result<Option<String>>;

    fn message(&mut self, text: &str);

    fn clear(&mut self);

    fn pause(&mut self, duration: Duration);
}

const SELECT_HELP: &str = "Use ↑/↓ to move, Enter to select, Esc to go back";
const PASSWORD_MASK: char = '*';

/// Restores cooked mode when dropped.
struct RawModeGuard
{
    _private: (),
}

impl RawModeGuard
{
    fn new() -> io::Result<Self>
    {
        terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard
{
    fn drop(&mut self)
    {
        let _ = terminal::disable_raw_mode();
    }
}

// Ctrl-C does not raise SIGINT in raw mode.
fn read_key() -> io::Result<KeyEvent>
{
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
            }
            return Ok(key);
        }
    }
}

fn truncate(text: &str, width: usize) -> String
{
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

/// Columns left for a selector line after its two-glyph marker.
fn line_width(cols: u16) -> usize
{
    usize::from(cols).saturating_sub(4).max(8)
}

/// Text a key adds to a line being typed. Control and Alt chords add nothing.
fn typed_char(key: &KeyEvent) -> Option<char>
{
    match key.code {
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => Some(c),
        _ => None,
    }
}

/// First visible item so that `cursor` stays inside a `window` sized view.
fn window_start(cursor: usize, window: usize) -> usize
{
    (cursor + 1).saturating_sub(window)
}

/// Interactive prompter on the controlling terminal.
pub struct Terminal
{
    out: Stdout,
}

impl Terminal
{
    pub fn new() -> Self
    {
        Self { out: io::stdout() }
    }

    fn erase(&mut self, lines: u16) -> io::Result<()>
    {
        if lines > 0 {
            queue!(self.out, MoveUp(lines), MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
        }
        Ok(())
    }

    fn draw_select(&mut self, label: &str, items: &[String], cursor: usize, previous: u16) -> io::Result<u16>
    {
        self.erase(previous)?;

        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        let width = line_width(cols);
        let window = usize::from(rows).saturating_sub(3).clamp(1, items.len());
        let start = window_start(cursor, window);

        let label = truncate(label, width);
        queue!(self.out, Print(format!("{} {}\r\n", "?".green().bold(), label.as_str().bold())))?;
        for (i, item) in items.iter().enumerate().skip(start).take(window) {
            let item = truncate(item, width);
            if i == cursor {
                queue!(self.out, Print(format!("👉 {}\r\n", item.as_str().cyan().bold())))?;
            } else {
                queue!(self.out, Print(format!("   {}\r\n", item.as_str().cyan())))?;
            }
        }
        queue!(self.out, Print(format!("{}\r\n", SELECT_HELP.bold())))?;
        self.out.flush()?;

        Ok((window + 2) as u16)
    }

    fn read_line(&mut self, label: &str, mask: Option<char>) -> io::Result<Option<String>>
    {
        let _raw = RawModeGuard::new()?;
        let mut value = String::new();

        loop {
            let shown = match mask {
                Some(m) => std::iter::repeat(m).take(value.chars().count()).collect(),
                None => value.clone(),
            };
            queue!(
                self.out,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(format!("👉 {} {}", label.cyan().bold(), shown))
            )?;
            self.out.flush()?;

            let key = read_key()?;
            match key.code {
                KeyCode::Enter => break,
                KeyCode::Esc => {
                    queue!(self.out, Print("\r\n"))?;
                    self.out.flush()?;
                    return Ok(None);
                }
                KeyCode::Backspace => {
                    value.pop();
                }
                _ => {
                    if let Some(c) = typed_char(&key) {
                        value.push(c);
                    }
                }
            }
        }

        queue!(self.out, Print("\r\n"))?;
        self.out.flush()?;

        Ok(Some(value))
    }
}

impl Default for Terminal
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl Prompter for Terminal
{
    fn select(&mut self, label: &str, items: &[String]) -> io::Result<Option<usize>>
    {
        if items.is_empty() {
            return Ok(None);
        }

        let _raw = RawModeGuard::new()?;
        let mut cursor = 0;
        let mut drawn = 0;

        let chosen = loop {
            drawn = self.draw_select(label, items, cursor, drawn)?;

            match read_key()?.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    cursor = cursor.checked_sub(1).unwrap_or(items.len() - 1);
                }
                KeyCode::Down | KeyCode::Char('j') => cursor = (cursor + 1) % items.len(),
                KeyCode::Home => cursor = 0,
                KeyCode::End => cursor = items.len() - 1,
                KeyCode::Enter => break Some(cursor),
                KeyCode::Esc => break None,
                _ => {}
            }
        };

        self.erase(drawn)?;
        if let Some(i) = chosen {
            queue!(
                self.out,
                Print(format!("{} {} {}\r\n", "✔".green().bold(), "Selected Option:".bold(), items[i].as_str().cyan()))
            )?;
        }
        self.out.flush()?;

        Ok(chosen)
    }

    fn input(&mut self, label: &str) -> io::Result<Option<String>>
    {
        self.read_line(label, None)
    }

    fn password(&mut self, label: &str) -> io::Result<Option<String>>
    {
        self.read_line(label, Some(PASSWORD_MASK))
    }

    fn message(&mut self, text: &str)
    {
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.flush();
    }

    fn clear(&mut self)
    {
        let _ = execute!(self.out, Clear(ClearType::All), MoveTo(0, 0));
    }

    fn pause(&mut self, duration: Duration)
    {
        std::thread::sleep(duration);
    }
}
