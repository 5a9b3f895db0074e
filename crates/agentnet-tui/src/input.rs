use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use agentnet_builder::AgentFormDraft;
use agentnet_core::types::{AgentKind, Position};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `/agent name|role|goals|model|type`
    Agent(AgentFormDraft),
    Cancel,
    Connect { source: String, target: String },
    Move { id: String, position: Position },
    Select(String),
    /// Node or edge id.
    Remove(String),
    Run,
    Quit,
    /// Plain text for the push channel.
    Say(String),
}

/// Actions produced by key input handling.
pub enum InputAction {
    Submit(Command),
    /// The line could not be parsed; carries a usage hint.
    Invalid(String),
    Quit,
    ScrollUp,
    ScrollDown,
    /// No-op (key was handled internally).
    None,
}

const USAGE: &str =
    "/agent name|role|goals|model|type  /connect SRC TGT  /move ID X Y  /select ID  /remove ID  /run  /cancel  /quit";

/// Parse one submitted line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Some(Command::Say(trimmed.to_string())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let words: Vec<&str> = args.split_whitespace().collect();

    let command = match (name, words.as_slice()) {
        ("quit" | "exit" | "q", _) => Command::Quit,
        ("run", []) => Command::Run,
        ("cancel", []) => Command::Cancel,
        ("agent", _) if !args.is_empty() => Command::Agent(parse_agent(args)),
        ("connect", [source, target]) => Command::Connect {
            source: source.to_string(),
            target: target.to_string(),
        },
        ("move", [id, x, y]) => {
            let x: f64 = x.parse().map_err(|_| format!("Bad x coordinate: {}", x))?;
            let y: f64 = y.parse().map_err(|_| format!("Bad y coordinate: {}", y))?;
            Command::Move {
                id: id.to_string(),
                position: Position::new(x, y),
            }
        }
        ("select", [id]) => Command::Select(id.to_string()),
        ("remove", [id]) => Command::Remove(id.to_string()),
        _ => return Err(format!("Usage: {}", USAGE)),
    };
    Ok(Some(command))
}

fn parse_agent(args: &str) -> AgentFormDraft {
    let mut fields = args.split('|').map(str::trim);
    let mut next = || fields.next().unwrap_or_default().to_string();
    let (name, role, goals, model) = (next(), next(), next(), next());
    let kind = next().parse().unwrap_or_default();
    AgentFormDraft {
        name,
        role,
        goals,
        model,
        kind,
    }
}

/// Input handler that manages the input buffer.
pub struct InputHandler {
    pub buffer: String,
    /// Cursor position in characters.
    pub cursor: usize,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
        }
    }

    fn byte_index(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    /// Handle a key event, returning an action.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                match parse_line(&text) {
                    Ok(Some(Command::Quit)) => InputAction::Quit,
                    Ok(Some(command)) => InputAction::Submit(command),
                    Ok(None) => InputAction::None,
                    Err(hint) => InputAction::Invalid(hint),
                }
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputAction::Quit
            }
            KeyCode::Char(c) => {
                let at = self.byte_index();
                self.buffer.insert(at, c);
                self.cursor += 1;
                InputAction::None
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index();
                    self.buffer.remove(at);
                }
                InputAction::None
            }
            KeyCode::Delete => {
                if self.cursor < self.char_len() {
                    let at = self.byte_index();
                    self.buffer.remove(at);
                }
                InputAction::None
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                InputAction::None
            }
            KeyCode::Right => {
                if self.cursor < self.char_len() {
                    self.cursor += 1;
                }
                InputAction::None
            }
            KeyCode::Home => {
                self.cursor = 0;
                InputAction::None
            }
            KeyCode::End => {
                self.cursor = self.char_len();
                InputAction::None
            }
            KeyCode::PageUp => InputAction::ScrollUp,
            KeyCode::PageDown => InputAction::ScrollDown,
            _ => InputAction::None,
        }
    }
}
