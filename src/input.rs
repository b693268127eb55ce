
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A run of printable text.
    Text(String),
    Commit,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    ClearScreen,
    ClearLine,
    Tab,
    Interrupt,
}

const ESC: char = '\x1b';

/// Stateful decoder: an escape sequence cut off at the end of one chunk is
/// completed by the next.
#[derive(Debug, Default)]
pub struct InputDecoder {
    pending: String,
}

enum Seq {
    Event(InputEvent),
    Ignored,
    Incomplete,
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, data: &str) -> Vec<InputEvent> {
        let mut input = std::mem::take(&mut self.pending);
        input.push_str(data);

        let mut events = Vec::new();
        let mut text = String::new();
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            let event = match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    Some(InputEvent::Commit)
                }
                '\n' => Some(InputEvent::Commit),
                '\x7f' | '\x08' => Some(InputEvent::Backspace),
                '\t' => Some(InputEvent::Tab),
                '\x01' => Some(InputEvent::Home),
                '\x05' => Some(InputEvent::End),
                '\x03' => Some(InputEvent::Interrupt),
                '\x0c' => Some(InputEvent::ClearScreen),
                '\x15' => Some(InputEvent::ClearLine),
                ESC => {
                    let rest: String = chars.clone().collect();
                    match escape_sequence(&mut chars) {
                        Seq::Event(e) => Some(e),
                        Seq::Ignored => None,
                        Seq::Incomplete => {
                            self.pending.push(ESC);
                            self.pending.push_str(&rest);
                            break;
                        }
                    }
                }
                c if c.is_control() => None,
                c => {
                    text.push(c);
                    continue;
                }
            };
            if !text.is_empty() {
                events.push(InputEvent::Text(std::mem::take(&mut text)));
            }
            if let Some(e) = event {
                events.push(e);
            }
        }
        if !text.is_empty() {
            events.push(InputEvent::Text(text));
        }
        events
    }
}

/// Parses what follows an ESC: CSI (`ESC [`) and SS3 (`ESC O`) sequences.
/// Only a sequence whose introducer has arrived is held for the next chunk;
/// an ESC at the very end is the Escape key on its own.
fn escape_sequence(chars: &mut Peekable<Chars<'_>>) -> Seq {
    match chars.next() {
        None => Seq::Ignored,
        Some('[') => {
            let mut params = String::new();
            loop {
                match chars.next() {
                    None => return Seq::Incomplete,
                    Some(c) if c.is_ascii_digit() || c == ';' => params.push(c),
                    Some(final_byte) => return csi(&params, final_byte),
                }
            }
        }
        Some('O') => match chars.next() {
            None => Seq::Incomplete,
            Some('H') => Seq::Event(InputEvent::Home),
            Some('F') => Seq::Event(InputEvent::End),
            Some('A') => Seq::Event(InputEvent::Up),
            Some('B') => Seq::Event(InputEvent::Down),
            Some('C') => Seq::Event(InputEvent::Right),
            Some('D') => Seq::Event(InputEvent::Left),
            Some(_) => Seq::Ignored,
        },
        Some(_) => Seq::Ignored,
    }
}

fn csi(params: &str, final_byte: char) -> Seq {
    let event = match (params, final_byte) {
        (_, 'A') => InputEvent::Up,
        (_, 'B') => InputEvent::Down,
        (_, 'C') => InputEvent::Right,
        (_, 'D') => InputEvent::Left,
        (_, 'H') | ("1", '~') | ("7", '~') => InputEvent::Home,
        (_, 'F') | ("4", '~') | ("8", '~') => InputEvent::End,
        ("3", '~') => InputEvent::Delete,
        _ => return Seq::Ignored,
    };
    Seq::Event(event)
}
