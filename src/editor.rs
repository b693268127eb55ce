// line editor. never runs anything itself: a submit hands the line back and
// the editor drops input until finish() is called

use crate::input::InputEvent;
use crate::output::Screen;
use crate::tokenizer::split_last_word;
use tracing::trace;

/// True for characters drawn two columns wide: the CJK unified ideograph
/// blocks, their extensions and the compatibility ideographs.
pub fn is_wide(c: char) -> bool {
    matches!(
        c as u32,
        0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2EBEF
            | 0x2F800..=0x2FA1F
            | 0x30000..=0x3134F
    )
}

pub fn char_width(c: char) -> usize {
    if is_wide(c) {
        2
    } else {
        1
    }
}

pub fn display_width<'a>(chars: impl IntoIterator<Item = &'a char>) -> usize {
    chars.into_iter().map(|c| char_width(*c)).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Idle,
    /// A submitted line is running; input is dropped.
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    None,
    /// Run this (trimmed) line. The editor is now busy.
    Submit(String),
    Exit,
    /// Completions are wanted for [`LineEditor::buffer`].
    Complete,
}

#[derive(Debug)]
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
    history: Vec<String>,
    browse: Option<usize>,
    mode: EditorMode,
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineEditor {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
            history: Vec::new(),
            browse: None,
            mode: EditorMode::Idle,
        }
    }

    pub fn buffer(&self) -> String {
        self.buffer.iter().collect()
    }

    // in chars, not bytes
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn browsing(&self) -> Option<usize> {
        self.browse
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn is_busy(&self) -> bool {
        self.mode == EditorMode::Busy
    }

    pub fn handle(&mut self, event: InputEvent, prompt: &str, screen: &mut dyn Screen) -> EditorAction {
        if self.is_busy() {
            trace!(?event, "input dropped while busy");
            return EditorAction::None;
        }
        match event {
            InputEvent::Text(text) => {
                let inserted: Vec<char> = text.chars().collect();
                let n = inserted.len();
                self.buffer.splice(self.cursor..self.cursor, inserted);
                self.cursor += n;
                self.redraw(prompt, screen);
            }
            InputEvent::Commit => return self.commit(screen),
            InputEvent::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.buffer.remove(self.cursor);
                    self.redraw(prompt, screen);
                }
            }
            InputEvent::Delete => {
                if self.cursor < self.buffer.len() {
                    self.buffer.remove(self.cursor);
                    self.redraw(prompt, screen);
                }
            }
            InputEvent::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    screen.write(&format!("\x1b[{}D", char_width(self.buffer[self.cursor])));
                }
            }
            InputEvent::Right => {
                if self.cursor < self.buffer.len() {
                    screen.write(&format!("\x1b[{}C", char_width(self.buffer[self.cursor])));
                    self.cursor += 1;
                }
            }
            InputEvent::Up => {
                let target = match self.browse {
                    None if !self.history.is_empty() => Some(self.history.len() - 1),
                    Some(i) if i > 0 => Some(i - 1),
                    _ => None,
                };
                if let Some(i) = target {
                    self.browse = Some(i);
                    let entry = self.history[i].clone();
                    self.replace_buffer(&entry);
                    self.redraw(prompt, screen);
                }
            }
            InputEvent::Down => {
                if let Some(i) = self.browse {
                    if i + 1 < self.history.len() {
                        self.browse = Some(i + 1);
                        let entry = self.history[i + 1].clone();
                        self.replace_buffer(&entry);
                    } else {
                        self.browse = None;
                        self.replace_buffer("");
                    }
                    self.redraw(prompt, screen);
                }
            }
            InputEvent::Home => {
                self.cursor = 0;
                self.redraw(prompt, screen);
            }
            InputEvent::End => {
                self.cursor = self.buffer.len();
                self.redraw(prompt, screen);
            }
            InputEvent::ClearScreen => {
                screen.clear();
                self.redraw(prompt, screen);
            }
            InputEvent::ClearLine => {
                self.replace_buffer("");
                self.redraw(prompt, screen);
            }
            InputEvent::Tab => return EditorAction::Complete,
            InputEvent::Interrupt => {
                screen.write("^C\r\n");
                self.replace_buffer("");
                self.browse = None;
                self.redraw(prompt, screen);
            }
        }
        EditorAction::None
    }

    fn commit(&mut self, screen: &mut dyn Screen) -> EditorAction {
        let line = self.buffer();
        if !line.is_empty() {
            self.history.push(line.clone());
            self.browse = None;
        }
        screen.write("\r\n");
        let trimmed = line.trim();
        if trimmed == "exit" {
            self.replace_buffer("");
            return EditorAction::Exit;
        }
        self.mode = EditorMode::Busy;
        EditorAction::Submit(trimmed.to_string())
    }

    /// Back to accepting input after a submitted line has run: clears the
    /// buffer and draws a fresh prompt.
    pub fn finish(&mut self, prompt: &str, screen: &mut dyn Screen) {
        self.mode = EditorMode::Idle;
        self.replace_buffer("");
        self.redraw(prompt, screen);
    }

    pub fn begin(&mut self) {
        self.mode = EditorMode::Busy;
    }

    /// Applies completion candidates for the current buffer. One candidate
    /// replaces the word being typed (plus a space after a command name);
    /// several extend it to their common prefix, or get listed when there
    /// is nothing to extend.
    pub fn complete(&mut self, candidates: &[String], prompt: &str, screen: &mut dyn Screen) {
        let current = self.buffer();
        let (head, word) = split_last_word(&current);
        let command_name = head.trim().is_empty();
        match candidates {
            [] => {}
            [only] => {
                let space = if command_name { " " } else { "" };
                let replaced = format!("{}{}{}", head, only, space);
                self.replace_buffer(&replaced);
                self.redraw(prompt, screen);
            }
            many => {
                let prefix = common_prefix(many);
                if prefix.chars().count() > word.chars().count() {
                    let replaced = format!("{}{}", head, prefix);
                    self.replace_buffer(&replaced);
                } else {
                    screen.write(&format!("\r\n{}\r\n", many.join("  ")));
                }
                self.redraw(prompt, screen);
            }
        }
    }

    fn replace_buffer(&mut self, text: &str) {
        self.buffer = text.chars().collect();
        self.cursor = self.buffer.len();
    }

    // rewrite the whole line then walk the cursor back
    pub fn redraw(&self, prompt: &str, screen: &mut dyn Screen) {
        let mut out = format!("\r\x1b[K{}", prompt);
        out.extend(self.buffer.iter());
        let back = display_width(&self.buffer[self.cursor..]);
        if back > 0 {
            out.push_str(&format!("\x1b[{}D", back));
        }
        screen.write(&out);
    }
}

fn common_prefix(words: &[String]) -> String {
    let Some((first, rest)) = words.split_first() else {
        return String::new();
    };
    let mut len = first.chars().count();
    for word in rest {
        len = first.chars().zip(word.chars()).take(len).take_while(|(a, b)| a == b).count();
    }
    first.chars().take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingScreen;

    const PROMPT: &str = "$ ";

    fn feed(ed: &mut LineEditor, screen: &mut RecordingScreen, events: Vec<InputEvent>) -> Vec<EditorAction> {
        events.into_iter().map(|e| ed.handle(e, PROMPT, screen)).collect()
    }

    fn text(s: &str) -> InputEvent {
        InputEvent::Text(s.to_string())
    }

    #[test]
    fn test_home_then_insert() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text("ls"), InputEvent::Home, text("x")]);
        assert_eq!(ed.buffer(), "xls");
        assert_eq!(ed.cursor(), 1);
        assert!(screen.written.ends_with("\r\x1b[K$ xls\x1b[2D"));
    }

    #[test]
    fn test_up_with_empty_history_is_noop() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text("pw"), InputEvent::Up]);
        assert_eq!(ed.buffer(), "pw");
        assert_eq!(ed.browsing(), None);
    }

    #[test]
    fn test_commit_then_up_restores_line() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        let actions = feed(&mut ed, &mut screen, vec![text("  echo hi "), InputEvent::Commit]);
        assert_eq!(actions[1], EditorAction::Submit("echo hi".into()));
        assert!(ed.is_busy());
        ed.finish(PROMPT, &mut screen);
        assert_eq!(ed.buffer(), "");
        feed(&mut ed, &mut screen, vec![InputEvent::Up]);
        assert_eq!(ed.buffer(), "  echo hi ");
        assert_eq!(ed.cursor(), 10);
    }

    #[test]
    fn test_history_walk() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        for line in ["one", "two", "three"] {
            feed(&mut ed, &mut screen, vec![text(line), InputEvent::Commit]);
            ed.finish(PROMPT, &mut screen);
        }
        feed(&mut ed, &mut screen, vec![InputEvent::Up, InputEvent::Up, InputEvent::Up, InputEvent::Up]);
        assert_eq!(ed.buffer(), "one");
        assert_eq!(ed.browsing(), Some(0));
        feed(&mut ed, &mut screen, vec![InputEvent::Down]);
        assert_eq!(ed.buffer(), "two");
        feed(&mut ed, &mut screen, vec![InputEvent::Down, InputEvent::Down]);
        assert_eq!(ed.buffer(), "");
        assert_eq!(ed.browsing(), None);
        feed(&mut ed, &mut screen, vec![InputEvent::Down]);
        assert_eq!(ed.buffer(), "");
    }

    #[test]
    fn test_empty_commit_skips_history() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        let actions = feed(&mut ed, &mut screen, vec![InputEvent::Commit]);
        assert_eq!(actions, vec![EditorAction::Submit(String::new())]);
        assert!(ed.history().is_empty());
    }

    #[test]
    fn test_busy_drops_input() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text("sleep"), InputEvent::Commit]);
        screen.take();
        let actions = feed(&mut ed, &mut screen, vec![text("ls"), InputEvent::Commit, InputEvent::Tab]);
        assert!(actions.iter().all(|a| *a == EditorAction::None));
        assert!(screen.written.is_empty());
        assert_eq!(ed.history(), &["sleep".to_string()]);
        ed.finish(PROMPT, &mut screen);
        feed(&mut ed, &mut screen, vec![text("ls")]);
        assert_eq!(ed.buffer(), "ls");
    }

    #[test]
    fn test_exit_is_not_submitted() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        let actions = feed(&mut ed, &mut screen, vec![text("exit"), InputEvent::Commit]);
        assert_eq!(actions[1], EditorAction::Exit);
        assert!(!ed.is_busy());
        assert_eq!(ed.history(), &["exit".to_string()]);
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text("abcd"), InputEvent::Left, InputEvent::Left, InputEvent::Backspace]);
        assert_eq!(ed.buffer(), "acd");
        assert_eq!(ed.cursor(), 1);
        feed(&mut ed, &mut screen, vec![InputEvent::Delete]);
        assert_eq!(ed.buffer(), "ad");
        assert_eq!(ed.cursor(), 1);
        feed(&mut ed, &mut screen, vec![InputEvent::End, InputEvent::Delete, InputEvent::Home, InputEvent::Backspace]);
        assert_eq!(ed.buffer(), "ad");
        assert_eq!(ed.cursor(), 0);
    }

    #[test]
    fn test_wide_characters_move_two_columns() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text("a你好")]);
        assert_eq!(ed.cursor(), 3);
        screen.take();
        feed(&mut ed, &mut screen, vec![InputEvent::Left]);
        assert_eq!(screen.take(), "\x1b[2D");
        feed(&mut ed, &mut screen, vec![InputEvent::Left, InputEvent::Left]);
        assert_eq!(screen.take(), "\x1b[2D\x1b[1D");
        feed(&mut ed, &mut screen, vec![InputEvent::Left]);
        assert_eq!(screen.take(), "");
        feed(&mut ed, &mut screen, vec![InputEvent::Right]);
        assert_eq!(screen.take(), "\x1b[1C");
        feed(&mut ed, &mut screen, vec![text("x")]);
        assert_eq!(screen.take(), "\r\x1b[K$ ax你好\x1b[4D");
    }

    fn candidates(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_complete_command_name_after_leading_space() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text(" mkd")]);
        ed.complete(&candidates(&["mkdir"]), PROMPT, &mut screen);
        assert_eq!(ed.buffer(), " mkdir ");
        feed(&mut ed, &mut screen, vec![text("my\\ d")]);
        ed.complete(&candidates(&["my\\ dir/"]), PROMPT, &mut screen);
        assert_eq!(ed.buffer(), " mkdir my\\ dir/");
        assert_eq!(ed.cursor(), 15);
    }

    #[test]
    fn test_complete_extends_to_common_prefix() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text("cd p")]);
        screen.take();
        ed.complete(&candidates(&["projects/", "protos/"]), PROMPT, &mut screen);
        assert_eq!(ed.buffer(), "cd pro");
        assert!(!screen.take().contains("projects/"));
        ed.complete(&candidates(&["projects/", "protos/"]), PROMPT, &mut screen);
        assert_eq!(ed.buffer(), "cd pro");
        assert!(screen.take().contains("\r\nprojects/  protos/\r\n"));
    }

    #[test]
    fn test_width_helpers() {
        assert!(is_wide('中'));
        assert!(is_wide('\u{3400}'));
        assert!(is_wide('\u{F900}'));
        assert!(!is_wide('a'));
        assert!(!is_wide('é'));
        assert_eq!(display_width(&['a', '中', 'b']), 4);
    }

    #[test]
    fn test_clear_controls() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text("abc"), InputEvent::ClearScreen]);
        assert_eq!(screen.clears, 1);
        assert_eq!(ed.buffer(), "abc");
        feed(&mut ed, &mut screen, vec![InputEvent::ClearLine]);
        assert_eq!(ed.buffer(), "");
        assert_eq!(ed.cursor(), 0);
    }

    #[test]
    fn test_interrupt_discards_line() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text("half typed"), InputEvent::Interrupt]);
        assert_eq!(ed.buffer(), "");
        assert!(ed.history().is_empty());
        assert!(screen.plain().contains("half typed^C\n$ "));
    }

    #[test]
    fn test_completion_application() {
        let mut ed = LineEditor::new();
        let mut screen = RecordingScreen::new();
        feed(&mut ed, &mut screen, vec![text("mk")]);
        ed.complete(&["mkdir".to_string()], PROMPT, &mut screen);
        assert_eq!(ed.buffer(), "mkdir ");
        feed(&mut ed, &mut screen, vec![text("pro")]);
        ed.complete(&["projects/".to_string()], PROMPT, &mut screen);
        assert_eq!(ed.buffer(), "mkdir projects/");
        ed.complete(&[], PROMPT, &mut screen);
        assert_eq!(ed.buffer(), "mkdir projects/");
        screen.take();
        ed.complete(&["a.txt".to_string(), "b.txt".to_string()], PROMPT, &mut screen);
        assert_eq!(ed.buffer(), "mkdir projects/");
        assert_eq!(screen.plain(), "\na.txt  b.txt\n$ mkdir projects/");
    }
}
