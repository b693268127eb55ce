
use std::cell::RefCell;
use std::rc::Rc;

/// Display collaborator: the terminal widget the shell draws on.
pub trait Screen {
    fn write(&mut self, data: &str);

    fn clear(&mut self);
}

/// What a command handler writes to.
pub trait OutputSink {
    fn print(&mut self, text: &str);

    fn println(&mut self, line: &str) {
        self.print(line);
        self.print("\n");
    }

    // red on a terminal
    fn eprintln(&mut self, line: &str);

    fn clear(&mut self);
}

const ERROR_STYLE: &str = "\x1b[31m";
const RESET_STYLE: &str = "\x1b[0m";

/// Forwards command output to a [`Screen`], turning `\n` into `\r\n` and
/// coloring the error stream.
pub struct ScreenSink<'a> {
    screen: &'a mut dyn Screen,
    at_line_start: bool,
}

impl<'a> ScreenSink<'a> {
    pub fn new(screen: &'a mut dyn Screen) -> Self {
        Self { screen, at_line_start: true }
    }

    pub fn at_line_start(&self) -> bool {
        self.at_line_start
    }
}

impl OutputSink for ScreenSink<'_> {
    fn print(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.screen.write(&text.replace('\n', "\r\n"));
        self.at_line_start = text.ends_with('\n');
    }

    fn eprintln(&mut self, line: &str) {
        if !self.at_line_start {
            self.screen.write("\r\n");
        }
        for part in line.split('\n') {
            self.screen.write(&format!("{}{}{}\r\n", ERROR_STYLE, part, RESET_STYLE));
        }
        self.at_line_start = true;
    }

    fn clear(&mut self) {
        self.screen.clear();
        self.at_line_start = true;
    }
}

/// Captures output in memory. Used by tests and by callers that want to
/// inspect a command's output instead of drawing it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferedOutput {
    pub stdout: String,
    pub stderr: Vec<String>,
    pub clears: usize,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}

impl OutputSink for BufferedOutput {
    fn print(&mut self, text: &str) {
        self.stdout.push_str(text);
    }

    fn eprintln(&mut self, line: &str) {
        self.stderr.push(line.to_string());
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

/// Screen that records everything written; handy in tests and for
/// headless sessions.
#[derive(Debug, Default, Clone)]
pub struct RecordingScreen {
    pub written: String,
    pub clears: usize,
}

impl RecordingScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Written text with escape sequences and carriage returns removed.
    pub fn plain(&self) -> String {
        let mut out = String::new();
        let mut chars = self.written.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\x1b' => {
                    if chars.peek() == Some(&'[') {
                        chars.next();
                        for c in chars.by_ref() {
                            if c.is_ascii_alphabetic() || c == '~' {
                                break;
                            }
                        }
                    }
                }
                '\r' => {}
                c => out.push(c),
            }
        }
        out
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.written)
    }
}

impl Screen for RecordingScreen {
    fn write(&mut self, data: &str) {
        self.written.push_str(data);
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

/// Lets a caller keep a handle on a screen it gave to a session.
impl<S: Screen> Screen for Rc<RefCell<S>> {
    fn write(&mut self, data: &str) {
        self.borrow_mut().write(data);
    }

    fn clear(&mut self) {
        self.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_sink_translates_newlines() {
        let mut screen = RecordingScreen::new();
        let mut sink = ScreenSink::new(&mut screen);
        sink.println("a\nb");
        assert!(sink.at_line_start());
        sink.print("hi");
        assert!(!sink.at_line_start());
        assert_eq!(screen.written, "a\r\nb\r\nhi");
    }

    #[test]
    fn test_error_lines_are_colored_and_start_on_new_line() {
        let mut screen = RecordingScreen::new();
        let mut sink = ScreenSink::new(&mut screen);
        sink.print("partial");
        sink.eprintln("boom");
        assert_eq!(screen.written, "partial\r\n\x1b[31mboom\x1b[0m\r\n");
        assert_eq!(screen.plain(), "partial\nboom\n");
    }

    #[test]
    fn test_buffered_output() {
        let mut out = BufferedOutput::new();
        out.println("one");
        out.print("two");
        out.eprintln("bad");
        out.clear();
        assert_eq!(out.lines(), vec!["one", "two"]);
        assert_eq!(out.stderr, vec!["bad"]);
        assert_eq!(out.clears, 1);
    }
}
