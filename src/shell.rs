
use crate::command::{Command, CommandRegistry, CommandResult};
use crate::config::ShellConfig;
use crate::context::ExecutionContext;
use crate::dispatch::Dispatcher;
use crate::editor::{EditorAction, LineEditor};
use crate::error::ConfigError;
use crate::input::{InputDecoder, InputEvent};
use crate::output::{Screen, ScreenSink};
use crate::prompt::{Prompt, PromptInfo};
use crate::vfs::Vfs;
use tracing::{debug, info, trace};
use uuid::Uuid;

pub const DEFAULT_COLUMNS: u16 = 80;
pub const DEFAULT_ROWS: u16 = 24;

pub type ExitHook = Box<dyn FnOnce()>;

/// What the session needs after one input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// A committed line, trimmed, waiting for [`Shell::run`].
    Run(String),
    Exit,
}

pub struct Shell {
    id: Uuid,
    dispatcher: Dispatcher,
    editor: LineEditor,
    decoder: InputDecoder,
    prompt: Prompt,
    screen: Box<dyn Screen>,
    banner: Option<String>,
    columns: u16,
    rows: u16,
    exit_hook: Option<ExitHook>,
    ended: bool,
}

impl Shell {
    pub fn new(config: ShellConfig, screen: Box<dyn Screen>) -> Result<Self, ConfigError> {
        config.validate()?;
        let vfs = config.build_vfs()?;
        let dispatcher = Dispatcher::new(CommandRegistry::default_commands(), vfs, config.environment());
        let prompt = config.prompt.as_deref().map(Prompt::template).unwrap_or_default();
        let id = Uuid::new_v4();
        info!(session = %id, user = %config.user, "session created");
        Ok(Self {
            id,
            dispatcher,
            editor: LineEditor::new(),
            decoder: InputDecoder::new(),
            prompt,
            screen,
            banner: config.banner,
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            exit_hook: None,
            ended: false,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    /// Writes the banner, if any, and the first prompt.
    pub fn start(&mut self) {
        if let Some(banner) = &self.banner {
            let mut text = banner.replace('\n', "\r\n");
            if !text.ends_with("\r\n") {
                text.push_str("\r\n");
            }
            self.screen.write(&text);
        }
        let prompt = self.render_prompt();
        self.editor.redraw(&prompt, self.screen.as_mut());
        debug!(session = %self.id, "session started");
    }

    /// Processes raw terminal input. A submitted line runs to completion
    /// before the next event is looked at, so keys pasted after a newline
    /// apply to the following prompt.
    pub async fn feed(&mut self, data: &str) {
        for event in self.decode(data) {
            match self.handle(event) {
                Step::Continue => {}
                Step::Run(line) => self.run(&line).await,
                Step::Exit => break,
            }
        }
    }

    /// First half of [`Shell::feed`]: raw data to editor events. Nothing
    /// comes back once the session has ended.
    pub fn decode(&mut self, data: &str) -> Vec<InputEvent> {
        if self.ended {
            trace!(session = %self.id, "input after exit dropped");
            return Vec::new();
        }
        self.decoder.decode(data)
    }

    /// Applies one event to the editor. Completion is resolved here; a
    /// committed line is handed back for [`Shell::run`].
    pub fn handle(&mut self, event: InputEvent) -> Step {
        if self.ended {
            return Step::Exit;
        }
        let prompt = self.render_prompt();
        match self.editor.handle(event, &prompt, self.screen.as_mut()) {
            EditorAction::None => Step::Continue,
            EditorAction::Complete => {
                let candidates = self.dispatcher.complete(&self.editor.buffer());
                debug!(session = %self.id, count = candidates.len(), "completion");
                self.editor.complete(&candidates, &prompt, self.screen.as_mut());
                Step::Continue
            }
            EditorAction::Submit(line) => Step::Run(line),
            EditorAction::Exit => {
                self.end();
                Step::Exit
            }
        }
    }

    /// Runs a submitted line and gives the editor its prompt back.
    pub async fn run(&mut self, line: &str) {
        let mut sink = ScreenSink::new(self.screen.as_mut());
        let status = self
            .dispatcher
            .dispatch(line, &mut sink, self.editor.history(), self.columns)
            .await;
        if !sink.at_line_start() {
            self.screen.write("\r\n");
        }
        debug!(session = %self.id, status, "line finished");
        let prompt = self.render_prompt();
        self.editor.finish(&prompt, self.screen.as_mut());
    }

    fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        info!(session = %self.id, "session ended");
        if let Some(hook) = self.exit_hook.take() {
            hook();
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.columns = columns.max(1);
        self.rows = rows.max(1);
        trace!(session = %self.id, columns, rows, "resize");
    }

    pub fn size(&self) -> (u16, u16) {
        (self.columns, self.rows)
    }

    pub fn render_prompt(&self) -> String {
        self.prompt.render(self.dispatcher.env(), self.dispatcher.vfs().cwd())
    }

    pub fn set_prompt(&mut self, prompt: Prompt) {
        self.prompt = prompt;
    }

    /// Replaces prompt templating with a function.
    pub fn set_prompt_fn<F>(&mut self, f: F)
    where
        F: Fn(&PromptInfo) -> String + 'static,
    {
        self.prompt = Prompt::custom(f);
    }

    /// Called once, when `exit` is entered.
    pub fn on_exit<F>(&mut self, hook: F)
    where
        F: FnOnce() + 'static,
    {
        self.exit_hook = Some(Box::new(hook));
    }

    /// Observer for every non-empty line, before it runs.
    pub fn on_command<F>(&mut self, hook: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.dispatcher.on_command(Box::new(hook));
    }

    pub fn register_command(&mut self, name: &str, command: Box<dyn Command>) {
        self.dispatcher.registry_mut().register_command(name, command);
    }

    pub fn register_fn<F>(&mut self, name: &str, description: &str, handler: F)
    where
        F: Fn(&mut ExecutionContext<'_>) -> CommandResult + 'static,
    {
        self.dispatcher.registry_mut().register_fn(name, description, handler);
    }

    pub fn set_env(&mut self, name: &str, value: &str) {
        self.dispatcher.set_var(name, value);
    }

    pub fn env(&self, name: &str) -> Option<&str> {
        self.dispatcher.var(name)
    }

    pub fn vfs(&self) -> &Vfs {
        self.dispatcher.vfs()
    }

    pub fn vfs_mut(&mut self) -> &mut Vfs {
        self.dispatcher.vfs_mut()
    }

    pub fn editor(&self) -> &LineEditor {
        &self.editor
    }

    pub fn last_status(&self) -> i32 {
        self.dispatcher.last_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingScreen;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn shell() -> (Shell, Rc<RefCell<RecordingScreen>>) {
        let screen = Rc::new(RefCell::new(RecordingScreen::new()));
        let shell = Shell::new(ShellConfig::default(), Box::new(screen.clone())).unwrap();
        (shell, screen)
    }

    #[test]
    fn test_start_draws_banner_and_prompt() {
        let screen = Rc::new(RefCell::new(RecordingScreen::new()));
        let config = ShellConfig { banner: Some("hello\nthere".into()), ..ShellConfig::default() };
        let mut sh = Shell::new(config, Box::new(screen.clone())).unwrap();
        sh.start();
        assert_eq!(screen.borrow().plain(), "hello\nthere\nguest@sandbox:~$ ");
    }

    #[test]
    fn test_output_then_fresh_prompt() {
        let (mut sh, screen) = shell();
        sh.start();
        block_on(sh.feed("echo -n hi\r"));
        let plain = screen.borrow().plain();
        assert!(plain.ends_with("echo -n hi\nhi\nguest@sandbox:~$ "), "{:?}", plain);
        assert!(!sh.editor().is_busy());
        assert_eq!(sh.last_status(), 0);
    }

    #[test]
    fn test_prompt_follows_cwd() {
        let (mut sh, screen) = shell();
        sh.start();
        block_on(sh.feed("cd /tmp\r"));
        assert!(screen.borrow().plain().ends_with("guest@sandbox:tmp$ "));
    }

    #[test]
    fn test_exit_fires_hook_once_and_stops_input() {
        let (mut sh, _screen) = shell();
        let fired = Rc::new(RefCell::new(0));
        let counter = fired.clone();
        sh.on_exit(move || *counter.borrow_mut() += 1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        sh.on_command(move |line| sink.borrow_mut().push(line.to_string()));
        sh.start();
        block_on(sh.feed("exit\rmkdir after\r"));
        assert!(sh.is_ended());
        block_on(sh.feed("exit\r"));
        assert_eq!(*fired.borrow(), 1);
        assert!(seen.borrow().is_empty());
        assert!(!sh.vfs().exists("after"));
    }

    #[test]
    fn test_tab_completion_round_trip() {
        let (mut sh, screen) = shell();
        sh.vfs_mut().mkdir("/home/guest/projects").unwrap();
        sh.start();
        block_on(sh.feed("mkd\t"));
        assert_eq!(sh.editor().buffer(), "mkdir ");
        block_on(sh.feed("\x15cd p\t"));
        assert_eq!(sh.editor().buffer(), "cd projects/");
        block_on(sh.feed("\r"));
        assert_eq!(sh.vfs().cwd(), "/home/guest/projects");
        block_on(sh.feed("c\t"));
        assert!(screen.borrow().plain().contains("\ncat  cd  clear  cp\n"));
    }

    #[test]
    fn test_pasted_lines_run_in_order() {
        let (mut sh, screen) = shell();
        sh.start();
        block_on(sh.feed("mkdir a\rcd a\rtouch b\rpw"));
        assert!(sh.vfs().exists("/home/guest/a/b"));
        assert_eq!(sh.editor().buffer(), "pw");
        assert!(!sh.editor().is_busy());
        assert_eq!(sh.editor().history(), ["mkdir a", "cd a", "touch b"]);
        assert!(screen.borrow().plain().ends_with("guest@sandbox:a$ pw"));
    }

    #[test]
    fn test_step_by_step() {
        let (mut sh, _screen) = shell();
        let events = sh.decode("ls\r");
        assert_eq!(events.len(), 2);
        let mut steps = events.into_iter().map(|e| sh.handle(e)).collect::<Vec<_>>();
        assert_eq!(steps.pop(), Some(Step::Run("ls".into())));
        assert!(sh.editor().is_busy());
        block_on(sh.run("ls"));
        assert!(!sh.editor().is_busy());
        let exit = sh.decode("exit\r").into_iter().map(|e| sh.handle(e)).last();
        assert_eq!(exit, Some(Step::Exit));
        assert!(sh.is_ended());
        assert!(sh.decode("ls\r").is_empty());
    }

    #[test]
    fn test_resize_clamps() {
        let (mut sh, _screen) = shell();
        sh.resize(0, 0);
        assert_eq!(sh.size(), (1, 1));
        sh.resize(120, 40);
        assert_eq!(sh.size(), (120, 40));
    }

    #[test]
    fn test_grading_hooks() {
        let (mut sh, screen) = shell();
        sh.set_env("TASK", "3");
        sh.register_fn("check", "report the task", |ctx| {
            let task = ctx.var("TASK").unwrap_or("none").to_string();
            ctx.println(&format!("task {}", task));
            Ok(0)
        });
        sh.start();
        block_on(sh.feed("check\r"));
        assert!(screen.borrow().plain().contains("check\ntask 3\n"));
        assert_eq!(sh.env("TASK"), Some("3"));
    }

    #[test]
    fn test_custom_prompt() {
        let (mut sh, screen) = shell();
        sh.set_prompt_fn(|info| format!("[{}] ", info.path));
        sh.start();
        assert_eq!(screen.borrow().plain(), "[~] ");
    }
}
