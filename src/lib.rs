// sandboxed shell for the browser: in-memory filesystem, built-in commands
// and a line editor that draws on whatever terminal widget the page provides
pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod input;
pub mod output;
pub mod prompt;
pub mod shell;
pub mod tokenizer;
pub mod vfs;

pub use command::{Command, CommandRegistry, CommandResult};
pub use config::ShellConfig;
pub use context::{CompletionContext, Environment, ExecutionContext};
pub use error::{CommandError, ConfigError, VfsError};
pub use output::{BufferedOutput, OutputSink, RecordingScreen, Screen};
pub use shell::{Shell, Step};
pub use vfs::Vfs;

use command::EXIT_SUCCESS;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// screen backed by the two js callbacks handed to the constructor
struct JsScreen {
    write: js_sys::Function,
    clear: js_sys::Function,
}

fn report(what: &str, err: &JsValue) {
    web_sys::console::error_2(&JsValue::from_str(what), err);
}

impl Screen for JsScreen {
    fn write(&mut self, data: &str) {
        if let Err(err) = self.write.call1(&JsValue::NULL, &JsValue::from_str(data)) {
            report("sandshell: write callback failed", &err);
        }
    }

    fn clear(&mut self) {
        if let Err(err) = self.clear.call0(&JsValue::NULL) {
            report("sandshell: clear callback failed", &err);
        }
    }
}

fn busy_error() -> JsValue {
    JsValue::from_str("shell is busy")
}

fn js_message(err: &JsValue) -> String {
    err.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| "command failed".to_string())
}

// js command: callback(args, cwd) may return text to print or a numeric
// exit status; a throw becomes the command's error
fn run_js_command(callback: &js_sys::Function, ctx: &mut ExecutionContext<'_>) -> CommandResult {
    let args: js_sys::Array = ctx.args.iter().map(|a| JsValue::from_str(a)).collect();
    let result = callback
        .call2(&JsValue::NULL, &args, &JsValue::from_str(&ctx.cwd))
        .map_err(|err| CommandError::failed(js_message(&err)))?;
    if let Some(text) = result.as_string() {
        ctx.out.print(&text);
        if !text.is_empty() && !text.ends_with('\n') {
            ctx.out.print("\n");
        }
        return Ok(EXIT_SUCCESS);
    }
    Ok(result.as_f64().map_or(EXIT_SUCCESS, |n| n as i32))
}

/// Browser handle on one session.
///
/// Input is gated by a busy flag: data arriving while an earlier chunk is
/// still being processed is dropped, not queued. The session itself is
/// only out of reach while a command runs, so env and filesystem reads
/// work from the command and exit callbacks. Clones share the session.
#[wasm_bindgen]
#[derive(Clone)]
pub struct WebShell {
    slot: Rc<RefCell<Option<Shell>>>,
    busy: Rc<Cell<bool>>,
    ended: Rc<Cell<bool>>,
    id: String,
    command_hooks: Rc<RefCell<Vec<js_sys::Function>>>,
    exit_hook: Rc<RefCell<Option<js_sys::Function>>>,
}

impl WebShell {
    fn with_shell<R>(&self, f: impl FnOnce(&Shell) -> R) -> Result<R, JsValue> {
        match self.slot.try_borrow().as_deref() {
            Ok(Some(shell)) => Ok(f(shell)),
            _ => Err(busy_error()),
        }
    }

    fn with_shell_mut<R>(&self, f: impl FnOnce(&mut Shell) -> R) -> Result<R, JsValue> {
        match self.slot.try_borrow_mut().as_deref_mut() {
            Ok(Some(shell)) => Ok(f(shell)),
            _ => Err(busy_error()),
        }
    }

    // hooks are copied out first so a callback may register more
    fn notify_command(&self, line: &str) {
        let hooks = self.command_hooks.borrow().clone();
        for hook in hooks {
            if let Err(err) = hook.call1(&JsValue::NULL, &JsValue::from_str(line)) {
                report("sandshell: command hook failed", &err);
            }
        }
    }

    fn notify_exit(&self) {
        self.ended.set(true);
        let hook = self.exit_hook.borrow_mut().take();
        if let Some(hook) = hook {
            if let Err(err) = hook.call0(&JsValue::NULL) {
                report("sandshell: exit hook failed", &err);
            }
        }
    }

    async fn process(&self, data: String) {
        let Ok(events) = self.with_shell_mut(|sh| sh.decode(&data)) else {
            return;
        };
        for event in events {
            let Ok(step) = self.with_shell_mut(|sh| sh.handle(event)) else {
                return;
            };
            match step {
                Step::Continue => {}
                Step::Run(line) => {
                    if !line.is_empty() {
                        self.notify_command(&line);
                    }
                    let taken = self.slot.borrow_mut().take();
                    let Some(mut shell) = taken else {
                        return;
                    };
                    shell.run(&line).await;
                    *self.slot.borrow_mut() = Some(shell);
                }
                Step::Exit => {
                    self.notify_exit();
                    return;
                }
            }
        }
    }
}

#[wasm_bindgen]
impl WebShell {
    /// `config` is an optional JSON document (see `ShellConfig`); `write`
    /// receives terminal output, `clear` wipes the display.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: Option<String>,
        write: js_sys::Function,
        clear: js_sys::Function,
    ) -> Result<WebShell, JsValue> {
        let config = match config {
            Some(json) => ShellConfig::from_json(&json),
            None => Ok(ShellConfig::default()),
        }
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let shell = Shell::new(config, Box::new(JsScreen { write, clear }))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WebShell {
            id: shell.session_id().to_string(),
            slot: Rc::new(RefCell::new(Some(shell))),
            busy: Rc::new(Cell::new(false)),
            ended: Rc::new(Cell::new(false)),
            command_hooks: Rc::new(RefCell::new(Vec::new())),
            exit_hook: Rc::new(RefCell::new(None)),
        })
    }

    pub fn start(&self) -> Result<(), JsValue> {
        self.with_shell_mut(Shell::start)
    }

    /// Raw terminal input, as delivered by the widget's data event.
    pub fn on_data(&self, data: String) {
        if self.busy.get() {
            tracing::trace!("input dropped while busy");
            return;
        }
        self.busy.set(true);
        let this = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            this.process(data).await;
            this.busy.set(false);
        });
    }

    #[wasm_bindgen(getter)]
    pub fn busy(&self) -> bool {
        self.busy.get()
    }

    #[wasm_bindgen(getter)]
    pub fn ended(&self) -> bool {
        self.ended.get()
    }

    pub fn session_id(&self) -> String {
        self.id.clone()
    }

    pub fn resize(&self, columns: u16, rows: u16) -> Result<(), JsValue> {
        self.with_shell_mut(|sh| sh.resize(columns, rows))
    }

    pub fn set_env(&self, name: &str, value: &str) -> Result<(), JsValue> {
        self.with_shell_mut(|sh| sh.set_env(name, value))
    }

    pub fn get_env(&self, name: &str) -> Result<Option<String>, JsValue> {
        self.with_shell(|sh| sh.env(name).map(str::to_string))
    }

    pub fn read_file(&self, path: &str) -> Result<Option<String>, JsValue> {
        self.with_shell(|sh| sh.vfs().read_file(path).map(str::to_string))
    }

    pub fn exists(&self, path: &str) -> Result<bool, JsValue> {
        self.with_shell(|sh| sh.vfs().exists(path))
    }

    /// Metadata object, or `null` when nothing is at `path`.
    pub fn stat(&self, path: &str) -> Result<JsValue, JsValue> {
        match self.with_shell(|sh| sh.vfs().stat(path))? {
            Some(meta) => serde_wasm_bindgen::to_value(&meta).map_err(JsValue::from),
            None => Ok(JsValue::NULL),
        }
    }

    /// `callback(line)` runs for every non-empty line before it executes.
    pub fn on_command(&self, callback: js_sys::Function) {
        self.command_hooks.borrow_mut().push(callback);
    }

    /// `callback()` runs once, when the user types `exit`.
    pub fn on_exit(&self, callback: js_sys::Function) {
        *self.exit_hook.borrow_mut() = Some(callback);
    }

    /// Adds a command. `callback(args, cwd)` returns text to print or a
    /// numeric exit status; throwing reports an error with status 1.
    pub fn register(&self, name: &str, description: &str, callback: js_sys::Function) -> Result<(), JsValue> {
        self.with_shell_mut(|sh| {
            sh.register_fn(name, description, move |ctx| run_js_command(&callback, ctx))
        })
    }
}
