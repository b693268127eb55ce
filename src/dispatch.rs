
use crate::command::{CommandRegistry, EXIT_FAILURE, EXIT_SUCCESS, EXIT_UNKNOWN_COMMAND};
use crate::context::{CompletionContext, Environment, ExecutionContext};
use crate::output::OutputSink;
use crate::tokenizer::{self, ParsedLine};
use crate::vfs::Vfs;
use futures::FutureExt;
use regex::Regex;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Observer called with every non-empty line before it runs.
pub type CommandHook = Box<dyn FnMut(&str)>;

fn one_shot_assignment() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)=(\S*)\s+(\S.*)$").ok())
        .as_ref()
}

fn assignment() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)=(\S*)$").ok())
        .as_ref()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "command panicked".to_string()
    }
}

/// Session state the dispatcher executes against: command registry,
/// filesystem and environment.
pub struct Dispatcher {
    registry: CommandRegistry,
    vfs: Vfs,
    env: Environment,
    hooks: Vec<CommandHook>,
    last_status: i32,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, vfs: Vfs, env: Environment) -> Self {
        Self { registry, vfs, env, hooks: Vec::new(), last_status: EXIT_SUCCESS }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn vfs_mut(&mut self) -> &mut Vfs {
        &mut self.vfs
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        self.env.insert(name.to_string(), value.to_string());
    }

    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    pub fn on_command(&mut self, hook: CommandHook) {
        self.hooks.push(hook);
    }

    /// Runs one line and returns its exit status. Handler errors and panics
    /// are reported on `out` and become status 1.
    pub async fn dispatch(
        &mut self,
        line: &str,
        out: &mut dyn OutputSink,
        history: &[String],
        columns: u16,
    ) -> i32 {
        let status = self.run_line(line.trim(), out, history, columns).await;
        self.last_status = status;
        status
    }

    async fn run_line(
        &mut self,
        line: &str,
        out: &mut dyn OutputSink,
        history: &[String],
        columns: u16,
    ) -> i32 {
        if line.is_empty() {
            return EXIT_SUCCESS;
        }
        for hook in self.hooks.iter_mut() {
            hook(line);
        }

        let mut overrides = Environment::new();
        let rest = if let Some(caps) = one_shot_assignment().and_then(|re| re.captures(line)) {
            overrides.insert(caps[1].to_string(), self.expand_value(&caps[2]));
            caps.get(3).map_or("", |m| m.as_str())
        } else if let Some(caps) = assignment().and_then(|re| re.captures(line)) {
            debug!(name = &caps[1], "assignment");
            let value = self.expand_value(&caps[2]);
            self.env.insert(caps[1].to_string(), value);
            return EXIT_SUCCESS;
        } else {
            line
        };

        let words = {
            let last = self.last_status.to_string();
            let env = &self.env;
            let overrides = &overrides;
            tokenizer::tokenize_with(rest, |name| {
                if name == "?" {
                    return Some(last.clone());
                }
                overrides.get(name).or_else(|| env.get(name)).cloned()
            })
        };
        let Some(ParsedLine { name, args, flags }) = tokenizer::parse(words) else {
            return EXIT_SUCCESS;
        };
        if name.is_empty() {
            return EXIT_SUCCESS;
        }

        let Some(command) = self.registry.get(&name) else {
            debug!(command = %name, "command not found");
            out.eprintln(&format!("{}: command not found", name));
            return EXIT_UNKNOWN_COMMAND;
        };
        if flags.has_long("help") && !command.usage().is_empty() {
            out.println(command.usage());
            return EXIT_SUCCESS;
        }

        let mut ctx = ExecutionContext::new(
            name.clone(),
            &mut self.vfs,
            &mut self.env,
            overrides,
            out,
            args,
            flags,
            &self.registry,
            history,
            columns,
        );
        let result = AssertUnwindSafe(command.execute(&mut ctx)).catch_unwind().await;
        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => {
                ctx.out.eprintln(&format!("{}: {}", name, err));
                EXIT_FAILURE
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!(command = %name, panic = %msg, "command panicked");
                ctx.out.eprintln(&format!("{}: {}", name, msg));
                EXIT_FAILURE
            }
        };
        debug!(command = %name, status, "command finished");
        status
    }

    // assignment values lose quotes and get variables expanded, like words
    fn expand_value(&self, value: &str) -> String {
        let last = self.last_status.to_string();
        tokenizer::tokenize_with(value, |name| {
            if name == "?" {
                return Some(last.clone());
            }
            self.env.get(name).cloned()
        })
        .concat()
    }

    /// Completion candidates for the line typed so far.
    pub fn complete(&self, line: &str) -> Vec<String> {
        let (head, partial) = tokenizer::split_last_word(line);
        if head.trim().is_empty() {
            return self
                .registry
                .get_command_names()
                .into_iter()
                .filter(|n| n.starts_with(partial))
                .map(str::to_string)
                .collect();
        }
        let name = tokenizer::tokenize(head).into_iter().next().unwrap_or_default();
        let ctx = CompletionContext { vfs: &self.vfs, env: &self.env, registry: &self.registry };
        self.registry
            .get(&name)
            .and_then(|cmd| cmd.complete(partial, &ctx))
            .unwrap_or_else(|| ctx.path_candidates(partial, false))
    }
}
