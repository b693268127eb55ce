use crate::context::{CompletionContext, ExecutionContext};
use crate::error::CommandError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Exit status of a finished command, or the fault that stopped it.
pub type CommandResult = Result<i32, CommandError>;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_NOT_FOUND: i32 = 2;
pub const EXIT_UNKNOWN_COMMAND: i32 = 127;

/// A registered command. Handlers may suspend; the shell never runs two at
/// once.
#[async_trait(?Send)]
pub trait Command {
    /// One-line description shown by `help`.
    fn description(&self) -> &str;

    fn usage(&self) -> &str {
        ""
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult;

    /// Candidates for the word being typed. `None` falls back to
    /// filesystem completion.
    fn complete(&self, _partial: &str, _ctx: &CompletionContext<'_>) -> Option<Vec<String>> {
        None
    }
}

type Handler = Box<dyn Fn(&mut ExecutionContext<'_>) -> CommandResult>;

/// Command backed by a closure, for callers that don't need a type.
pub struct FnCommand {
    description: String,
    handler: Handler,
}

impl FnCommand {
    pub fn new<F>(description: &str, handler: F) -> Self
    where
        F: Fn(&mut ExecutionContext<'_>) -> CommandResult + 'static,
    {
        Self { description: description.to_string(), handler: Box::new(handler) }
    }
}

#[async_trait(?Send)]
impl Command for FnCommand {
    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        (self.handler)(ctx)
    }
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: HashMap::new() }
    }

    /// Adds or replaces the command registered under `name`.
    pub fn register_command(&mut self, name: &str, cmd: Box<dyn Command>) {
        self.commands.insert(name.to_string(), cmd);
    }

    pub fn register_fn<F>(&mut self, name: &str, description: &str, handler: F)
    where
        F: Fn(&mut ExecutionContext<'_>) -> CommandResult + 'static,
    {
        self.register_command(name, Box::new(FnCommand::new(description, handler)));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn get_command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn default_commands() -> Self {
        let mut reg = Self::new();
        crate::commands::register_builtins(&mut reg);
        reg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut reg = CommandRegistry::new();
        reg.register_fn("true", "do nothing", |_| Ok(EXIT_SUCCESS));
        reg.register_fn("false", "fail", |_| Ok(EXIT_FAILURE));
        assert!(reg.contains("true"));
        assert_eq!(reg.get("false").map(|c| c.description()), Some("fail"));
        assert!(reg.get("nope").is_none());
        assert_eq!(reg.get_command_names(), vec!["false", "true"]);
    }

    #[test]
    fn test_builtins_are_registered() {
        let reg = CommandRegistry::default_commands();
        for name in ["cat", "cd", "cp", "echo", "ls", "mkdir", "mv", "pwd", "rm", "touch"] {
            assert!(reg.contains(name), "missing builtin {}", name);
        }
    }
}
