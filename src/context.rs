use crate::command::CommandRegistry;
use crate::output::OutputSink;
use crate::tokenizer::{escape_word, unescape_word, Flags};
use crate::vfs::Vfs;
use std::collections::HashMap;

pub type Environment = HashMap<String, String>;

/// Everything a handler gets for one invocation.
pub struct ExecutionContext<'a> {
    pub command: String,
    pub vfs: &'a mut Vfs,
    /// Session environment overlaid with this line's one-shot assignment.
    pub env: Environment,
    session_env: &'a mut Environment,
    pub out: &'a mut dyn OutputSink,
    pub cwd: String,
    pub args: Vec<String>,
    pub flags: Flags,
    pub registry: &'a CommandRegistry,
    pub history: &'a [String],
    pub columns: u16,
}

impl<'a> ExecutionContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        command: String,
        vfs: &'a mut Vfs,
        session_env: &'a mut Environment,
        overrides: Environment,
        out: &'a mut dyn OutputSink,
        args: Vec<String>,
        flags: Flags,
        registry: &'a CommandRegistry,
        history: &'a [String],
        columns: u16,
    ) -> Self {
        let mut env = session_env.clone();
        env.extend(overrides);
        let cwd = vfs.cwd().to_string();
        Self {
            command,
            vfs,
            env,
            session_env,
            out,
            cwd,
            args,
            flags,
            registry,
            history,
            columns,
        }
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Sets a variable for the rest of the session.
    pub fn set_var(&mut self, name: &str, value: &str) {
        self.session_env.insert(name.to_string(), value.to_string());
        self.env.insert(name.to_string(), value.to_string());
    }

    pub fn unset_var(&mut self, name: &str) {
        self.session_env.remove(name);
        self.env.remove(name);
    }

    /// `<command>: <message>` on the error stream.
    pub fn error(&mut self, message: impl std::fmt::Display) {
        let line = format!("{}: {}", self.command, message);
        self.out.eprintln(&line);
    }

    pub fn println(&mut self, line: &str) {
        self.out.println(line);
    }
}

/// Read-only view handed to completion functions.
pub struct CompletionContext<'a> {
    pub vfs: &'a Vfs,
    pub env: &'a Environment,
    pub registry: &'a CommandRegistry,
}

impl CompletionContext<'_> {
    /// Filesystem entries matching `partial` as typed. The part up to the
    /// last `/` picks the directory and is kept in every candidate;
    /// directories get a trailing `/`. Candidates come back escaped so they
    /// can go straight into the line.
    pub fn path_candidates(&self, partial: &str, dirs_only: bool) -> Vec<String> {
        let partial = unescape_word(partial);
        let (dir_part, prefix) = match partial.rfind('/') {
            Some(idx) => partial.split_at(idx + 1),
            None => ("", partial.as_str()),
        };
        let listing = if dir_part.is_empty() {
            self.vfs.list(None)
        } else {
            self.vfs.list(Some(dir_part))
        };
        let Some(entries) = listing else {
            return Vec::new();
        };
        let mut out: Vec<String> = entries
            .into_iter()
            .filter(|n| n.name().starts_with(prefix))
            .filter(|n| prefix.starts_with('.') || !n.name().starts_with('.'))
            .filter(|n| !dirs_only || n.is_dir())
            .map(|n| {
                let suffix = if n.is_dir() { "/" } else { "" };
                escape_word(&format!("{}{}{}", dir_part, n.name(), suffix))
            })
            .collect();
        out.sort();
        out
    }
}
