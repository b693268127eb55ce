
mod cat;
mod cd;
mod clear;
mod cp;
mod echo;
mod env;
mod export;
mod help;
mod history;
mod ls;
mod mkdir;
mod mv;
mod pwd;
mod rm;
mod rmdir;
mod stat;
mod touch;

pub use cat::CatCommand;
pub use cd::CdCommand;
pub use clear::ClearCommand;
pub use cp::CpCommand;
pub use echo::EchoCommand;
pub use env::EnvCommand;
pub use export::ExportCommand;
pub use help::HelpCommand;
pub use history::HistoryCommand;
pub use ls::LsCommand;
pub use mkdir::MkdirCommand;
pub use mv::MvCommand;
pub use pwd::PwdCommand;
pub use rm::RmCommand;
pub use rmdir::RmdirCommand;
pub use stat::StatCommand;
pub use touch::TouchCommand;

use crate::command::CommandRegistry;
use crate::context::ExecutionContext;
use crate::error::{CommandError, VfsError};
use crate::vfs::Vfs;

pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register_command("cat", Box::new(CatCommand));
    reg.register_command("cd", Box::new(CdCommand));
    reg.register_command("clear", Box::new(ClearCommand));
    reg.register_command("cp", Box::new(CpCommand));
    reg.register_command("echo", Box::new(EchoCommand));
    reg.register_command("env", Box::new(EnvCommand));
    reg.register_command("export", Box::new(ExportCommand));
    reg.register_command("help", Box::new(HelpCommand));
    reg.register_command("history", Box::new(HistoryCommand));
    reg.register_command("ls", Box::new(LsCommand));
    reg.register_command("mkdir", Box::new(MkdirCommand));
    reg.register_command("mv", Box::new(MvCommand));
    reg.register_command("pwd", Box::new(PwdCommand));
    reg.register_command("rm", Box::new(RmCommand));
    reg.register_command("rmdir", Box::new(RmdirCommand));
    reg.register_command("stat", Box::new(StatCommand));
    reg.register_command("touch", Box::new(TouchCommand));
}

/// Rejects any flag outside the given short letters and long names.
fn check_flags(ctx: &ExecutionContext<'_>, short: &str, long: &[&str]) -> Result<(), CommandError> {
    match ctx.flags.unknown(short, long) {
        Some(flag) => Err(CommandError::usage(format!("invalid option '{}'", flag))),
        None => Ok(()),
    }
}

/// VFS errors carry the resolved path; users want to see what they typed.
fn describe(vfs: &Vfs, typed: &[&str], err: &VfsError) -> String {
    let message = err.to_string();
    typed
        .iter()
        .find(|arg| vfs.resolve_path(arg) == err.path())
        .map(|arg| message.replacen(err.path(), arg, 1))
        .unwrap_or(message)
}
