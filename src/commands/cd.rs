use super::{check_flags, describe};
use crate::command::{Command, CommandResult, EXIT_SUCCESS};
use crate::context::{CompletionContext, ExecutionContext};
use crate::error::CommandError;
use async_trait::async_trait;

pub struct CdCommand;

const CD_USAGE: &str = "Usage: cd [DIR]\nChange the working directory.\n\n  cd        go to the home directory\n  cd ~      same\n  cd -      go back to the previous directory and print it";

#[async_trait(?Send)]
impl Command for CdCommand {
    fn description(&self) -> &str {
        "Change the working directory"
    }

    fn usage(&self) -> &str {
        CD_USAGE
    }

    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> CommandResult {
        check_flags(ctx, "", &[])?;
        if ctx.args.len() > 1 {
            return Err(CommandError::usage("too many arguments"));
        }

        // work out where we're headed and whether to announce it
        let (target, announce) = match ctx.args.first().map(String::as_str) {
            None | Some("~") => {
                let home = ctx.var("HOME").map(str::to_string);
                (home.unwrap_or_else(|| ctx.vfs.home().to_string()), false)
            }
            Some("-") => match ctx.var("OLDPWD") {
                Some(old) => (old.to_string(), true),
                None => return Err(CommandError::failed("OLDPWD not set")),
            },
            Some(path) => (path.to_string(), false),
        };

        let previous = ctx.vfs.cwd().to_string();
        if let Err(err) = ctx.vfs.change_directory(&target) {
            return Err(CommandError::failed(describe(ctx.vfs, &[target.as_str()], &err)));
        }
        let current = ctx.vfs.cwd().to_string();
        ctx.set_var("OLDPWD", &previous);
        ctx.set_var("PWD", &current);
        ctx.cwd = current.clone();
        if announce {
            ctx.println(&current);
        }
        Ok(EXIT_SUCCESS)
    }

    fn complete(&self, partial: &str, ctx: &CompletionContext<'_>) -> Option<Vec<String>> {
        Some(ctx.path_candidates(partial, true))
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::{run, session};

    #[test]
    fn test_cd_relative_and_parent() {
        let mut d = session();
        d.vfs_mut().mkdir("/home/guest/docs").unwrap();
        let (status, out) = run(&mut d, "cd docs");
        assert_eq!(status, 0);
        assert!(out.stdout.is_empty());
        assert_eq!(d.vfs().cwd(), "/home/guest/docs");
        assert_eq!(d.var("PWD"), Some("/home/guest/docs"));
        assert_eq!(d.var("OLDPWD"), Some("/home/guest"));
        run(&mut d, "cd ../..");
        assert_eq!(d.vfs().cwd(), "/home");
    }

    #[test]
    fn test_cd_home() {
        let mut d = session();
        run(&mut d, "cd /tmp");
        run(&mut d, "cd");
        assert_eq!(d.vfs().cwd(), "/home/guest");
        run(&mut d, "cd /");
        run(&mut d, "cd ~");
        assert_eq!(d.vfs().cwd(), "/home/guest");
    }

    #[test]
    fn test_cd_dash_swaps_and_prints() {
        let mut d = session();
        let (status, out) = run(&mut d, "cd -");
        assert_eq!(status, 1);
        assert_eq!(out.stderr, vec!["cd: OLDPWD not set"]);
        run(&mut d, "cd /tmp");
        let (status, out) = run(&mut d, "cd -");
        assert_eq!(status, 0);
        assert_eq!(out.stdout, "/home/guest\n");
        assert_eq!(d.vfs().cwd(), "/home/guest");
        assert_eq!(d.var("OLDPWD"), Some("/tmp"));
    }

    #[test]
    fn test_cd_errors() {
        let mut d = session();
        d.vfs_mut().write_file("/home/guest/file.txt", "").unwrap();
        let (status, out) = run(&mut d, "cd nowhere");
        assert_eq!(status, 1);
        assert_eq!(out.stderr, vec!["cd: nowhere: No such file or directory"]);
        let (_, out) = run(&mut d, "cd file.txt");
        assert_eq!(out.stderr, vec!["cd: file.txt: Not a directory"]);
        let (_, out) = run(&mut d, "cd a b");
        assert_eq!(out.stderr, vec!["cd: too many arguments"]);
        assert_eq!(d.vfs().cwd(), "/home/guest");
    }

    #[test]
    fn test_cd_completes_directories_only() {
        let mut d = session();
        d.vfs_mut().mkdir("/home/guest/src").unwrap();
        d.vfs_mut().write_file("/home/guest/setup.sh", "").unwrap();
        assert_eq!(d.complete("cd s"), vec!["src/"]);
        assert_eq!(d.complete("cat s"), vec!["setup.sh", "src/"]);
    }
}
