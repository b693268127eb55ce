//! Session configuration.
//!
//! Every field has a default, so `{}` is a valid configuration:
//!
//! ```json
//! {
//!   "user": "student",
//!   "hostname": "lab",
//!   "prompt": "{user}@{host}:{path}{symbol} ",
//!   "banner": "Welcome to the lab machine.",
//!   "files": { "/home/student/README": "Start here.\n" },
//!   "env": { "EDITOR": "nano" }
//! }
//! ```

use crate::context::Environment;
use crate::error::ConfigError;
use crate::vfs::Vfs;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_USER: &str = "guest";
pub const DEFAULT_HOSTNAME: &str = "sandbox";
pub const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";
pub const SHELL_PATH: &str = "/bin/sandshell";

const DEFAULT_DIRECTORIES: &[&str] = &["/bin", "/etc", "/home", "/tmp", "/usr", "/usr/bin", "/var"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    pub user: String,
    pub hostname: String,
    /// Defaults to `/home/<user>`.
    pub home: Option<String>,
    pub path: String,
    /// Prompt template, `{user}@{host}:{path}{symbol} ` style.
    pub prompt: Option<String>,
    /// Written once when the session starts.
    pub banner: Option<String>,
    /// Created (with parents) before anything else.
    pub directories: Vec<String>,
    /// Path to content. Missing parent directories are created.
    pub files: BTreeMap<String, String>,
    /// Extra variables, applied after the standard ones.
    pub env: BTreeMap<String, String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            hostname: DEFAULT_HOSTNAME.to_string(),
            home: None,
            path: DEFAULT_PATH.to_string(),
            prompt: None,
            banner: None,
            directories: DEFAULT_DIRECTORIES.iter().map(|d| d.to_string()).collect(),
            files: BTreeMap::new(),
            env: BTreeMap::new(),
        }
    }
}

impl ShellConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user.is_empty() || self.user.contains(|c: char| c == '/' || c.is_whitespace()) {
            return Err(ConfigError::Invalid(format!("bad user name '{}'", self.user)));
        }
        if let Some(home) = &self.home {
            if !home.starts_with('/') {
                return Err(ConfigError::Invalid(format!("home must be absolute, got '{}'", home)));
            }
        }
        Ok(())
    }

    pub fn home(&self) -> String {
        self.home.clone().unwrap_or_else(|| format!("/home/{}", self.user))
    }

    /// A filesystem with the seed directories, the home directory and the
    /// seed files in place, sitting in the home directory.
    pub fn build_vfs(&self) -> Result<Vfs, ConfigError> {
        let home = self.home();
        let mut vfs = Vfs::with_home(&home);
        for dir in &self.directories {
            vfs.mkdir_all(dir)?;
        }
        vfs.mkdir_all(&home)?;
        for (path, content) in &self.files {
            let abs = vfs.resolve_path(path);
            if let Some((parent, _)) = abs.rsplit_once('/') {
                if !parent.is_empty() {
                    vfs.mkdir_all(parent)?;
                }
            }
            vfs.write_file(&abs, content)?;
        }
        vfs.change_directory(&home)?;
        debug!(nodes = vfs.node_count(), home = %home, "filesystem seeded");
        Ok(vfs)
    }

    /// Starting environment for a session.
    pub fn environment(&self) -> Environment {
        let home = self.home();
        let mut env = Environment::from([
            ("USER".to_string(), self.user.clone()),
            ("HOSTNAME".to_string(), self.hostname.clone()),
            ("HOME".to_string(), home.clone()),
            ("PATH".to_string(), self.path.clone()),
            ("PWD".to_string(), home),
            ("SHELL".to_string(), SHELL_PATH.to_string()),
        ]);
        env.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = ShellConfig::from_json("{}").unwrap();
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.home(), "/home/guest");
    }

    #[test]
    fn test_partial_config() {
        let config = ShellConfig::from_json(
            r#"{"user": "ada", "files": {"notes/todo.txt": "x"}, "env": {"EDITOR": "nano", "PATH": "/bin"}}"#,
        )
        .unwrap();
        assert_eq!(config.user, "ada");
        assert_eq!(config.hostname, DEFAULT_HOSTNAME);
        assert_eq!(config.home(), "/home/ada");
        let env = config.environment();
        assert_eq!(env.get("EDITOR").map(String::as_str), Some("nano"));
        assert_eq!(env.get("PATH").map(String::as_str), Some("/bin"));
        assert_eq!(env.get("PWD").map(String::as_str), Some("/home/ada"));
        assert_eq!(env.get("SHELL").map(String::as_str), Some(SHELL_PATH));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(ShellConfig::from_json(r#"{"colour": "red"}"#), Err(ConfigError::Json(_))));
        assert!(matches!(ShellConfig::from_json("[1, 2]"), Err(ConfigError::Json(_))));
        assert!(matches!(ShellConfig::from_json(r#"{"user": "a b"}"#), Err(ConfigError::Invalid(_))));
        assert!(matches!(ShellConfig::from_json(r#"{"home": "rel"}"#), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_build_vfs() {
        let mut config = ShellConfig::default();
        config.files.insert("/etc/motd".into(), "hi\n".into());
        config.files.insert("~/projects/app/main.rs".into(), "fn main() {}".into());
        let vfs = config.build_vfs().unwrap();
        assert_eq!(vfs.cwd(), "/home/guest");
        for dir in DEFAULT_DIRECTORIES {
            assert!(vfs.get_node(dir).is_some_and(|n| n.is_dir()), "{} missing", dir);
        }
        assert_eq!(vfs.read_file("/etc/motd"), Some("hi\n"));
        assert_eq!(vfs.read_file("/home/guest/projects/app/main.rs"), Some("fn main() {}"));
    }

    #[test]
    fn test_seed_conflict_is_reported() {
        let mut config = ShellConfig::default();
        config.files.insert("/tmp".into(), "not a dir".into());
        assert!(matches!(config.build_vfs(), Err(ConfigError::Seed(_))));
    }
}
