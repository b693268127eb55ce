// prompt templates take {user} {host} {path} {short_path} {symbol}
// or the bash spellings \u \h \w \W \$

use crate::context::Environment;

pub const DEFAULT_TEMPLATE: &str = "{user}@{host}:{short_path}{symbol} ";

/// Values a prompt is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInfo {
    pub user: String,
    pub host: String,
    pub path: String,
    pub short_path: String,
    pub symbol: char,
}

impl PromptInfo {
    pub fn gather(env: &Environment, cwd: &str) -> Self {
        let user = env.get("USER").cloned().unwrap_or_default();
        let host = env.get("HOSTNAME").cloned().unwrap_or_default();
        let path = home_relative(cwd, &user);
        let short_path = short_path(&path);
        let symbol = if user == "root" { '#' } else { '$' };
        Self { user, host, path, short_path, symbol }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "user" | "u" => Some(self.user.clone()),
            "host" | "h" => Some(self.host.clone()),
            "path" | "w" => Some(self.path.clone()),
            "short_path" | "W" => Some(self.short_path.clone()),
            "symbol" | "$" => Some(self.symbol.to_string()),
            _ => None,
        }
    }
}

/// `/home/<user>` becomes `~`, anything below it `~/rest`.
fn home_relative(cwd: &str, user: &str) -> String {
    let home = format!("/home/{}", user);
    if user.is_empty() {
        return cwd.to_string();
    }
    if cwd == home {
        return "~".to_string();
    }
    match cwd.strip_prefix(&home) {
        Some(rest) if rest.starts_with('/') => format!("~{}", rest),
        _ => cwd.to_string(),
    }
}

fn short_path(path: &str) -> String {
    if path == "~" || path == "/" {
        return path.to_string();
    }
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}

pub enum PromptFormat {
    Template(String),
    Custom(Box<dyn Fn(&PromptInfo) -> String>),
}

pub struct Prompt {
    format: PromptFormat,
}

impl Default for Prompt {
    fn default() -> Self {
        Self::template(DEFAULT_TEMPLATE)
    }
}

impl Prompt {
    pub fn template(template: &str) -> Self {
        Self { format: PromptFormat::Template(template.to_string()) }
    }

    /// Replaces templating entirely.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&PromptInfo) -> String + 'static,
    {
        Self { format: PromptFormat::Custom(Box::new(f)) }
    }

    pub fn render(&self, env: &Environment, cwd: &str) -> String {
        let info = PromptInfo::gather(env, cwd);
        match &self.format {
            PromptFormat::Template(t) => expand_template(t, &info),
            PromptFormat::Custom(f) => f(&info),
        }
    }
}

fn expand_template(template: &str, info: &PromptInfo) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(c) = rest.chars().next() {
        let after = &rest[c.len_utf8()..];
        match c {
            '\\' => {
                if let Some(value) = after.chars().next().and_then(|k| info.lookup(&k.to_string())) {
                    out.push_str(&value);
                    rest = &after[1..];
                    continue;
                }
            }
            '{' => {
                if let Some(end) = after.find('}') {
                    if let Some(value) = info.lookup(&after[..end]) {
                        out.push_str(&value);
                        rest = &after[end + 1..];
                        continue;
                    }
                }
            }
            _ => {}
        }
        out.push(c);
        rest = after;
    }
    out
}
