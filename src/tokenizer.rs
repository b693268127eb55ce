
use std::collections::{BTreeMap, BTreeSet};
use std::iter::Peekable;
use std::str::Chars;

/// Flags collected from a command line. `-rf` sets `r` and `f`,
/// `--name` and `--name=value` set long flags.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Flags {
    short: BTreeSet<char>,
    long: BTreeMap<String, Option<String>>,
}

impl Flags {
    pub fn has(&self, c: char) -> bool {
        self.short.contains(&c)
    }

    pub fn has_long(&self, name: &str) -> bool {
        self.long.contains_key(name)
    }

    /// True when either the short or the long spelling was given.
    pub fn any(&self, c: char, name: &str) -> bool {
        self.has(c) || self.has_long(name)
    }

    pub fn long_value(&self, name: &str) -> Option<&str> {
        self.long.get(name)?.as_deref()
    }

    pub fn short(&self) -> impl Iterator<Item = char> + '_ {
        self.short.iter().copied()
    }

    pub fn long(&self) -> impl Iterator<Item = &str> + '_ {
        self.long.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_empty() && self.long.is_empty()
    }

    /// First flag not in the allowed sets, rendered the way it was typed.
    pub fn unknown(&self, short: &str, long: &[&str]) -> Option<String> {
        if let Some(c) = self.short.iter().find(|c| !short.contains(**c)) {
            return Some(format!("-{}", c));
        }
        self.long
            .keys()
            .find(|k| !long.contains(&k.as_str()))
            .map(|k| format!("--{}", k))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub name: String,
    pub args: Vec<String>,
    pub flags: Flags,
}

/// Word splitting without variable expansion.
pub fn tokenize(input: &str) -> Vec<String> {
    split(input, None)
}

/// Word splitting with `$NAME`, `${NAME}` and `$?` expanded through
/// `lookup`. Unset names expand to nothing; single quotes suppress it.
pub fn tokenize_with<F>(input: &str, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    split(input, Some(&lookup))
}

fn split(input: &str, lookup: Option<&dyn Fn(&str) -> Option<String>>) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quote) {
            ('\\', _) => {
                // a trailing backslash just ends the input
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (q, Some(open)) if q == open => quote = None,
            ('$', Some('"')) | ('$', None) if lookup.is_some() => {
                if let Some(lookup) = lookup {
                    let value = expand(&mut chars, lookup);
                    if !value.is_empty() || quote.is_some() {
                        in_word = true;
                    }
                    current.push_str(&value);
                }
            }
            (_, Some(_)) => current.push(c),
            ('"', None) | ('\'', None) => {
                quote = Some(c);
                in_word = true;
            }
            (ws, None) if ws.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (_, None) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// Splits `line` before the word being typed: everything after the last
/// whitespace that is neither quoted nor escaped.
pub fn split_last_word(line: &str) -> (&str, &str) {
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            (q, Some(open)) if q == open => quote = None,
            (_, Some(_)) => {}
            ('"', None) | ('\'', None) => quote = Some(c),
            (ws, None) if ws.is_whitespace() => start = i + ws.len_utf8(),
            _ => {}
        }
    }
    line.split_at(start)
}

/// Backslash-escapes whatever the splitter would otherwise act on, so the
/// result reads back as one word.
pub fn escape_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        if c.is_whitespace() || matches!(c, '\\' | '"' | '\'' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A typed (possibly half-quoted) word as the splitter would read it.
pub fn unescape_word(word: &str) -> String {
    tokenize(word).concat()
}

// reads what follows a `$`. a lone `$` stays literal
fn expand(chars: &mut Peekable<Chars<'_>>, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    match chars.peek().copied() {
        Some('?') => {
            chars.next();
            lookup("?").unwrap_or_default()
        }
        Some('{') => {
            chars.next();
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    return lookup(&name).unwrap_or_default();
                }
                name.push(c);
            }
            format!("${{{}", name)
        }
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '_' || c.is_ascii_alphanumeric() {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            lookup(&name).unwrap_or_default()
        }
        _ => "$".to_string(),
    }
}

/// First word is the command name; `--name[=value]` and `-xyz` become
/// flags, everything else (including `-` and `--`) stays positional.
pub fn parse(words: Vec<String>) -> Option<ParsedLine> {
    let mut words = words.into_iter();
    let name = words.next()?;
    let mut args = Vec::new();
    let mut flags = Flags::default();
    for word in words {
        if let Some(long) = word.strip_prefix("--").filter(|l| !l.is_empty()) {
            match long.split_once('=') {
                Some((key, value)) => flags.long.insert(key.to_string(), Some(value.to_string())),
                None => flags.long.insert(long.to_string(), None),
            };
        } else if word.len() > 1 && word.starts_with('-') && !word.starts_with("--") {
            flags.short.extend(word.chars().skip(1));
        } else {
            args.push(word);
        }
    }
    Some(ParsedLine { name, args, flags })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        tokenize(s)
    }

    #[test]
    fn test_quoted_argument_keeps_spaces() {
        let parsed = parse(words("mkdir \"my dir\"")).unwrap();
        assert_eq!(parsed.name, "mkdir");
        assert_eq!(parsed.args, vec!["my dir"]);
        assert!(parsed.flags.is_empty());
    }

    #[test]
    fn test_combined_short_flags() {
        let parsed = parse(words("rm -rf /tmp/x")).unwrap();
        assert!(parsed.flags.has('r'));
        assert!(parsed.flags.has('f'));
        assert_eq!(parsed.flags.short().count(), 2);
        assert_eq!(parsed.args, vec!["/tmp/x"]);
    }

    #[test]
    fn test_long_flags_and_values() {
        let parsed = parse(words("ls --all --color=never - -- x")).unwrap();
        assert!(parsed.flags.has_long("all"));
        assert_eq!(parsed.flags.long_value("color"), Some("never"));
        assert_eq!(parsed.flags.long_value("all"), None);
        assert_eq!(parsed.args, vec!["-", "--", "x"]);
    }

    #[test]
    fn test_quotes_nest_the_other_kind_literally() {
        assert_eq!(words(r#"echo "it's" 'say "hi"'"#), vec!["echo", "it's", "say \"hi\""]);
    }

    #[test]
    fn test_backslash_escapes_everywhere() {
        assert_eq!(words(r"a\ b"), vec!["a b"]);
        assert_eq!(words(r#""q\"q""#), vec!["q\"q"]);
        assert_eq!(words(r"'x\'y'"), vec!["x'y"]);
        assert_eq!(words(r"tail\"), vec!["tail"]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(words("echo \"open  space"), vec!["echo", "open  space"]);
        assert_eq!(words("echo 'x"), vec!["echo", "x"]);
    }

    #[test]
    fn test_empty_quotes_make_an_empty_word() {
        assert_eq!(words("touch \"\""), vec!["touch", ""]);
        assert!(words("   \t ").is_empty());
        assert!(parse(Vec::new()).is_none());
    }

    #[test]
    fn test_expansion() {
        let lookup = |name: &str| match name {
            "USER" => Some("guest".to_string()),
            "?" => Some("127".to_string()),
            _ => None,
        };
        assert_eq!(tokenize_with("echo $USER ${USER}x", lookup), vec!["echo", "guest", "guestx"]);
        assert_eq!(tokenize_with("echo \"$USER home\" '$USER'", lookup), vec!["echo", "guest home", "$USER"]);
        assert_eq!(tokenize_with("echo $? $NOPE end", lookup), vec!["echo", "127", "end"]);
        assert_eq!(tokenize_with("echo \"$NOPE\"", lookup), vec!["echo", ""]);
        assert_eq!(tokenize_with("echo $ 5$", lookup), vec!["echo", "$", "5$"]);
        assert_eq!(tokenize("echo $USER"), vec!["echo", "$USER"]);
    }

    #[test]
    fn test_last_word_and_escaping() {
        assert_eq!(split_last_word(" mkd"), (" ", "mkd"));
        assert_eq!(split_last_word("cd my\\ d"), ("cd ", "my\\ d"));
        assert_eq!(split_last_word("cat \"a b"), ("cat ", "\"a b"));
        assert_eq!(split_last_word("ls "), ("ls ", ""));
        assert_eq!(escape_word("my dir/"), "my\\ dir/");
        assert_eq!(escape_word("it's $x"), "it\\'s\\ \\$x");
        assert_eq!(unescape_word("my\\ d"), "my d");
        assert_eq!(unescape_word("\"my d"), "my d");
        assert_eq!(words(&format!("cd {}", escape_word("a \"b\" \\c"))), vec!["cd", "a \"b\" \\c"]);
    }

    #[test]
    fn test_unknown_flag_reporting() {
        let parsed = parse(words("ls -lz --bogus")).unwrap();
        assert_eq!(parsed.flags.unknown("al1", &["all"]), Some("-z".to_string()));
        let parsed = parse(words("ls -l --bogus")).unwrap();
        assert_eq!(parsed.flags.unknown("al1", &["all"]), Some("--bogus".to_string()));
    }
}
