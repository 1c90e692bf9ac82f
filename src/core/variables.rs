// src/core/variables.rs

use crate::constants::{SHELL_IDENTIFIER, TERMINAL_IDENTIFIER};
use crate::models::ShellConfig;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

lazy_static! {
    /// `${ENV:NAME}`, `$ENV{NAME}`, `${NAME}` and `$NAME`, optionally preceded
    /// by the backslash that suppresses expansion.
    static ref VARIABLE_RE: Regex = Regex::new(
        r"(\\)?(?:\$\{ENV:([A-Za-z_][A-Za-z0-9_]*)\}|\$ENV\{([A-Za-z_][A-Za-z0-9_]*)\}|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*))"
    )
    .unwrap();
    static ref ASSIGNMENT_RE: Regex =
        Regex::new(r"^\s*(export\s+)?([A-Za-z_][A-Za-z0-9_]*)=(.*)$").unwrap();
}

/// Where an assignment stores its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    /// `NAME=value`: a session variable.
    Session,
    /// `export NAME=value`: an environment variable.
    Environment,
}

/// An assignment line that was recognised and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Which table the value went to.
    pub scope: VariableScope,
    /// The variable name.
    pub name: String,
    /// The stored value, after quote stripping and expansion.
    pub value: String,
}

/// Session variables and environment variables of one console session.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: BTreeMap<String, String>,
    env: BTreeMap<String, String>,
}

impl VariableStore {
    /// An empty store, without the default environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the default environment from the config, then applies its `[env]` table.
    pub fn with_defaults(config: &ShellConfig) -> Self {
        let mut store = Self::new();
        let defaults = [
            ("USER", config.user.as_str()),
            ("HOME", config.home.as_str()),
            ("PATH", config.path.as_str()),
            ("PWD", config.home.as_str()),
            ("SHELL", SHELL_IDENTIFIER),
            ("TERM", TERMINAL_IDENTIFIER),
        ];
        for (name, value) in defaults {
            store.set_env(name, value);
        }
        for (name, value) in &config.env {
            store.set_env(name, value);
        }
        store
    }

    /// Reads a session variable.
    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Sets a session variable.
    pub fn set_var(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Removes a session variable. Returns whether it existed.
    pub fn unset_var(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    /// Reads an environment variable.
    pub fn get_env(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Sets an environment variable.
    pub fn set_env(&mut self, name: &str, value: &str) {
        self.env.insert(name.to_string(), value.to_string());
    }

    /// Removes an environment variable. Returns whether it existed.
    pub fn unset_env(&mut self, name: &str) -> bool {
        self.env.remove(name).is_some()
    }

    /// Session variables, sorted by name.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Environment variables, sorted by name.
    pub fn env(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Session variable first, then environment.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.get_var(name).or_else(|| self.get_env(name))
    }

    /// Rewrites every variable reference in `input`. The two `ENV` forms read
    /// only the environment; the plain forms prefer session variables. An
    /// unresolved name expands to nothing. A reference preceded by `\` is kept
    /// verbatim, backslash included, for the tokenizer to unescape.
    pub fn expand(&self, input: &str) -> String {
        self.expand_with(input, str::to_string)
    }

    /// Like `expand`, but backslash-escapes quotes and backslashes inside the
    /// substituted values, so the result can be tokenized without a value
    /// opening or closing a quoted span. Whitespace in a value still splits
    /// arguments.
    pub fn expand_for_tokenizer(&self, input: &str) -> String {
        self.expand_with(input, escape_for_tokenizer)
    }

    fn expand_with(&self, input: &str, substitute: impl Fn(&str) -> String) -> String {
        VARIABLE_RE
            .replace_all(input, |caps: &Captures| {
                if caps.get(1).is_some() {
                    return caps.get(0).map_or("", |m| m.as_str()).to_string();
                }
                let value = if let Some(name) = caps.get(2).or_else(|| caps.get(3)) {
                    self.get_env(name.as_str())
                } else {
                    caps.get(4)
                        .or_else(|| caps.get(5))
                        .and_then(|name| self.lookup(name.as_str()))
                };
                substitute(value.unwrap_or_default())
            })
            .into_owned()
    }

    /// Recognises `NAME=value` (session) and `export NAME=value` (environment),
    /// strips one layer of surrounding quotes and stores the value. Values in
    /// single quotes are stored literally; everything else is expanded first.
    pub fn handle_assignment(&mut self, line: &str) -> Option<Assignment> {
        let caps = ASSIGNMENT_RE.captures(line)?;
        let scope = if caps.get(1).is_some() {
            VariableScope::Environment
        } else {
            VariableScope::Session
        };
        let name = caps.get(2)?.as_str().to_string();
        let raw = caps.get(3).map_or("", |m| m.as_str()).trim();

        let value = match strip_quotes(raw) {
            Some(('\'', inner)) => inner.to_string(),
            Some((_, inner)) => self.expand(inner),
            None => self.expand(raw),
        };

        match scope {
            VariableScope::Session => self.set_var(&name, &value),
            VariableScope::Environment => self.set_env(&name, &value),
        }
        log::debug!("Assigned {:?} {}={:?}", scope, name, value);
        Some(Assignment { scope, name, value })
    }
}

fn escape_for_tokenizer(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Returns the quote character and the inner text when `text` is wrapped in a
/// matching pair of quotes.
fn strip_quotes(text: &str) -> Option<(char, &str)> {
    ['"', '\''].into_iter().find_map(|q| {
        text.strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
            .map(|inner| (q, inner))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VariableStore {
        let mut store = VariableStore::with_defaults(&ShellConfig::default());
        store.set_var("NAME", "session");
        store.set_env("NAME", "environment");
        store
    }

    #[test]
    fn test_default_environment_is_seeded() {
        let mut config = ShellConfig::default();
        config.user = "ada".to_string();
        config.env.insert("EDITOR".to_string(), "ed".to_string());
        let store = VariableStore::with_defaults(&config);

        assert_eq!(store.get_env("USER"), Some("ada"));
        assert_eq!(store.get_env("PWD"), store.get_env("HOME"));
        assert_eq!(store.get_env("SHELL"), Some(SHELL_IDENTIFIER));
        assert_eq!(store.get_env("TERM"), Some(TERMINAL_IDENTIFIER));
        assert_eq!(store.get_env("EDITOR"), Some("ed"));
        assert!(store.get_env("PATH").is_some());
    }

    #[test]
    fn test_expansion_forms() {
        let store = store();
        assert_eq!(store.expand("$NAME"), "session");
        assert_eq!(store.expand("${NAME}!"), "session!");
        assert_eq!(store.expand("$ENV{NAME}"), "environment");
        assert_eq!(store.expand("${ENV:NAME}"), "environment");
        assert_eq!(store.expand("[$MISSING]"), "[]");
        assert_eq!(store.expand("cost: 5$"), "cost: 5$");
    }

    #[test]
    fn test_plain_forms_fall_back_to_environment() {
        let store = store();
        assert_eq!(store.expand("$TERM"), TERMINAL_IDENTIFIER);
        // The ENV forms never read session variables.
        let mut only_session = VariableStore::new();
        only_session.set_var("X", "1");
        assert_eq!(only_session.expand("${ENV:X}$X"), "1");
    }

    #[test]
    fn test_escaped_reference_is_kept() {
        let store = store();
        assert_eq!(store.expand(r"echo \$NAME $NAME"), r"echo \$NAME session");
    }

    #[test]
    fn test_tokenizer_expansion_escapes_quotes_in_values() {
        let mut store = VariableStore::new();
        store.set_var("X", r#"it's "a" \o/"#);
        assert_eq!(store.expand("$X"), r#"it's "a" \o/"#);
        assert_eq!(store.expand_for_tokenizer("$X"), r#"it\'s \"a\" \\o/"#);
        assert_eq!(
            crate::core::tokenizer::tokenize(&store.expand_for_tokenizer("say $X")).unwrap(),
            vec!["say", "it's", "\"a\"", r"\o/"]
        );
    }

    #[test]
    fn test_assignment_routes_by_form() {
        let mut store = VariableStore::new();
        let session = store.handle_assignment("GREETING=\"hello there\"").unwrap();
        assert_eq!(session.scope, VariableScope::Session);
        assert_eq!(store.get_var("GREETING"), Some("hello there"));

        let env = store.handle_assignment("export EDITOR='vi'").unwrap();
        assert_eq!(env.scope, VariableScope::Environment);
        assert_eq!(store.get_env("EDITOR"), Some("vi"));
        assert_eq!(store.get_var("EDITOR"), None);

        assert!(store.handle_assignment("echo a=b").is_none());
        assert!(store.handle_assignment("1X=2").is_none());
    }

    #[test]
    fn test_assignment_expands_unless_single_quoted() {
        let mut store = VariableStore::new();
        store.set_env("BASE", "/opt");
        store.handle_assignment("DIR=$BASE/bin");
        store.handle_assignment("RAW='$BASE/bin'");
        assert_eq!(store.get_var("DIR"), Some("/opt/bin"));
        assert_eq!(store.get_var("RAW"), Some("$BASE/bin"));
    }
}
