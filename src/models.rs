// src/models.rs

use crate::constants::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_HOME, DEFAULT_PATH, DEFAULT_PROMPT, DEFAULT_USER,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// --- IDENTIFIERS ---

/// Identifies one open console instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first block of the UUID is plenty for log lines.
        let full = self.0.simple().to_string();
        write!(f, "{}", full.get(..8).unwrap_or(&full))
    }
}

/// Identifies an addressable output group inside one output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies a background job. Allocated monotonically and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- OUTPUT ---

/// Whether a group was printed as regular output or as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Regular output.
    Output,
    /// Error output, rendered in the error style.
    Error,
}

/// The eight base ANSI colors. Bright variants are expressed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnsiColor {
    /// SGR 30 / 40.
    Black,
    /// SGR 31 / 41.
    Red,
    /// SGR 32 / 42.
    Green,
    /// SGR 33 / 43.
    Yellow,
    /// SGR 34 / 44.
    Blue,
    /// SGR 35 / 45.
    Magenta,
    /// SGR 36 / 46.
    Cyan,
    /// SGR 37 / 47.
    White,
}

// --- JOBS ---

/// Lifecycle of a background job. `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Spawned and not yet settled.
    Running,
    /// The handler returned successfully.
    Completed,
    /// The handler returned an error.
    Failed,
    /// Cancelled through `kill` or a closing session.
    Killed,
}

impl JobStatus {
    /// Whether the status can no longer change.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Killed => "killed",
        };
        f.write_str(label)
    }
}

// --- FLAG SCHEMA MODELS ---

/// The value type a flag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagType {
    /// Free text, optionally limited to a list of choices.
    String,
    /// A finite floating-point number.
    Number,
    /// A switch that takes no value.
    Boolean,
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        };
        f.write_str(label)
    }
}

/// A typed flag value after casting.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    /// A string flag's value, markup-escaped.
    Text(String),
    /// A number flag's value.
    Number(f64),
    /// A boolean flag's value.
    Bool(bool),
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Declares one flag of a command's schema.
///
/// Built with the typed constructors and chained modifiers:
///
/// ```
/// use consh::models::FlagDefinition;
///
/// let reverse = FlagDefinition::boolean("reverse").alias("r");
/// let format = FlagDefinition::string("format").choices(&["json", "text"]).default_value("text");
/// assert!(reverse.aliases.contains(&"r".to_string()));
/// assert_eq!(format.default.as_deref(), Some("text"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlagDefinition {
    /// Canonical name, without dashes.
    pub name: String,
    /// Alternative names, without dashes. One-letter aliases are short flags.
    pub aliases: Vec<String>,
    /// The type values are cast to.
    pub value_type: FlagType,
    /// Raw default, cast to the flag's type when the schema is built.
    pub default: Option<String>,
    /// Parsing fails when the flag is absent.
    pub required: bool,
    /// The only values a string flag accepts.
    pub choices: Option<Vec<String>>,
    /// Flags that may not be given together with this one.
    pub conflicts_with: Vec<String>,
    /// When set, the flag may not appear together with positional arguments.
    pub exclusive: bool,
    /// Left out of usage lines and `help`.
    pub hidden: bool,
    /// Shown next to the flag in `help`.
    pub description: Option<String>,
}

impl FlagDefinition {
    /// A flag of the given type with no modifiers. Leading dashes are dropped.
    pub fn new(name: &str, value_type: FlagType) -> Self {
        Self {
            name: name.trim_start_matches('-').to_string(),
            aliases: Vec::new(),
            value_type,
            default: None,
            required: false,
            choices: None,
            conflicts_with: Vec::new(),
            exclusive: false,
            hidden: false,
            description: None,
        }
    }

    /// A string flag.
    pub fn string(name: &str) -> Self {
        Self::new(name, FlagType::String)
    }

    /// A number flag.
    pub fn number(name: &str) -> Self {
        Self::new(name, FlagType::Number)
    }

    /// A boolean flag, `false` unless given.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, FlagType::Boolean)
    }

    /// Adds an alternative name.
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.trim_start_matches('-').to_string());
        self
    }

    /// Sets the raw default.
    pub fn default_value(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }

    /// Makes the flag mandatory.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restricts a string flag to `allowed`.
    pub fn choices(mut self, allowed: &[&str]) -> Self {
        self.choices = Some(allowed.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Declares a flag that may not be combined with this one.
    pub fn conflicts_with(mut self, other: &str) -> Self {
        self.conflicts_with
            .push(other.trim_start_matches('-').to_string());
        self
    }

    /// Forbids positional arguments alongside this flag.
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Hides the flag from usage and `help`.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Sets the help text.
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Describes a positional argument for usage output and presence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalSpec {
    /// Placeholder name shown in usage lines.
    pub name: String,
    /// Shown next to the argument in `help`.
    pub description: Option<String>,
    /// Parsing fails when the argument is absent.
    pub required: bool,
    /// Accepts any number of trailing values.
    pub variadic: bool,
}

impl PositionalSpec {
    /// A mandatory positional.
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            required: true,
            variadic: false,
        }
    }

    /// An optional positional.
    pub fn optional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            required: false,
            variadic: false,
        }
    }

    /// Lets the positional take every remaining value.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Sets the help text.
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

// --- `config.toml` MODEL ---

/// Represents the deserialized structure of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    /// Seeds `USER`.
    pub user: String,
    /// Seeds `HOME` and the initial `PWD`.
    pub home: String,
    /// Seeds `PATH`.
    pub path: String,
    /// Prompt template. `{user}` and `{cwd}` are replaced at render time.
    pub prompt: String,
    /// Lines of input history kept per session.
    pub history_limit: usize,
    /// Extra or overriding environment variables, applied after the defaults.
    pub env: BTreeMap<String, String>,
    /// Aliases registered when the shell starts.
    pub aliases: BTreeMap<String, String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("cls".to_string(), "clear".to_string());
        aliases.insert("h".to_string(), "history".to_string());

        Self {
            user: DEFAULT_USER.to_string(),
            home: DEFAULT_HOME.to_string(),
            path: DEFAULT_PATH.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            env: BTreeMap::new(),
            aliases,
        }
    }
}
