// src/core/registry.rs

use crate::constants::MAX_ALIAS_DEPTH;
use crate::core::arg_parser::{
    FlagError, FlagSchema, ParsedArguments, SchemaError, parse_arguments, usage_line,
};
use crate::core::tokenizer::tokenize;
use crate::models::{FlagDefinition, PositionalSpec};
use crate::system::context::CommandContext;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// The future a handler returns. Handlers run on the local task set, so it
/// does not need to be `Send`.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;
/// A registered handler, shared by every invocation of its command.
pub type HandlerFn = Rc<dyn Fn(ParsedArguments, CommandContext) -> HandlerFuture>;

// --- COMMAND DEFINITIONS ---

/// A command that receives its tokens verbatim as positionals.
pub struct RawCommand {
    /// The name the command is invoked by.
    pub name: String,
    /// One-line summary shown by `help`.
    pub description: String,
    /// Hidden commands are left out of `help` listings.
    pub hidden: bool,
    /// The handler invoked with the command's arguments.
    pub handler: HandlerFn,
}

impl RawCommand {
    /// A visible raw command with no description.
    pub fn new(
        name: &str,
        handler: impl Fn(ParsedArguments, CommandContext) -> HandlerFuture + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            hidden: false,
            handler: Rc::new(handler),
        }
    }

    /// Sets the one-line summary.
    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Hides the command from `help` listings.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A command whose tokens are parsed against a flag schema before dispatch.
pub struct SchemaCommand {
    /// The name the command is invoked by.
    pub name: String,
    /// One-line summary shown by `help`.
    pub description: String,
    /// Hidden commands are left out of `help` listings.
    pub hidden: bool,
    /// Flag definitions, validated at registration.
    pub flags: Vec<FlagDefinition>,
    /// Positional arguments, for usage and presence checks.
    pub positionals: Vec<PositionalSpec>,
    /// The handler invoked with the parsed arguments.
    pub handler: HandlerFn,
}

impl SchemaCommand {
    /// A visible command with an empty schema.
    pub fn new(
        name: &str,
        handler: impl Fn(ParsedArguments, CommandContext) -> HandlerFuture + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            hidden: false,
            flags: Vec::new(),
            positionals: Vec::new(),
            handler: Rc::new(handler),
        }
    }

    /// Sets the one-line summary.
    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Hides the command from `help` listings.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Adds a flag definition.
    pub fn flag(mut self, flag: FlagDefinition) -> Self {
        self.flags.push(flag);
        self
    }

    /// Adds a positional argument.
    pub fn positional(mut self, spec: PositionalSpec) -> Self {
        self.positionals.push(spec);
        self
    }
}

/// What a command module hands to the registry.
pub enum CommandSpec {
    /// Tokens are passed through as positionals.
    Raw(RawCommand),
    /// Tokens are parsed against a flag schema.
    Schema(SchemaCommand),
}

impl From<RawCommand> for CommandSpec {
    fn from(command: RawCommand) -> Self {
        CommandSpec::Raw(command)
    }
}

impl From<SchemaCommand> for CommandSpec {
    fn from(command: SchemaCommand) -> Self {
        CommandSpec::Schema(command)
    }
}

/// How a registered command turns tokens into arguments.
#[derive(Debug)]
pub enum ArgumentMode {
    /// Tokens become positionals, markup-escaped.
    Raw,
    /// Tokens are parsed against the validated schema.
    Schema {
        /// The validated flag schema.
        schema: FlagSchema,
        /// Declared positional arguments.
        positionals: Vec<PositionalSpec>,
    },
}

/// The canonical, validated form every `CommandSpec` is normalised into.
pub struct Command {
    /// The canonical command name.
    pub name: String,
    /// One-line summary shown by `help`.
    pub description: String,
    /// Whether `help` leaves the command out.
    pub hidden: bool,
    /// How tokens become arguments.
    pub mode: ArgumentMode,
    handler: HandlerFn,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("hidden", &self.hidden)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl TryFrom<CommandSpec> for Command {
    type Error = SchemaError;

    fn try_from(spec: CommandSpec) -> Result<Self, Self::Error> {
        Ok(match spec {
            CommandSpec::Raw(raw) => Command {
                name: raw.name,
                description: raw.description,
                hidden: raw.hidden,
                mode: ArgumentMode::Raw,
                handler: raw.handler,
            },
            CommandSpec::Schema(cmd) => Command {
                mode: ArgumentMode::Schema {
                    schema: FlagSchema::new(cmd.flags)?,
                    positionals: cmd.positionals,
                },
                name: cmd.name,
                description: cmd.description,
                hidden: cmd.hidden,
                handler: cmd.handler,
            },
        })
    }
}

impl Command {
    /// Turns the tokens after the command name into arguments.
    pub fn parse(&self, tokens: &[String]) -> Result<ParsedArguments, FlagError> {
        match &self.mode {
            ArgumentMode::Raw => Ok(ParsedArguments::raw(tokens)),
            ArgumentMode::Schema {
                schema,
                positionals,
            } => parse_arguments(tokens, schema, positionals),
        }
    }

    /// Runs the handler.
    pub fn invoke(&self, args: ParsedArguments, ctx: CommandContext) -> HandlerFuture {
        (self.handler)(args, ctx)
    }

    /// A one-line usage synopsis.
    pub fn usage(&self) -> String {
        match &self.mode {
            ArgumentMode::Raw => format!("{} [args]...", self.name),
            ArgumentMode::Schema {
                schema,
                positionals,
            } => usage_line(&self.name, schema, positionals),
        }
    }

    /// Visible flag definitions, empty for raw commands.
    pub fn visible_flags(&self) -> Vec<&FlagDefinition> {
        match &self.mode {
            ArgumentMode::Raw => Vec::new(),
            ArgumentMode::Schema { schema, .. } => {
                schema.flags().iter().filter(|d| !d.hidden).collect()
            }
        }
    }
}

// --- REGISTRY ---

/// The outcome of following a name through the alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasResolution {
    /// The name to look up in the registry.
    pub command: String,
    /// Words contributed by alias targets, to be placed before the user's arguments.
    pub args: Vec<String>,
    /// How many alias hops were followed.
    pub hops: usize,
    /// Whether the hop limit cut resolution short.
    pub truncated: bool,
}

/// Registered commands and the alias table.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Rc<Command>>,
    aliases: BTreeMap<String, String>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalises and registers a command. Returns whether an existing command
    /// of the same name was overwritten.
    pub fn register(&mut self, spec: impl Into<CommandSpec>) -> Result<bool, SchemaError> {
        let command = Command::try_from(spec.into())?;
        let name = command.name.clone();
        let replaced = self.commands.insert(name.clone(), Rc::new(command)).is_some();
        if replaced {
            log::warn!("Command '{}' was registered again; the previous one was replaced.", name);
        } else {
            log::debug!("Registered command '{}'", name);
        }
        Ok(replaced)
    }

    /// Looks a command up by its canonical name. Aliases are not followed.
    pub fn get(&self, name: &str) -> Option<Rc<Command>> {
        self.commands.get(name).cloned()
    }

    /// Commands sorted by name, optionally including hidden ones.
    pub fn list(&self, include_hidden: bool) -> Vec<Rc<Command>> {
        let mut commands: Vec<Rc<Command>> = self
            .commands
            .values()
            .filter(|c| include_hidden || !c.hidden)
            .cloned()
            .collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    /// Defines or replaces an alias, returning the previous target.
    pub fn set_alias(&mut self, name: &str, target: &str) -> Option<String> {
        self.aliases.insert(name.to_string(), target.to_string())
    }

    /// Removes an alias. Returns whether it existed.
    pub fn remove_alias(&mut self, name: &str) -> bool {
        self.aliases.remove(name).is_some()
    }

    /// The target of an alias.
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// All aliases, sorted by name.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Follows `name` through the alias table, at most `MAX_ALIAS_DEPTH` hops.
    ///
    /// Each alias target is split into words; its first word is the next name
    /// and the rest are prepended to the arguments collected so far. Hitting
    /// the hop limit stops at the last resolved name and logs a warning. An
    /// alias whose target leads back to an already visited name (`ls='ls -l'`)
    /// stops there quietly. The alias table is never modified.
    pub fn resolve(&self, name: &str) -> AliasResolution {
        let mut current = name.to_string();
        let mut args: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::from([current.clone()]);
        let mut hops = 0;
        let mut truncated = false;

        while let Some(target) = self.aliases.get(&current) {
            if hops == MAX_ALIAS_DEPTH {
                log::warn!(
                    "Alias chain starting at '{}' exceeds {} hops; using '{}'.",
                    name,
                    MAX_ALIAS_DEPTH,
                    current
                );
                truncated = true;
                break;
            }
            let words = tokenize(target)
                .unwrap_or_else(|_| target.split_whitespace().map(String::from).collect());
            let Some((head, rest)) = words.split_first() else {
                break;
            };
            hops += 1;
            args.splice(0..0, rest.iter().cloned());
            current = head.clone();
            if !visited.insert(current.clone()) {
                break;
            }
        }

        log::trace!("Resolved '{}' to '{}' {:?} in {} hops", name, current, args, hops);
        AliasResolution {
            command: current,
            args,
            hops,
            truncated,
        }
    }
}
