// src/core/arg_parser.rs

use crate::{
    core::commons::escape_markup,
    models::{FlagDefinition, FlagType, FlagValue, PositionalSpec},
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

// --- ERRORS ---

/// A user-facing argument error. Every variant names the flag and the rule it broke.
///
/// Values are kept as typed; the message is escaped for markup where it is printed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlagError {
    /// A flag the schema does not declare, as typed.
    #[error("FlagError: unknown flag '{0}'")]
    UnknownFlag(String),
    /// A required flag was not given.
    #[error("FlagError: missing required flag '--{0}'")]
    MissingRequired(String),
    /// A string or number flag came without its value.
    #[error("FlagError: flag '--{0}' requires a value")]
    MissingValue(String),
    /// `--flag=value` used on a boolean flag.
    #[error("FlagError: boolean flag '--{0}' does not take a value")]
    BooleanWithValue(String),
    /// A number flag got something that is not a finite number.
    #[error("FlagError: flag '--{flag}' expects a number, got '{value}'")]
    InvalidNumber {
        /// The flag's canonical name.
        flag: String,
        /// The value as typed.
        value: String,
    },
    /// A value outside the flag's allowed choices.
    #[error("FlagError: flag '--{flag}' does not accept '{value}' (allowed: {allowed})")]
    InvalidChoice {
        /// The flag's canonical name.
        flag: String,
        /// The value as typed.
        value: String,
        /// The accepted values, comma separated.
        allowed: String,
    },
    /// Two mutually exclusive flags were both given.
    #[error("FlagError: flags '--{0}' and '--{1}' cannot be used together")]
    Conflict(String, String),
    /// An exclusive flag was combined with positional arguments.
    #[error("FlagError: flag '--{0}' cannot be combined with positional arguments")]
    ExclusiveWithPositional(String),
    /// A value-taking flag appeared inside a short flag cluster.
    #[error("FlagError: flag '-{flag}' in group '-{group}' takes a value and cannot be grouped")]
    GroupedNonBoolean {
        /// The offending letter.
        flag: String,
        /// The whole cluster, without its dash.
        group: String,
    },
    /// A required positional argument is absent.
    #[error("FlagError: missing required argument <{0}>")]
    MissingPositional(String),
}

/// An error in a schema declaration, reported when the schema is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two flags share a name or alias.
    #[error("Flag name or alias '{0}' is declared more than once.")]
    DuplicateName(String),
    /// A default that does not cast to the flag's type.
    #[error("Flag '--{flag}' has an invalid default '{value}': {reason}")]
    InvalidDefault {
        /// The flag's canonical name.
        flag: String,
        /// The declared default.
        value: String,
        /// Why the cast failed.
        reason: String,
    },
    /// A conflict list names a flag the schema does not declare.
    #[error("Flag '--{flag}' conflicts with undeclared flag '--{other}'.")]
    UnknownConflict {
        /// The flag declaring the conflict.
        flag: String,
        /// The undeclared name it refers to.
        other: String,
    },
    /// Choices declared on a number or boolean flag.
    #[error("Flag '--{0}' declares choices but is not a string flag.")]
    ChoicesOnNonString(String),
}

// --- SCHEMA ---

/// An immutable, validated list of flag definitions with its alias table.
#[derive(Debug, Clone, Default)]
pub struct FlagSchema {
    flags: Vec<FlagDefinition>,
    /// Typed defaults, one per flag, cast once at construction.
    defaults: Vec<Option<FlagValue>>,
    /// Maps every name and alias (without dashes) to an index into `flags`.
    lookup: HashMap<String, usize>,
}

impl FlagSchema {
    /// Validates the definitions and builds the alias table.
    ///
    /// Conflict lists are normalized to canonical flag names, so a flag may
    /// name its rival by any of its aliases.
    pub fn new(flags: Vec<FlagDefinition>) -> Result<Self, SchemaError> {
        let mut lookup = HashMap::new();
        for (index, def) in flags.iter().enumerate() {
            for key in std::iter::once(&def.name).chain(def.aliases.iter()) {
                if lookup.insert(key.clone(), index).is_some() {
                    return Err(SchemaError::DuplicateName(key.clone()));
                }
            }
        }

        let names: Vec<String> = flags.iter().map(|d| d.name.clone()).collect();
        let mut flags = flags;
        for def in flags.iter_mut() {
            if def.choices.is_some() && def.value_type != FlagType::String {
                return Err(SchemaError::ChoicesOnNonString(def.name.clone()));
            }
            let mut canonical = Vec::with_capacity(def.conflicts_with.len());
            for other in &def.conflicts_with {
                let target = lookup
                    .get(other)
                    .and_then(|i| names.get(*i))
                    .ok_or_else(|| SchemaError::UnknownConflict {
                        flag: def.name.clone(),
                        other: other.clone(),
                    })?;
                canonical.push(target.clone());
            }
            def.conflicts_with = canonical;
        }

        let defaults = flags
            .iter()
            .map(resolve_default)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            flags,
            defaults,
            lookup,
        })
    }

    /// A schema with no flags, as raw commands use.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The validated definitions, in declaration order.
    pub fn flags(&self) -> &[FlagDefinition] {
        &self.flags
    }

    /// Whether the schema declares no flags.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Looks a flag up by its name or any alias, with or without leading dashes.
    pub fn resolve(&self, key: &str) -> Option<&FlagDefinition> {
        self.lookup
            .get(key.trim_start_matches('-'))
            .and_then(|i| self.flags.get(*i))
    }
}

fn resolve_default(def: &FlagDefinition) -> Result<Option<FlagValue>, SchemaError> {
    match (&def.default, def.value_type) {
        (None, FlagType::Boolean) => Ok(Some(FlagValue::Bool(false))),
        (None, _) => Ok(None),
        (Some(raw), _) => cast_value(def, raw)
            .map(Some)
            .map_err(|e| SchemaError::InvalidDefault {
                flag: def.name.clone(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

// --- PARSED ARGUMENTS ---

/// The typed result of parsing one command line against a schema.
///
/// Every flag declared by the schema has a key in `flags`, holding its default
/// when the flag was not given. No other keys ever appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArguments {
    flags: BTreeMap<String, Option<FlagValue>>,
    present: BTreeSet<String>,
    positionals: Vec<String>,
}

impl ParsedArguments {
    /// Builds arguments for a command that takes its tokens verbatim.
    pub fn raw(tokens: &[String]) -> Self {
        Self {
            flags: BTreeMap::new(),
            present: BTreeSet::new(),
            positionals: tokens.iter().map(|t| escape_markup(t)).collect(),
        }
    }

    /// Returns the value of a flag, `None` if it has no value and no default.
    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name).and_then(Option::as_ref)
    }

    /// The value of a string flag.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.flag(name) {
            Some(FlagValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// The value of a number flag.
    pub fn get_number(&self, name: &str) -> Option<f64> {
        match self.flag(name) {
            Some(FlagValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Whether a boolean flag is set. Unknown names read as `false`.
    pub fn get_bool(&self, name: &str) -> bool {
        matches!(self.flag(name), Some(FlagValue::Bool(true)))
    }

    /// Whether the flag was given explicitly (defaults do not count).
    pub fn is_present(&self, name: &str) -> bool {
        self.present.contains(name)
    }

    /// The declared flag names, in sorted order.
    pub fn flag_names(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    /// Positional arguments, markup-escaped.
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// The positional at `index`, if given.
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positionals.get(index).map(String::as_str)
    }

    /// Consumes the arguments, keeping only the positionals.
    pub fn into_positionals(self) -> Vec<String> {
        self.positionals
    }
}

// --- PARSER ---

/// Parses the tokens that follow a command name against its flag schema.
///
/// # Logic (left to right):
/// - `--` ends flag parsing; everything after it is positional.
/// - `--name=value` and `--name value` assign a value to a long flag. The `=`
///   form is rejected for booleans; a bare `--name` sets a boolean to true.
/// - `-xyz` is a cluster of short boolean flags. Grouping a flag that takes a
///   value is an error.
/// - `-x` behaves like a long flag, but only consumes the next token as its
///   value when that token does not start with `-`. This means a negative
///   number cannot follow a short flag; use `--name -5` or `--name=-5`.
/// - Anything else is a positional argument.
///
/// Strings and positionals are escaped for markup. After the scan, required
/// flags, conflicts, exclusivity and required positionals are checked.
pub fn parse_arguments(
    tokens: &[String],
    schema: &FlagSchema,
    positional_specs: &[PositionalSpec],
) -> Result<ParsedArguments, FlagError> {
    let mut values: BTreeMap<String, Option<FlagValue>> = schema
        .flags
        .iter()
        .zip(schema.defaults.iter())
        .map(|(def, default)| (def.name.clone(), default.clone()))
        .collect();
    let mut present = BTreeSet::new();
    let mut positionals = Vec::new();

    let mut record = |def: &FlagDefinition, value: FlagValue| {
        values.insert(def.name.clone(), Some(value));
        present.insert(def.name.clone());
    };

    let mut tokens_iter = tokens.iter().peekable();
    while let Some(token) = tokens_iter.next() {
        if token == "--" {
            positionals.extend(tokens_iter.by_ref().map(|t| escape_markup(t)));
            break;
        }

        if let Some(long) = token.strip_prefix("--") {
            let (name, inline_value) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let def = schema
                .resolve(name)
                .ok_or_else(|| FlagError::UnknownFlag(format!("--{}", name)))?;

            let value = match (def.value_type, inline_value) {
                (FlagType::Boolean, Some(_)) => {
                    return Err(FlagError::BooleanWithValue(def.name.clone()));
                }
                (FlagType::Boolean, None) => FlagValue::Bool(true),
                (_, Some(raw)) => cast_value(def, raw)?,
                (_, None) => {
                    let raw = tokens_iter
                        .next()
                        .ok_or_else(|| FlagError::MissingValue(def.name.clone()))?;
                    cast_value(def, raw)?
                }
            };
            record(def, value);
            continue;
        }

        let short = match token.strip_prefix('-') {
            Some(short) if !short.is_empty() => short,
            // A lone `-` (or no dash at all) is positional.
            _ => {
                positionals.push(escape_markup(token));
                continue;
            }
        };

        if short.chars().count() > 1 {
            // Grouped short booleans, e.g. `-rf`.
            for letter in short.chars() {
                let key = letter.to_string();
                let def = schema
                    .resolve(&key)
                    .ok_or_else(|| FlagError::UnknownFlag(format!("-{}", letter)))?;
                if def.value_type != FlagType::Boolean {
                    return Err(FlagError::GroupedNonBoolean {
                        flag: key,
                        group: short.to_string(),
                    });
                }
                record(def, FlagValue::Bool(true));
            }
            continue;
        }

        let def = schema
            .resolve(short)
            .ok_or_else(|| FlagError::UnknownFlag(format!("-{}", short)))?;
        let value = if def.value_type == FlagType::Boolean {
            FlagValue::Bool(true)
        } else {
            match tokens_iter.next_if(|next| !next.starts_with('-')) {
                Some(raw) => cast_value(def, raw)?,
                None => return Err(FlagError::MissingValue(def.name.clone())),
            }
        };
        record(def, value);
    }

    validate(schema, &present, &positionals, positional_specs)?;

    log::trace!(
        "Parsed flags {:?} with positionals {:?}",
        present,
        positionals
    );
    Ok(ParsedArguments {
        flags: values,
        present,
        positionals,
    })
}

/// Casts a raw token to the flag's declared type.
fn cast_value(def: &FlagDefinition, raw: &str) -> Result<FlagValue, FlagError> {
    match def.value_type {
        FlagType::String => {
            if let Some(allowed) = &def.choices
                && !allowed.iter().any(|choice| choice == raw)
            {
                return Err(FlagError::InvalidChoice {
                    flag: def.name.clone(),
                    value: raw.to_string(),
                    allowed: allowed.join(", "),
                });
            }
            Ok(FlagValue::Text(escape_markup(raw)))
        }
        FlagType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FlagValue::Number)
            .ok_or_else(|| FlagError::InvalidNumber {
                flag: def.name.clone(),
                value: raw.to_string(),
            }),
        FlagType::Boolean => Ok(FlagValue::Bool(matches!(
            raw.trim().to_lowercase().as_str(),
            "true" | "1"
        ))),
    }
}

fn validate(
    schema: &FlagSchema,
    present: &BTreeSet<String>,
    positionals: &[String],
    positional_specs: &[PositionalSpec],
) -> Result<(), FlagError> {
    for def in &schema.flags {
        if def.required && !present.contains(&def.name) {
            return Err(FlagError::MissingRequired(def.name.clone()));
        }
    }

    for def in schema.flags.iter().filter(|d| present.contains(&d.name)) {
        if let Some(other) = def.conflicts_with.iter().find(|o| present.contains(*o)) {
            return Err(FlagError::Conflict(def.name.clone(), other.clone()));
        }
        if def.exclusive && !positionals.is_empty() {
            return Err(FlagError::ExclusiveWithPositional(def.name.clone()));
        }
    }

    // An exclusive flag that was given legitimately excuses missing positionals.
    let exclusive_given = schema
        .flags
        .iter()
        .any(|d| d.exclusive && present.contains(&d.name));
    if !exclusive_given {
        for (index, spec) in positional_specs.iter().enumerate() {
            if spec.required && positionals.get(index).is_none() {
                return Err(FlagError::MissingPositional(spec.name.clone()));
            }
        }
    }

    Ok(())
}

// --- USAGE ---

/// Renders a one-line usage synopsis from the schema. Hidden flags are omitted.
pub fn usage_line(command: &str, schema: &FlagSchema, positional_specs: &[PositionalSpec]) -> String {
    let mut parts = vec![command.to_string()];
    for def in schema.flags.iter().filter(|d| !d.hidden) {
        let short = def.aliases.iter().find(|a| a.chars().count() == 1);
        let flag = match short {
            Some(s) => format!("-{}|--{}", s, def.name),
            None => format!("--{}", def.name),
        };
        let flag = match def.value_type {
            FlagType::Boolean => flag,
            _ => format!("{} <{}>", flag, def.value_type),
        };
        parts.push(if def.required {
            flag
        } else {
            format!("[{}]", flag)
        });
    }
    for spec in positional_specs {
        let dots = if spec.variadic { "..." } else { "" };
        parts.push(if spec.required {
            format!("<{}>{}", spec.name, dots)
        } else {
            format!("[{}]{}", spec.name, dots)
        });
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn sort_schema() -> FlagSchema {
        FlagSchema::new(vec![
            FlagDefinition::boolean("reverse").alias("r"),
            FlagDefinition::boolean("force").alias("f"),
            FlagDefinition::number("limit").alias("n"),
            FlagDefinition::string("format")
                .alias("F")
                .choices(&["json", "text"])
                .default_value("text"),
        ])
        .unwrap()
    }

    fn parse(line: &str, schema: &FlagSchema) -> Result<ParsedArguments, FlagError> {
        parse_arguments(&args(line), schema, &[])
    }

    #[test]
    fn test_defaults_populate_every_declared_flag() {
        let schema = sort_schema();
        let parsed = parse("", &schema).unwrap();

        let names: Vec<_> = parsed.flag_names().collect();
        assert_eq!(names, vec!["force", "format", "limit", "reverse"]);
        assert!(!parsed.get_bool("reverse"));
        assert_eq!(parsed.get_str("format"), Some("text"));
        assert_eq!(parsed.get_number("limit"), None);
        assert!(!parsed.is_present("format"));
    }

    #[test]
    fn test_grouped_short_flags_equal_separate_flags() {
        let schema = sort_schema();
        assert_eq!(
            parse("-rf", &schema).unwrap(),
            parse("-r -f", &schema).unwrap()
        );
    }

    #[test]
    fn test_long_flag_value_forms() {
        let schema = sort_schema();
        let a = parse("--limit=5 file", &schema).unwrap();
        let b = parse("--limit 5 file", &schema).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get_number("limit"), Some(5.0));
        assert_eq!(a.positionals(), &["file".to_string()]);

        // Long flags always take the next token, even a negative number.
        let c = parse("--limit -3", &schema).unwrap();
        assert_eq!(c.get_number("limit"), Some(-3.0));
    }

    #[test]
    fn test_boolean_rejects_inline_value() {
        let schema = sort_schema();
        assert_eq!(
            parse("--reverse=true", &schema),
            Err(FlagError::BooleanWithValue("reverse".into()))
        );
    }

    #[test]
    fn test_short_flag_value_heuristic() {
        let schema = sort_schema();
        let parsed = parse("-n 7 rest", &schema).unwrap();
        assert_eq!(parsed.get_number("limit"), Some(7.0));
        assert_eq!(parsed.positionals(), &["rest".to_string()]);

        // A value that looks like a flag is never consumed by a short flag.
        assert_eq!(
            parse("-n -5", &schema),
            Err(FlagError::MissingValue("limit".into()))
        );
        assert_eq!(
            parse("-n", &schema),
            Err(FlagError::MissingValue("limit".into()))
        );
    }

    #[test]
    fn test_grouping_non_boolean_is_an_error() {
        let schema = sort_schema();
        assert_eq!(
            parse("-rn", &schema),
            Err(FlagError::GroupedNonBoolean {
                flag: "n".into(),
                group: "rn".into()
            })
        );
    }

    #[test]
    fn test_unknown_flags() {
        let schema = sort_schema();
        assert_eq!(
            parse("--nope", &schema),
            Err(FlagError::UnknownFlag("--nope".into()))
        );
        assert_eq!(
            parse("-x", &schema),
            Err(FlagError::UnknownFlag("-x".into()))
        );
        assert_eq!(
            parse("-rx", &schema),
            Err(FlagError::UnknownFlag("-x".into()))
        );
    }

    #[test]
    fn test_double_dash_ends_flag_parsing() {
        let schema = sort_schema();
        let parsed = parse("-r -- -f --limit", &schema).unwrap();
        assert!(parsed.get_bool("reverse"));
        assert!(!parsed.get_bool("force"));
        assert_eq!(parsed.positionals(), &["-f".to_string(), "--limit".to_string()]);
    }

    #[test]
    fn test_lone_dash_is_positional() {
        let schema = sort_schema();
        let parsed = parse("-", &schema).unwrap();
        assert_eq!(parsed.positionals(), &["-".to_string()]);
    }

    #[test]
    fn test_number_casting_failure() {
        let schema = sort_schema();
        assert_eq!(
            parse("--limit ten", &schema),
            Err(FlagError::InvalidNumber {
                flag: "limit".into(),
                value: "ten".into()
            })
        );
        assert!(parse("--limit=inf", &schema).is_err());
    }

    #[test]
    fn test_enumerated_values() {
        let schema = sort_schema();
        assert_eq!(
            parse("--format json", &schema).unwrap().get_str("format"),
            Some("json")
        );
        let err = parse("-F yaml", &schema).unwrap_err();
        assert_eq!(
            err,
            FlagError::InvalidChoice {
                flag: "format".into(),
                value: "yaml".into(),
                allowed: "json, text".into()
            }
        );
        assert!(err.to_string().contains("json, text"));
    }

    #[test]
    fn test_required_flag_violation_names_the_flag() {
        let schema = FlagSchema::new(vec![FlagDefinition::string("target").required()]).unwrap();
        for line in ["", "positional", "-- --target x"] {
            let err = parse(line, &schema).unwrap_err();
            assert_eq!(err, FlagError::MissingRequired("target".into()));
            assert!(err.to_string().contains("--target"));
        }
        assert!(parse("--target x", &schema).is_ok());
    }

    #[test]
    fn test_conflicting_flags() {
        let schema = FlagSchema::new(vec![
            FlagDefinition::boolean("all").alias("a").conflicts_with("clear"),
            FlagDefinition::boolean("clear"),
        ])
        .unwrap();
        assert_eq!(
            parse("-a --clear", &schema),
            Err(FlagError::Conflict("all".into(), "clear".into()))
        );
        assert!(parse("-a", &schema).is_ok());
        assert!(parse("--clear", &schema).is_ok());
    }

    #[test]
    fn test_conflicts_declared_by_alias_are_normalized() {
        let schema = FlagSchema::new(vec![
            FlagDefinition::boolean("quiet").alias("q"),
            FlagDefinition::boolean("verbose").conflicts_with("-q"),
        ])
        .unwrap();
        assert_eq!(
            parse("--verbose -q", &schema),
            Err(FlagError::Conflict("verbose".into(), "quiet".into()))
        );
    }

    #[test]
    fn test_exclusive_flag_with_positionals() {
        let schema = FlagSchema::new(vec![FlagDefinition::boolean("clear").exclusive()]).unwrap();
        assert_eq!(
            parse("--clear extra", &schema),
            Err(FlagError::ExclusiveWithPositional("clear".into()))
        );
        assert!(parse("--clear", &schema).is_ok());
    }

    #[test]
    fn test_required_positionals() {
        let schema = FlagSchema::empty();
        let specs = [PositionalSpec::required("id")];
        assert_eq!(
            parse_arguments(&[], &schema, &specs),
            Err(FlagError::MissingPositional("id".into()))
        );
        assert!(parse_arguments(&args("3"), &schema, &specs).is_ok());
    }

    #[test]
    fn test_strings_and_positionals_are_sanitized() {
        let schema = FlagSchema::new(vec![FlagDefinition::string("title")]).unwrap();
        let parsed = parse("--title <b> <script>", &schema).unwrap();
        assert_eq!(parsed.get_str("title"), Some("&lt;b&gt;"));
        assert_eq!(parsed.positionals(), &["&lt;script&gt;".to_string()]);
    }

    #[test]
    fn test_errors_carry_the_value_as_typed() {
        let schema = sort_schema();
        assert_eq!(
            parse("--limit <ten>", &schema),
            Err(FlagError::InvalidNumber {
                flag: "limit".into(),
                value: "<ten>".into()
            })
        );
        let err = parse("-F a&b", &schema).unwrap_err();
        assert!(err.to_string().contains("'a&b'"));
    }

    #[test]
    fn test_schema_construction_errors() {
        assert_eq!(
            FlagSchema::new(vec![
                FlagDefinition::boolean("recursive").alias("r"),
                FlagDefinition::boolean("reverse").alias("r"),
            ])
            .unwrap_err(),
            SchemaError::DuplicateName("r".into())
        );
        assert!(matches!(
            FlagSchema::new(vec![FlagDefinition::number("n").default_value("many")]),
            Err(SchemaError::InvalidDefault { .. })
        ));
        assert!(matches!(
            FlagSchema::new(vec![FlagDefinition::boolean("a").conflicts_with("b")]),
            Err(SchemaError::UnknownConflict { .. })
        ));
    }

    #[test]
    fn test_boolean_defaults_are_cast() {
        let schema = FlagSchema::new(vec![
            FlagDefinition::boolean("color").default_value("1"),
            FlagDefinition::boolean("pager").default_value("no"),
        ])
        .unwrap();
        let parsed = parse("", &schema).unwrap();
        assert!(parsed.get_bool("color"));
        assert!(!parsed.get_bool("pager"));
    }

    #[test]
    fn test_usage_line_omits_hidden_flags() {
        let schema = FlagSchema::new(vec![
            FlagDefinition::boolean("reverse").alias("r"),
            FlagDefinition::number("limit"),
            FlagDefinition::boolean("debug").hidden(),
        ])
        .unwrap();
        let usage = usage_line("sort", &schema, &[PositionalSpec::optional("line").variadic()]);
        assert_eq!(usage, "sort [-r|--reverse] [--limit <number>] [line]...");
    }
}
