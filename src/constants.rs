// src/constants.rs

/// The maximum number of alias hops followed before resolution gives up.
pub const MAX_ALIAS_DEPTH: usize = 10;

/// The name of the directory containing consh configuration (in ~/.config/).
pub const CONFIG_DIR_NAME: &str = "consh";

/// The name of the main configuration file (inside the config directory).
pub const CONFIG_FILENAME: &str = "config.toml";

/// The value seeded into `SHELL` for every session.
pub const SHELL_IDENTIFIER: &str = "/bin/consh";

/// The value seeded into `TERM` for every session.
pub const TERMINAL_IDENTIFIER: &str = "consh-term";

/// Default `USER` when the config sets none.
pub const DEFAULT_USER: &str = "guest";
/// Default `HOME`, also the initial `PWD`.
pub const DEFAULT_HOME: &str = "/home/guest";
/// Default `PATH`.
pub const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";
/// Default prompt template.
pub const DEFAULT_PROMPT: &str = "{user}@desktop:{cwd}$ ";
/// Default number of history lines kept per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// ANSI sequence prepended to every line printed through `print_error`.
pub const ERROR_STYLE: &str = "\x1b[31m";
/// ANSI sequence that ends the error style.
pub const RESET_STYLE: &str = "\x1b[0m";
