//! Command line parsing and shorthand alias resolution.
//!
//! Everything after the binary name is split into command tokens and
//! flag tokens. Single-letter shorthands (`terra p` for `terraform
//! plan`, `-a` for `-auto-approve`) are expanded here, during parsing,
//! so the rest of the pipeline only ever sees canonical names.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// Matches `-key`, `--key`, `-key=value` and `--key=value` tokens.
static FLAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-{1,2}([a-z][a-z-]*)(?:=([\w./-]+))?$").expect("flag pattern is valid")
});

/// Expand a single-letter command shorthand to its canonical terraform
/// subcommand. Tokens without a shorthand pass through unchanged.
#[must_use]
pub fn resolve_command_alias(token: &str) -> &str {
    match token {
        "a" => "apply",
        "c" => "console",
        "d" => "destroy",
        "e" => "env",
        "f" => "fmt",
        "i" => "import",
        "o" => "output",
        "p" => "plan",
        "r" => "refresh",
        "s" => "show",
        "t" => "taint",
        "u" => "untaint",
        "v" => "validate",
        "w" => "workspace",
        other => other,
    }
}

/// Expand a flag key shorthand to its canonical name.
#[must_use]
pub fn resolve_flag_alias(key: &str) -> &str {
    match key {
        "a" | "auto" => "auto-approve",
        other => other,
    }
}

/// Value carried by a parsed flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// Flag given without a value (`-dry-run`).
    Absent,
    /// Literal `true`/`false` value.
    Bool(bool),
    /// Any other value, lower-cased.
    Text(String),
}

impl FlagValue {
    fn from_literal(raw: &str) -> Self {
        match raw {
            "true" => FlagValue::Bool(true),
            "false" => FlagValue::Bool(false),
            other => FlagValue::Text(other.to_lowercase()),
        }
    }
}

/// A single flag token, key alias-resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFlag {
    pub key: String,
    pub value: FlagValue,
}

/// A parsed command line: command tokens (aliases expanded) plus flags
/// in encounter order. Built once per process run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub commands: Vec<String>,
    pub flags: Vec<ParsedFlag>,
}

impl Invocation {
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.iter().any(|flag| flag.key == key)
    }

    /// The watch request, if any: `Some(Some(dir))` for an explicit
    /// target directory, `Some(None)` when the working directory
    /// should be watched instead.
    #[must_use]
    pub fn watch_request(&self) -> Option<Option<PathBuf>> {
        self.flags
            .iter()
            .find(|flag| flag.key == "watch")
            .map(|flag| match &flag.value {
                FlagValue::Text(dir) => Some(PathBuf::from(dir)),
                FlagValue::Absent | FlagValue::Bool(_) => None,
            })
    }
}

/// Split raw invocation tokens into command tokens and flags, expanding
/// shorthand aliases as they are encountered.
///
/// Without any command token the invocation defaults to terraform's
/// help screen and all flags are dropped.
#[must_use]
pub fn parse<I>(tokens: I) -> Invocation
where
    I: IntoIterator<Item = String>,
{
    let mut invocation = Invocation::default();
    for token in tokens {
        if let Some(captures) = FLAG_PATTERN.captures(&token) {
            let key = resolve_flag_alias(&captures[1]).to_string();
            let value = captures
                .get(2)
                .map_or(FlagValue::Absent, |m| FlagValue::from_literal(m.as_str()));
            invocation.flags.push(ParsedFlag { key, value });
        } else {
            invocation
                .commands
                .push(resolve_command_alias(&token).to_string());
        }
    }

    if invocation.commands.is_empty() {
        return Invocation {
            commands: vec!["--help".to_string()],
            flags: Vec::new(),
        };
    }
    invocation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_command_aliases_resolve() {
        for (short, long) in [
            ("a", "apply"),
            ("c", "console"),
            ("d", "destroy"),
            ("e", "env"),
            ("f", "fmt"),
            ("i", "import"),
            ("o", "output"),
            ("p", "plan"),
            ("r", "refresh"),
            ("s", "show"),
            ("t", "taint"),
            ("u", "untaint"),
            ("v", "validate"),
            ("w", "workspace"),
        ] {
            assert_eq!(resolve_command_alias(short), long);
        }
    }

    #[test]
    fn test_unknown_command_passes_through() {
        assert_eq!(resolve_command_alias("plan"), "plan");
        assert_eq!(resolve_command_alias("graph"), "graph");
    }

    #[test]
    fn test_flag_aliases_resolve() {
        assert_eq!(resolve_flag_alias("a"), "auto-approve");
        assert_eq!(resolve_flag_alias("auto"), "auto-approve");
        assert_eq!(resolve_flag_alias("watch"), "watch");
    }

    #[test]
    fn test_parse_splits_commands_and_flags() {
        let invocation = parse(tokens(&["plan", "--out=my.plan"]));
        assert_eq!(invocation.commands, vec!["plan"]);
        assert_eq!(
            invocation.flags,
            vec![ParsedFlag {
                key: "out".to_string(),
                value: FlagValue::Text("my.plan".to_string()),
            }]
        );
    }

    #[test]
    fn test_parse_expands_shorthands() {
        let invocation = parse(tokens(&["p", "-a"]));
        assert_eq!(invocation.commands, vec!["plan"]);
        assert_eq!(invocation.flags[0].key, "auto-approve");
        assert_eq!(invocation.flags[0].value, FlagValue::Absent);
    }

    #[test]
    fn test_parse_coerces_booleans() {
        let invocation = parse(tokens(&["apply", "--refresh=false", "--lock=true"]));
        assert_eq!(invocation.flags[0].value, FlagValue::Bool(false));
        assert_eq!(invocation.flags[1].value, FlagValue::Bool(true));
    }

    #[test]
    fn test_parse_lowercases_values() {
        let invocation = parse(tokens(&["apply", "--target=Module.Web"]));
        assert_eq!(
            invocation.flags[0].value,
            FlagValue::Text("module.web".to_string())
        );
    }

    #[test]
    fn test_parse_defaults_to_help_and_drops_flags() {
        let invocation = parse(tokens(&["--debug"]));
        assert_eq!(invocation.commands, vec!["--help"]);
        assert!(invocation.flags.is_empty());

        let empty = parse(tokens(&[]));
        assert_eq!(empty.commands, vec!["--help"]);
    }

    #[test]
    fn test_parse_keeps_multiple_commands_in_order() {
        let invocation = parse(tokens(&["w", "select", "staging"]));
        assert_eq!(invocation.commands, vec!["workspace", "select", "staging"]);
    }

    #[test]
    fn test_watch_request_variants() {
        assert_eq!(parse(tokens(&["plan"])).watch_request(), None);
        assert_eq!(parse(tokens(&["plan", "--watch"])).watch_request(), Some(None));
        assert_eq!(
            parse(tokens(&["plan", "--watch=infra/prod"])).watch_request(),
            Some(Some(PathBuf::from("infra/prod")))
        );
        // A boolean value carries no directory
        assert_eq!(
            parse(tokens(&["plan", "--watch=true"])).watch_request(),
            Some(None)
        );
    }

    #[test]
    fn test_has_flag() {
        let invocation = parse(tokens(&["plan", "--test"]));
        assert!(invocation.has_flag("test"));
        assert!(!invocation.has_flag("watch"));
    }
}
