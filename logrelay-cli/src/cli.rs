//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O happen here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// logrelay -- manage the error pattern catalog and configuration.
///
/// Use `logrelay <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logrelay", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logrelay.toml configuration file.
    #[arg(short, long, default_value = "logrelay.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect and edit error patterns in the store.
    Patterns(PatternsArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

/// Which pattern hash a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternScope {
    /// `error_patterns:global`
    Global,
    /// `error_patterns:{connector_type}`
    Connector,
    /// Both, global first.
    All,
}

// ---- patterns ----

#[derive(Args, Debug)]
pub struct PatternsArgs {
    #[command(subcommand)]
    pub action: PatternsAction,
}

#[derive(Subcommand, Debug)]
pub enum PatternsAction {
    /// List stored pattern records, including inactive ones.
    List {
        #[arg(long, value_enum, default_value = "all")]
        scope: PatternScope,
    },
    /// Run a message through the loaded catalog and show the first match.
    Test {
        /// Log message to classify.
        message: String,

        /// Also print the level derived from the message.
        #[arg(long)]
        level: bool,
    },
    /// Validate and store a pattern record.
    Add(AddPatternArgs),
    /// Mark a stored pattern inactive.
    Disable {
        /// Pattern id (hash field name).
        id: String,

        #[arg(long, value_enum, default_value = "global")]
        scope: PatternScope,
    },
}

#[derive(Args, Debug)]
pub struct AddPatternArgs {
    /// Pattern id (hash field name).
    #[arg(long)]
    pub id: String,

    /// Pattern text or regular expression.
    #[arg(long)]
    pub pattern: String,

    /// contains, exact or regex.
    #[arg(long, default_value = "contains")]
    pub match_type: String,

    #[arg(long)]
    pub case_sensitive: bool,

    /// Classification tag (defaults to "fatal" when omitted).
    #[arg(long)]
    pub classification: Option<String>,

    #[arg(long, value_enum, default_value = "global")]
    pub scope: PatternScope,

    /// Human readable explanation shown to users.
    #[arg(long)]
    pub message: Option<String>,

    /// Suggested user action.
    #[arg(long)]
    pub call_to_action: Option<String>,

    /// Whether the failure is worth retrying.
    #[arg(long)]
    pub retry: bool,

    /// Match only for log filtering, never fail the job.
    #[arg(long)]
    pub log_filter_only: bool,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, redis, routing, intake, metrics).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_patterns_list_default_scope() {
        let cli = Cli::try_parse_from(["logrelay", "patterns", "list"]).expect("parse succeeded");
        match cli.command {
            Commands::Patterns(PatternsArgs {
                action: PatternsAction::List { scope },
            }) => assert_eq!(scope, PatternScope::All),
            _ => panic!("expected patterns list"),
        }
    }

    #[test]
    fn test_cli_parse_patterns_test_with_level() {
        let cli = Cli::try_parse_from(["logrelay", "patterns", "test", "CUDA error", "--level"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Patterns(PatternsArgs {
                action: PatternsAction::Test { message, level },
            }) => {
                assert_eq!(message, "CUDA error");
                assert!(level);
            }
            _ => panic!("expected patterns test"),
        }
    }

    #[test]
    fn test_cli_parse_patterns_add_full() {
        let cli = Cli::try_parse_from([
            "logrelay",
            "patterns",
            "add",
            "--id",
            "oom",
            "--pattern",
            "out of memory",
            "--match-type",
            "regex",
            "--case-sensitive",
            "--scope",
            "connector",
            "--retry",
            "--log-filter-only",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Patterns(PatternsArgs {
                action: PatternsAction::Add(add),
            }) => {
                assert_eq!(add.id, "oom");
                assert_eq!(add.match_type, "regex");
                assert!(add.case_sensitive);
                assert_eq!(add.scope, PatternScope::Connector);
                assert!(add.retry);
                assert!(add.log_filter_only);
                assert!(add.classification.is_none());
            }
            _ => panic!("expected patterns add"),
        }
    }

    #[test]
    fn test_cli_parse_patterns_add_requires_pattern() {
        let result = Cli::try_parse_from(["logrelay", "patterns", "add", "--id", "oom"]);
        assert!(result.is_err(), "--pattern should be required");
    }

    #[test]
    fn test_cli_parse_patterns_disable() {
        let cli = Cli::try_parse_from(["logrelay", "patterns", "disable", "oom"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Patterns(PatternsArgs {
                action: PatternsAction::Disable { id, scope },
            }) => {
                assert_eq!(id, "oom");
                assert_eq!(scope, PatternScope::Global);
            }
            _ => panic!("expected patterns disable"),
        }
    }

    #[test]
    fn test_cli_parse_global_output_after_subcommand() {
        let cli = Cli::try_parse_from(["logrelay", "config", "validate", "--output", "json"])
            .expect("parse succeeded");
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.config, PathBuf::from("logrelay.toml"));
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["logrelay", "config", "show", "--section", "redis"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Show { section },
            }) => assert_eq!(section.as_deref(), Some("redis")),
            _ => panic!("expected config show"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_scope() {
        let result = Cli::try_parse_from(["logrelay", "patterns", "list", "--scope", "local"]);
        assert!(result.is_err());
    }
}
