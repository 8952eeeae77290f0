//! CLI argument definitions for `tabmap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tabmap",
    version,
    about = "Map a source table onto a target table's schema",
    long_about = "Map a source table onto a target table's schema.\n\n\
                  The first source row is transformed and shown for confirmation;\n\
                  once accepted, the transformation is propagated over every row."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: tabmap.toml in the platform config dir).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Learn a mapping from the first row and apply it to the whole source.
    Map(MapArgs),

    /// Show which target columns hold identical values.
    Groups(GroupsArgs),
}

#[derive(Parser)]
pub struct MapArgs {
    /// Table whose rows are transformed.
    #[arg(long = "source", value_name = "CSV")]
    pub source: PathBuf,

    /// Table whose columns and conventions the output follows.
    #[arg(long = "target", value_name = "CSV")]
    pub target: PathBuf,

    /// Where to write the result (default: stdout).
    #[arg(long = "output", short = 'o', value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Accept the first proposal without asking.
    #[arg(long = "yes", short = 'y')]
    pub yes: bool,

    /// Model identifier (overrides the config file).
    #[arg(long = "model", value_name = "NAME")]
    pub model: Option<String>,

    /// API base URL (overrides the config file).
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Source cells per propagation call (overrides the config file).
    #[arg(long = "cell-budget", value_name = "CELLS")]
    pub cell_budget: Option<usize>,

    /// Seed for few-shot example sampling.
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Also ask for a prose description of each proposed mapping.
    #[arg(long = "narrate")]
    pub narrate: bool,
}

#[derive(Parser)]
pub struct GroupsArgs {
    /// Table to inspect.
    #[arg(long = "target", value_name = "CSV")]
    pub target: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn map_flags_parse() {
        let cli = Cli::try_parse_from([
            "tabmap",
            "map",
            "--source",
            "s.csv",
            "--target",
            "t.csv",
            "--yes",
            "--cell-budget",
            "50",
        ])
        .unwrap();
        let Command::Map(args) = cli.command else {
            panic!("expected map");
        };
        assert!(args.yes);
        assert_eq!(args.cell_budget, Some(50));
        assert!(args.output.is_none());
    }

    #[test]
    fn config_is_global() {
        let cli =
            Cli::try_parse_from(["tabmap", "groups", "--target", "t.csv", "--config", "x.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
