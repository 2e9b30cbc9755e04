//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use fieldmodel_core::Handler;
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// fieldmodel - map raw records onto declared schemas and back
///
/// Loads schema declarations from a YAML or JSON document and runs records
/// through them: parse into logical shape, convert back to source shape,
/// check round trips, or inspect the normalized field table.
#[derive(Parser, Debug)]
#[command(
    name = "fieldmodel",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FIELDMODEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results (defaults to the configured format, then human)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse raw input into the logical shape of a schema
    Parse(ParseArgs),

    /// Parse raw input and convert it back to source shape
    Convert(ConvertArgs),

    /// Parse then convert, reporting source keys that were lost or changed
    Roundtrip(ConvertArgs),

    /// Show the normalized field table of a schema
    Inspect(InspectArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Schema selection shared by every data command
#[derive(clap::Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Declaration document (YAML or JSON)
    #[arg(long = "schemas", value_name = "FILE")]
    pub schemas: PathBuf,

    /// Schema to use; may be omitted when the document declares exactly one
    #[arg(long = "schema", value_name = "NAME")]
    pub schema: Option<String>,
}

/// Arguments for the parse command
#[derive(Parser, Debug)]
pub struct ParseArgs {
    #[command(flatten)]
    pub target: SchemaArgs,

    /// Input record (JSON or YAML); `-` reads stdin
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Ingestion handler
    #[arg(long, value_enum)]
    pub handler: Option<HandlerArg>,

    /// Warn about values that do not match their field model
    #[arg(long)]
    pub debug: bool,

    /// Fail on values that do not match their field model
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the convert and roundtrip commands
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub target: SchemaArgs,

    /// Input record (JSON or YAML); `-` reads stdin
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Fail on values that do not match their field model
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub target: SchemaArgs,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Ingestion handler as accepted on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum HandlerArg {
    /// Read declared fields by source key
    Update,
    /// Read declared fields by logical name
    Merge,
    /// Copy every key of the input
    Attr,
}

impl From<HandlerArg> for Handler {
    fn from(handler: HandlerArg) -> Self {
        match handler {
            HandlerArg::Update => Handler::Update,
            HandlerArg::Merge => Handler::Merge,
            HandlerArg::Attr => Handler::Attr,
        }
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["fieldmodel", "-vv", "inspect", "--schemas", "s.yaml"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["fieldmodel", "--quiet", "inspect", "--schemas", "s.yaml"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::parse_from([
            "fieldmodel",
            "-o",
            "json-pretty",
            "parse",
            "--schemas",
            "schemas.yaml",
            "--schema",
            "User",
            "--handler",
            "merge",
            "--strict",
            "-",
        ]);
        assert_eq!(cli.output, Some(OutputFormat::JsonPretty));
        match cli.command {
            Commands::Parse(args) => {
                assert_eq!(args.target.schema.as_deref(), Some("User"));
                assert_eq!(args.input, PathBuf::from("-"));
                assert_eq!(args.handler.map(Handler::from), Some(Handler::Merge));
                assert!(args.strict);
                assert!(!args.debug);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_schemas_flag_is_required() {
        assert!(Cli::try_parse_from(["fieldmodel", "convert", "input.json"]).is_err());
    }
}
