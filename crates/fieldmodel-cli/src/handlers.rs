//! Command handlers for CLI subcommands
//!
//! Each data command loads the declaration document, selects one schema and
//! runs the input through it.

mod inspect;
mod parse;
mod roundtrip;
mod utils;

pub use inspect::handle_inspect;
pub use parse::{handle_convert, handle_parse};
pub use roundtrip::handle_roundtrip;

use crate::cli::{Cli, CompletionsArgs};
use crate::error::Result;
use clap::CommandFactory;

/// Handle the completions command
pub fn handle_completions(args: CompletionsArgs) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(args.shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}
