//! Survey cross-tabulation CLI.

use clap::Parser;
use xtab_cli::logging::init_logging;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command};
use crate::commands::{CommandOutput, run_crosstab, run_describe, run_plan};
use crate::summary::print_output;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&cli.log_config()) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let (result, json) = match &cli.command {
        Command::Crosstab(args) => (run_crosstab(args), args.data.json),
        Command::Plan(args) => (run_plan(args), args.data.json),
        Command::Describe(args) => (run_describe(args), args.data.json),
    };
    let printed = result.and_then(|output| emit(&output, json));
    if let Err(error) = printed {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn emit(output: &CommandOutput, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", output.to_json()?);
    } else {
        print_output(output);
    }
    Ok(())
}
