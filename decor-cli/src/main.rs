mod cmd;
mod config;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let matches = Command::new("decor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Decorate documentation pages with navigation, tooltips and highlighted code")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log progress information"),
        )
        .subcommand(cmd::build::make_subcommand())
        .subcommand(cmd::nav::make_subcommand())
        .get_matches();

    init_tracing(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("build", args)) => cmd::build::execute(args),
        Some(("nav", args)) => cmd::nav::execute(args),
        _ => unreachable!("a subcommand is required"),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
