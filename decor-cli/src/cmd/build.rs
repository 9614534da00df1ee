use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use decor_core::SiteBuilder;

use crate::config::DecorConfig;

pub fn add_source_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("DIR")
                .help("Directory containing the Markdown page sources"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Site configuration file [default: ./decor.toml]"),
        )
}

pub fn make_subcommand() -> Command {
    add_source_args(Command::new("build"))
        .about("Decorate every page listed in the site map")
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for the decorated pages"),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .value_name("DIR")
                .help("Theme directory"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let decor_config = DecorConfig::load(args)?;
    let build = &decor_config.build;

    let site = SiteBuilder::new()
        .source_dir(&build.source)
        .output_dir(&build.output)
        .theme_dir(&build.theme)
        .config(decor_config.site_config()?)
        .build()?;
    let report = site.render_all()?;

    println!(
        "Decorated {} pages in {}",
        report.written.len() - report.aborted.len(),
        build.output
    );
    for page in &report.aborted {
        println!("  left undecorated: {page}");
    }
    for page in &report.missing {
        println!("  missing source: {page}");
    }

    Ok(())
}
