use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use decor_core::{Navigation, NavigationRow, SiteBuilder};

use crate::cmd::build::add_source_args;
use crate::config::DecorConfig;

pub fn make_subcommand() -> Command {
    add_source_args(Command::new("nav"))
        .about("Print the navigation rows computed for a page")
        .arg(
            Arg::new("page")
                .value_name("PAGE")
                .required(true)
                .help("Page path as listed in the site map, e.g. tticomp/language.html"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the rows as JSON"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let decor_config = DecorConfig::load(args)?;
    let site_config = decor_config.site_config()?;
    let policy = site_config.site.unknown_page;

    let page = args
        .get_one::<String>("page")
        .map(String::as_str)
        .unwrap_or_default();

    let site = SiteBuilder::new()
        .source_dir(&decor_config.build.source)
        .theme_dir(&decor_config.build.theme)
        .config(site_config)
        .build()?;

    // Subsection rows need the page's source; without it only page rows are listed.
    let rendered = if site.source_for(page).is_file() {
        site.render_page(page)?.navigation
    } else {
        tracing::warn!(page, "No source for page, listing pages only");
        None
    };
    let navigation = match rendered {
        Some(navigation) => navigation,
        None => Navigation::build(site.site_map(), page, policy, &[] as &[&str])?,
    };

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&navigation)?);
    } else {
        let current_path = site
            .site_map()
            .get(navigation.current)
            .map(|entry| entry.path.as_str());
        print!("{}", format_rows(&navigation, current_path));
    }

    Ok(())
}

/// One line per row, indented by depth; the current page is starred.
fn format_rows(navigation: &Navigation, current_path: Option<&str>) -> String {
    let mut out = String::new();
    for row in &navigation.rows {
        let indent = "  ".repeat(row.depth());
        let line = match row {
            NavigationRow::PageLink { title, path, .. } => {
                let marker = if current_path == Some(path.as_str()) { "* " } else { "" };
                format!("{indent}{marker}{title} ({path})")
            }
            NavigationRow::SectionLink {
                title, anchor_id, ..
            } => format!("{indent}#{anchor_id} {title}"),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}
