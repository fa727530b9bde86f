use clap::{App, AppSettings, Arg, SubCommand};
use inkpot::build::build_site;
use inkpot::config::Config;
use std::error::Error;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("inkpot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static blog from markdown posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Directory to search (with its parents) for inkpot.yaml"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Overrides the output directory"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("build") {
        let project = Path::new(matches.value_of("project").unwrap_or("."));
        let output = matches.value_of("output").map(Path::new);
        if let Err(e) = run_build(project, output) {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run_build(project: &Path, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = Config::from_directory(project, output)?;
    let summary = build_site(&config)?;
    log::info!(
        "{} posts, {} categories, {} tags, {} archive months",
        summary.posts,
        summary.categories,
        summary.tags,
        summary.archives
    );
    Ok(())
}
