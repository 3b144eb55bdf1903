use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser};
use nlx::commands::{Actions, ShowFilter, config::ConfigOverrides, run};
use std::path::PathBuf;

/// nlx - link local packages into a Node project
///
/// Scans a directory of sibling packages (for example a monorepo's `packages/`),
/// matches them against the current project's dependencies and drives
/// `npm link` / `yarn link` for the ones that are shared.
///
/// The client is chosen from NLX_NPM_CLIENT, else yarn when a yarn.lock is
/// present, else npm.
///
/// Examples:
///   nlx ../my-monorepo/packages --show    # List shared and linked dependencies
///   nlx ../my-monorepo/packages --link    # Link every shared dependency
///   nlx -d ../my-monorepo/packages -u     # Unlink them and reinstall
#[derive(Parser, Debug)]
#[command(
    name = "nlx",
    author,
    version = env!("NLX_VERSION"),
    about,
    disable_version_flag = true
)]
struct Cli {
    /// Relative path to the monorepo/directory with many packages
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Same as PATH
    #[arg(short = 'd', long = "dir", value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Link all packages in PATH that are dependencies of this project
    #[arg(short = 'l', long)]
    link: bool,

    /// Unlink all linked dependencies found in PATH
    #[arg(short = 'u', long)]
    unlink: bool,

    /// Show shared and/or linked dependencies
    #[arg(short = 's', long)]
    show: bool,

    /// Only show currently linked packages
    #[arg(long, requires = "show", conflicts_with = "shared_only")]
    linked_only: bool,

    /// Only show dependencies shared between the project and PATH
    #[arg(long, requires = "show")]
    shared_only: bool,

    /// Do not reinstall dependencies after unlinking
    #[arg(long, requires = "unlink")]
    skip_install: bool,

    /// Extra glob for names to skip while scanning the project for its own packages
    #[arg(long = "exclude", value_name = "GLOB")]
    excludes: Vec<String>,

    /// Link status cache location (defaults to node_modules/.cache/nlx.json)
    #[arg(long, env = "NLX_CACHE_FILE", value_name = "PATH")]
    cache_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

impl Cli {
    fn actions(&self) -> Actions {
        let show = self.show.then(|| {
            if self.linked_only {
                ShowFilter::LinkedOnly
            } else if self.shared_only {
                ShowFilter::SharedOnly
            } else {
                ShowFilter::All
            }
        });

        Actions {
            packages_dir: self.path.clone().or_else(|| self.dir.clone()),
            link: self.link,
            unlink: self.unlink,
            show,
            reinstall: !self.skip_install,
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            cache_file: self.cache_file.clone(),
            excludes: self.excludes.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let actions = cli.actions();
    if actions.is_empty() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let runtime = nlx::runtime::RealRuntime;
    run(&runtime, actions, cli.overrides())
}
