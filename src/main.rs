use anyhow::{Context, Result};
use argh::FromArgs;
use build_shell::config::load_config;
use build_shell::env::Environment;
use build_shell::external::ExternalDispatcher;
use build_shell::modules::discover;
use build_shell::{Interpreter, Mode};
use std::path::PathBuf;

#[derive(FromArgs)]
/// Interactive shell for running build phases and plugin goals across the
/// modules of a multi-module project.
struct Args {
    #[argh(option, short = 'p')]
    /// project directory; defaults to the current directory.
    project: Option<PathBuf>,

    #[argh(switch, short = 'g')]
    /// run plugin goals (`group:artifact:goal` or goal aliases) instead of phases.
    goals: bool,

    #[argh(option, short = 'c')]
    /// extra configuration file merged over the user and project ones.
    config: Option<PathBuf>,

    #[argh(option, short = 'e')]
    /// evaluate this line and exit instead of reading commands; repeatable.
    execute: Vec<String>,

    #[argh(switch, short = 'v')]
    /// log debug output.
    verbose: bool,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    let root = match args.project {
        Some(dir) => dir,
        None => std::env::current_dir().context("can't determine current directory")?,
    };
    let config = load_config(&root, args.config.as_deref())?;
    let registry = discover(&root)?;
    log::info!(
        "Project {} with {} modules",
        registry.current().id,
        registry.len()
    );

    let dispatcher = ExternalDispatcher::new(&config.shell.build_command, Environment::new())?;
    log::debug!("Using build tool {}", dispatcher.program().display());

    let mode = if args.goals { Mode::Goals } else { Mode::Phases };
    let mut shell = Interpreter::new(mode, config, registry, dispatcher);

    if args.execute.is_empty() {
        shell.repl().context("Unable to execute cli commands")
    } else {
        shell.run_lines(args.execute.as_slice());
        Ok(())
    }
}
