use crate::alias::{AliasTable, BUILTIN_GOALS};
use crate::command::Dispatcher;
use crate::completion::{CommandCompleter, CommandHelper};
use crate::config::Config;
use crate::error::ShellError;
use crate::lexer::split_into_tokens;
use crate::modules::{Module, ModuleRegistry};
use crate::parser::{InvocationGroup, group_tokens};
use anyhow::anyhow;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::time::Instant;

/// Lines that end the session.
pub const EXIT_COMMANDS: &[&str] = &["quit", "exit", "bye"];

/// Lines that list the known modules.
pub const LIST_COMMANDS: &[&str] = &["list", "ls"];

/// Lifecycle phases offered for completion in phase mode.
pub const DEFAULT_PHASES: &[&str] = &[
    "clean",
    "validate",
    "generate-sources",
    "generate-resources",
    "test-compile",
    "test",
    "package",
    "integration-test",
    "install",
    "deploy",
    "site",
    "site-deploy",
];

/// Property flags offered for completion in phase mode.
pub const DEFAULT_PROPERTIES: &[&str] = &["-o", "-N", "-Dmaven.test.skip=true", "-DskipTests"];

/// Which command language the session speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Module selectors, phases and properties, grouped into invocations.
    Phases,
    /// Goal aliases and `group:artifact:goal` references.
    Goals,
}

/// How many targets ran and how many failed while evaluating one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of evaluating a single input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Listed,
    Dispatched(DispatchReport),
    Exit,
}

/// An interactive build session over a fixed set of modules and aliases.
///
/// Each line is tokenized, alias-expanded and turned into build calls that are
/// handed to the [`Dispatcher`] in order. A failing target is logged and the
/// remaining targets still run.
///
/// Example
/// ```no_run
/// use build_shell::config::Config;
/// use build_shell::env::Environment;
/// use build_shell::external::ExternalDispatcher;
/// use build_shell::modules::discover;
/// use build_shell::{Interpreter, Mode};
/// # fn main() -> anyhow::Result<()> {
/// let registry = discover(".".as_ref())?;
/// let dispatcher = ExternalDispatcher::new("mvn", Environment::new())?;
/// let mut sh = Interpreter::new(Mode::Phases, Config::default(), registry, dispatcher);
/// sh.eval_line("core* clean install -DskipTests")?;
/// # Ok(())
/// # }
/// ```
pub struct Interpreter<D: Dispatcher> {
    mode: Mode,
    config: Config,
    aliases: AliasTable,
    registry: ModuleRegistry,
    completer: CommandCompleter,
    dispatcher: D,
}

impl<D: Dispatcher> Interpreter<D> {
    pub fn new(mode: Mode, config: Config, registry: ModuleRegistry, dispatcher: D) -> Self {
        let aliases = match mode {
            Mode::Phases => AliasTable::with_overrides(std::iter::empty(), &config.aliases),
            Mode::Goals => AliasTable::with_overrides(BUILTIN_GOALS.iter().copied(), &config.goals),
        };

        let mut words: Vec<String> = Vec::new();
        if mode == Mode::Phases {
            words.extend(DEFAULT_PHASES.iter().map(|s| s.to_string()));
        }
        words.extend(aliases.names().map(str::to_string));
        words.extend(EXIT_COMMANDS.iter().map(|s| s.to_string()));
        words.extend(LIST_COMMANDS.iter().map(|s| s.to_string()));
        if mode == Mode::Phases {
            words.extend(registry.ids().map(str::to_string));
            words.extend(DEFAULT_PROPERTIES.iter().map(|s| s.to_string()));
        }

        Self {
            mode,
            config,
            aliases,
            registry,
            completer: CommandCompleter::new(words),
            dispatcher,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn completer(&self) -> &CommandCompleter {
        &self.completer
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Evaluates one input line.
    ///
    /// Control words must match the whole (trimmed) line. Errors abandon the
    /// line only.
    pub fn eval_line(&mut self, line: &str) -> Result<Outcome, ShellError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Outcome::Skipped);
        }
        if EXIT_COMMANDS.contains(&line) {
            return Ok(Outcome::Exit);
        }
        if LIST_COMMANDS.contains(&line) {
            self.list_modules();
            return Ok(Outcome::Listed);
        }

        let report = match self.mode {
            Mode::Phases => self.run_phases(line)?,
            Mode::Goals => self.run_goals(line)?,
        };
        Ok(Outcome::Dispatched(report))
    }

    /// Evaluates lines in order, as if typed, until one of them ends the session.
    pub fn run_lines<S: AsRef<str>>(&mut self, lines: &[S]) {
        for line in lines {
            let line = line.as_ref();
            match self.eval_line(line) {
                Ok(Outcome::Exit) => break,
                Ok(_) => {}
                Err(e) => log::error!("Invalid command: {} ({})", line, e),
            }
        }
    }

    /// Interactive read loop with history and tab completion.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl: Editor<CommandHelper, DefaultHistory> =
            Editor::new().map_err(|e| anyhow!("failed to init line editor: {e}"))?;
        rl.set_helper(Some(CommandHelper::new(self.completer.clone())));

        log::info!("Waiting for commands");
        loop {
            match rl.readline(&self.config.shell.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())
                            .map_err(|e| anyhow!("failed to record history: {e}"))?;
                    }
                    match self.eval_line(&line) {
                        Ok(Outcome::Exit) => break,
                        Ok(_) => {}
                        Err(e) => log::error!("Invalid command: {} ({})", line.trim(), e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    log::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(anyhow!("Unable to read commands: {e}")),
            }
        }

        Ok(())
    }

    fn list_modules(&self) {
        log::info!("Listing available projects: ");
        for id in self.registry.ids() {
            log::info!("* {}", id);
        }
    }

    fn run_phases(&mut self, line: &str) -> Result<DispatchReport, ShellError> {
        let tokens = self.aliases.expand_tokens(split_into_tokens(line))?;
        log::debug!("Expanded '{}' to {:?}", line, tokens);

        let groups = group_tokens(
            &tokens,
            &self.registry,
            self.config.shell.property_prefix_width,
        );
        if groups.is_empty() {
            log::warn!("Nothing to run for '{}'", line);
        }

        let mut report = DispatchReport::default();
        for group in &groups {
            log::info!("Executing: {}", group);
            let start = Instant::now();
            dispatch_group(&mut self.dispatcher, self.registry.current(), group, &mut report);
            log::info!("Execution time: {} ms", start.elapsed().as_millis());
        }
        Ok(report)
    }

    fn run_goals(&mut self, line: &str) -> Result<DispatchReport, ShellError> {
        let calls = self.aliases.resolve_goal_calls(line)?;

        let project = self.registry.current();
        let mut report = DispatchReport::default();
        for call in &calls {
            let version = call.version(&self.config.project);
            log::info!("Executing: {} (version {})", call, version);
            let start = Instant::now();
            match self.dispatcher.run_goal(project, call, &version) {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    report.failed += 1;
                    log::error!("Failed to execute '{}' on '{}': {:#}", call, project.id, e);
                }
            }
            log::info!("Execution time: {} ms", start.elapsed().as_millis());
        }
        Ok(report)
    }
}

/// Runs every command of `group` on each of its modules, in declaration order.
/// An empty module list means `current`.
fn dispatch_group<D: Dispatcher>(
    dispatcher: &mut D,
    current: &Module,
    group: &InvocationGroup<'_>,
    report: &mut DispatchReport,
) {
    if group.commands.is_empty() {
        log::warn!("No phases or goals given for {}", group);
        return;
    }

    let targets: Vec<&Module> = if group.modules.is_empty() {
        vec![current]
    } else {
        group.modules.clone()
    };

    for module in targets {
        match dispatcher.run_phases(module, &group.commands, &group.properties) {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                report.failed += 1;
                log::error!(
                    "Failed to execute '{:?}' on '{}': {:#}",
                    group.commands,
                    module.id,
                    e
                );
            }
        }
    }
}
