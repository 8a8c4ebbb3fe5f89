use crate::command::Dispatcher;
use crate::env::Environment;
use crate::goal::{GoalCall, LATEST_VERSION};
use crate::modules::Module;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Runs the build tool (`mvn` by default) as a child process, one call per target.
pub struct ExternalDispatcher {
    program: PathBuf,
    env: Environment,
}

impl ExternalDispatcher {
    /// Resolves `build_command` on the environment's `PATH`.
    pub fn new(build_command: &str, env: Environment) -> Result<Self> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let program = find_command_path(OsStr::new(&search_paths), Path::new(build_command))
            .map(Cow::into_owned)
            .with_context(|| format!("build tool not found: {}", build_command))?;
        Ok(Self { program, env })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, args: Vec<OsString>) -> Result<()> {
        log::debug!("Running {} {:?}", self.program.display(), args);
        let status = std::process::Command::new(&self.program)
            .args(&args)
            .envs(self.env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.env.current_dir)
            .status()
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;
        if status.success() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("{} exited with {}", self.program.display(), status))
        }
    }
}

impl Dispatcher for ExternalDispatcher {
    fn run_phases(
        &mut self,
        module: &Module,
        commands: &[String],
        properties: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.run(phase_args(module, commands, properties))
    }

    fn run_goal(&mut self, project: &Module, call: &GoalCall, version: &str) -> Result<()> {
        self.run(goal_args(project, call, version))
    }
}

/// `-f <pom> <commands...> -D<key>[=<value>]...`; properties with an empty key
/// are not forwarded.
fn phase_args(
    module: &Module,
    commands: &[String],
    properties: &BTreeMap<String, String>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-f".into(), module.build_file().into_os_string()];
    args.extend(commands.iter().map(OsString::from));
    for (key, value) in properties {
        if key.is_empty() {
            log::debug!("Not forwarding property with empty key (value '{}')", value);
            continue;
        }
        let arg = if value.is_empty() {
            format!("-D{}", key)
        } else {
            format!("-D{}={}", key, value)
        };
        args.push(arg.into());
    }
    args
}

/// `-f <pom> group:artifact[:version]:goal`; the latest marker leaves the
/// version for the build tool to pick.
fn goal_args(project: &Module, call: &GoalCall, version: &str) -> Vec<OsString> {
    let coordinates = if version == LATEST_VERSION {
        format!("{}:{}:{}", call.group_id, call.artifact_id, call.goal)
    } else {
        format!(
            "{}:{}:{}:{}",
            call.group_id, call.artifact_id, version, call.goal
        )
    };
    vec![
        "-f".into(),
        project.build_file().into_os_string(),
        coordinates.into(),
    ]
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `tools/mvnw`): returns it if it exists.
/// - `./mvnw` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| path.is_file())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};

    fn module() -> Module {
        Module::new("acme-core", "/work/core")
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_phase_args() {
        let mut properties = BTreeMap::new();
        properties.insert("skipTests".to_string(), String::new());
        properties.insert("env".to_string(), "ci".to_string());
        properties.insert(String::new(), String::new());

        let args = phase_args(
            &module(),
            &["clean".to_string(), "install".to_string()],
            &properties,
        );
        assert_eq!(
            strings(args),
            vec![
                "-f",
                "/work/core/pom.xml",
                "clean",
                "install",
                "-Denv=ci",
                "-DskipTests"
            ]
        );
    }

    #[test]
    fn test_goal_args_with_version() {
        let call = GoalCall::parse("org.apache.maven.plugins:maven-jar-plugin:jar").unwrap();
        assert_eq!(
            strings(goal_args(&module(), &call, "3.3.0")),
            vec![
                "-f",
                "/work/core/pom.xml",
                "org.apache.maven.plugins:maven-jar-plugin:3.3.0:jar"
            ]
        );
    }

    #[test]
    fn test_goal_args_latest() {
        let call = GoalCall::parse("org.apache.maven.plugins:maven-jar-plugin:jar").unwrap();
        assert_eq!(
            strings(goal_args(&module(), &call, LATEST_VERSION)),
            vec![
                "-f",
                "/work/core/pom.xml",
                "org.apache.maven.plugins:maven-jar-plugin:jar"
            ]
        );
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(OsStr::new("/bin"), path).expect("Expected to find /bin/sh");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_nonexisting() {
        let res = find_command_path(OsStr::new("/bin"), Path::new("/bin/nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    fn single_component_found_in_path() {
        let tmp = tempfile::tempdir().unwrap();
        File::create(tmp.path().join("mvn")).unwrap();

        let found = find_command_path(tmp.path().as_os_str(), Path::new("mvn"))
            .expect("Expected to find 'mvn' via PATH search");
        assert_eq!(found.as_ref(), tmp.path().join("mvn"));
    }

    #[test]
    fn single_component_skips_directories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("first").join("mvn")).unwrap();
        fs::create_dir_all(tmp.path().join("second")).unwrap();
        File::create(tmp.path().join("second").join("mvn")).unwrap();

        let search = std::env::join_paths([tmp.path().join("first"), tmp.path().join("second")])
            .unwrap();
        let found = find_command_path(&search, Path::new("mvn")).expect("mvn in second dir");
        assert_eq!(found.as_ref(), tmp.path().join("second").join("mvn"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let tmp = tempfile::tempdir().unwrap();
        let res = find_command_path(tmp.path().as_os_str(), Path::new("nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(OsStr::new("/bin"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }

    #[test]
    fn missing_build_tool_is_an_error() {
        let mut env = Environment::new();
        env.set_var("PATH", "/does/not/exist");
        assert!(ExternalDispatcher::new("mvn-that-does-not-exist", env).is_err());
    }

    #[test]
    #[cfg(unix)]
    fn exit_status_decides_success() {
        let env = Environment::new();
        let call = GoalCall::parse("a:b:c").unwrap();

        let mut ok = ExternalDispatcher::new("true", env.clone()).unwrap();
        assert!(ok.run_goal(&module(), &call, LATEST_VERSION).is_ok());

        let mut failing = ExternalDispatcher::new("false", env).unwrap();
        assert!(failing.run_phases(&module(), &[], &BTreeMap::new()).is_err());
    }
}
