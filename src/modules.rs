//! Known build modules and module selectors.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Character that turns a module token into a selector matching any substring.
pub const WILDCARD: char = '*';

const BUILD_FILE: &str = "pom.xml";

/// A build unit of the reactor, addressed by its artifact id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub id: String,
    pub base_dir: PathBuf,
}

impl Module {
    pub fn new(id: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            base_dir: base_dir.into(),
        }
    }

    pub fn build_file(&self) -> PathBuf {
        self.base_dir.join(BUILD_FILE)
    }
}

/// Read-only snapshot of the modules known when the session started.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
    index: HashMap<String, usize>,
    current: Module,
}

impl ModuleRegistry {
    /// Creates a registry for the `current` project and its reactor modules.
    ///
    /// A module id seen twice replaces the earlier entry but keeps its position.
    pub fn new(current: Module, reactor: Vec<Module>) -> Self {
        let mut modules: Vec<Module> = Vec::with_capacity(reactor.len());
        let mut index = HashMap::new();
        for module in reactor {
            match index.get(&module.id) {
                Some(&i) => modules[i] = module,
                None => {
                    index.insert(module.id.clone(), modules.len());
                    modules.push(module);
                }
            }
        }
        Self {
            modules,
            index,
            current,
        }
    }

    /// The project the shell was started in; commands without an explicit
    /// target run against it.
    pub fn current(&self) -> &Module {
        &self.current
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Resolves a literal module id or a wildcard selector to modules, in
    /// registry order.
    ///
    /// `*` matches any substring and the whole id must match. Other regex
    /// metacharacters are handed to the pattern engine as they are; a selector
    /// that does not compile matches nothing.
    pub fn select(&self, token: &str) -> Vec<&Module> {
        if !is_selector(token) {
            return self.get(token).into_iter().collect();
        }

        let pattern = format!("^(?:{})$", token.replace(WILDCARD, ".*"));
        match Regex::new(&pattern) {
            Ok(re) => self.modules.iter().filter(|m| re.is_match(&m.id)).collect(),
            Err(e) => {
                log::warn!("Ignoring module selector '{}': {}", token, e);
                Vec::new()
            }
        }
    }
}

/// Whether `token` is a wildcard module selector rather than a literal id.
pub fn is_selector(token: &str) -> bool {
    token.contains(WILDCARD)
}

/// Builds the registry for the project rooted at `root`.
///
/// The root and every descendant directory holding a `pom.xml` become modules,
/// skipping `target` and hidden directories. The root is the current project.
pub fn discover(root: &Path) -> Result<ModuleRegistry> {
    let root = fs::canonicalize(root)
        .with_context(|| format!("can't canonicalize {}", root.display()))?;

    let current = load_module(&root)?;
    if !current.build_file().exists() {
        log::warn!("No {} found in {}", BUILD_FILE, root.display());
    }

    let mut reactor = Vec::new();
    if current.build_file().exists() {
        reactor.push(current.clone());
    }
    collect_modules(&root, &mut reactor)?;

    log::debug!("Discovered {} modules under {}", reactor.len(), root.display());
    Ok(ModuleRegistry::new(current, reactor))
}

fn collect_modules(dir: &Path, out: &mut Vec<Module>) -> Result<()> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("can't list {}", dir.display()))?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                log::warn!("Failed to read entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|path| path.is_dir() && !is_skipped(path))
        .collect();
    children.sort();

    for child in children {
        if child.join(BUILD_FILE).is_file() {
            out.push(load_module(&child)?);
        }
        collect_modules(&child, out)?;
    }
    Ok(())
}

fn is_skipped(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name == "target" || name.starts_with('.'),
        None => true,
    }
}

fn load_module(dir: &Path) -> Result<Module> {
    let build_file = dir.join(BUILD_FILE);
    let declared = if build_file.is_file() {
        let pom = fs::read_to_string(&build_file)
            .with_context(|| format!("can't read {}", build_file.display()))?;
        artifact_id(&pom)
    } else {
        None
    };

    let id = declared
        .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| dir.to_string_lossy().into_owned());
    Ok(Module::new(id, dir))
}

/// Extracts the project's own `<artifactId>`, ignoring the `<parent>` block
/// and comments.
fn artifact_id(pom: &str) -> Option<String> {
    let noise = Regex::new(r"(?s)<!--.*?-->|<parent>.*?</parent>").ok()?;
    let stripped = noise.replace_all(pom, "");
    let re = Regex::new(r"<artifactId>\s*([^<\s]+)\s*</artifactId>").ok()?;
    re.captures(&stripped).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(ids: &[&str]) -> ModuleRegistry {
        let modules = ids
            .iter()
            .map(|id| Module::new(*id, format!("/work/{}", id)))
            .collect();
        ModuleRegistry::new(Module::new("root", "/work"), modules)
    }

    fn ids<'a>(modules: &[&'a Module]) -> Vec<&'a str> {
        modules.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_literal_lookup() {
        let reg = registry(&["serviceA", "serviceB", "libCore"]);
        assert_eq!(ids(&reg.select("libCore")), vec!["libCore"]);
        assert!(reg.select("libcore").is_empty());
    }

    #[test]
    fn test_wildcard_in_registry_order() {
        let reg = registry(&["serviceA", "serviceB", "libCore"]);
        assert_eq!(ids(&reg.select("service*")), vec!["serviceA", "serviceB"]);
        assert_eq!(ids(&reg.select("*Core")), vec!["libCore"]);
        assert_eq!(ids(&reg.select("*")), vec!["serviceA", "serviceB", "libCore"]);
        assert!(reg.select("nomatch*").is_empty());
    }

    #[test]
    fn test_wildcard_matches_whole_id() {
        let reg = registry(&["core", "core-api", "legacy-core"]);
        assert_eq!(ids(&reg.select("core*")), vec!["core", "core-api"]);
    }

    #[test]
    fn test_wildcard_on_empty_registry() {
        let reg = registry(&[]);
        assert!(reg.select("*").is_empty());
    }

    #[test]
    fn test_metacharacters_pass_through() {
        let reg = registry(&["app1", "app2", "app-x"]);
        assert_eq!(ids(&reg.select("app[0-9]*")), vec!["app1", "app2"]);
        assert!(reg.select("app(*").is_empty());
    }

    #[test]
    fn test_duplicate_ids_keep_first_position() {
        let reg = ModuleRegistry::new(
            Module::new("root", "/work"),
            vec![
                Module::new("a", "/one"),
                Module::new("b", "/b"),
                Module::new("a", "/two"),
            ],
        );
        assert_eq!(reg.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(reg.get("a").unwrap().base_dir, PathBuf::from("/two"));
    }

    #[test]
    fn test_artifact_id_skips_parent_and_comments() {
        let pom = r#"
            <project>
              <!-- <artifactId>commented</artifactId> -->
              <parent>
                <groupId>com.acme</groupId>
                <artifactId>acme-parent</artifactId>
              </parent>
              <artifactId> acme-core </artifactId>
              <dependencies>
                <dependency><artifactId>other</artifactId></dependency>
              </dependencies>
            </project>"#;
        assert_eq!(artifact_id(pom), Some("acme-core".to_string()));
        assert_eq!(artifact_id("<project/>"), None);
    }

    fn write_pom(dir: &Path, artifact: &str) {
        fs::create_dir_all(dir).unwrap();
        let pom = format!("<project><artifactId>{}</artifactId></project>", artifact);
        fs::write(dir.join(BUILD_FILE), pom).unwrap();
    }

    #[test]
    fn test_discover_reactor() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_pom(root, "acme");
        write_pom(&root.join("core"), "acme-core");
        write_pom(&root.join("services").join("billing"), "acme-billing");
        write_pom(&root.join("core").join("target").join("stale"), "stale");
        write_pom(&root.join(".hidden"), "hidden");
        fs::create_dir_all(root.join("docs")).unwrap();

        let reg = discover(root).unwrap();
        assert_eq!(reg.current().id, "acme");
        assert_eq!(
            reg.ids().collect::<Vec<_>>(),
            vec!["acme", "acme-core", "acme-billing"]
        );
        assert!(reg.get("stale").is_none());
        assert!(reg.get("hidden").is_none());
    }

    #[test]
    fn test_discover_without_build_file_uses_dir_name() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("plain");
        fs::create_dir_all(&project).unwrap();

        let reg = discover(&project).unwrap();
        assert_eq!(reg.current().id, "plain");
        assert!(reg.is_empty());
    }

    #[test]
    fn test_discover_missing_root_errors() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover(&tmp.path().join("missing")).is_err());
    }
}
