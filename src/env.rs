use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Process environment handed to the build tool.
///
/// Note: fields are public; the dispatcher reads them directly when spawning.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variables visible to the build tool (e.g., PATH, JAVA_HOME, MAVEN_OPTS).
    pub vars: HashMap<String, String>,
    /// Working directory of the build tool process.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
