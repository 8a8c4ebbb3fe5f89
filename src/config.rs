//! Configuration loading and merging.
//!
//! Config is loaded from up to three TOML files, later ones taking precedence
//! key by key:
//! 1. User-level: `~/.build_shell/config.toml`
//! 2. Project-level: `<project>/.build_shell/config.toml`
//! 3. A file passed with `--config`
//!
//! ```toml
//! [shell]
//! prompt = "acme> "
//! build_command = "./mvnw"
//! property_prefix_width = 2
//!
//! [aliases]
//! ci = "clean install -DskipTests"
//!
//! [goals]
//! checkstyle = "org.apache.maven.plugins:maven-checkstyle-plugin:check"
//!
//! [[plugins.build]]
//! group_id = "org.apache.maven.plugins"
//! artifact_id = "maven-compiler-plugin"
//! version = "3.11.0"
//! ```

use crate::goal::{PluginRef, ProjectModel};
use crate::parser::DEFAULT_PROPERTY_PREFIX_WIDTH;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_PROMPT: &str = "maven2> ";
const DEFAULT_BUILD_COMMAND: &str = "mvn";
const CONFIG_DIR: &str = ".build_shell";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub shell: ShellConfig,
    /// Token aliases for the phase flow.
    pub aliases: HashMap<String, String>,
    /// Goal aliases, merged over the built-in ones.
    pub goals: HashMap<String, String>,
    pub project: ProjectModel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    pub build_command: String,
    pub property_prefix_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        merge_config(Vec::new())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    shell: Option<RawShell>,
    aliases: Option<HashMap<String, String>>,
    goals: Option<HashMap<String, String>>,
    plugins: Option<RawPlugins>,
}

#[derive(Debug, Default, Deserialize)]
struct RawShell {
    prompt: Option<String>,
    #[serde(alias = "buildCommand")]
    build_command: Option<String>,
    #[serde(alias = "propertyPrefixWidth")]
    property_prefix_width: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlugins {
    build: Option<Vec<PluginRef>>,
    management: Option<Vec<PluginRef>>,
}

fn read_toml(path: &Path) -> Option<RawConfig> {
    if !path.exists() {
        return None;
    }
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    if contents.trim().is_empty() {
        return None;
    }
    match toml::from_str::<RawConfig>(&contents) {
        Ok(raw) => Some(raw),
        Err(e) => {
            log::warn!("Ignoring invalid config {}: {}", path.display(), e);
            None
        }
    }
}

/// Merges layers given in increasing precedence.
fn merge_config(layers: Vec<RawConfig>) -> Config {
    let mut prompt = None;
    let mut build_command = None;
    let mut property_prefix_width = None;
    let mut aliases = HashMap::new();
    let mut goals = HashMap::new();
    let mut build_plugins = None;
    let mut plugin_management = None;

    for layer in layers {
        if let Some(shell) = layer.shell {
            prompt = shell.prompt.or(prompt);
            build_command = shell.build_command.or(build_command);
            property_prefix_width = shell.property_prefix_width.or(property_prefix_width);
        }
        aliases.extend(layer.aliases.unwrap_or_default());
        goals.extend(layer.goals.unwrap_or_default());
        if let Some(plugins) = layer.plugins {
            build_plugins = plugins.build.or(build_plugins);
            plugin_management = plugins.management.or(plugin_management);
        }
    }

    Config {
        shell: ShellConfig {
            prompt: prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            build_command: build_command.unwrap_or_else(|| DEFAULT_BUILD_COMMAND.to_string()),
            property_prefix_width: property_prefix_width.unwrap_or(DEFAULT_PROPERTY_PREFIX_WIDTH),
        },
        aliases,
        goals,
        project: ProjectModel {
            build_plugins: build_plugins.unwrap_or_default(),
            plugin_management: plugin_management.unwrap_or_default(),
        },
    }
}

fn config_path_from_root(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}

fn user_config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(config_path_from_root(&home))
}

/// Loads the layered configuration for the project at `root`.
///
/// Only an explicitly requested file is required to exist.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<Config> {
    let mut paths: Vec<PathBuf> = user_config_path().into_iter().collect();
    paths.push(config_path_from_root(root));
    if let Some(path) = explicit {
        fs::metadata(path).with_context(|| format!("can't open config {}", path.display()))?;
        paths.push(path.to_path_buf());
    }
    Ok(load_layers(&paths))
}

fn load_layers(paths: &[PathBuf]) -> Config {
    let layers = paths
        .iter()
        .filter_map(|path| {
            let raw = read_toml(path)?;
            log::debug!("Loaded config from {}", path.display());
            Some(raw)
        })
        .collect();
    merge_config(layers)
}
