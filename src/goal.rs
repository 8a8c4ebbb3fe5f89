use crate::error::{Result, ShellError};
use serde::Deserialize;
use std::fmt;

/// Version marker asking the build tool to pick the newest available release.
pub const LATEST_VERSION: &str = "RELEASE";

/// A single plugin goal addressed by its coordinates, e.g.
/// `org.apache.maven.plugins:maven-compiler-plugin:compile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalCall {
    pub group_id: String,
    pub artifact_id: String,
    pub goal: String,
}

impl GoalCall {
    /// Parses a `group:artifact:goal` reference.
    ///
    /// Exactly two colons are required and none of the three parts may be empty.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(group_id), Some(artifact_id), Some(goal), None)
                if !group_id.is_empty() && !artifact_id.is_empty() && !goal.is_empty() =>
            {
                Ok(Self {
                    group_id: group_id.to_string(),
                    artifact_id: artifact_id.to_string(),
                    goal: goal.to_string(),
                })
            }
            _ => Err(ShellError::MalformedGoalReference(text.to_string())),
        }
    }

    /// Determines which plugin version the project already uses for this call.
    ///
    /// Active build plugins are searched first, then plugin management, each in
    /// declaration order. A matching declaration without a version does not stop
    /// the search. Falls back to [`LATEST_VERSION`].
    pub fn version(&self, project: &ProjectModel) -> String {
        let declared = |plugins: &[PluginRef]| {
            plugins
                .iter()
                .find(|p| p.group_id == self.group_id && p.artifact_id == self.artifact_id)
                .and_then(|p| p.version.clone())
        };
        declared(&project.build_plugins)
            .or_else(|| declared(&project.plugin_management))
            .unwrap_or_else(|| LATEST_VERSION.to_string())
    }
}

impl fmt::Display for GoalCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} [{}]", self.group_id, self.artifact_id, self.goal)
    }
}

/// One plugin declaration of the project build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginRef {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl PluginRef {
    pub fn new(group_id: &str, artifact_id: &str, version: Option<&str>) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.map(str::to_string),
        }
    }
}

/// Plugin declarations of the current project, in the two tiers the build tool
/// consults: explicit build plugins override plugin management defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectModel {
    pub build_plugins: Vec<PluginRef>,
    pub plugin_management: Vec<PluginRef>,
}
