use crate::goal::GoalCall;
use crate::modules::Module;
use anyhow::Result;
use std::collections::BTreeMap;

/// Seam to the external build engine.
///
/// The shell only cares whether a call succeeded; the error is logged and the
/// remaining targets still run.
pub trait Dispatcher {
    /// Runs lifecycle phases or goals with execution properties on one module.
    fn run_phases(
        &mut self,
        module: &Module,
        commands: &[String],
        properties: &BTreeMap<String, String>,
    ) -> Result<()>;

    /// Runs a single plugin goal on the project. `version` may be
    /// [`LATEST_VERSION`](crate::goal::LATEST_VERSION).
    fn run_goal(&mut self, project: &Module, call: &GoalCall, version: &str) -> Result<()>;
}
