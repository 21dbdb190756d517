//! Service control for the secondary instance (stages 1 and 6)

use crate::config::Config;
use crate::exec::CommandSpec;

use super::{os_command, Step};

fn systemctl(config: &Config, description: &str, action: &str) -> CommandSpec {
    os_command(config, description, "systemctl").args([action, config.mysql_instance.as_str()])
}

/// Stop the instance.
///
/// The status probes are informational: `systemctl status` exits non-zero
/// for a stopped unit, so they never fail the stage.
pub fn stop_plan(config: &Config) -> Vec<Step> {
    vec![
        Step::Run(
            systemctl(config, "Checking MySQL instance status (before stop)", "status").unchecked(),
        ),
        Step::Run(systemctl(config, "Stopping MySQL instance", "stop")),
        Step::Settle(config.stop_settle()),
        Step::Run(systemctl(config, "Verifying MySQL instance is stopped", "status").unchecked()),
    ]
}

/// Start the instance; here the status check must pass.
pub fn start_plan(config: &Config) -> Vec<Step> {
    vec![
        Step::Run(systemctl(config, "Starting MySQL instance", "start")),
        Step::Settle(config.start_settle()),
        Step::Run(systemctl(config, "Checking MySQL instance status", "status")),
    ]
}
