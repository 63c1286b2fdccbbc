//! Load balancer component.

use super::TsuruComponent;
use crate::client::ContainerSpec;
use crate::install_config::InstallConfig;
use crate::machine::Machine;

const IMAGE: &str = "tsuru/planb:latest";

/// Port PlanB listens on inside its container.
const LISTEN_PORT: &str = "80/tcp";

/// PlanB, the platform router. Reads and writes its routes in the Redis
/// instance on the same machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanB;

impl TsuruComponent for PlanB {
    fn name(&self) -> &'static str {
        "PlanB"
    }

    fn container_name(&self) -> &'static str {
        "planb"
    }

    fn container_spec(&self, machine: &Machine, config: &InstallConfig) -> ContainerSpec {
        ContainerSpec::new(self.container_name(), config.resolve_image(IMAGE))
            .with_cmd([
                "--listen",
                ":80",
                "--read-redis-host",
                machine.ip.as_str(),
                "--write-redis-host",
                machine.ip.as_str(),
            ])
            .with_published_port(LISTEN_PORT, config.ports().planb)
    }
}
