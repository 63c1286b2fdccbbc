//! Cache component.

use super::TsuruComponent;
use crate::client::ContainerSpec;
use crate::install_config::InstallConfig;
use crate::machine::Machine;

const IMAGE: &str = "redis:latest";

#[derive(Debug, Clone, Copy, Default)]
pub struct Redis;

impl TsuruComponent for Redis {
    fn name(&self) -> &'static str {
        "Redis"
    }

    fn container_name(&self) -> &'static str {
        "redis"
    }

    fn container_spec(&self, _machine: &Machine, config: &InstallConfig) -> ContainerSpec {
        ContainerSpec::new(self.container_name(), config.resolve_image(IMAGE))
            .with_published_port("6379/tcp", config.ports().redis)
    }
}
