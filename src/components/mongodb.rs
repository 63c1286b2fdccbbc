//! Document store component.

use super::TsuruComponent;
use crate::client::ContainerSpec;
use crate::install_config::InstallConfig;
use crate::machine::Machine;

const IMAGE: &str = "mongo:latest";

/// MongoDB, the platform's document store.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoDb;

impl TsuruComponent for MongoDb {
    fn name(&self) -> &'static str {
        "MongoDB"
    }

    fn container_name(&self) -> &'static str {
        "mongo"
    }

    fn container_spec(&self, _machine: &Machine, config: &InstallConfig) -> ContainerSpec {
        ContainerSpec::new(self.container_name(), config.resolve_image(IMAGE))
            .with_published_port("27017/tcp", config.ports().mongodb)
    }
}
