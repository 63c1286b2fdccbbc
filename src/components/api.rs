//! Platform API component.

use super::TsuruComponent;
use crate::client::ContainerSpec;
use crate::install_config::InstallConfig;
use crate::machine::Machine;

const IMAGE: &str = "tsuru/api:latest";

/// The tsuru API server.
///
/// Installed last: its environment points at every other service. The
/// variable names are read by the unmodified `tsuru/api` image at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsuruApi;

impl TsuruComponent for TsuruApi {
    fn name(&self) -> &'static str {
        "TsuruAPI"
    }

    fn container_name(&self) -> &'static str {
        "tsuru"
    }

    fn container_spec(&self, machine: &Machine, config: &InstallConfig) -> ContainerSpec {
        let ports = config.ports();
        let ip = machine.ip.as_str();

        ContainerSpec::new(self.container_name(), config.resolve_image(IMAGE))
            .with_env("MONGODB_ADDR", ip)
            .with_env("MONGODB_PORT", ports.mongodb)
            .with_env("REDIS_ADDR", ip)
            .with_env("REDIS_PORT", ports.redis)
            .with_env("HIPACHE_DOMAIN", format!("{}.nip.io", ip))
            .with_env("REGISTRY_ADDR", ip)
            .with_env("REGISTRY_PORT", ports.registry)
            .with_env("TSURU_ADDR", format!("http://{}", ip))
            .with_env("TSURU_PORT", ports.tsuru_api)
            .with_published_port(&format!("{}/tcp", ports.tsuru_api), ports.tsuru_api)
    }
}
