//! Image registry component.

use super::TsuruComponent;
use crate::client::ContainerSpec;
use crate::install_config::InstallConfig;
use crate::machine::Machine;

const IMAGE: &str = "registry:2";

/// Certificate root inside the registry container.
const CERTS_ROOT: &str = "/certs";
const STORAGE_ROOT: &str = "/var/lib/registry";
/// Host directory holding per-registry certificates, mounted at [`CERTS_ROOT`].
const HOST_CERTS_DIR: &str = "/etc/docker/certs.d";

/// Docker registry v2 serving the platform's application images over TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registry;

impl TsuruComponent for Registry {
    fn name(&self) -> &'static str {
        "Registry"
    }

    fn container_name(&self) -> &'static str {
        "registry"
    }

    fn container_spec(&self, machine: &Machine, config: &InstallConfig) -> ContainerSpec {
        let port = config.ports().registry;
        let certs_dir = format!("{}/{}:{}", CERTS_ROOT, machine.ip, port);

        ContainerSpec::new(self.container_name(), config.resolve_image(IMAGE))
            .with_env("REGISTRY_STORAGE_FILESYSTEM_ROOTDIRECTORY", STORAGE_ROOT)
            .with_env("REGISTRY_HTTP_TLS_KEY", format!("{}/registry-key.pem", certs_dir))
            .with_env("REGISTRY_HTTP_TLS_CERTIFICATE", format!("{}/registry-cert.pem", certs_dir))
            .with_published_port("5000/tcp", port)
            .with_bind(format!("{}:{}", STORAGE_ROOT, STORAGE_ROOT))
            .with_bind(format!("{}:{}:ro", HOST_CERTS_DIR, CERTS_ROOT))
    }
}
