//! Per-run install parameters.

use serde::{Deserialize, Serialize};

use crate::image::resolve_image;

pub const DEFAULT_MONGODB_PORT: u16 = 27017;
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_PLANB_PORT: u16 = 80;
pub const DEFAULT_REGISTRY_PORT: u16 = 5000;
pub const DEFAULT_TSURU_API_PORT: u16 = 8080;

/// Host port allocated to each platform service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ServicePorts {
    pub mongodb: u16,
    pub redis: u16,
    pub planb: u16,
    pub registry: u16,
    pub tsuru_api: u16,
}

impl Default for ServicePorts {
    fn default() -> Self {
        Self {
            mongodb: DEFAULT_MONGODB_PORT,
            redis: DEFAULT_REDIS_PORT,
            planb: DEFAULT_PLANB_PORT,
            registry: DEFAULT_REGISTRY_PORT,
            tsuru_api: DEFAULT_TSURU_API_PORT,
        }
    }
}

impl ServicePorts {
    /// Returns `(service, port)` pairs in registry order.
    pub fn entries(&self) -> [(&'static str, u16); 5] {
        [
            ("mongodb", self.mongodb),
            ("redis", self.redis),
            ("planb", self.planb),
            ("registry", self.registry),
            ("tsuru-api", self.tsuru_api),
        ]
    }
}

/// Resolved parameters of one provisioning run.
///
/// A fresh value is built for every run and is never mutated once the run
/// starts; components only read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    name: String,
    docker_hub_mirror: Option<String>,
    ports: ServicePorts,
}

impl InstallConfig {
    /// Creates a config with default ports and no registry mirror.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docker_hub_mirror: None,
            ports: ServicePorts::default(),
        }
    }

    /// Sets the registry mirror. An empty hostname clears it.
    #[must_use]
    pub fn with_mirror(mut self, mirror: impl Into<String>) -> Self {
        let mirror = mirror.into();
        self.docker_hub_mirror = if mirror.trim().is_empty() {
            None
        } else {
            Some(mirror.trim().to_string())
        };
        self
    }

    #[must_use]
    pub fn with_ports(mut self, ports: ServicePorts) -> Self {
        self.ports = ports;
        self
    }

    /// Name of the install run.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn docker_hub_mirror(&self) -> Option<&str> {
        self.docker_hub_mirror.as_deref()
    }

    pub fn ports(&self) -> &ServicePorts {
        &self.ports
    }

    /// Resolves `reference` against this run's mirror.
    pub fn resolve_image(&self, reference: &str) -> String {
        resolve_image(reference, self.docker_hub_mirror())
    }
}
