//! Container daemon abstraction for the installer.
//!
//! This module provides:
//! - [`ContainerSpec`]: Specification of a container to create
//! - [`ContainerRecord`]: The daemon's view of an existing container
//! - [`ContainerClient`]: Trait for daemon transports
//! - [`DockerClient`]: Production implementation talking to the daemon over TLS

mod docker;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::InstallerError;
use crate::machine::Machine;

pub use docker::{DEFAULT_DAEMON_TIMEOUT_SECS, DockerClient};

/// A host address bound to a container port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBinding {
    #[serde(rename = "hostIP")]
    pub host_ip: String,
    pub host_port: String,
}

impl PortBinding {
    pub fn new(host_ip: impl Into<String>, host_port: impl Into<String>) -> Self {
        Self {
            host_ip: host_ip.into(),
            host_port: host_port.into(),
        }
    }
}

/// Container port (e.g. `"80/tcp"`) to host bindings.
pub type PortBindings = BTreeMap<String, Vec<PortBinding>>;

/// Specification of a container to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name, unique within a run and stable across runs.
    pub name: String,
    /// Fully resolved image reference.
    pub image: String,
    /// Command-line arguments; empty keeps the image default.
    pub cmd: Vec<String>,
    /// `KEY=value` environment entries.
    pub env: Vec<String>,
    /// Container ports exposed (e.g. `"80/tcp"`).
    pub exposed_ports: Vec<String>,
    pub port_bindings: PortBindings,
    /// Volume binds in `host:container[:mode]` form.
    pub binds: Vec<String>,
}

impl ContainerSpec {
    /// Creates a spec with a name and image and nothing else.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    /// Sets the command-line arguments.
    #[must_use]
    pub fn with_cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = cmd.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a `KEY=value` environment entry.
    #[must_use]
    pub fn with_env(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        self.env.push(format!("{}={}", key, value));
        self
    }

    /// Exposes `container_port` and binds it on `0.0.0.0:host_port`.
    #[must_use]
    pub fn with_published_port(mut self, container_port: &str, host_port: u16) -> Self {
        if !self.exposed_ports.iter().any(|p| p == container_port) {
            self.exposed_ports.push(container_port.to_string());
        }
        self.port_bindings
            .entry(container_port.to_string())
            .or_default()
            .push(PortBinding::new("0.0.0.0", host_port.to_string()));
        self
    }

    #[must_use]
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.binds.push(bind.into());
        self
    }
}

/// The daemon's record of a container.
///
/// Always fetched fresh from the daemon; never cached across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    pub image: String,
    pub cmd: Vec<String>,
    pub env: Vec<String>,
    pub exposed_ports: Vec<String>,
    pub port_bindings: PortBindings,
    pub running: bool,
}

/// Trait for container daemon transports.
///
/// Every call is authenticated with the TLS material of the given
/// [`Machine`]. Implementations must be `Send + Sync` so status queries can
/// run from several threads at once.
pub trait ContainerClient: Send + Sync {
    /// Makes `image` available on the daemon.
    fn pull_image(&self, machine: &Machine, image: &str) -> Result<(), InstallerError>;

    /// Creates a stopped container and returns its id.
    fn create(&self, machine: &Machine, spec: &ContainerSpec) -> Result<String, InstallerError>;

    /// Starts the created container `id`. `name` is its spec name, used
    /// when reporting failures.
    fn start(&self, machine: &Machine, name: &str, id: &str) -> Result<(), InstallerError>;

    /// Returns the daemon's current record for the named container.
    ///
    /// Fails with [`InstallerError::NotFound`] if it does not exist.
    fn inspect(&self, machine: &Machine, name: &str) -> Result<ContainerRecord, InstallerError>;

    /// Stops and deletes the named container.
    ///
    /// Fails with [`InstallerError::NotFound`] if it does not exist; callers
    /// decide whether absence is an error.
    fn remove(&self, machine: &Machine, name: &str) -> Result<(), InstallerError>;
}
