//! Installable platform components.
//!
//! This module provides the [`TsuruComponent`] trait, the five concrete
//! components and [`Component`], the closed set of registered components in
//! install order. Components never reference each other; everything one
//! needs to know about another comes from the [`Machine`] and the
//! [`InstallConfig`].

use std::collections::BTreeMap;

use serde::Serialize;
use strum::Display;
use tracing::{debug, info};

use crate::client::{ContainerClient, ContainerSpec, PortBinding};
use crate::error::InstallerError;
use crate::install_config::InstallConfig;
use crate::machine::Machine;

pub mod api;
pub mod mongodb;
pub mod planb;
pub mod redis;
pub mod registry;

pub use api::TsuruApi;
pub use mongodb::MongoDb;
pub use planb::PlanB;
pub use redis::Redis;
pub use registry::Registry;

/// Status report of one component, as seen by the daemon right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    pub name: String,
    pub container: String,
    pub image: String,
    pub running: bool,
    pub port_bindings: BTreeMap<String, Vec<PortBinding>>,
}

/// Trait for installable platform components.
///
/// Implementors only describe their container through
/// [`container_spec`](TsuruComponent::container_spec); the lifecycle methods
/// share one implementation so every component resolves images and talks
/// to the daemon the same way.
pub trait TsuruComponent: Send + Sync + std::fmt::Debug {
    /// Stable component name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Name of the component's container on the daemon.
    fn container_name(&self) -> &'static str;

    /// Builds the container specification for this run.
    fn container_spec(&self, machine: &Machine, config: &InstallConfig) -> ContainerSpec;

    /// Pulls the image, then creates and starts the container.
    ///
    /// Nothing is retried. If start fails the created container is left in
    /// place for [`remove`](TsuruComponent::remove).
    #[tracing::instrument(skip_all, fields(component = self.name()))]
    fn install(
        &self,
        client: &dyn ContainerClient,
        machine: &Machine,
        config: &InstallConfig,
    ) -> Result<(), InstallerError> {
        let spec = self.container_spec(machine, config);
        debug!(?spec, "resolved container spec");

        client.pull_image(machine, &spec.image)?;
        let id = client.create(machine, &spec)?;
        debug!(container = %spec.name, %id, "container created");
        client.start(machine, &spec.name, &id)?;
        info!(container = %spec.name, image = %spec.image, "container started");
        Ok(())
    }

    /// Reports the daemon's current view of the container.
    fn status(
        &self,
        client: &dyn ContainerClient,
        machine: &Machine,
    ) -> Result<ComponentStatus, InstallerError> {
        let record = client.inspect(machine, self.container_name())?;
        Ok(ComponentStatus {
            name: self.name().to_string(),
            container: self.container_name().to_string(),
            image: record.image,
            running: record.running,
            port_bindings: record.port_bindings,
        })
    }

    /// Stops and deletes the container. Absence is not an error.
    fn remove(
        &self,
        client: &dyn ContainerClient,
        machine: &Machine,
    ) -> Result<(), InstallerError> {
        match client.remove(machine, self.container_name()) {
            Ok(()) => {
                info!(container = self.container_name(), "container removed");
                Ok(())
            }
            Err(InstallerError::NotFound(_)) => {
                debug!(container = self.container_name(), "container already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// The registered platform components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Component {
    MongoDb,
    Redis,
    PlanB,
    Registry,
    TsuruApi,
}

impl Component {
    /// Every component in install order: data stores first, the platform
    /// API last since it is wired to all the others.
    pub const ALL: [Component; 5] = [
        Component::MongoDb,
        Component::Redis,
        Component::PlanB,
        Component::Registry,
        Component::TsuruApi,
    ];

    /// Returns the implementation of this component.
    pub fn as_component(&self) -> &'static dyn TsuruComponent {
        match self {
            Component::MongoDb => &MongoDb,
            Component::Redis => &Redis,
            Component::PlanB => &PlanB,
            Component::Registry => &Registry,
            Component::TsuruApi => &TsuruApi,
        }
    }
}

/// Returns the component implementations in install order.
pub fn registry() -> Vec<&'static dyn TsuruComponent> {
    Component::ALL.iter().map(Component::as_component).collect()
}
