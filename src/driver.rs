//! Provisioning driver.
//!
//! The driver installs components one at a time in registry order. Later
//! components are wired to the addresses of earlier ones, so each install
//! must finish (create, then start) before the next begins:
//!
//! 1. **MongoDB**, **Redis**: data stores
//! 2. **PlanB**: router backed by Redis
//! 3. **Registry**: image registry
//! 4. **TsuruAPI**: wired to all of the above
//!
//! The first failure aborts the run. Nothing already installed is rolled
//! back; [`Installer::remove_all`] is the operator's cleanup path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use strum::Display;
use tracing::{error, info, warn};

use crate::client::ContainerClient;
use crate::components::{self, ComponentStatus, TsuruComponent};
use crate::error::InstallerError;
use crate::install_config::InstallConfig;
use crate::machine::Machine;

/// State of a whole provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RunState {
    NotStarted,
    Running,
    Complete,
    Aborted,
}

/// Install state of a single component within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ComponentState {
    Pending,
    Installed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentOutcome {
    pub name: &'static str,
    pub state: ComponentState,
}

/// Outcome of [`Installer::install`].
#[derive(Debug)]
pub struct RunReport {
    pub state: RunState,
    /// Every registered component in order, including those never attempted.
    pub components: Vec<ComponentOutcome>,
    /// The failure that aborted the run, if any.
    pub error: Option<InstallerError>,
}

impl RunReport {
    fn new(components: &[&'static dyn TsuruComponent]) -> Self {
        Self {
            state: RunState::NotStarted,
            components: components
                .iter()
                .map(|c| ComponentOutcome {
                    name: c.name(),
                    state: ComponentState::Pending,
                })
                .collect(),
            error: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == RunState::Complete
    }

    /// Names of the components installed by this run, in order.
    pub fn installed(&self) -> Vec<&'static str> {
        self.components
            .iter()
            .filter(|c| c.state == ComponentState::Installed)
            .map(|c| c.name)
            .collect()
    }

    /// Converts the report into a `Result`, yielding the aborting error.
    pub fn into_result(mut self) -> Result<Self, InstallerError> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Result of a status query for one component.
#[derive(Debug)]
pub struct StatusEntry {
    pub name: &'static str,
    pub status: Result<ComponentStatus, InstallerError>,
}

/// Result of a remove for one component.
#[derive(Debug)]
pub struct RemoveEntry {
    pub name: &'static str,
    pub result: Result<(), InstallerError>,
}

/// Drives components through install, status and removal against one
/// container client.
pub struct Installer<'a> {
    client: &'a dyn ContainerClient,
    components: Vec<&'static dyn TsuruComponent>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Installer<'a> {
    /// Creates a driver over the default component registry.
    pub fn new(client: &'a dyn ContainerClient) -> Self {
        Self {
            client,
            components: components::registry(),
            cancel: None,
        }
    }

    /// Replaces the components driven, keeping the given order.
    #[must_use]
    pub fn with_components(mut self, components: Vec<&'static dyn TsuruComponent>) -> Self {
        self.components = components;
        self
    }

    /// Stops the run before the next component once `flag` is set.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn components(&self) -> &[&'static dyn TsuruComponent] {
        &self.components
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Installs every component in order, stopping at the first failure.
    pub fn install(&self, machine: &Machine, config: &InstallConfig) -> RunReport {
        let mut report = RunReport::new(&self.components);
        report.state = RunState::Running;
        let total = self.components.len();
        info!("starting install run {} with {} component(s)", config.name(), total);

        for (index, component) in self.components.iter().enumerate() {
            if self.cancelled() {
                warn!("install run cancelled before {}", component.name());
                report.state = RunState::Aborted;
                report.error = Some(InstallerError::Cancelled(component.name().to_string()));
                return report;
            }

            info!("installing component {}/{}: {}", index + 1, total, component.name());
            match component.install(self.client, machine, config) {
                Ok(()) => report.components[index].state = ComponentState::Installed,
                Err(e) => {
                    error!("component {} failed: {}", component.name(), e);
                    report.components[index].state = ComponentState::Failed;
                    report.state = RunState::Aborted;
                    report.error = Some(InstallerError::ComponentFailed {
                        component: component.name().to_string(),
                        source: Box::new(e),
                    });
                    return report;
                }
            }
        }

        report.state = RunState::Complete;
        info!("install run {} completed successfully", config.name());
        report
    }

    /// Queries every component's status concurrently.
    ///
    /// Results come back in registry order; one failing query does not
    /// affect the others.
    pub fn status_all(&self, machine: &Machine) -> Vec<StatusEntry> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .components
                .iter()
                .map(|component| {
                    let handle = scope.spawn(move || component.status(self.client, machine));
                    (component.name(), handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    let status = handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                    StatusEntry { name, status }
                })
                .collect()
        })
    }

    /// Removes every component in reverse install order.
    ///
    /// Failures are logged and returned; they do not stop removal of the
    /// remaining components.
    pub fn remove_all(&self, machine: &Machine) -> Vec<RemoveEntry> {
        self.components
            .iter()
            .rev()
            .map(|component| {
                let result = component.remove(self.client, machine);
                if let Err(e) = &result {
                    warn!("failed to remove {}: {}", component.name(), e);
                }
                RemoveEntry {
                    name: component.name(),
                    result,
                }
            })
            .collect()
    }
}
