//! Installer profile loading and validation.
//!
//! A profile is a YAML file describing the target [`Machine`] and the
//! parameters of the install run:
//!
//! ```yaml
//! name: tsuru-test
//! docker-hub-mirror: myregistry.com
//! machine:
//!   address: https://192.168.99.100:2376
//!   ip: 192.168.99.100
//!   ca-path: certs
//! ports:
//!   tsuru-api: 8080
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::sync::LazyLock;
use std::time::Duration;

use camino::Utf8Path;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::client::DEFAULT_DAEMON_TIMEOUT_SECS;
use crate::error::InstallerError;
use crate::install_config::{InstallConfig, ServicePorts};
use crate::machine::Machine;

/// `host[:port]` with no scheme or path.
static MIRROR_HOST: LazyLock<Regex> = LazyLock::new(|| {
    let label = r"[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?";
    Regex::new(&format!(r"^{label}(\.{label})*(:[0-9]{{1,5}})?$"))
        .expect("mirror host pattern is valid")
});

const DAEMON_SCHEMES: &[&str] = &["https", "tcp", "http"];

fn default_daemon_timeout() -> u64 {
    DEFAULT_DAEMON_TIMEOUT_SECS
}

/// An installer profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Profile {
    /// Name of the install run.
    pub name: String,
    /// Registry mirror prefixed to every image. Empty means unset.
    #[serde(default)]
    pub docker_hub_mirror: Option<String>,
    /// Per-request daemon timeout in seconds.
    #[serde(default = "default_daemon_timeout")]
    pub daemon_timeout: u64,
    pub machine: Machine,
    #[serde(default)]
    pub ports: ServicePorts,
}

impl Profile {
    /// Builds the run's [`InstallConfig`].
    pub fn install_config(&self) -> InstallConfig {
        let config = InstallConfig::new(self.name.clone()).with_ports(self.ports);
        match &self.docker_hub_mirror {
            Some(mirror) => config.with_mirror(mirror.clone()),
            None => config,
        }
    }

    pub fn daemon_timeout(&self) -> Duration {
        Duration::from_secs(self.daemon_timeout)
    }

    /// Validates the profile without touching the daemon.
    pub fn validate(&self) -> Result<(), InstallerError> {
        if self.name.trim().is_empty() {
            return Err(InstallerError::Config("run name must not be empty".to_string()));
        }

        let address = Url::parse(&self.machine.address).map_err(|e| {
            InstallerError::Config(format!(
                "invalid machine address {:?}: {}",
                self.machine.address, e
            ))
        })?;
        if !DAEMON_SCHEMES.contains(&address.scheme()) {
            return Err(InstallerError::Config(format!(
                "unsupported machine address scheme {:?} (expected one of {})",
                address.scheme(),
                DAEMON_SCHEMES.join(", ")
            )));
        }
        if address.host_str().is_none() {
            return Err(InstallerError::Config(format!(
                "machine address has no host: {}",
                self.machine.address
            )));
        }

        if self.machine.ip.trim().is_empty() {
            return Err(InstallerError::Config("machine ip must not be empty".to_string()));
        }

        if let Some(mirror) = self.docker_hub_mirror.as_deref().map(str::trim)
            && !mirror.is_empty()
            && !MIRROR_HOST.is_match(mirror)
        {
            return Err(InstallerError::Config(format!(
                "docker-hub-mirror must be a bare host[:port], got {:?}",
                mirror
            )));
        }

        if self.daemon_timeout == 0 {
            return Err(InstallerError::Config("daemon-timeout must be positive".to_string()));
        }

        let mut seen = HashSet::new();
        for (service, port) in self.ports.entries() {
            if port == 0 {
                return Err(InstallerError::Config(format!("port for {} must not be 0", service)));
            }
            if !seen.insert(port) {
                return Err(InstallerError::Config(format!(
                    "port {} for {} is already allocated to another service",
                    port, service
                )));
            }
        }

        Ok(())
    }
}

/// Loads a profile from a YAML file.
///
/// A relative `machine.ca-path` is resolved against the profile's directory.
pub fn load_profile(path: &Utf8Path) -> Result<Profile, InstallerError> {
    let file = File::open(path).map_err(|e| InstallerError::io(path.to_string(), e))?;
    let reader = BufReader::new(file);
    let mut profile: Profile = serde_yaml::from_reader(reader)
        .map_err(|e| InstallerError::Config(format!("failed to parse yaml: {}: {}", path, e)))?;

    let base_dir = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    profile.machine.resolve_paths(base_dir);

    Ok(profile)
}
