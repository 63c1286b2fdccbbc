//! Docker daemon client over mutual TLS.
//!
//! This module provides [`DockerClient`], which talks to the remote daemon
//! through `bollard`. Each call opens its own connection from the
//! [`Machine`]'s TLS material and blocks on a private tokio runtime, so the
//! rest of the installer stays synchronous.

use std::collections::HashMap;
use std::time::Duration;

use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerInspectResponse, HostConfig, PortMap};
use bollard::{API_DEFAULT_VERSION, Docker};
use futures::TryStreamExt;
use tokio::runtime::{Builder, Runtime};

use super::{ContainerClient, ContainerRecord, ContainerSpec, PortBinding, PortBindings};
use crate::error::InstallerError;
use crate::machine::Machine;

/// Per-request daemon timeout used when none is configured.
pub const DEFAULT_DAEMON_TIMEOUT_SECS: u64 = 120;

/// Container client that talks to a real daemon.
pub struct DockerClient {
    runtime: Runtime,
    timeout: Duration,
}

impl DockerClient {
    /// Creates a client whose daemon requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, InstallerError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| InstallerError::io("failed to build daemon client runtime", e))?;
        Ok(Self { runtime, timeout })
    }

    /// Builds a daemon handle from the machine's credentials.
    ///
    /// No request is sent here; failures are unreadable or malformed TLS
    /// material and are reported as configuration errors.
    fn connect(&self, machine: &Machine) -> Result<Docker, InstallerError> {
        let tls = machine.tls_files()?;
        Docker::connect_with_ssl(
            &machine.address,
            tls.key.as_std_path(),
            tls.cert.as_std_path(),
            tls.ca.as_std_path(),
            self.timeout.as_secs(),
            API_DEFAULT_VERSION,
        )
        .map_err(|e| {
            InstallerError::Config(format!("invalid TLS credentials in {}: {}", machine.ca_path, e))
        })
    }
}

impl ContainerClient for DockerClient {
    fn pull_image(&self, machine: &Machine, image: &str) -> Result<(), InstallerError> {
        let docker = self.connect(machine)?;
        tracing::debug!(image, "pulling image");
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        self.runtime
            .block_on(async {
                docker
                    .create_image(Some(options), None, None)
                    .try_collect::<Vec<_>>()
                    .await
            })
            .map_err(|e| daemon_error(format!("pull image {}", image), e))?;
        Ok(())
    }

    fn create(&self, machine: &Machine, spec: &ContainerSpec) -> Result<String, InstallerError> {
        let docker = self.connect(machine)?;
        tracing::debug!(?spec, "creating container");
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };
        let response = self
            .runtime
            .block_on(docker.create_container(Some(options), create_config(spec)))
            .map_err(|e| daemon_error(format!("create container {}", spec.name), e))?;
        for warning in &response.warnings {
            tracing::warn!(container = %spec.name, "daemon warning: {}", warning);
        }
        Ok(response.id)
    }

    fn start(&self, machine: &Machine, name: &str, id: &str) -> Result<(), InstallerError> {
        let docker = self.connect(machine)?;
        self.runtime
            .block_on(docker.start_container(id, None::<StartContainerOptions<String>>))
            .map_err(|e| daemon_error(format!("start container {}", name), e))
    }

    fn inspect(&self, machine: &Machine, name: &str) -> Result<ContainerRecord, InstallerError> {
        let docker = self.connect(machine)?;
        let response = self
            .runtime
            .block_on(docker.inspect_container(name, None::<InspectContainerOptions>))
            .map_err(|e| lookup_error(name, "inspect", e))?;
        Ok(container_record(response))
    }

    fn remove(&self, machine: &Machine, name: &str) -> Result<(), InstallerError> {
        let docker = self.connect(machine)?;
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        self.runtime
            .block_on(docker.remove_container(name, Some(options)))
            .map_err(|e| lookup_error(name, "remove", e))
    }
}

fn create_config(spec: &ContainerSpec) -> Config<String> {
    let non_empty = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());

    let exposed_ports = (!spec.exposed_ports.is_empty()).then(|| {
        spec.exposed_ports
            .iter()
            .map(|port| (port.clone(), HashMap::new()))
            .collect()
    });

    let port_bindings: Option<PortMap> = (!spec.port_bindings.is_empty()).then(|| {
        spec.port_bindings
            .iter()
            .map(|(port, bindings)| {
                let bindings = bindings
                    .iter()
                    .map(|b| bollard::models::PortBinding {
                        host_ip: Some(b.host_ip.clone()),
                        host_port: Some(b.host_port.clone()),
                    })
                    .collect();
                (port.clone(), Some(bindings))
            })
            .collect()
    });

    Config {
        image: Some(spec.image.clone()),
        cmd: non_empty(&spec.cmd),
        env: non_empty(&spec.env),
        exposed_ports,
        host_config: Some(HostConfig {
            port_bindings,
            binds: non_empty(&spec.binds),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn container_record(response: ContainerInspectResponse) -> ContainerRecord {
    let config = response.config.unwrap_or_default();
    let port_bindings: PortBindings = response
        .host_config
        .and_then(|hc| hc.port_bindings)
        .unwrap_or_default()
        .into_iter()
        .map(|(port, bindings)| {
            let bindings = bindings
                .unwrap_or_default()
                .into_iter()
                .map(|b| {
                    PortBinding::new(b.host_ip.unwrap_or_default(), b.host_port.unwrap_or_default())
                })
                .collect();
            (port, bindings)
        })
        .collect();
    let mut exposed_ports: Vec<String> = config
        .exposed_ports
        .map(|ports| ports.into_keys().collect())
        .unwrap_or_default();
    exposed_ports.sort();

    ContainerRecord {
        id: response.id.unwrap_or_default(),
        name: response
            .name
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default(),
        image: config.image.unwrap_or_default(),
        cmd: config.cmd.unwrap_or_default(),
        env: config.env.unwrap_or_default(),
        exposed_ports,
        port_bindings,
        running: response.state.and_then(|s| s.running).unwrap_or(false),
    }
}

/// Classifies a bollard error into the installer taxonomy.
fn daemon_error(operation: String, err: BollardError) -> InstallerError {
    match err {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => InstallerError::DaemonRejected {
            operation,
            status_code: Some(status_code),
            message,
        },
        BollardError::DockerStreamError { error } => InstallerError::DaemonRejected {
            operation,
            status_code: None,
            message: error,
        },
        other => InstallerError::Transport {
            operation,
            message: other.to_string(),
        },
    }
}

/// Like [`daemon_error`], but a 404 means the named container is absent.
fn lookup_error(name: &str, verb: &str, err: BollardError) -> InstallerError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => InstallerError::NotFound(name.to_string()),
        other => daemon_error(format!("{} container {}", verb, name), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use bollard::models::{ContainerConfig, ContainerState};
    use camino::Utf8PathBuf;

    use crate::machine::{CA_CERT_FILE, CLIENT_CERT_FILE, CLIENT_KEY_FILE};

    const TEST_CA: &str = include_str!("testdata/ca.pem");
    const TEST_CERT: &str = include_str!("testdata/cert.pem");
    const TEST_KEY: &str = include_str!("testdata/key.pem");

    /// Machine on a port nothing listens on, with the given credentials.
    fn machine_with_credentials(
        dir: &tempfile::TempDir,
        ca: &str,
        cert: &str,
        key: &str,
    ) -> Machine {
        fs::write(dir.path().join(CA_CERT_FILE), ca).unwrap();
        fs::write(dir.path().join(CLIENT_CERT_FILE), cert).unwrap();
        fs::write(dir.path().join(CLIENT_KEY_FILE), key).unwrap();
        let ca_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        Machine::new("https://127.0.0.1:1", "127.0.0.1", ca_path)
    }

    fn server_error(status_code: u16, message: &str) -> BollardError {
        BollardError::DockerResponseServerError {
            status_code,
            message: message.to_string(),
        }
    }

    #[test]
    fn lookup_404_is_not_found() {
        let err = lookup_error("mongo", "inspect", server_error(404, "No such container: mongo"));
        assert!(matches!(err, InstallerError::NotFound(ref name) if name == "mongo"));
    }

    #[test]
    fn create_404_is_daemon_rejected_not_missing_container() {
        let err = daemon_error(
            "create container mongo".to_string(),
            server_error(404, "No such image: mongo:latest"),
        );
        match err {
            InstallerError::DaemonRejected {
                status_code,
                message,
                ..
            } => {
                assert_eq!(status_code, Some(404));
                assert_eq!(message, "No such image: mongo:latest");
            }
            other => panic!("expected DaemonRejected, got {:?}", other),
        }
    }

    #[test]
    fn stream_error_is_daemon_rejected_without_status() {
        let err = daemon_error(
            "pull image mongo:latest".to_string(),
            BollardError::DockerStreamError {
                error: "manifest unknown".to_string(),
            },
        );
        assert!(matches!(
            err,
            InstallerError::DaemonRejected {
                status_code: None,
                ..
            }
        ));
    }

    #[test]
    fn timeout_is_transport() {
        let err = daemon_error("start container redis".to_string(), BollardError::RequestTimeoutError);
        assert!(err.is_transport());
    }

    #[test]
    fn create_config_leaves_empty_fields_unset() {
        let spec = ContainerSpec::new("mongo", "mongo:latest");
        let config = create_config(&spec);
        assert_eq!(config.image.as_deref(), Some("mongo:latest"));
        assert!(config.cmd.is_none());
        assert!(config.env.is_none());
        assert!(config.exposed_ports.is_none());
    }

    #[test]
    fn create_config_maps_port_bindings() {
        let spec = ContainerSpec::new("planb", "tsuru/planb:latest").with_published_port("80/tcp", 80);
        let config = create_config(&spec);

        let exposed = config.exposed_ports.unwrap();
        assert!(exposed.contains_key("80/tcp"));
        let bindings = config.host_config.unwrap().port_bindings.unwrap();
        let binding = &bindings["80/tcp"].as_ref().unwrap()[0];
        assert_eq!(binding.host_ip.as_deref(), Some("0.0.0.0"));
        assert_eq!(binding.host_port.as_deref(), Some("80"));
    }

    #[test]
    fn container_record_strips_name_slash_and_reads_state() {
        let response = ContainerInspectResponse {
            id: Some("abc123".to_string()),
            name: Some("/redis".to_string()),
            config: Some(ContainerConfig {
                image: Some("redis:latest".to_string()),
                ..Default::default()
            }),
            state: Some(ContainerState {
                running: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = container_record(response);
        assert_eq!(record.name, "redis");
        assert_eq!(record.image, "redis:latest");
        assert!(record.running);
        assert!(record.port_bindings.is_empty());
    }

    #[test]
    fn malformed_credentials_are_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let placeholder = "-----BEGIN PLACEHOLDER-----\n";
        let machine = machine_with_credentials(&dir, placeholder, placeholder, placeholder);
        let client = DockerClient::new(Duration::from_secs(2)).unwrap();

        let err = client.inspect(&machine, "mongo").unwrap_err();
        match err {
            InstallerError::Config(ref message) => {
                assert!(message.contains("invalid TLS credentials"), "got: {}", message);
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn missing_credentials_are_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let ca_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let machine = Machine::new("https://127.0.0.1:1", "127.0.0.1", ca_path);
        let client = DockerClient::new(Duration::from_secs(2)).unwrap();

        let err = client.pull_image(&machine, "mongo:latest").unwrap_err();
        assert!(matches!(err, InstallerError::Config(_)), "got: {:?}", err);
    }

    #[test]
    fn unreachable_daemon_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let machine = machine_with_credentials(&dir, TEST_CA, TEST_CERT, TEST_KEY);
        let client = DockerClient::new(Duration::from_secs(2)).unwrap();

        let err = client.inspect(&machine, "mongo").unwrap_err();
        assert!(err.is_transport(), "got: {:?}", err);
        assert!(err.to_string().contains("inspect container mongo"), "got: {}", err);
    }
}
