use std::collections::BTreeMap;
use std::fs;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use tempfile::TempDir;
use tsuru_installer::InstallerError;
use tsuru_installer::client::{ContainerClient, ContainerRecord, ContainerSpec};
use tsuru_installer::machine::{CA_CERT_FILE, CLIENT_CERT_FILE, CLIENT_KEY_FILE, Machine};

/// A daemon call observed by [`FakeDaemon`], with the container record as
/// it stood right after the call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Event {
    Pulled(String),
    Created(ContainerRecord),
    Started(ContainerRecord),
    Removed(String),
}

#[derive(Default)]
struct FakeState {
    containers: BTreeMap<String, ContainerRecord>,
    events: Vec<Event>,
    next_id: usize,
}

/// In-memory container daemon.
///
/// Behaves like the real daemon for the calls the installer makes and can
/// be told to reject a specific container or to be unreachable.
#[derive(Default)]
pub struct FakeDaemon {
    state: Mutex<FakeState>,
    reject_create: Option<String>,
    reject_start: Option<String>,
    unreachable: bool,
}

#[allow(dead_code)]
impl FakeDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects creation of the named container with a 500.
    pub fn rejecting_create(name: &str) -> Self {
        Self {
            reject_create: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Creates the named container but fails to start it.
    pub fn rejecting_start(name: &str) -> Self {
        Self {
            reject_start: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Fails every call with a transport error.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }

    pub fn container(&self, name: &str) -> Option<ContainerRecord> {
        self.state.lock().unwrap().containers.get(name).cloned()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state.lock().unwrap().containers.keys().cloned().collect()
    }

    /// Records of containers as they were when created, in creation order.
    pub fn created(&self) -> Vec<ContainerRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Created(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    fn check_reachable(&self, operation: &str) -> Result<(), InstallerError> {
        if self.unreachable {
            return Err(InstallerError::Transport {
                operation: operation.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

impl ContainerClient for FakeDaemon {
    fn pull_image(&self, _machine: &Machine, image: &str) -> Result<(), InstallerError> {
        self.check_reachable("pull image")?;
        self.state.lock().unwrap().events.push(Event::Pulled(image.to_string()));
        Ok(())
    }

    fn create(&self, _machine: &Machine, spec: &ContainerSpec) -> Result<String, InstallerError> {
        self.check_reachable("create container")?;
        let operation = format!("create container {}", spec.name);
        if self.reject_create.as_deref() == Some(spec.name.as_str()) {
            return Err(InstallerError::DaemonRejected {
                operation,
                status_code: Some(500),
                message: "simulated create failure".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap();
        if state.containers.contains_key(&spec.name) {
            return Err(InstallerError::DaemonRejected {
                operation,
                status_code: Some(409),
                message: format!("Conflict. The container name \"/{}\" is already in use", spec.name),
            });
        }
        state.next_id += 1;
        let record = ContainerRecord {
            id: format!("id-{}", state.next_id),
            name: spec.name.clone(),
            image: spec.image.clone(),
            cmd: spec.cmd.clone(),
            env: spec.env.clone(),
            exposed_ports: spec.exposed_ports.clone(),
            port_bindings: spec.port_bindings.clone(),
            running: false,
        };
        state.containers.insert(spec.name.clone(), record.clone());
        state.events.push(Event::Created(record.clone()));
        Ok(record.id)
    }

    fn start(&self, _machine: &Machine, name: &str, id: &str) -> Result<(), InstallerError> {
        self.check_reachable("start container")?;
        let mut state = self.state.lock().unwrap();
        let record = state
            .containers
            .values_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| InstallerError::DaemonRejected {
                operation: format!("start container {}", name),
                status_code: Some(404),
                message: format!("No such container: {}", id),
            })?;
        if self.reject_start.as_deref() == Some(record.name.as_str()) {
            return Err(InstallerError::DaemonRejected {
                operation: format!("start container {}", name),
                status_code: Some(500),
                message: "simulated start failure".to_string(),
            });
        }
        record.running = true;
        let snapshot = record.clone();
        state.events.push(Event::Started(snapshot));
        Ok(())
    }

    fn inspect(&self, _machine: &Machine, name: &str) -> Result<ContainerRecord, InstallerError> {
        self.check_reachable("inspect container")?;
        self.container(name)
            .ok_or_else(|| InstallerError::NotFound(name.to_string()))
    }

    fn remove(&self, _machine: &Machine, name: &str) -> Result<(), InstallerError> {
        self.check_reachable("remove container")?;
        let mut state = self.state.lock().unwrap();
        if state.containers.remove(name).is_none() {
            return Err(InstallerError::NotFound(name.to_string()));
        }
        state.events.push(Event::Removed(name.to_string()));
        Ok(())
    }
}

/// Machine pointing at a fake daemon; its credentials are never read.
#[allow(dead_code)]
pub fn test_machine() -> Machine {
    Machine::new("https://127.0.0.1:2376", "127.0.0.1", "/nonexistent/certs")
}

/// Creates a directory holding placeholder TLS credentials.
#[allow(dead_code)]
pub fn credentials_dir() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    for name in [CA_CERT_FILE, CLIENT_CERT_FILE, CLIENT_KEY_FILE] {
        fs::write(dir.path().join(name), "-----BEGIN PLACEHOLDER-----\n").unwrap();
    }
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("temp dir is not UTF-8");
    (dir, path)
}
